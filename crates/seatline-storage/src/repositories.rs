// Repository layer for database operations
//
// The capacity and lifecycle mutations are written as single conditional
// UPDATEs (the guard and the write are one statement), so concurrent callers
// against the same tier or ticket serialize inside Postgres. A zero-row
// result is mapped back to the precise domain error by re-reading the row.

use anyhow::Error as AnyError;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use seatline_core::{RefundDecision, Reservation, Result, TicketingError};

use crate::models::*;

fn db_err(e: sqlx::Error) -> TicketingError {
    TicketingError::Internal(AnyError::from(e))
}

#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create database connection from URL
    pub async fn from_url(database_url: &str) -> anyhow::Result<Self> {
        let pool = PgPool::connect(database_url).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    // ============================================
    // Events
    // ============================================

    pub async fn create_event(&self, input: CreateEvent) -> Result<EventRow> {
        let row = sqlx::query_as::<_, EventRow>(
            r#"
            INSERT INTO events (id, organizer_id, name, starts_at, price_cents, capacity, sold, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, 0, 'draft', $7, $7)
            RETURNING id, organizer_id, name, starts_at, price_cents, capacity, sold, status, created_at, updated_at
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(input.organizer_id)
        .bind(&input.name)
        .bind(input.starts_at)
        .bind(input.price_cents)
        .bind(input.capacity)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(row)
    }

    pub async fn get_event(&self, id: Uuid) -> Result<Option<EventRow>> {
        let row = sqlx::query_as::<_, EventRow>(
            r#"
            SELECT id, organizer_id, name, starts_at, price_cents, capacity, sold, status, created_at, updated_at
            FROM events
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(row)
    }

    pub async fn list_events(&self) -> Result<Vec<EventRow>> {
        let rows = sqlx::query_as::<_, EventRow>(
            r#"
            SELECT id, organizer_id, name, starts_at, price_cents, capacity, sold, status, created_at, updated_at
            FROM events
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(rows)
    }

    pub async fn publish_event(&self, id: Uuid) -> Result<EventRow> {
        let row = sqlx::query_as::<_, EventRow>(
            r#"
            UPDATE events
            SET status = 'published', updated_at = $2
            WHERE id = $1
            RETURNING id, organizer_id, name, starts_at, price_cents, capacity, sold, status, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.ok_or(TicketingError::EventNotFound(id))
    }

    pub async fn cancel_event(&self, id: Uuid) -> Result<EventRow> {
        let row = sqlx::query_as::<_, EventRow>(
            r#"
            UPDATE events
            SET status = 'cancelled', updated_at = $2
            WHERE id = $1
            RETURNING id, organizer_id, name, starts_at, price_cents, capacity, sold, status, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.ok_or(TicketingError::EventNotFound(id))
    }

    pub async fn create_tier(&self, input: CreateTier) -> Result<TierRow> {
        if self.get_event(input.event_id).await?.is_none() {
            return Err(TicketingError::EventNotFound(input.event_id));
        }

        let row = sqlx::query_as::<_, TierRow>(
            r#"
            INSERT INTO ticket_tiers (id, event_id, name, price_cents, allocation, sold, created_at)
            VALUES ($1, $2, $3, $4, $5, 0, $6)
            RETURNING id, event_id, name, price_cents, allocation, sold, created_at
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(input.event_id)
        .bind(&input.name)
        .bind(input.price_cents)
        .bind(input.allocation)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(row)
    }

    pub async fn get_tier(&self, id: Uuid) -> Result<Option<TierRow>> {
        let row = sqlx::query_as::<_, TierRow>(
            r#"
            SELECT id, event_id, name, price_cents, allocation, sold, created_at
            FROM ticket_tiers
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(row)
    }

    pub async fn list_tiers(&self, event_id: Uuid) -> Result<Vec<TierRow>> {
        let rows = sqlx::query_as::<_, TierRow>(
            r#"
            SELECT id, event_id, name, price_cents, allocation, sold, created_at
            FROM ticket_tiers
            WHERE event_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(rows)
    }

    // ============================================
    // Capacity ledger
    // ============================================

    /// Atomically reserve capacity against a tier or the event-level pool
    ///
    /// The bounds check and the increment are a single conditional UPDATE;
    /// concurrent reserves against the same counter serialize on the row.
    pub async fn reserve_capacity(
        &self,
        event_id: Uuid,
        tier_id: Option<Uuid>,
        quantity: i32,
    ) -> Result<Reservation> {
        if quantity < 1 {
            return Err(TicketingError::invalid("quantity must be at least 1"));
        }

        match tier_id {
            Some(tier_id) => {
                let event = self
                    .get_event(event_id)
                    .await?
                    .ok_or(TicketingError::EventNotFound(event_id))?;
                if event.status != "published" {
                    return Err(TicketingError::EventNotBookable(event_id));
                }

                let updated = sqlx::query(
                    r#"
                    UPDATE ticket_tiers
                    SET sold = sold + $3
                    WHERE id = $1 AND event_id = $2
                      AND (allocation IS NULL OR sold + $3 <= allocation)
                    "#,
                )
                .bind(tier_id)
                .bind(event_id)
                .bind(quantity)
                .execute(&self.pool)
                .await
                .map_err(db_err)?;

                if updated.rows_affected() == 0 {
                    let tier = self.get_tier(tier_id).await?;
                    return match tier {
                        Some(t) if t.event_id == event_id => Err(TicketingError::CapacityExceeded),
                        _ => Err(TicketingError::TierNotFound(tier_id)),
                    };
                }
            }
            None => {
                let updated = sqlx::query(
                    r#"
                    UPDATE events
                    SET sold = sold + $2, updated_at = $3
                    WHERE id = $1 AND status = 'published'
                      AND (capacity IS NULL OR sold + $2 <= capacity)
                    "#,
                )
                .bind(event_id)
                .bind(quantity)
                .bind(Utc::now())
                .execute(&self.pool)
                .await
                .map_err(db_err)?;

                if updated.rows_affected() == 0 {
                    let event = self
                        .get_event(event_id)
                        .await?
                        .ok_or(TicketingError::EventNotFound(event_id))?;
                    return if event.status != "published" {
                        Err(TicketingError::EventNotBookable(event_id))
                    } else {
                        Err(TicketingError::CapacityExceeded)
                    };
                }
            }
        }

        Ok(Reservation {
            event_id,
            tier_id,
            quantity,
        })
    }

    /// Compensate a reservation whose downstream work failed
    pub async fn release_capacity(&self, reservation: &Reservation) -> Result<()> {
        match reservation.tier_id {
            Some(tier_id) => {
                sqlx::query(
                    "UPDATE ticket_tiers SET sold = GREATEST(sold - $2, 0) WHERE id = $1",
                )
                .bind(tier_id)
                .bind(reservation.quantity)
                .execute(&self.pool)
                .await
                .map_err(db_err)?;
            }
            None => {
                sqlx::query(
                    "UPDATE events SET sold = GREATEST(sold - $2, 0), updated_at = $3 WHERE id = $1",
                )
                .bind(reservation.event_id)
                .bind(reservation.quantity)
                .bind(Utc::now())
                .execute(&self.pool)
                .await
                .map_err(db_err)?;
            }
        }
        Ok(())
    }

    // ============================================
    // Tickets
    // ============================================

    /// Create a batch of tickets plus their sale ledger entries in one
    /// transaction, all-or-nothing for the requested quantity
    pub async fn create_tickets(&self, inputs: Vec<CreateTicket>) -> Result<Vec<TicketRow>> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        let now = Utc::now();
        let mut created = Vec::with_capacity(inputs.len());

        for input in inputs {
            let row = sqlx::query_as::<_, TicketRow>(
                r#"
                INSERT INTO tickets (id, event_id, tier_id, owner_id, price_paid_cents, purchased_at, state, checked_in_at, refund_state)
                VALUES ($1, $2, $3, $4, $5, $6, 'issued', NULL, 'none')
                RETURNING id, event_id, tier_id, owner_id, price_paid_cents, purchased_at, state, checked_in_at, refund_state
                "#,
            )
            .bind(Uuid::now_v7())
            .bind(input.event_id)
            .bind(input.tier_id)
            .bind(input.owner_id)
            .bind(input.price_paid_cents)
            .bind(now)
            .fetch_one(&mut *tx)
            .await
            .map_err(db_err)?;

            sqlx::query(
                r#"
                INSERT INTO ledger_entries (id, event_id, ticket_id, amount_cents, kind, created_at)
                VALUES ($1, $2, $3, $4, 'sale', $5)
                "#,
            )
            .bind(Uuid::now_v7())
            .bind(row.event_id)
            .bind(row.id)
            .bind(row.price_paid_cents)
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;

            created.push(row);
        }

        tx.commit().await.map_err(db_err)?;
        Ok(created)
    }

    pub async fn get_ticket(&self, id: Uuid) -> Result<Option<TicketRow>> {
        let row = sqlx::query_as::<_, TicketRow>(
            r#"
            SELECT id, event_id, tier_id, owner_id, price_paid_cents, purchased_at, state, checked_in_at, refund_state
            FROM tickets
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(row)
    }

    pub async fn list_tickets_for_owner(&self, owner_id: Uuid) -> Result<Vec<TicketRow>> {
        let rows = sqlx::query_as::<_, TicketRow>(
            r#"
            SELECT id, event_id, tier_id, owner_id, price_paid_cents, purchased_at, state, checked_in_at, refund_state
            FROM tickets
            WHERE owner_id = $1
            ORDER BY purchased_at DESC
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(rows)
    }

    pub async fn list_tickets_for_event(&self, event_id: Uuid) -> Result<Vec<TicketRow>> {
        let rows = sqlx::query_as::<_, TicketRow>(
            r#"
            SELECT id, event_id, tier_id, owner_id, price_paid_cents, purchased_at, state, checked_in_at, refund_state
            FROM tickets
            WHERE event_id = $1
            ORDER BY purchased_at DESC
            "#,
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(rows)
    }

    pub async fn count_checked_in(&self, event_id: Uuid) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM tickets WHERE event_id = $1 AND state = 'checked_in'",
        )
        .bind(event_id)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(count)
    }

    /// Check a ticket in, guarded against double entry
    pub async fn check_in_ticket(&self, id: Uuid) -> Result<TicketRow> {
        let row = sqlx::query_as::<_, TicketRow>(
            r#"
            UPDATE tickets
            SET state = 'checked_in', checked_in_at = $2
            WHERE id = $1 AND state = 'issued'
            RETURNING id, event_id, tier_id, owner_id, price_paid_cents, purchased_at, state, checked_in_at, refund_state
            "#,
        )
        .bind(id)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        match row {
            Some(row) => Ok(row),
            None => {
                let ticket = self
                    .get_ticket(id)
                    .await?
                    .ok_or(TicketingError::TicketNotFound(id))?;
                match ticket.state.as_str() {
                    "void" => Err(TicketingError::TicketVoided(id)),
                    _ => Err(TicketingError::AlreadyCheckedIn(id)),
                }
            }
        }
    }

    /// Revert a mistaken check-in
    pub async fn undo_check_in(&self, id: Uuid) -> Result<TicketRow> {
        let row = sqlx::query_as::<_, TicketRow>(
            r#"
            UPDATE tickets
            SET state = 'issued', checked_in_at = NULL
            WHERE id = $1 AND state = 'checked_in'
            RETURNING id, event_id, tier_id, owner_id, price_paid_cents, purchased_at, state, checked_in_at, refund_state
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        match row {
            Some(row) => Ok(row),
            None => {
                let ticket = self
                    .get_ticket(id)
                    .await?
                    .ok_or(TicketingError::TicketNotFound(id))?;
                match ticket.state.as_str() {
                    "void" => Err(TicketingError::TicketVoided(id)),
                    _ => Err(TicketingError::NotCheckedIn(id)),
                }
            }
        }
    }

    // ============================================
    // Refund requests
    // ============================================

    /// Open a refund request, snapshotting the amount from the ticket
    ///
    /// The ticket's refund_state flips to pending in the same conditional
    /// UPDATE that guards the ticket state, so a racing check-in or second
    /// request loses cleanly.
    pub async fn create_refund_request(
        &self,
        ticket_id: Uuid,
        reason: String,
    ) -> Result<RefundRequestRow> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        let ticket = sqlx::query_as::<_, TicketRow>(
            r#"
            UPDATE tickets
            SET refund_state = 'pending'
            WHERE id = $1 AND state = 'issued' AND refund_state <> 'pending'
            RETURNING id, event_id, tier_id, owner_id, price_paid_cents, purchased_at, state, checked_in_at, refund_state
            "#,
        )
        .bind(ticket_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_err)?;

        let ticket = match ticket {
            Some(ticket) => ticket,
            None => {
                tx.rollback().await.map_err(db_err)?;
                let ticket = self
                    .get_ticket(ticket_id)
                    .await?
                    .ok_or(TicketingError::TicketNotFound(ticket_id))?;
                return Err(match ticket.state.as_str() {
                    "checked_in" => TicketingError::AlreadyUsed(ticket_id),
                    "void" => TicketingError::TicketVoided(ticket_id),
                    _ => TicketingError::RefundAlreadyPending(ticket_id),
                });
            }
        };

        let row = sqlx::query_as::<_, RefundRequestRow>(
            r#"
            INSERT INTO refund_requests (id, ticket_id, event_id, amount_cents, reason, status, requested_at, processed_by, processed_at, note)
            VALUES ($1, $2, $3, $4, $5, 'pending', $6, NULL, NULL, NULL)
            RETURNING id, ticket_id, event_id, amount_cents, reason, status, requested_at, processed_by, processed_at, note
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(ticket.id)
        .bind(ticket.event_id)
        .bind(ticket.price_paid_cents)
        .bind(&reason)
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await
        .map_err(db_err)?;

        tx.commit().await.map_err(db_err)?;
        Ok(row)
    }

    pub async fn get_refund_request(&self, id: Uuid) -> Result<Option<RefundRequestRow>> {
        let row = sqlx::query_as::<_, RefundRequestRow>(
            r#"
            SELECT id, ticket_id, event_id, amount_cents, reason, status, requested_at, processed_by, processed_at, note
            FROM refund_requests
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(row)
    }

    pub async fn list_refund_requests(&self, event_id: Uuid) -> Result<Vec<RefundRequestRow>> {
        let rows = sqlx::query_as::<_, RefundRequestRow>(
            r#"
            SELECT id, ticket_id, event_id, amount_cents, reason, status, requested_at, processed_by, processed_at, note
            FROM refund_requests
            WHERE event_id = $1
            ORDER BY requested_at DESC
            "#,
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(rows)
    }

    /// Process a pending refund request exactly once
    ///
    /// Runs in a transaction with the request and ticket rows locked. An
    /// approve that races a completed check-in fails with `AlreadyUsed` and
    /// leaves the request pending.
    pub async fn process_refund_request(
        &self,
        id: Uuid,
        decision: RefundDecision,
        processed_by: Uuid,
        note: Option<String>,
    ) -> Result<(RefundRequestRow, TicketRow)> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        let request = sqlx::query_as::<_, RefundRequestRow>(
            r#"
            SELECT id, ticket_id, event_id, amount_cents, reason, status, requested_at, processed_by, processed_at, note
            FROM refund_requests
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_err)?
        .ok_or(TicketingError::RefundRequestNotFound(id))?;

        if request.status != "pending" {
            return Err(TicketingError::AlreadyProcessed(id));
        }

        let ticket = sqlx::query_as::<_, TicketRow>(
            r#"
            SELECT id, event_id, tier_id, owner_id, price_paid_cents, purchased_at, state, checked_in_at, refund_state
            FROM tickets
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(request.ticket_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_err)?
        .ok_or(TicketingError::TicketNotFound(request.ticket_id))?;

        let now = Utc::now();
        let (status, ticket) = match decision {
            RefundDecision::Approve => {
                if ticket.state != "issued" {
                    return Err(TicketingError::AlreadyUsed(ticket.id));
                }

                let ticket = sqlx::query_as::<_, TicketRow>(
                    r#"
                    UPDATE tickets
                    SET state = 'void', refund_state = 'approved'
                    WHERE id = $1
                    RETURNING id, event_id, tier_id, owner_id, price_paid_cents, purchased_at, state, checked_in_at, refund_state
                    "#,
                )
                .bind(ticket.id)
                .fetch_one(&mut *tx)
                .await
                .map_err(db_err)?;

                sqlx::query(
                    r#"
                    INSERT INTO ledger_entries (id, event_id, ticket_id, amount_cents, kind, created_at)
                    VALUES ($1, $2, $3, $4, 'refund', $5)
                    "#,
                )
                .bind(Uuid::now_v7())
                .bind(request.event_id)
                .bind(request.ticket_id)
                .bind(-request.amount_cents)
                .bind(now)
                .execute(&mut *tx)
                .await
                .map_err(db_err)?;

                ("approved", ticket)
            }
            RefundDecision::Reject => {
                let ticket = sqlx::query_as::<_, TicketRow>(
                    r#"
                    UPDATE tickets
                    SET refund_state = 'rejected'
                    WHERE id = $1
                    RETURNING id, event_id, tier_id, owner_id, price_paid_cents, purchased_at, state, checked_in_at, refund_state
                    "#,
                )
                .bind(ticket.id)
                .fetch_one(&mut *tx)
                .await
                .map_err(db_err)?;

                ("rejected", ticket)
            }
        };

        let request = sqlx::query_as::<_, RefundRequestRow>(
            r#"
            UPDATE refund_requests
            SET status = $2, processed_by = $3, processed_at = $4, note = $5
            WHERE id = $1
            RETURNING id, ticket_id, event_id, amount_cents, reason, status, requested_at, processed_by, processed_at, note
            "#,
        )
        .bind(id)
        .bind(status)
        .bind(processed_by)
        .bind(now)
        .bind(&note)
        .fetch_one(&mut *tx)
        .await
        .map_err(db_err)?;

        tx.commit().await.map_err(db_err)?;
        Ok((request, ticket))
    }

    // ============================================
    // Money ledger
    // ============================================

    pub async fn list_ledger_entries(&self, event_id: Uuid) -> Result<Vec<LedgerEntryRow>> {
        let rows = sqlx::query_as::<_, LedgerEntryRow>(
            r#"
            SELECT id, event_id, ticket_id, amount_cents, kind, created_at
            FROM ledger_entries
            WHERE event_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(rows)
    }

    pub async fn ledger_balance(&self, event_id: Uuid) -> Result<i64> {
        let balance: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(amount_cents), 0) FROM ledger_entries WHERE event_id = $1",
        )
        .bind(event_id)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(balance)
    }
}
