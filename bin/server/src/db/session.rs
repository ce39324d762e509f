//! PostgreSQL-backed conversation sessions.

use async_trait::async_trait;
use budget_chat_conversation::{
    PendingConfirmation, Session, SessionError, SessionStore, Turn, TurnRole,
};
use budget_chat_core::{TurnId, UserId};
use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use sqlx::{FromRow, PgPool};
use std::str::FromStr;
use tracing::debug;

/// Row type for session queries.
#[derive(FromRow)]
struct SessionRow {
    user_id: String,
    active_budget: Option<String>,
    ledger_handle: Option<String>,
    pending_confirmation: Option<JsonValue>,
    user_turns: i64,
    created_at: DateTime<Utc>,
    last_active_at: DateTime<Utc>,
}

impl SessionRow {
    fn try_into_session(self) -> Result<Session, sqlx::Error> {
        let pending_confirmation = self
            .pending_confirmation
            .map(serde_json::from_value::<PendingConfirmation>)
            .transpose()
            .map_err(|e| decode(format!("invalid pending confirmation: {e}")))?;
        let user_turns = u64::try_from(self.user_turns)
            .map_err(|_| decode(format!("negative turn count {}", self.user_turns)))?;

        Ok(Session {
            user_id: UserId::from_phone(&self.user_id),
            active_budget: self.active_budget,
            ledger_handle: self.ledger_handle,
            pending_confirmation,
            user_turns,
            created_at: self.created_at,
            last_active_at: self.last_active_at,
        })
    }
}

/// Row type for turn queries.
#[derive(FromRow)]
struct TurnRow {
    id: String,
    role: String,
    text: String,
    intent: Option<String>,
    entities: Option<JsonValue>,
    created_at: DateTime<Utc>,
}

impl TurnRow {
    fn try_into_turn(self) -> Result<Turn, sqlx::Error> {
        let id = TurnId::from_str(&self.id)
            .map_err(|e| decode(format!("invalid turn id '{}': {}", self.id, e)))?;
        let role = TurnRole::from_str(&self.role).map_err(decode)?;
        Ok(Turn {
            id,
            role,
            text: self.text,
            intent: self.intent,
            entities: self.entities,
            timestamp: self.created_at,
        })
    }
}

fn decode(message: String) -> sqlx::Error {
    sqlx::Error::Decode(Box::new(std::io::Error::new(
        std::io::ErrorKind::InvalidData,
        message,
    )))
}

fn storage_error(e: sqlx::Error) -> SessionError {
    match e {
        sqlx::Error::Decode(inner) => SessionError::Corrupted {
            reason: inner.to_string(),
        },
        other => SessionError::StorageFailed {
            reason: other.to_string(),
        },
    }
}

/// Session store over the `chat_users` and `chat_turns` tables.
#[derive(Clone)]
pub struct PgSessionStore {
    pool: PgPool,
}

impl PgSessionStore {
    /// Creates a new session store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionStore for PgSessionStore {
    async fn get_or_create(&self, user: &UserId) -> Result<Session, SessionError> {
        let row: SessionRow = sqlx::query_as(
            r#"
            INSERT INTO chat_users (user_id)
            VALUES ($1)
            ON CONFLICT (user_id) DO UPDATE SET user_id = EXCLUDED.user_id
            RETURNING user_id, active_budget, ledger_handle, pending_confirmation,
                      user_turns, created_at, last_active_at
            "#,
        )
        .bind(user.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(storage_error)?;

        row.try_into_session().map_err(storage_error)
    }

    async fn append_turn(&self, user: &UserId, turn: Turn) -> Result<(), SessionError> {
        let user_increment: i64 = if turn.is_user() { 1 } else { 0 };
        let mut tx = self.pool.begin().await.map_err(storage_error)?;

        sqlx::query(
            r#"
            INSERT INTO chat_users (user_id, user_turns)
            VALUES ($1, $2)
            ON CONFLICT (user_id) DO UPDATE
            SET user_turns = chat_users.user_turns + EXCLUDED.user_turns,
                last_active_at = now()
            "#,
        )
        .bind(user.as_str())
        .bind(user_increment)
        .execute(&mut *tx)
        .await
        .map_err(storage_error)?;

        sqlx::query(
            r#"
            INSERT INTO chat_turns (id, user_id, role, text, intent, entities, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(turn.id.to_string())
        .bind(user.as_str())
        .bind(turn.role.as_str())
        .bind(&turn.text)
        .bind(&turn.intent)
        .bind(&turn.entities)
        .bind(turn.timestamp)
        .execute(&mut *tx)
        .await
        .map_err(storage_error)?;

        tx.commit().await.map_err(storage_error)
    }

    async fn recent_turns(&self, user: &UserId, limit: usize) -> Result<Vec<Turn>, SessionError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows: Vec<TurnRow> = sqlx::query_as(
            r#"
            SELECT id, role, text, intent, entities, created_at
            FROM (
                SELECT seq, id, role, text, intent, entities, created_at
                FROM chat_turns
                WHERE user_id = $1
                ORDER BY seq DESC
                LIMIT $2
            ) recent
            ORDER BY seq ASC
            "#,
        )
        .bind(user.as_str())
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(storage_error)?;

        rows.into_iter()
            .map(TurnRow::try_into_turn)
            .collect::<Result<_, _>>()
            .map_err(storage_error)
    }

    async fn set_active_budget(
        &self,
        user: &UserId,
        budget: Option<&str>,
    ) -> Result<(), SessionError> {
        sqlx::query(
            r#"
            INSERT INTO chat_users (user_id, active_budget)
            VALUES ($1, $2)
            ON CONFLICT (user_id) DO UPDATE SET active_budget = EXCLUDED.active_budget
            "#,
        )
        .bind(user.as_str())
        .bind(budget)
        .execute(&self.pool)
        .await
        .map_err(storage_error)?;

        debug!(user = %user, budget, "set active budget");
        Ok(())
    }

    async fn set_ledger_handle(&self, user: &UserId, handle: &str) -> Result<(), SessionError> {
        sqlx::query(
            r#"
            INSERT INTO chat_users (user_id, ledger_handle)
            VALUES ($1, $2)
            ON CONFLICT (user_id) DO UPDATE SET ledger_handle = EXCLUDED.ledger_handle
            "#,
        )
        .bind(user.as_str())
        .bind(handle)
        .execute(&self.pool)
        .await
        .map_err(storage_error)?;
        Ok(())
    }

    async fn set_pending_confirmation(
        &self,
        user: &UserId,
        pending: Option<PendingConfirmation>,
    ) -> Result<(), SessionError> {
        let pending = pending
            .map(|p| serde_json::to_value(&p))
            .transpose()
            .map_err(|e| SessionError::StorageFailed {
                reason: format!("could not encode pending confirmation: {e}"),
            })?;

        sqlx::query(
            r#"
            INSERT INTO chat_users (user_id, pending_confirmation)
            VALUES ($1, $2)
            ON CONFLICT (user_id) DO UPDATE
            SET pending_confirmation = EXCLUDED.pending_confirmation
            "#,
        )
        .bind(user.as_str())
        .bind(pending)
        .execute(&self.pool)
        .await
        .map_err(storage_error)?;
        Ok(())
    }

    async fn trim_history(&self, user: &UserId, keep: usize) -> Result<usize, SessionError> {
        let keep = i64::try_from(keep).unwrap_or(i64::MAX);
        let result = sqlx::query(
            r#"
            DELETE FROM chat_turns
            WHERE user_id = $1
              AND seq NOT IN (
                  SELECT seq FROM chat_turns
                  WHERE user_id = $1
                  ORDER BY seq DESC
                  LIMIT $2
              )
            "#,
        )
        .bind(user.as_str())
        .bind(keep)
        .execute(&self.pool)
        .await
        .map_err(storage_error)?;

        let removed = usize::try_from(result.rows_affected()).unwrap_or(usize::MAX);
        if removed > 0 {
            debug!(user = %user, removed, "trimmed conversation history");
        }
        Ok(removed)
    }
}
