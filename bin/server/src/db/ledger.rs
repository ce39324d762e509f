//! PostgreSQL-backed budget ledgers.
//!
//! Every ledger handle owns a set of rows in `budgets`; a budget's items are
//! its `line_items` rows ranked by id, so positions close up after a delete.

use async_trait::async_trait;
use budget_chat_ledger::{LedgerError, LedgerStore, LineItem, RESERVED_SHEET, same_budget_name};
use sqlx::{FromRow, PgPool};
use tracing::debug;

/// Row type for line item queries.
#[derive(FromRow)]
struct LineItemRow {
    name: String,
    quantity: f64,
    unit_price: i64,
    note: Option<String>,
}

impl LineItemRow {
    fn try_into_item(self) -> Result<LineItem, LedgerError> {
        let unit_price = u64::try_from(self.unit_price).map_err(|_| LedgerError::Unavailable {
            reason: format!("stored unit price {} is negative", self.unit_price),
        })?;
        let item = LineItem::new(self.name, self.quantity, unit_price);
        Ok(match self.note {
            Some(note) => item.with_note(note),
            None => item,
        })
    }
}

fn unavailable(e: sqlx::Error) -> LedgerError {
    LedgerError::Unavailable {
        reason: e.to_string(),
    }
}

fn not_found(budget: &str) -> LedgerError {
    LedgerError::BudgetNotFound {
        name: budget.to_string(),
    }
}

/// Ledger store over the `budgets` and `line_items` tables.
#[derive(Clone)]
pub struct PgLedgerStore {
    pool: PgPool,
}

impl PgLedgerStore {
    /// Creates a new ledger store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn budget_id(&self, ledger: &str, budget: &str) -> Result<i64, LedgerError> {
        sqlx::query_scalar(
            r#"
            SELECT id FROM budgets
            WHERE ledger = $1 AND lower(btrim(name)) = lower(btrim($2))
            "#,
        )
        .bind(ledger)
        .bind(budget)
        .fetch_optional(&self.pool)
        .await
        .map_err(unavailable)?
        .ok_or_else(|| not_found(budget))
    }

    async fn item_count(&self, budget_id: i64) -> Result<usize, LedgerError> {
        let count: i64 = sqlx::query_scalar("SELECT count(*) FROM line_items WHERE budget_id = $1")
            .bind(budget_id)
            .fetch_one(&self.pool)
            .await
            .map_err(unavailable)?;
        Ok(usize::try_from(count).unwrap_or_default())
    }
}

#[async_trait]
impl LedgerStore for PgLedgerStore {
    async fn create_budget(&self, ledger: &str, name: &str) -> Result<(), LedgerError> {
        if same_budget_name(name, RESERVED_SHEET) {
            return Err(LedgerError::NameCollision {
                name: name.to_string(),
            });
        }

        let result = sqlx::query(
            r#"
            INSERT INTO budgets (ledger, name)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(ledger)
        .bind(name.trim())
        .execute(&self.pool)
        .await
        .map_err(unavailable)?;

        if result.rows_affected() == 0 {
            return Err(LedgerError::NameCollision {
                name: name.to_string(),
            });
        }
        debug!(ledger, budget = name, "created budget");
        Ok(())
    }

    async fn list_budgets(&self, ledger: &str) -> Result<Vec<String>, LedgerError> {
        sqlx::query_scalar("SELECT name FROM budgets WHERE ledger = $1 ORDER BY id")
            .bind(ledger)
            .fetch_all(&self.pool)
            .await
            .map_err(unavailable)
    }

    async fn add_item(
        &self,
        ledger: &str,
        budget: &str,
        item: &LineItem,
    ) -> Result<(), LedgerError> {
        let unit_price = i64::try_from(item.unit_price).map_err(|_| LedgerError::Unavailable {
            reason: format!("unit price {} does not fit the ledger", item.unit_price),
        })?;

        let result = sqlx::query(
            r#"
            INSERT INTO line_items (budget_id, name, quantity, unit_price, note)
            SELECT id, $3, $4, $5, $6
            FROM budgets
            WHERE ledger = $1 AND lower(btrim(name)) = lower(btrim($2))
            "#,
        )
        .bind(ledger)
        .bind(budget)
        .bind(&item.name)
        .bind(item.quantity)
        .bind(unit_price)
        .bind(&item.note)
        .execute(&self.pool)
        .await
        .map_err(unavailable)?;

        if result.rows_affected() == 0 {
            return Err(not_found(budget));
        }
        Ok(())
    }

    async fn get_items(&self, ledger: &str, budget: &str) -> Result<Vec<LineItem>, LedgerError> {
        let budget_id = self.budget_id(ledger, budget).await?;
        let rows: Vec<LineItemRow> = sqlx::query_as(
            r#"
            SELECT name, quantity, unit_price, note
            FROM line_items
            WHERE budget_id = $1
            ORDER BY id
            "#,
        )
        .bind(budget_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unavailable)?;

        rows.into_iter().map(LineItemRow::try_into_item).collect()
    }

    async fn delete_item(
        &self,
        ledger: &str,
        budget: &str,
        position: usize,
    ) -> Result<LineItem, LedgerError> {
        let budget_id = self.budget_id(ledger, budget).await?;
        let out_of_range = |len| LedgerError::PositionOutOfRange { position, len };
        if position == 0 {
            return Err(out_of_range(self.item_count(budget_id).await?));
        }
        let offset = i64::try_from(position - 1).unwrap_or(i64::MAX);

        let row: Option<LineItemRow> = sqlx::query_as(
            r#"
            DELETE FROM line_items
            WHERE id = (
                SELECT id FROM line_items
                WHERE budget_id = $1
                ORDER BY id
                OFFSET $2
                LIMIT 1
            )
            RETURNING name, quantity, unit_price, note
            "#,
        )
        .bind(budget_id)
        .bind(offset)
        .fetch_optional(&self.pool)
        .await
        .map_err(unavailable)?;

        match row {
            Some(row) => row.try_into_item(),
            None => Err(out_of_range(self.item_count(budget_id).await?)),
        }
    }

    async fn delete_budget(&self, ledger: &str, budget: &str) -> Result<(), LedgerError> {
        let result = sqlx::query(
            r#"
            DELETE FROM budgets
            WHERE ledger = $1 AND lower(btrim(name)) = lower(btrim($2))
            "#,
        )
        .bind(ledger)
        .bind(budget)
        .execute(&self.pool)
        .await
        .map_err(unavailable)?;

        if result.rows_affected() == 0 {
            return Err(not_found(budget));
        }
        debug!(ledger, budget, "deleted budget");
        Ok(())
    }
}
