//! Console Repository
//!
//! Executes statements already accepted by [`ReadOnlyQuery`] inside a
//! `READ ONLY` transaction with a statement timeout, returning rows as JSON
//! objects.

use sea_orm::{
    AccessMode, ConnectionTrait, DatabaseConnection, DbBackend, FromQueryResult, JsonValue,
    Statement, TransactionTrait,
};
use serde::Serialize;
use tracing::info;

use rimba_core::console::ReadOnlyQuery;

/// Per-statement timeout applied inside the console transaction.
const STATEMENT_TIMEOUT: &str = "SET LOCAL statement_timeout = '10s'";

/// Rows returned by a console query.
#[derive(Debug, Clone, Serialize)]
pub struct ConsoleResult {
    /// Result rows as JSON objects keyed by column name.
    pub rows: Vec<JsonValue>,
    /// Number of rows returned.
    pub row_count: usize,
    /// Whether rows beyond the limit were dropped.
    pub truncated: bool,
}

/// Repository running read-only console statements.
pub struct ConsoleRepository {
    db: DatabaseConnection,
}

impl ConsoleRepository {
    /// Creates a new ConsoleRepository.
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Runs a validated statement, returning at most `row_limit` rows.
    pub async fn execute(
        &self,
        query: &ReadOnlyQuery,
        row_limit: u64,
    ) -> Result<ConsoleResult, sea_orm::DbErr> {
        // One extra row tells us whether the result was cut.
        let sql = query.limited(row_limit.saturating_add(1));

        let txn = self
            .db
            .begin_with_config(None, Some(AccessMode::ReadOnly))
            .await?;
        txn.execute_unprepared(STATEMENT_TIMEOUT).await?;

        let rows = JsonValue::find_by_statement(Statement::from_string(DbBackend::Postgres, sql))
            .all(&txn)
            .await;
        txn.rollback().await?;
        let rows = rows?;

        let result = truncate(rows, row_limit);
        info!(
            kind = ?query.kind(),
            row_count = result.row_count,
            truncated = result.truncated,
            "Console query executed"
        );
        Ok(result)
    }
}

fn truncate(mut rows: Vec<JsonValue>, row_limit: u64) -> ConsoleResult {
    let cap = usize::try_from(row_limit).unwrap_or(usize::MAX);
    let truncated = rows.len() > cap;
    rows.truncate(cap);
    ConsoleResult {
        row_count: rows.len(),
        rows,
        truncated,
    }
}
