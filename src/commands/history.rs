use crate::db::{DbError, DbPool};
use crate::records::{summarize_history, HistorySummary};

/// Aggregate counts and series over every stored diagnostic
pub async fn history(pool: &DbPool) -> Result<HistorySummary, DbError> {
  summarize_history(pool).await
}
