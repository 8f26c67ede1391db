use slotswap_core::error::SwapError;

/// Classify a sqlx error into the domain taxonomy.
///
/// Lock-wait timeouts (55P03), serialization failures (40001), and
/// detected deadlocks (40P01) are transient contention and map to the
/// retryable `ConcurrencyConflict`; everything else is a `Storage`
/// failure.
pub(crate) fn map_db_error(err: sqlx::Error) -> SwapError {
    match &err {
        sqlx::Error::Database(db_err) => match db_err.code().as_deref() {
            Some("55P03") => SwapError::ConcurrencyConflict("lock wait timed out".to_string()),
            Some("40001") => {
                SwapError::ConcurrencyConflict("serialization failure".to_string())
            }
            Some("40P01") => SwapError::ConcurrencyConflict("deadlock detected".to_string()),
            _ => {
                tracing::error!(error = %db_err, "Database error");
                SwapError::Storage(err.to_string())
            }
        },
        other => {
            tracing::error!(error = %other, "Database error");
            SwapError::Storage(err.to_string())
        }
    }
}
