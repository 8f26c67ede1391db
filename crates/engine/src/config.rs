/// Engine configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Upper bound on row-lock wait inside engine transactions, in
    /// milliseconds. Exceeding it surfaces as a retryable
    /// `ConcurrencyConflict` instead of a hang (default: `5000`).
    pub lock_timeout_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            lock_timeout_ms: 5000,
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default |
    /// |------------------------|---------|
    /// | `SWAP_LOCK_TIMEOUT_MS` | `5000`  |
    pub fn from_env() -> Self {
        let lock_timeout_ms: u64 = std::env::var("SWAP_LOCK_TIMEOUT_MS")
            .unwrap_or_else(|_| "5000".into())
            .parse()
            .expect("SWAP_LOCK_TIMEOUT_MS must be a valid u64");

        Self { lock_timeout_ms }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_lock_timeout() {
        assert_eq!(EngineConfig::default().lock_timeout_ms, 5000);
    }
}
