use crate::orders::TransitionPolicy;
use std::path::PathBuf;
use std::time::Duration;

/// Engine configuration
///
/// # Environment variables
///
/// | Variable | Default | Meaning |
/// |----------|---------|---------|
/// | WORK_DIR | ./data | orders.redb, local.redb and logs/ |
/// | LOG_LEVEL | info | tracing filter |
/// | LOG_JSON | false | JSON log lines |
/// | ENVIRONMENT | development | development / staging / production |
/// | WEBHOOK_URL | http://localhost:5678/webhook/nuevo-pedido | new-order webhook |
/// | WEBHOOK_ENABLED | true | false disables notifications |
/// | WEBHOOK_TIMEOUT_MS | 5000 | webhook HTTP timeout |
/// | PRODUCT_API_URL | http://localhost:8000 | REST product API |
/// | PRODUCT_CACHE_TTL_SECS | 300 | catalog cache TTL |
/// | TRANSITION_POLICY | strict | strict / permissive |
/// | ADMIN_ORDER_LIMIT | 100 | admin subscription result cap |
///
/// Unparseable values fall back to the default.
#[derive(Debug, Clone)]
pub struct Config {
    pub work_dir: String,
    pub log_level: String,
    pub log_json: bool,
    pub environment: String,

    // === Notifications ===
    pub webhook_url: String,
    pub webhook_enabled: bool,
    pub webhook_timeout_ms: u64,

    // === Product catalog ===
    pub product_api_url: String,
    pub product_cache_ttl_secs: u64,

    // === Orders ===
    pub transition_policy: TransitionPolicy,
    /// Result-count cap of the admin live view
    pub admin_order_limit: usize,
}

impl Config {
    /// Load from process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load through an arbitrary key lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let string = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.into());
        Self {
            work_dir: string("WORK_DIR", "./data"),
            log_level: string("LOG_LEVEL", "info"),
            log_json: lookup("LOG_JSON")
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
            environment: string("ENVIRONMENT", "development"),

            webhook_url: string("WEBHOOK_URL", "http://localhost:5678/webhook/nuevo-pedido"),
            webhook_enabled: lookup("WEBHOOK_ENABLED")
                .and_then(|v| v.parse().ok())
                .unwrap_or(true),
            webhook_timeout_ms: lookup("WEBHOOK_TIMEOUT_MS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(5000),

            product_api_url: string("PRODUCT_API_URL", "http://localhost:8000"),
            product_cache_ttl_secs: lookup("PRODUCT_CACHE_TTL_SECS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(300),

            transition_policy: lookup("TRANSITION_POLICY")
                .and_then(|v| v.parse().ok())
                .unwrap_or_default(),
            admin_order_limit: lookup("ADMIN_ORDER_LIMIT")
                .and_then(|v| v.parse().ok())
                .filter(|limit| *limit > 0)
                .unwrap_or(100),
        }
    }

    /// Defaults with a custom work dir, for tests
    pub fn with_work_dir(work_dir: impl Into<String>) -> Self {
        let mut config = Self::from_lookup(|_| None);
        config.work_dir = work_dir.into();
        config
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    pub fn orders_db_path(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("orders.redb")
    }

    pub fn local_db_path(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("local.redb")
    }

    pub fn logs_dir(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("logs")
    }

    pub fn webhook_timeout(&self) -> Duration {
        Duration::from_millis(self.webhook_timeout_ms)
    }

    pub fn product_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.product_cache_ttl_secs)
    }

    /// Create the work dir and its logs/ subdirectory
    pub fn ensure_work_dir_structure(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(self.logs_dir())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[]);
        assert_eq!(config.work_dir, "./data");
        assert_eq!(config.log_level, "info");
        assert!(!config.log_json);
        assert!(config.is_development());
        assert!(config.webhook_enabled);
        assert_eq!(config.webhook_timeout(), Duration::from_millis(5000));
        assert_eq!(config.product_cache_ttl(), Duration::from_secs(300));
        assert_eq!(config.transition_policy, TransitionPolicy::Strict);
        assert_eq!(config.admin_order_limit, 100);
    }

    #[test]
    fn test_overrides_and_bad_values() {
        let config = config(&[
            ("WORK_DIR", "/tmp/engine"),
            ("ENVIRONMENT", "production"),
            ("WEBHOOK_ENABLED", "false"),
            ("TRANSITION_POLICY", "permissive"),
            ("WEBHOOK_TIMEOUT_MS", "soon"),
            ("ADMIN_ORDER_LIMIT", "0"),
        ]);
        assert!(config.is_production());
        assert!(!config.webhook_enabled);
        assert_eq!(config.transition_policy, TransitionPolicy::Permissive);
        assert_eq!(config.webhook_timeout_ms, 5000);
        assert_eq!(config.admin_order_limit, 100);
        assert_eq!(config.orders_db_path(), PathBuf::from("/tmp/engine/orders.redb"));
    }
}
