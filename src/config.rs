//! Process configuration read from the environment

use tracing::warn;

use crate::controller::poll::PollBudgets;

/// Default listening port
pub const DEFAULT_PORT: u16 = 8080;

/// Namespace the Crunchy operator manages clusters in
pub const DEFAULT_NAMESPACE: &str = "postgres-operator";

/// Runtime configuration
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Port the HTTP server binds on all interfaces (`PORT`)
    pub port: u16,
    /// Namespace holding PostgresClusters and their children (`PGO_NAMESPACE`)
    pub namespace: String,
    /// Whether create requires a password and writes it into the user
    /// secret (`MANAGE_CREDENTIALS`). When disabled, the operator-generated
    /// password is returned instead.
    pub manage_credentials: bool,
    /// Polling budgets for the lifecycle operations
    pub poll: PollBudgets,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            namespace: DEFAULT_NAMESPACE.to_string(),
            manage_credentials: true,
            poll: PollBudgets::default(),
        }
    }
}

impl Config {
    /// Read configuration from process environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through a lookup function
    ///
    /// Unset or empty variables fall back to defaults. Malformed values are
    /// logged and ignored.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = match get("PORT") {
            Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
                warn!(value = %raw, "Invalid PORT, using {}", DEFAULT_PORT);
                DEFAULT_PORT
            }),
            None => defaults.port,
        };

        let namespace = get("PGO_NAMESPACE")
            .map(|ns| ns.trim().to_string())
            .unwrap_or(defaults.namespace);

        let manage_credentials = match get("MANAGE_CREDENTIALS") {
            Some(raw) => parse_bool(&raw).unwrap_or_else(|| {
                warn!(value = %raw, "Invalid MANAGE_CREDENTIALS, using true");
                true
            }),
            None => defaults.manage_credentials,
        };

        Self {
            port,
            namespace,
            manage_credentials,
            poll: defaults.poll,
        }
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
