//! Request builders and helpers
//!
//! ```rust,ignore
//! let req = ClusterRequestBuilder::new("demo").with_databases(&["db1", "db2"]).build();
//! let ctx = test_context(FakeControlPlane::new());
//! ```

use std::sync::Arc;

use postgres_cluster_api::config::Config;
use postgres_cluster_api::controller::{ClusterRequest, Context};
use postgres_cluster_api::health::HealthState;

use super::FakeControlPlane;

/// Password used by the default request
pub const TEST_PASSWORD: &str = "s3cr3t-pass";

/// Builder for create requests
///
/// Starts from the `demo` / `alice` / `db1` / `1Gi` request used throughout
/// the tests.
#[derive(Clone, Debug)]
pub struct ClusterRequestBuilder {
    req: ClusterRequest,
}

impl ClusterRequestBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            req: ClusterRequest {
                name: name.to_string(),
                user: "alice".to_string(),
                password: Some(TEST_PASSWORD.to_string()),
                databases: vec!["db1".to_string()],
                storage: "1Gi".to_string(),
            },
        }
    }

    pub fn with_user(mut self, user: &str) -> Self {
        self.req.user = user.to_string();
        self
    }

    pub fn with_password(mut self, password: &str) -> Self {
        self.req.password = Some(password.to_string());
        self
    }

    pub fn without_password(mut self) -> Self {
        self.req.password = None;
        self
    }

    pub fn with_databases(mut self, databases: &[&str]) -> Self {
        self.req.databases = databases.iter().map(|d| d.to_string()).collect();
        self
    }

    pub fn with_storage(mut self, storage: &str) -> Self {
        self.req.storage = storage.to_string();
        self
    }

    pub fn build(self) -> ClusterRequest {
        self.req
    }
}

/// The default `demo` request
pub fn demo_request() -> ClusterRequest {
    ClusterRequestBuilder::new("demo").build()
}

/// Build a Kubernetes API error response
pub fn api_error(code: u16, reason: &str) -> kube::Error {
    kube::Error::Api(kube::error::ErrorResponse {
        status: "Failure".to_string(),
        message: format!("fake control plane: {}", reason),
        reason: reason.to_string(),
        code,
    })
}

/// Context with default budgets and credential management enabled
pub fn test_context(fake: FakeControlPlane) -> Context<FakeControlPlane> {
    Context::new(fake, &Config::default(), None)
}

/// Context that records metrics into the returned health state
pub fn test_context_with_metrics(
    fake: FakeControlPlane,
) -> (Context<FakeControlPlane>, Arc<HealthState>) {
    let health_state = Arc::new(HealthState::new());
    let ctx = Context::new(fake, &Config::default(), Some(health_state.clone()));
    (ctx, health_state)
}

/// Context where the operator generates credentials
pub fn unmanaged_context(fake: FakeControlPlane) -> Context<FakeControlPlane> {
    let config = Config {
        manage_credentials: false,
        ..Config::default()
    };
    Context::new(fake, &config, None)
}
