//! Fixed-interval polling for eventually consistent control-plane state
//!
//! The Crunchy operator materialises services and secrets some time after a
//! PostgresCluster is submitted, and removes the resource some time after a
//! delete. Nothing pushes these changes to us, so each operation re-reads
//! until the condition holds or the attempt budget runs out.
//!
//! There is no backoff and no jitter: attempt, sleep a fixed interval, repeat.

use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

use crate::controller::error::{Error, Result};

/// What exhausting the budget means for the caller
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OnExhausted {
    /// The condition is best-effort; the caller proceeds without a value
    Degrade,
    /// The condition is required; exhaustion is an error
    Fail,
}

/// Attempt budget and interval for one poll
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PollPolicy {
    /// Name used in logs, metrics and timeout errors
    pub condition: &'static str,
    /// Maximum number of condition checks (at least one check always runs)
    pub max_attempts: u32,
    /// Delay between consecutive checks
    pub interval: Duration,
    pub on_exhausted: OnExhausted,
}

impl PollPolicy {
    /// Node port discovery during create
    pub const CREATE_NODE_PORT: PollPolicy = PollPolicy {
        condition: "node port",
        max_attempts: 20,
        interval: Duration::from_secs(1),
        on_exhausted: OnExhausted::Degrade,
    };

    /// Node port discovery during get
    pub const GET_NODE_PORT: PollPolicy = PollPolicy {
        condition: "node port",
        max_attempts: 5,
        interval: Duration::from_millis(500),
        on_exhausted: OnExhausted::Degrade,
    };

    /// Credential secret discovery during create
    pub const USER_SECRET: PollPolicy = PollPolicy {
        condition: "user secret",
        max_attempts: 30,
        interval: Duration::from_secs(1),
        on_exhausted: OnExhausted::Fail,
    };

    /// PostgresCluster disappearance during delete
    pub const DELETION: PollPolicy = PollPolicy {
        condition: "cluster deletion",
        max_attempts: 30,
        interval: Duration::from_secs(1),
        on_exhausted: OnExhausted::Degrade,
    };

    /// Upper bound on the time spent sleeping
    pub fn max_wait(&self) -> Duration {
        self.interval * self.max_attempts.saturating_sub(1)
    }
}

/// Polling policies used by the lifecycle operations
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PollBudgets {
    pub create_node_port: PollPolicy,
    pub get_node_port: PollPolicy,
    pub user_secret: PollPolicy,
    pub deletion: PollPolicy,
}

impl Default for PollBudgets {
    fn default() -> Self {
        Self {
            create_node_port: PollPolicy::CREATE_NODE_PORT,
            get_node_port: PollPolicy::GET_NODE_PORT,
            user_secret: PollPolicy::USER_SECRET,
            deletion: PollPolicy::DELETION,
        }
    }
}

/// Repeatedly evaluate `check` until it yields a value or the budget is spent
///
/// Returns `Ok(Some(value))` as soon as a check observes the condition. On
/// exhaustion returns `Ok(None)` for [`OnExhausted::Degrade`] policies and
/// [`Error::RequiredConditionTimeout`] for [`OnExhausted::Fail`] policies.
/// Checks are responsible for turning read failures into `None`.
pub async fn poll_until<F, Fut, T>(
    policy: &PollPolicy,
    subject: &str,
    mut check: F,
) -> Result<Option<T>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Option<T>>,
{
    let attempts = policy.max_attempts.max(1);

    for attempt in 1..=attempts {
        if let Some(value) = check().await {
            debug!(
                condition = policy.condition,
                subject = %subject,
                attempt,
                "Condition observed"
            );
            return Ok(Some(value));
        }

        debug!(
            condition = policy.condition,
            subject = %subject,
            attempt,
            max_attempts = attempts,
            "Condition not yet observed"
        );

        if attempt < attempts {
            tokio::time::sleep(policy.interval).await;
        }
    }

    warn!(
        condition = policy.condition,
        subject = %subject,
        attempts,
        waited = ?policy.max_wait(),
        "Condition not observed within polling budget"
    );

    match policy.on_exhausted {
        OnExhausted::Degrade => Ok(None),
        OnExhausted::Fail => Err(Error::RequiredConditionTimeout {
            condition: policy.condition,
            attempts,
        }),
    }
}
