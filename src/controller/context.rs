use std::sync::Arc;

use crate::config::Config;
use crate::controller::control_plane::ControlPlane;
use crate::controller::poll::{PollBudgets, PollPolicy};
use crate::health::HealthState;

/// Shared context for the lifecycle operations
pub struct Context<C> {
    /// Control plane access
    pub control_plane: C,
    /// Whether create writes the caller's password into the user secret
    pub manage_credentials: bool,
    /// Polling budgets
    pub poll: PollBudgets,
    /// Health state for recording metrics (optional)
    pub health_state: Option<Arc<HealthState>>,
}

impl<C: ControlPlane> Context<C> {
    pub fn new(control_plane: C, config: &Config, health_state: Option<Arc<HealthState>>) -> Self {
        Self {
            control_plane,
            manage_credentials: config.manage_credentials,
            poll: config.poll,
            health_state,
        }
    }

    pub(crate) fn record_poll_exhausted(&self, policy: &PollPolicy) {
        if let Some(ref state) = self.health_state {
            state.metrics.record_poll_exhausted(policy.condition);
        }
    }

    pub(crate) fn record_sweep_deleted(&self, kind: &str) {
        if let Some(ref state) = self.health_state {
            state.metrics.record_sweep_deleted(kind);
        }
    }

    pub(crate) fn record_request(&self, operation: &str, outcome: &str, duration_secs: f64) {
        if let Some(ref state) = self.health_state {
            state
                .metrics
                .record_request(operation, outcome, duration_secs);
        }
    }
}
