pub mod cleanup;
pub mod context;
pub mod control_plane;
pub mod error;
pub mod lifecycle;
pub mod poll;
pub mod types;
pub mod validation;

pub use cleanup::{SweepReport, belongs_to_cluster, sweep_cluster_leftovers};
pub use context::Context;
pub use control_plane::{AuxiliaryKind, ControlPlane, KubeControlPlane};
pub use error::{Error, Result, is_not_found};
pub use lifecycle::{create_cluster, delete_cluster, get_cluster, list_clusters};
pub use poll::{OnExhausted, PollBudgets, PollPolicy, poll_until};
pub use types::{ClusterRequest, ClusterResponse};
pub use validation::{
    MAX_NAME_LENGTH, validate_name, validate_request, validate_storage, validate_user,
};
