pub mod api;
pub mod config;
pub mod controller;
pub mod crd;
pub mod health;
pub mod resources;

pub use api::{build_router, run_server};
pub use config::Config;
pub use controller::{
    ClusterRequest, ClusterResponse, Context, ControlPlane, Error, KubeControlPlane, Result,
    SweepReport, create_cluster, delete_cluster, get_cluster, list_clusters,
};
pub use crd::{ObservedCluster, postgres_cluster_resource};
pub use health::{HealthState, Metrics};
