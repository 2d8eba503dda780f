pub mod common;
pub mod postgres_cluster;
pub mod secret;
pub mod service;

pub use common::{FIELD_MANAGER, exposed_service_names, standard_labels, user_secret_name};
pub use postgres_cluster::{generate_cluster_spec, generate_postgres_cluster};
