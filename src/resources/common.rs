//! Naming conventions and constants shared by the resource generators
//!
//! The Crunchy operator derives child resource names from the cluster name.
//! These helpers keep the derivations in one place.

use std::collections::BTreeMap;

/// Field manager / managed-by value for everything this service writes
pub const FIELD_MANAGER: &str = "postgres-cluster-api";

/// Label the Crunchy operator puts on every child resource of a cluster
pub const CLUSTER_LABEL: &str = "postgres-operator.crunchydata.com/cluster";

/// Annotation asking the operator to create a schema per user
pub const AUTO_CREATE_USER_SCHEMA_ANNOTATION: &str =
    "postgres-operator.crunchydata.com/autoCreateUserSchema";

/// Services the operator creates for a cluster, in discovery order
pub fn exposed_service_names(cluster_name: &str) -> [String; 2] {
    [
        format!("{}-ha", cluster_name),
        format!("{}-primary", cluster_name),
    ]
}

/// Secret holding the generated credentials of a cluster user
pub fn user_secret_name(cluster_name: &str, user: &str) -> String {
    format!("{}-pguser-{}", cluster_name, user)
}

/// Labels stamped on the PostgresCluster resource itself
pub fn standard_labels() -> BTreeMap<String, String> {
    BTreeMap::from([(
        "app.kubernetes.io/managed-by".to_string(),
        FIELD_MANAGER.to_string(),
    )])
}
