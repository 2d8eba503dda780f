//! Request and response bodies of the cluster API

use serde::{Deserialize, Serialize};

/// Body of a create request
///
/// Every field defaults when absent so that a missing field is reported by
/// validation as a client error instead of a JSON decoding failure.
#[derive(Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct ClusterRequest {
    pub name: String,
    pub user: String,
    pub password: Option<String>,
    pub databases: Vec<String>,
    pub storage: String,
}

/// Cluster description returned by create and get
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClusterResponse {
    pub cluster_name: String,
    pub user: String,
    pub databases: Vec<String>,
    pub storage: String,
    /// Only present on create; get never discloses the credential
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Zero when the port was not allocated within the polling budget
    pub node_port: i32,
}
