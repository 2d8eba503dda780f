//! Crunchy Data `PostgresCluster` (postgres-operator.crunchydata.com/v1beta1)
//!
//! The CRD is owned by the Crunchy operator, so it is addressed through
//! `DynamicObject` with an explicit `ApiResource` instead of a derived type.
//! The structs below only cover the subset of `.spec` this service writes.

use kube::api::{ApiResource, DynamicObject};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Crunchy operator API group
pub const API_GROUP: &str = "postgres-operator.crunchydata.com";
/// Crunchy operator API version
pub const API_VERSION: &str = "v1beta1";
/// PostgresCluster kind
pub const KIND: &str = "PostgresCluster";
/// PostgresCluster plural resource name
pub const PLURAL: &str = "postgresclusters";

/// `ApiResource` describing the PostgresCluster custom resource
pub fn postgres_cluster_resource() -> ApiResource {
    ApiResource {
        group: API_GROUP.to_string(),
        version: API_VERSION.to_string(),
        kind: KIND.to_string(),
        api_version: format!("{}/{}", API_GROUP, API_VERSION),
        plural: PLURAL.to_string(),
    }
}

/// Desired state sent to the Crunchy operator
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PostgresClusterSpec {
    /// Major PostgreSQL version
    pub postgres_version: i32,
    /// Users and the databases they own
    pub users: Vec<PostgresUserSpec>,
    /// Instance sets (each is a StatefulSet group managed by the operator)
    pub instances: Vec<InstanceSetSpec>,
    /// Backup configuration
    pub backups: BackupsSpec,
    /// Exposure of the primary service
    pub service: ServiceSpec,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct PostgresUserSpec {
    pub name: String,
    pub databases: Vec<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InstanceSetSpec {
    pub name: String,
    pub replicas: i32,
    pub data_volume_claim_spec: VolumeClaimSpec,
}

/// Minimal PersistentVolumeClaim spec
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VolumeClaimSpec {
    pub access_modes: Vec<String>,
    pub resources: VolumeResources,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct VolumeResources {
    pub requests: BTreeMap<String, String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct BackupsSpec {
    pub pgbackrest: PgBackRestSpec,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct PgBackRestSpec {
    pub repos: Vec<BackupRepoSpec>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct BackupRepoSpec {
    pub name: String,
    pub volume: RepoVolume,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RepoVolume {
    pub volume_claim_spec: VolumeClaimSpec,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ServiceSpec {
    #[serde(rename = "type")]
    pub type_: String,
}

/// Lenient view of a stored PostgresCluster
///
/// The Crunchy schema evolves independently of this service, so every field
/// is extracted by path and falls back to an empty value when it is missing
/// or has an unexpected shape.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ObservedCluster {
    /// Name of the first user entry
    pub user: String,
    /// String entries of the first user's database list
    pub databases: Vec<String>,
    /// Storage request of the first instance set
    pub storage: String,
}

impl ObservedCluster {
    /// Extract the fields this service reports from a stored object
    pub fn from_object(obj: &DynamicObject) -> Self {
        Self::from_value(&obj.data)
    }

    /// Extract fields from the object's data (everything except metadata)
    pub fn from_value(data: &Value) -> Self {
        let user = data.pointer("/spec/users/0");

        let name = user
            .and_then(|u| u.get("name"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let databases = user
            .and_then(|u| u.get("databases"))
            .and_then(Value::as_array)
            .map(|dbs| {
                dbs.iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let storage = data
            .pointer("/spec/instances/0/dataVolumeClaimSpec/resources/requests/storage")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        Self {
            user: name,
            databases,
            storage,
        }
    }
}
