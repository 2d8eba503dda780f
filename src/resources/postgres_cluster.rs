//! PostgresCluster desired-state generation
//!
//! Maps a validated [`ClusterRequest`] to the document submitted to the
//! Crunchy operator. Replica count, backup repository layout and service
//! exposure are fixed policy and cannot be set per request.

use std::collections::BTreeMap;

use kube::api::{DynamicObject, ObjectMeta};
use serde_json::json;

use crate::controller::error::Result;
use crate::controller::types::ClusterRequest;
use crate::crd::{
    BackupRepoSpec, BackupsSpec, InstanceSetSpec, PgBackRestSpec, PostgresClusterSpec,
    PostgresUserSpec, RepoVolume, ServiceSpec, VolumeClaimSpec, VolumeResources,
    postgres_cluster_resource,
};
use crate::resources::common::{AUTO_CREATE_USER_SCHEMA_ANNOTATION, standard_labels};

/// PostgreSQL major version for new clusters
pub const POSTGRES_VERSION: i32 = 17;

/// Instances in the single instance set (primary + one replica)
pub const INSTANCE_REPLICAS: i32 = 2;

/// Name of the single instance set
pub const INSTANCE_SET_NAME: &str = "instance1";

/// Name of the single pgBackRest repository
pub const BACKUP_REPO_NAME: &str = "repo1";

/// Volume access mode for data and backup volumes
pub const ACCESS_MODE: &str = "ReadWriteOnce";

/// Service type requested for the primary service
pub const SERVICE_TYPE: &str = "NodePort";

fn volume_claim_spec(storage: &str) -> VolumeClaimSpec {
    VolumeClaimSpec {
        access_modes: vec![ACCESS_MODE.to_string()],
        resources: VolumeResources {
            requests: BTreeMap::from([("storage".to_string(), storage.to_string())]),
        },
    }
}

/// Build the PostgresCluster spec for a request
pub fn generate_cluster_spec(req: &ClusterRequest) -> PostgresClusterSpec {
    PostgresClusterSpec {
        postgres_version: POSTGRES_VERSION,
        users: vec![PostgresUserSpec {
            name: req.user.clone(),
            databases: req.databases.clone(),
        }],
        instances: vec![InstanceSetSpec {
            name: INSTANCE_SET_NAME.to_string(),
            replicas: INSTANCE_REPLICAS,
            data_volume_claim_spec: volume_claim_spec(&req.storage),
        }],
        backups: BackupsSpec {
            pgbackrest: PgBackRestSpec {
                repos: vec![BackupRepoSpec {
                    name: BACKUP_REPO_NAME.to_string(),
                    volume: RepoVolume {
                        volume_claim_spec: volume_claim_spec(&req.storage),
                    },
                }],
            },
        },
        service: ServiceSpec {
            type_: SERVICE_TYPE.to_string(),
        },
    }
}

/// Generate the PostgresCluster object for a request
///
/// The namespace is left unset; the control plane client submits into its
/// configured namespace.
pub fn generate_postgres_cluster(req: &ClusterRequest) -> Result<DynamicObject> {
    let spec = generate_cluster_spec(req);

    let mut obj = DynamicObject::new(&req.name, &postgres_cluster_resource());
    obj.metadata = ObjectMeta {
        name: Some(req.name.clone()),
        labels: Some(standard_labels()),
        annotations: Some(BTreeMap::from([(
            AUTO_CREATE_USER_SCHEMA_ANNOTATION.to_string(),
            "true".to_string(),
        )])),
        ..Default::default()
    };
    obj.data = json!({
        "spec": serde_json::to_value(spec)?
    });

    Ok(obj)
}
