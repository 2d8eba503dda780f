//! Best-effort removal of resources left behind by a deleted cluster
//!
//! The Crunchy operator garbage-collects most children through owner
//! references, but objects can linger when the PostgresCluster disappears
//! before its finalizer finishes. After a delete, each auxiliary collection
//! is listed and every object that belongs to the cluster is deleted.
//! Failures are logged and counted, never returned.

use kube::api::ObjectMeta;
use tracing::{info, warn};

use crate::controller::control_plane::{AuxiliaryKind, ControlPlane};
use crate::resources::common::CLUSTER_LABEL;

/// Outcome of one sweep
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Objects that belonged to the cluster
    pub matched: usize,
    /// Objects successfully deleted, with their kind
    pub deleted: Vec<(AuxiliaryKind, String)>,
    /// Deletions that failed
    pub failed: usize,
    /// Collections that could not be listed
    pub list_failures: usize,
}

/// Check if an object belongs to a cluster
///
/// The operator's cluster label is authoritative when present. Unlabelled
/// objects match on their name: either exactly the cluster name or the
/// cluster name followed by `-`, so `app` never claims `app2-ha`.
pub fn belongs_to_cluster(meta: &ObjectMeta, cluster_name: &str) -> bool {
    if let Some(owner) = meta.labels.as_ref().and_then(|l| l.get(CLUSTER_LABEL)) {
        return owner == cluster_name;
    }

    match meta.name.as_deref() {
        Some(name) => name
            .strip_prefix(cluster_name)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('-')),
        None => false,
    }
}

/// Delete every auxiliary object belonging to `cluster_name`
pub async fn sweep_cluster_leftovers<C: ControlPlane>(
    cp: &C,
    cluster_name: &str,
) -> SweepReport {
    let mut report = SweepReport::default();

    for kind in AuxiliaryKind::ALL {
        let items = match cp.list_auxiliary(kind).await {
            Ok(items) => items,
            Err(e) => {
                warn!(
                    cluster = %cluster_name,
                    kind = %kind,
                    error = %e,
                    "Failed to list leftovers"
                );
                report.list_failures += 1;
                continue;
            }
        };

        for meta in items
            .iter()
            .filter(|meta| belongs_to_cluster(meta, cluster_name))
        {
            let Some(name) = meta.name.as_deref() else {
                continue;
            };
            report.matched += 1;

            match cp.delete_auxiliary(kind, name).await {
                Ok(()) => {
                    info!(
                        cluster = %cluster_name,
                        kind = %kind,
                        name = %name,
                        "Deleted leftover"
                    );
                    report.deleted.push((kind, name.to_string()));
                }
                Err(e) => {
                    warn!(
                        cluster = %cluster_name,
                        kind = %kind,
                        name = %name,
                        error = %e,
                        "Failed to delete leftover"
                    );
                    report.failed += 1;
                }
            }
        }
    }

    report
}
