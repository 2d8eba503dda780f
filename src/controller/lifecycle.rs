//! Cluster lifecycle operations
//!
//! Each operation is a short linear sequence: one write or read against the
//! PostgresCluster, then polls for the side effects the Crunchy operator
//! produces asynchronously.
//!
//! - create: submit, discover the node port (best-effort), wait for the user
//!   secret (required), then set or read the password.
//! - get: read the resource leniently, discover the node port (best-effort).
//! - delete: delete the resource, wait for it to disappear (best-effort),
//!   then sweep leftovers.
//! - list: enumerate resource names.
//!
//! A failed credential wait after a successful submit leaves the
//! PostgresCluster in place; no rollback is attempted.

use k8s_openapi::api::core::v1::Secret;
use kube::ResourceExt;
use tracing::{debug, info, warn};

use crate::controller::cleanup::{SweepReport, sweep_cluster_leftovers};
use crate::controller::context::Context;
use crate::controller::control_plane::ControlPlane;
use crate::controller::error::{Error, Result, is_not_found};
use crate::controller::poll::{PollPolicy, poll_until};
use crate::controller::types::{ClusterRequest, ClusterResponse};
use crate::controller::validation::validate_request;
use crate::crd::ObservedCluster;
use crate::resources::common::{exposed_service_names, user_secret_name};
use crate::resources::postgres_cluster::generate_postgres_cluster;
use crate::resources::secret::{read_password, with_password};
use crate::resources::service::allocated_node_port;

/// Error labels shown to callers
pub const CREATE_CONTEXT: &str = "k8s create error";
pub const GET_CONTEXT: &str = "k8s get error";
pub const DELETE_CONTEXT: &str = "delete error";
pub const LIST_CONTEXT: &str = "list error";
pub const UPDATE_SECRET_CONTEXT: &str = "failed to update user password secret";

/// Provision a new cluster
pub async fn create_cluster<C: ControlPlane>(
    ctx: &Context<C>,
    req: ClusterRequest,
) -> Result<ClusterResponse> {
    validate_request(&req, ctx.manage_credentials)?;

    let cluster = generate_postgres_cluster(&req)?;

    info!(cluster = %req.name, "Creating PostgresCluster");
    ctx.control_plane
        .create_cluster(&cluster)
        .await
        .map_err(Error::kube(CREATE_CONTEXT))?;
    info!(cluster = %req.name, "PostgresCluster created");

    let node_port = discover_node_port(ctx, &req.name, &ctx.poll.create_node_port).await?;

    let secret_name = user_secret_name(&req.name, &req.user);
    let secret = wait_for_user_secret(ctx, &secret_name).await?;

    let password = if ctx.manage_credentials {
        let password = req.password.clone().unwrap_or_default();
        ctx.control_plane
            .replace_secret(&with_password(secret, &password))
            .await
            .map_err(Error::kube(UPDATE_SECRET_CONTEXT))?;
        info!(cluster = %req.name, secret = %secret_name, "Updated secret with new password");
        password
    } else {
        read_password(&secret).unwrap_or_else(|| {
            warn!(secret = %secret_name, "User secret has no password");
            String::new()
        })
    };

    Ok(ClusterResponse {
        cluster_name: req.name,
        user: req.user,
        databases: req.databases,
        storage: req.storage,
        password: Some(password),
        node_port: node_port.unwrap_or(0),
    })
}

/// Describe an existing cluster
///
/// The credential is never read or returned.
pub async fn get_cluster<C: ControlPlane>(ctx: &Context<C>, name: &str) -> Result<ClusterResponse> {
    if name.is_empty() {
        return Err(Error::MissingName);
    }

    let obj = ctx.control_plane.get_cluster(name).await.map_err(|e| {
        if is_not_found(&e) {
            Error::NotFound(e)
        } else {
            Error::kube(GET_CONTEXT)(e)
        }
    })?;
    let observed = ObservedCluster::from_object(&obj);

    let node_port = discover_node_port(ctx, name, &ctx.poll.get_node_port).await?;

    Ok(ClusterResponse {
        cluster_name: name.to_string(),
        user: observed.user,
        databases: observed.databases,
        storage: observed.storage,
        password: None,
        node_port: node_port.unwrap_or(0),
    })
}

/// Tear down a cluster and sweep its leftovers
///
/// If the resource is already gone the sweep still runs before the delete
/// error is returned. Any other delete failure returns immediately.
pub async fn delete_cluster<C: ControlPlane>(ctx: &Context<C>, name: &str) -> Result<SweepReport> {
    if name.is_empty() {
        return Err(Error::MissingName);
    }

    info!(cluster = %name, "Deleting PostgresCluster");
    if let Err(e) = ctx.control_plane.delete_cluster(name).await {
        if !is_not_found(&e) {
            return Err(Error::kube(DELETE_CONTEXT)(e));
        }
        warn!(cluster = %name, "PostgresCluster already absent, sweeping leftovers");
        sweep(ctx, name).await;
        return Err(Error::kube(DELETE_CONTEXT)(e));
    }

    if wait_for_deletion(ctx, name).await?.is_none() {
        warn!(cluster = %name, "PostgresCluster still present, sweeping leftovers anyway");
    }

    Ok(sweep(ctx, name).await)
}

/// Names of all clusters in control-plane enumeration order
pub async fn list_clusters<C: ControlPlane>(ctx: &Context<C>) -> Result<Vec<String>> {
    let clusters = ctx
        .control_plane
        .list_clusters()
        .await
        .map_err(Error::kube(LIST_CONTEXT))?;

    Ok(clusters.iter().map(|c| c.name_any()).collect())
}

/// Poll the cluster's services for an allocated node port
async fn discover_node_port<C: ControlPlane>(
    ctx: &Context<C>,
    cluster_name: &str,
    policy: &PollPolicy,
) -> Result<Option<i32>> {
    let cp = &ctx.control_plane;
    let services = exposed_service_names(cluster_name);
    let services = &services;

    let node_port = poll_until(policy, cluster_name, move || async move {
        for service in services {
            match cp.get_service(service).await {
                Ok(svc) => {
                    if let Some(port) = allocated_node_port(&svc) {
                        return Some(port);
                    }
                }
                Err(e) => debug!(service = %service, error = %e, "Service not readable"),
            }
        }
        None
    })
    .await?;

    match node_port {
        Some(port) => info!(cluster = %cluster_name, node_port = port, "Node port discovered"),
        None => ctx.record_poll_exhausted(policy),
    }

    Ok(node_port)
}

/// Wait for the operator to generate the user secret
async fn wait_for_user_secret<C: ControlPlane>(ctx: &Context<C>, secret_name: &str) -> Result<Secret> {
    let cp = &ctx.control_plane;
    let policy = &ctx.poll.user_secret;

    let secret = poll_until(policy, secret_name, move || async move {
        match cp.get_secret(secret_name).await {
            Ok(secret) => Some(secret),
            Err(e) => {
                debug!(secret = %secret_name, error = %e, "Secret not readable");
                None
            }
        }
    })
    .await
    .inspect_err(|_| ctx.record_poll_exhausted(policy))?;

    secret.ok_or(Error::RequiredConditionTimeout {
        condition: policy.condition,
        attempts: policy.max_attempts,
    })
}

/// Wait for the PostgresCluster read to return 404
///
/// Returns `Ok(None)` if the resource is still present after the budget.
async fn wait_for_deletion<C: ControlPlane>(ctx: &Context<C>, name: &str) -> Result<Option<()>> {
    let cp = &ctx.control_plane;
    let policy = &ctx.poll.deletion;

    let gone = poll_until(policy, name, move || async move {
        match cp.get_cluster(name).await {
            Err(e) if is_not_found(&e) => Some(()),
            Ok(_) => None,
            Err(e) => {
                debug!(cluster = %name, error = %e, "Deletion check failed");
                None
            }
        }
    })
    .await?;

    if gone.is_none() {
        ctx.record_poll_exhausted(policy);
    }

    Ok(gone)
}

async fn sweep<C: ControlPlane>(ctx: &Context<C>, name: &str) -> SweepReport {
    let report = sweep_cluster_leftovers(&ctx.control_plane, name).await;

    for (kind, _) in &report.deleted {
        ctx.record_sweep_deleted(kind.as_str());
    }

    info!(
        cluster = %name,
        matched = report.matched,
        deleted = report.deleted.len(),
        failed = report.failed,
        list_failures = report.list_failures,
        "Leftover sweep finished"
    );

    report
}
