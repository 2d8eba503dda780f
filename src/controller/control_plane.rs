//! Access to the Kubernetes control plane
//!
//! [`ControlPlane`] is the seam between the lifecycle operations and the API
//! server. [`KubeControlPlane`] is the real implementation; tests substitute
//! an in-memory fake.

use std::fmt;
use std::future::Future;

use k8s_openapi::NamespaceResourceScope;
use k8s_openapi::api::apps::v1::StatefulSet;
use k8s_openapi::api::batch::v1::Job;
use k8s_openapi::api::core::v1::{PersistentVolumeClaim, Pod, Secret, Service};
use kube::api::{Api, DeleteParams, DynamicObject, ListParams, ObjectMeta, PostParams};
use kube::{Client, Resource};
use serde::de::DeserializeOwned;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use crate::crd::postgres_cluster_resource;

/// Collections scanned for leftovers after a cluster is deleted
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AuxiliaryKind {
    Service,
    StatefulSet,
    Job,
    Pod,
    PersistentVolumeClaim,
}

impl AuxiliaryKind {
    /// Sweep order
    pub const ALL: [AuxiliaryKind; 5] = [
        AuxiliaryKind::Service,
        AuxiliaryKind::StatefulSet,
        AuxiliaryKind::Job,
        AuxiliaryKind::Pod,
        AuxiliaryKind::PersistentVolumeClaim,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AuxiliaryKind::Service => "Service",
            AuxiliaryKind::StatefulSet => "StatefulSet",
            AuxiliaryKind::Job => "Job",
            AuxiliaryKind::Pod => "Pod",
            AuxiliaryKind::PersistentVolumeClaim => "PersistentVolumeClaim",
        }
    }
}

impl fmt::Display for AuxiliaryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Namespaced reads and writes used by the lifecycle operations
pub trait ControlPlane: Send + Sync + 'static {
    /// Submit a new PostgresCluster
    fn create_cluster(
        &self,
        cluster: &DynamicObject,
    ) -> impl Future<Output = Result<(), kube::Error>> + Send;

    fn get_cluster(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<DynamicObject, kube::Error>> + Send;

    fn delete_cluster(&self, name: &str) -> impl Future<Output = Result<(), kube::Error>> + Send;

    /// All PostgresClusters in enumeration order
    fn list_clusters(
        &self,
    ) -> impl Future<Output = Result<Vec<DynamicObject>, kube::Error>> + Send;

    fn get_service(&self, name: &str) -> impl Future<Output = Result<Service, kube::Error>> + Send;

    fn get_secret(&self, name: &str) -> impl Future<Output = Result<Secret, kube::Error>> + Send;

    /// Replace a secret with the given object
    fn replace_secret(
        &self,
        secret: &Secret,
    ) -> impl Future<Output = Result<(), kube::Error>> + Send;

    /// Metadata of every object of an auxiliary kind
    fn list_auxiliary(
        &self,
        kind: AuxiliaryKind,
    ) -> impl Future<Output = Result<Vec<ObjectMeta>, kube::Error>> + Send;

    fn delete_auxiliary(
        &self,
        kind: AuxiliaryKind,
        name: &str,
    ) -> impl Future<Output = Result<(), kube::Error>> + Send;
}

/// [`ControlPlane`] backed by the Kubernetes API server
///
/// The client is created on first use from the ambient configuration
/// (in-cluster service account or kubeconfig) and cached. A failure to build
/// it is returned from the operation that triggered it, so the HTTP server
/// starts and answers probes without credentials.
pub struct KubeControlPlane {
    client: OnceCell<Client>,
    namespace: String,
}

impl KubeControlPlane {
    /// Lazily connect using the default client configuration
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            client: OnceCell::new(),
            namespace: namespace.into(),
        }
    }

    /// Use an already constructed client
    pub fn with_client(client: Client, namespace: impl Into<String>) -> Self {
        Self {
            client: OnceCell::new_with(Some(client)),
            namespace: namespace.into(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    async fn client(&self) -> Result<Client, kube::Error> {
        self.client
            .get_or_try_init(|| async {
                let client = Client::try_default().await?;
                info!(namespace = %self.namespace(), "Connected to Kubernetes cluster");
                Ok::<_, kube::Error>(client)
            })
            .await
            .cloned()
    }

    async fn clusters(&self) -> Result<Api<DynamicObject>, kube::Error> {
        Ok(Api::namespaced_with(
            self.client().await?,
            &self.namespace,
            &postgres_cluster_resource(),
        ))
    }

    async fn api<K>(&self) -> Result<Api<K>, kube::Error>
    where
        K: Resource<Scope = NamespaceResourceScope>,
        <K as Resource>::DynamicType: Default,
    {
        Ok(Api::namespaced(self.client().await?, &self.namespace))
    }

    async fn list_meta<K>(&self) -> Result<Vec<ObjectMeta>, kube::Error>
    where
        K: Resource<Scope = NamespaceResourceScope>
            + Clone
            + DeserializeOwned
            + fmt::Debug,
        <K as Resource>::DynamicType: Default,
    {
        let api: Api<K> = self.api().await?;
        let list = api.list_metadata(&ListParams::default()).await?;
        Ok(list.items.into_iter().map(|item| item.metadata).collect())
    }

    async fn delete_named<K>(&self, name: &str) -> Result<(), kube::Error>
    where
        K: Resource<Scope = NamespaceResourceScope>
            + Clone
            + DeserializeOwned
            + fmt::Debug,
        <K as Resource>::DynamicType: Default,
    {
        let api: Api<K> = self.api().await?;
        api.delete(name, &DeleteParams::background()).await?;
        Ok(())
    }
}

impl ControlPlane for KubeControlPlane {
    async fn create_cluster(&self, cluster: &DynamicObject) -> Result<(), kube::Error> {
        let api = self.clusters().await?;
        api.create(&PostParams::default(), cluster).await?;
        Ok(())
    }

    async fn get_cluster(&self, name: &str) -> Result<DynamicObject, kube::Error> {
        self.clusters().await?.get(name).await
    }

    async fn delete_cluster(&self, name: &str) -> Result<(), kube::Error> {
        let api = self.clusters().await?;
        api.delete(name, &DeleteParams::default()).await?;
        Ok(())
    }

    async fn list_clusters(&self) -> Result<Vec<DynamicObject>, kube::Error> {
        let api = self.clusters().await?;
        Ok(api.list(&ListParams::default()).await?.items)
    }

    async fn get_service(&self, name: &str) -> Result<Service, kube::Error> {
        self.api::<Service>().await?.get(name).await
    }

    async fn get_secret(&self, name: &str) -> Result<Secret, kube::Error> {
        self.api::<Secret>().await?.get(name).await
    }

    async fn replace_secret(&self, secret: &Secret) -> Result<(), kube::Error> {
        let name = secret.metadata.name.clone().unwrap_or_default();
        let api = self.api::<Secret>().await?;
        api.replace(&name, &PostParams::default(), secret).await?;
        debug!(secret = %name, "Replaced secret");
        Ok(())
    }

    async fn list_auxiliary(&self, kind: AuxiliaryKind) -> Result<Vec<ObjectMeta>, kube::Error> {
        match kind {
            AuxiliaryKind::Service => self.list_meta::<Service>().await,
            AuxiliaryKind::StatefulSet => self.list_meta::<StatefulSet>().await,
            AuxiliaryKind::Job => self.list_meta::<Job>().await,
            AuxiliaryKind::Pod => self.list_meta::<Pod>().await,
            AuxiliaryKind::PersistentVolumeClaim => {
                self.list_meta::<PersistentVolumeClaim>().await
            }
        }
    }

    async fn delete_auxiliary(&self, kind: AuxiliaryKind, name: &str) -> Result<(), kube::Error> {
        match kind {
            AuxiliaryKind::Service => self.delete_named::<Service>(name).await,
            AuxiliaryKind::StatefulSet => self.delete_named::<StatefulSet>(name).await,
            AuxiliaryKind::Job => self.delete_named::<Job>(name).await,
            AuxiliaryKind::Pod => self.delete_named::<Pod>(name).await,
            AuxiliaryKind::PersistentVolumeClaim => {
                self.delete_named::<PersistentVolumeClaim>(name).await
            }
        }
    }
}
