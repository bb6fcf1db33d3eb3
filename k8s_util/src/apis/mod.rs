use anyhow::Context;
use k8s_openapi::api::apps::v1::Deployment;
use kube::{api::ListParams, Api, Client};
use log::debug;

/// Read access to the deployments of a namespace.
///
/// This is the only cluster operation the deployment tooling needs, split out
/// so it can be backed by something other than a live cluster.
#[allow(async_fn_in_trait)]
pub trait DeploymentSource {
    async fn list_deployments(&self, namespace: &str) -> anyhow::Result<Vec<Deployment>>;
}

/// Handle to a cluster. Namespaced API handles are built per call from a clone
/// of the client.
pub struct Cluster {
    pub client: Client,
}

impl Cluster {
    pub fn new(client: Client) -> Self {
        Cluster { client }
    }

    pub fn namespace(&self, ns: &str) -> Apis {
        Apis::namespaced(&self.client, ns)
    }
}

impl DeploymentSource for Cluster {
    async fn list_deployments(&self, namespace: &str) -> anyhow::Result<Vec<Deployment>> {
        self.namespace(namespace).list_deployments().await
    }
}

pub struct Apis {
    pub namespace: String,
    pub deployment: Api<Deployment>,
}

impl Apis {
    pub fn namespaced(client: &Client, namespace: &str) -> Self {
        Apis {
            namespace: namespace.to_string(),
            deployment: Api::namespaced(client.clone(), namespace),
        }
    }

    pub async fn list_deployments(&self) -> anyhow::Result<Vec<Deployment>> {
        let deployments = self
            .deployment
            .list(&ListParams::default())
            .await
            .with_context(|| format!("when listing deployments in {}", self.namespace))?;

        debug!(
            "Deployments found in '{}': {:?}",
            self.namespace,
            deployments
                .items
                .iter()
                .map(|v| &v.metadata.name)
                .collect::<Vec<_>>()
        );

        Ok(deployments.items)
    }
}
