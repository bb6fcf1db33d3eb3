use std::path::Path;

use kube::Client;

pub mod apis;
pub mod client;
pub mod deployment;

pub async fn create_client(
    kubeconfig_path: Option<&Path>,
    k8s_context: Option<&str>,
) -> anyhow::Result<Client> {
    let client = client::create_client(kubeconfig_path, k8s_context).await?;
    log::info!("created client, default namespace {}", client.default_namespace());
    Ok(client)
}
