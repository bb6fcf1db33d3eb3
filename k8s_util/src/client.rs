use std::path::Path;

use anyhow::Context;
use kube::{
    config::{KubeConfigOptions, Kubeconfig},
    Client, Config,
};

fn read_kubeconfig(kubeconfig_path: Option<&Path>) -> anyhow::Result<Kubeconfig> {
    match kubeconfig_path {
        Some(path) => Kubeconfig::read_from(path)
            .with_context(|| format!("when reading kubeconfig at {}", path.display())),
        None => Kubeconfig::read().context("when reading default kubeconfig"),
    }
}

/// Builds a client for the cluster.
///
/// With neither a kubeconfig path nor a context the config is inferred the
/// same way `kubectl` does it (`KUBECONFIG`, `~/.kube/config`, then in-cluster).
pub async fn create_client(
    kubeconfig_path: Option<&Path>,
    context: Option<&str>,
) -> anyhow::Result<Client> {
    let options = KubeConfigOptions {
        context: context.map(str::to_owned),
        ..Default::default()
    };

    let config = match (kubeconfig_path, context) {
        (None, None) => Config::infer()
            .await
            .context("when inferring cluster config")?,
        (path, _) => {
            let kubeconfig = read_kubeconfig(path)?;
            Config::from_custom_kubeconfig(kubeconfig, &options)
                .await
                .with_context(|| match context {
                    Some(ctx) => format!("when loading kubeconfig context `{}`", ctx),
                    None => "when loading current kubeconfig context".to_owned(),
                })?
        }
    };

    log::debug!("using cluster at {}", config.cluster_url);

    Client::try_from(config).context("attempting to get client")
}

/// Names of all contexts in the kubeconfig, in file order.
pub fn list_contexts(kubeconfig_path: Option<&Path>) -> anyhow::Result<Vec<String>> {
    let kubeconfig = read_kubeconfig(kubeconfig_path)?;
    Ok(kubeconfig
        .contexts
        .into_iter()
        .map(|named| named.name)
        .collect())
}
