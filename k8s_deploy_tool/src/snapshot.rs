use std::collections::{btree_map, BTreeMap};

use chrono::{DateTime, Utc};
use k8s_openapi::api::apps::v1::Deployment;
use k8s_util::{
    apis::DeploymentSource,
    deployment::{deployment_created_at, deployment_primary_image},
};
use serde::{Serialize, Serializer};

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeploymentRecord {
    pub name: String,
    /// Image of the first container in the pod template.
    pub image: String,
    /// Creation time of the deployment object.
    #[serde(serialize_with = "serialize_timestamp")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl DeploymentRecord {
    pub fn updated_display(&self) -> String {
        format_timestamp(self.updated_at.as_ref())
    }
}

pub fn format_timestamp(time: Option<&DateTime<Utc>>) -> String {
    match time {
        Some(time) => time.format(TIMESTAMP_FORMAT).to_string(),
        None => "-".to_owned(),
    }
}

fn serialize_timestamp<S: Serializer>(
    time: &Option<DateTime<Utc>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match time {
        Some(time) => serializer.collect_str(&time.format(TIMESTAMP_FORMAT)),
        None => serializer.serialize_none(),
    }
}

/// Deployments of one namespace at one point in time, keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct NamespaceSnapshot {
    records: BTreeMap<String, DeploymentRecord>,
}

impl NamespaceSnapshot {
    pub fn insert(&mut self, record: DeploymentRecord) {
        self.records.insert(record.name.clone(), record);
    }

    pub fn get(&self, name: &str) -> Option<&DeploymentRecord> {
        self.records.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.records.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(String::as_str)
    }

    pub fn iter(&self) -> btree_map::Values<'_, String, DeploymentRecord> {
        self.records.values()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl FromIterator<DeploymentRecord> for NamespaceSnapshot {
    fn from_iter<I: IntoIterator<Item = DeploymentRecord>>(iter: I) -> Self {
        let mut snapshot = NamespaceSnapshot::default();
        for record in iter {
            snapshot.insert(record);
        }
        snapshot
    }
}

impl<'a> IntoIterator for &'a NamespaceSnapshot {
    type Item = &'a DeploymentRecord;
    type IntoIter = btree_map::Values<'a, String, DeploymentRecord>;
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Returns `None` for deployments without a name or without a container image
/// in their pod template.
pub fn record_from_deployment(deployment: &Deployment) -> Option<DeploymentRecord> {
    let name = deployment.metadata.name.clone()?;
    let image = deployment_primary_image(deployment)?.to_owned();
    Some(DeploymentRecord {
        name,
        image,
        updated_at: deployment_created_at(deployment),
    })
}

/// Lists the deployments in `namespace` and builds a snapshot from them.
///
/// Deployments that have no container image are skipped with a warning.
pub async fn fetch_snapshot(
    source: &impl DeploymentSource,
    namespace: &str,
) -> anyhow::Result<NamespaceSnapshot> {
    let deployments = source.list_deployments(namespace).await?;

    let mut snapshot = NamespaceSnapshot::default();
    for deployment in &deployments {
        match record_from_deployment(deployment) {
            Some(record) => snapshot.insert(record),
            None => log::warn!(
                "skipping deployment {:?} in {}: pod template has no container image",
                deployment.metadata.name.as_deref().unwrap_or("<unnamed>"),
                namespace
            ),
        }
    }

    log::debug!(
        "built snapshot of {} deployments in {}",
        snapshot.len(),
        namespace
    );
    Ok(snapshot)
}

/// Like [`fetch_snapshot`], but a failed fetch yields an empty snapshot.
pub async fn build_snapshot(source: &impl DeploymentSource, namespace: &str) -> NamespaceSnapshot {
    match fetch_snapshot(source, namespace).await {
        Ok(snapshot) => snapshot,
        Err(err) => {
            log::warn!("unable to list deployments in {}: {:#}", namespace, err);
            NamespaceSnapshot::default()
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::HashMap;

    use anyhow::bail;
    use chrono::TimeZone;
    use k8s_openapi::{
        api::{
            apps::v1::DeploymentSpec,
            core::v1::{Container, PodSpec, PodTemplateSpec},
        },
        apimachinery::pkg::apis::meta::v1::{ObjectMeta, Time},
    };

    use super::*;

    pub fn record(name: &str, image: &str) -> DeploymentRecord {
        DeploymentRecord {
            name: name.into(),
            image: image.into(),
            updated_at: Some(Utc.with_ymd_and_hms(2024, 5, 17, 8, 0, 0).unwrap()),
        }
    }

    pub fn snapshot(records: &[(&str, &str)]) -> NamespaceSnapshot {
        records
            .iter()
            .map(|(name, image)| record(name, image))
            .collect()
    }

    fn deployment(name: &str, images: &[&str]) -> Deployment {
        Deployment {
            metadata: ObjectMeta {
                name: Some(name.into()),
                creation_timestamp: Some(Time(
                    Utc.with_ymd_and_hms(2024, 5, 17, 8, 0, 0).unwrap(),
                )),
                ..Default::default()
            },
            spec: Some(DeploymentSpec {
                template: PodTemplateSpec {
                    metadata: None,
                    spec: Some(PodSpec {
                        containers: images
                            .iter()
                            .enumerate()
                            .map(|(idx, image)| Container {
                                name: format!("c{}", idx),
                                image: Some(image.to_string()),
                                ..Default::default()
                            })
                            .collect(),
                        ..Default::default()
                    }),
                },
                ..Default::default()
            }),
            status: None,
        }
    }

    /// Namespaces missing from the map fail like a 404 would.
    #[derive(Default)]
    struct FakeCluster {
        namespaces: HashMap<String, Vec<Deployment>>,
    }

    impl DeploymentSource for FakeCluster {
        async fn list_deployments(&self, namespace: &str) -> anyhow::Result<Vec<Deployment>> {
            match self.namespaces.get(namespace) {
                Some(deployments) => Ok(deployments.clone()),
                None => bail!("namespaces \"{}\" not found", namespace),
            }
        }
    }

    #[test]
    fn record_takes_first_container_image() {
        let depl = deployment("web", &["nginx:1.25", "envoy:1.30"]);
        let record = record_from_deployment(&depl).unwrap();
        assert_eq!(record.name, "web");
        assert_eq!(record.image, "nginx:1.25");
        assert_eq!(record.updated_display(), "2024-05-17T08:00:00Z");
    }

    #[test]
    fn record_requires_a_container() {
        assert_eq!(record_from_deployment(&deployment("web", &[])), None);
    }

    #[test]
    fn missing_timestamp_displays_placeholder() {
        let mut depl = deployment("web", &["nginx"]);
        depl.metadata.creation_timestamp = None;
        let record = record_from_deployment(&depl).unwrap();
        assert_eq!(record.updated_display(), "-");
    }

    #[tokio::test]
    async fn builds_snapshot_keyed_by_name() {
        let cluster = FakeCluster {
            namespaces: maplit::hashmap! {
                "staging".to_owned() => vec![
                    deployment("web", &["nginx:1.25"]),
                    deployment("cache", &["redis:7"]),
                ],
            },
        };

        let snapshot = build_snapshot(&cluster, "staging").await;
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.get("cache").unwrap().image, "redis:7");
        assert_eq!(snapshot.names().collect::<Vec<_>>(), vec!["cache", "web"]);
    }

    #[tokio::test]
    async fn skips_deployments_without_containers() {
        let cluster = FakeCluster {
            namespaces: maplit::hashmap! {
                "staging".to_owned() => vec![
                    deployment("web", &["nginx:1.25"]),
                    deployment("broken", &[]),
                ],
            },
        };

        let snapshot = fetch_snapshot(&cluster, "staging").await.unwrap();
        assert!(snapshot.contains("web"));
        assert!(!snapshot.contains("broken"));
    }

    #[tokio::test]
    async fn failed_fetch_degrades_to_empty_snapshot() {
        let cluster = FakeCluster::default();

        assert!(fetch_snapshot(&cluster, "missing").await.is_err());
        assert!(build_snapshot(&cluster, "missing").await.is_empty());
    }

    #[tokio::test]
    async fn empty_namespace_is_empty_snapshot() {
        let cluster = FakeCluster {
            namespaces: maplit::hashmap! { "empty".to_owned() => vec![] },
        };
        assert!(fetch_snapshot(&cluster, "empty").await.unwrap().is_empty());
    }

    #[test]
    fn serializes_timestamps_in_display_format() {
        let json = serde_json::to_value(snapshot(&[("web", "nginx:1.25")])).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "web": {
                    "name": "web",
                    "image": "nginx:1.25",
                    "updated_at": "2024-05-17T08:00:00Z",
                }
            })
        );
    }
}
