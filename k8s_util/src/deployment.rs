use chrono::{DateTime, Utc};
use k8s_openapi::api::{apps::v1::Deployment, core::v1::PodSpec};

pub fn deployment_get_pod_spec(deployment: &Deployment) -> Option<&PodSpec> {
    deployment.spec.as_ref()?.template.spec.as_ref()
}

/// Image of the first container in the pod spec, if there is one.
pub fn pod_spec_primary_image(pod_spec: &PodSpec) -> Option<&str> {
    pod_spec.containers.first()?.image.as_deref()
}

pub fn deployment_primary_image(deployment: &Deployment) -> Option<&str> {
    deployment_get_pod_spec(deployment).and_then(pod_spec_primary_image)
}

/// Creation time of the object. This is not bumped by rollouts.
pub fn deployment_created_at(deployment: &Deployment) -> Option<DateTime<Utc>> {
    deployment
        .metadata
        .creation_timestamp
        .as_ref()
        .map(|time| time.0)
}
