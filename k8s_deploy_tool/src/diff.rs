use serde::Serialize;

use crate::snapshot::{DeploymentRecord, NamespaceSnapshot};

/// A deployment present on both sides whose image reference differs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageDrift {
    pub name: String,
    pub left: DeploymentRecord,
    pub right: DeploymentRecord,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DiffResult {
    pub only_in_left: Vec<String>,
    pub only_in_right: Vec<String>,
    pub images_differ: Vec<ImageDrift>,
    pub images_match: Vec<String>,
}

impl DiffResult {
    /// Names present on both sides.
    pub fn shared(&self) -> impl Iterator<Item = &str> {
        self.images_differ
            .iter()
            .map(|drift| drift.name.as_str())
            .chain(self.images_match.iter().map(String::as_str))
    }

    /// True when a deployment is missing on either side or its image drifted.
    pub fn has_differences(&self) -> bool {
        !(self.only_in_left.is_empty()
            && self.only_in_right.is_empty()
            && self.images_differ.is_empty())
    }
}

/// Compares two snapshots by deployment name, then by exact image string.
pub fn compute_diff(left: &NamespaceSnapshot, right: &NamespaceSnapshot) -> DiffResult {
    let mut result = DiffResult::default();

    for left_record in left {
        match right.get(&left_record.name) {
            None => result.only_in_left.push(left_record.name.clone()),
            Some(right_record) if right_record.image != left_record.image => {
                result.images_differ.push(ImageDrift {
                    name: left_record.name.clone(),
                    left: left_record.clone(),
                    right: right_record.clone(),
                })
            }
            Some(_) => result.images_match.push(left_record.name.clone()),
        }
    }

    result.only_in_right = right
        .names()
        .filter(|name| !left.contains(name))
        .map(str::to_owned)
        .collect();

    result
}
