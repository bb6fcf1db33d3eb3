use std::fmt::Write as _;

use crate::{
    diff::DiffResult,
    scan::{ScanOutcome, INSTALL_HINT},
    snapshot::{DeploymentRecord, NamespaceSnapshot},
};

const NAME_WIDTH: usize = 15;
const IMAGE_WIDTH: usize = 70;
const RULE: &str = "--------------------------------------------";

fn join_or_none(names: &[String]) -> String {
    if names.is_empty() {
        "(none)".to_owned()
    } else {
        names.join(", ")
    }
}

fn side(out: &mut String, namespace: &str, record: &DeploymentRecord) {
    writeln!(
        out,
        "      {}: {}  (updated: {})",
        namespace,
        record.image,
        record.updated_display()
    )
    .unwrap();
}

pub fn render_snapshot(namespace: &str, snapshot: &NamespaceSnapshot) -> String {
    let mut out = String::new();
    writeln!(out, "\nNAMESPACE: {}", namespace).unwrap();
    writeln!(out, "{}", RULE).unwrap();

    if snapshot.is_empty() {
        out.push_str("(no deployments found)\n");
        return out;
    }

    for record in snapshot {
        writeln!(
            out,
            "{:name_w$} {:image_w$} {}",
            record.name,
            record.image,
            record.updated_display(),
            name_w = NAME_WIDTH,
            image_w = IMAGE_WIDTH,
        )
        .unwrap();
    }
    out
}

pub fn render_diff(left_ns: &str, right_ns: &str, diff: &DiffResult) -> String {
    let mut out = String::new();
    writeln!(out, "\nComparing {} vs {}\n", left_ns, right_ns).unwrap();

    writeln!(
        out,
        "Deployments only in {}: {}",
        left_ns,
        join_or_none(&diff.only_in_left)
    )
    .unwrap();
    writeln!(
        out,
        "Deployments only in {}: {}\n",
        right_ns,
        join_or_none(&diff.only_in_right)
    )
    .unwrap();

    out.push_str("Deployments with different images:\n");
    if diff.images_differ.is_empty() {
        out.push_str("  - (none)\n");
    }
    for drift in &diff.images_differ {
        writeln!(out, "  - {}", drift.name).unwrap();
        side(&mut out, left_ns, &drift.left);
        side(&mut out, right_ns, &drift.right);
    }

    out.push_str("\nDeployments identical in both namespaces:\n");
    if diff.images_match.is_empty() {
        out.push_str("  - (none)\n");
    }
    for name in &diff.images_match {
        writeln!(out, "  - {}", name).unwrap();
    }
    out
}

pub fn render_scan_start(namespace: &str) -> String {
    format!("\nRunning Trivy scan for namespace: {}\n", namespace)
}

/// One line telling the user how the scan went. `binary` is only used to
/// name a scanner that could not be found.
pub fn render_scan_outcome(binary: &str, outcome: &ScanOutcome) -> String {
    match outcome {
        ScanOutcome::Success => "Trivy scan finished.".to_owned(),
        ScanOutcome::NotInstalled => {
            format!("{} not found. Install with: {}", binary, INSTALL_HINT)
        }
        ScanOutcome::Failed(detail) => format!("Trivy scan failed: {}", detail),
    }
}
