use std::{ffi::OsString, io, process::Stdio};

use tokio::process::Command;

pub const DEFAULT_SCANNER: &str = "trivy";
pub const INSTALL_HINT: &str = "sudo apt install trivy -y";

#[derive(clap::ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ReportMode {
    #[default]
    Summary,
    All,
}

impl ReportMode {
    fn as_arg(self) -> &'static str {
        match self {
            ReportMode::Summary => "summary",
            ReportMode::All => "all",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScannerConfig {
    pub binary: OsString,
    pub report: ReportMode,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            binary: DEFAULT_SCANNER.into(),
            report: ReportMode::default(),
        }
    }
}

impl ScannerConfig {
    pub fn args(&self, namespace: &str) -> Vec<String> {
        vec![
            "k8s".to_owned(),
            "--include-namespaces".to_owned(),
            namespace.to_owned(),
            "--report".to_owned(),
            self.report.as_arg().to_owned(),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    Success,
    NotInstalled,
    Failed(String),
}

/// Runs the scanner against a namespace. Its output goes straight to the
/// terminal, only the exit status is looked at.
pub async fn run_scan(config: &ScannerConfig, namespace: &str) -> ScanOutcome {
    let args = config.args(namespace);
    log::debug!("running {:?} {:?}", config.binary, args);

    let status = Command::new(&config.binary)
        .args(&args)
        .stdin(Stdio::null())
        .status()
        .await;

    match status {
        Ok(status) if status.success() => ScanOutcome::Success,
        Ok(status) => ScanOutcome::Failed(format!(
            "{} exited with {}",
            config.binary.to_string_lossy(),
            status
        )),
        Err(err) if err.kind() == io::ErrorKind::NotFound => ScanOutcome::NotInstalled,
        Err(err) => ScanOutcome::Failed(format!(
            "could not run {}: {}",
            config.binary.to_string_lossy(),
            err
        )),
    }
}
