use std::{
    ffi::OsString,
    path::{Path, PathBuf},
    process::ExitCode,
};

use anyhow::Context;
use clap::Parser;
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colored::Colorize;
use k8s_util::apis::Cluster;
use serde::Serialize;

mod diff;
mod render;
mod scan;
mod snapshot;

use scan::{ReportMode, ScanOutcome, ScannerConfig};

/// Inspect deployments and compare them across namespaces.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(flatten)]
    verbose: Verbosity<WarnLevel>,
    /// Kubeconfig context to use instead of the current one
    #[arg(short, long, global = true)]
    context: Option<String>,
    /// Path to a kubeconfig file
    #[arg(long, global = true)]
    kubeconfig: Option<PathBuf>,
    #[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Table)]
    output: OutputFormat,
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// List deployments in a namespace with their image and creation time
    Show { namespace: String },
    /// Compare the deployments of two namespaces for image drift
    Diff { ns1: String, ns2: String },
    /// Run a Trivy security scan against a namespace
    Scan {
        namespace: String,
        /// Scanner binary to invoke
        #[arg(long, env = "K8S_DEPLOY_TOOL_SCANNER", default_value = scan::DEFAULT_SCANNER)]
        scanner: OsString,
        #[arg(long, value_enum, default_value_t = ReportMode::Summary)]
        report: ReportMode,
    },
    /// List the contexts in the kubeconfig
    Contexts,
}

fn parse_args() -> Result<Args, ExitCode> {
    match Args::try_parse() {
        Ok(args) => Ok(args),
        // --help and --version
        Err(err) if !err.use_stderr() => {
            let _ = err.print();
            Err(ExitCode::SUCCESS)
        }
        Err(err) => {
            let _ = err.print();
            Err(ExitCode::FAILURE)
        }
    }
}

async fn connect(kubeconfig: Option<&Path>, context: Option<&str>) -> anyhow::Result<Cluster> {
    let client = k8s_util::create_client(kubeconfig, context)
        .await
        .context("failed to load kube config")?;
    Ok(Cluster::new(client))
}

/// Reports a failed connection on one line, the caller exits with failure.
async fn connect_or_report(kubeconfig: Option<&Path>, context: Option<&str>) -> Option<Cluster> {
    match connect(kubeconfig, context).await {
        Ok(cluster) => Some(cluster),
        Err(err) => {
            eprintln!("{}", format!("{:#}", err).red());
            None
        }
    }
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value).context("when serializing output")?;
    println!("{}", json);
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<ExitCode> {
    let args = match parse_args() {
        Ok(args) => args,
        Err(code) => return Ok(code),
    };
    env_logger::Builder::new()
        .filter_level(args.verbose.log_level_filter())
        .init();

    let kubeconfig = args.kubeconfig.as_deref();
    let context = args.context.as_deref();

    match args.command {
        Commands::Show { namespace } => {
            let Some(cluster) = connect_or_report(kubeconfig, context).await else {
                return Ok(ExitCode::FAILURE);
            };
            let snapshot = snapshot::build_snapshot(&cluster, &namespace).await;
            match args.output {
                OutputFormat::Table => {
                    print!("{}", render::render_snapshot(&namespace, &snapshot))
                }
                OutputFormat::Json => print_json(&snapshot)?,
            }
        }
        Commands::Diff { ns1, ns2 } => {
            let Some(cluster) = connect_or_report(kubeconfig, context).await else {
                return Ok(ExitCode::FAILURE);
            };
            let left = snapshot::build_snapshot(&cluster, &ns1).await;
            let right = snapshot::build_snapshot(&cluster, &ns2).await;
            let diff = diff::compute_diff(&left, &right);
            log::debug!(
                "{} deployments in both {} and {}",
                diff.shared().count(),
                ns1,
                ns2
            );
            if !diff.has_differences() {
                log::info!("no differences between {} and {}", ns1, ns2);
            }
            match args.output {
                OutputFormat::Table => print!("{}", render::render_diff(&ns1, &ns2, &diff)),
                OutputFormat::Json => print_json(&diff)?,
            }
        }
        Commands::Scan {
            namespace,
            scanner,
            report,
        } => {
            // trivy reads the same kubeconfig, so surface config errors first
            if connect_or_report(kubeconfig, context).await.is_none() {
                return Ok(ExitCode::FAILURE);
            }
            let config = ScannerConfig {
                binary: scanner,
                report,
            };
            println!("{}", render::render_scan_start(&namespace).blue());
            let outcome = scan::run_scan(&config, &namespace).await;
            let message =
                render::render_scan_outcome(&config.binary.to_string_lossy(), &outcome);
            match outcome {
                ScanOutcome::Success => println!("{}", message.green()),
                ScanOutcome::NotInstalled => println!("{}", message.yellow()),
                ScanOutcome::Failed(_) => println!("{}", message.red()),
            }
        }
        Commands::Contexts => {
            for context in k8s_util::client::list_contexts(kubeconfig)? {
                println!("{}", context);
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}
