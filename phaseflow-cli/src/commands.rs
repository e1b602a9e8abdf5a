//! Subcommand implementations.

use anyhow::Context;
use clap::Args;
use phaseflow::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use uuid::Uuid;

/// Arguments for `phaseflow run`.
#[derive(Args)]
pub struct RunArgs {
    /// First gene symbol
    #[arg(long, default_value = "TP53")]
    entity_a: String,

    /// Second gene symbol
    #[arg(long, default_value = "TYMS")]
    entity_b: String,

    /// Drug target name
    #[arg(long, default_value = "thymidylate synthase")]
    target_name: String,

    /// Disease condition for trial search
    #[arg(long, default_value = "cancer")]
    condition: String,

    /// Gateway program, spawned once per step call
    #[arg(long, env = "PHASEFLOW_GATEWAY_CMD")]
    gateway_cmd: String,

    /// Argument passed to the gateway program (repeatable)
    #[arg(long = "gateway-arg", allow_hyphen_values = true)]
    gateway_args: Vec<String>,

    /// Working directory for the gateway
    #[arg(long, env = "PHASEFLOW_GATEWAY_CWD")]
    gateway_cwd: Option<PathBuf>,

    /// JSON configuration file (timeouts, retry policies, validate settings)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Attempt journal file; enables resume after a crash
    #[arg(long)]
    journal: Option<PathBuf>,

    /// Run id to resume (requires --journal to replay anything)
    #[arg(long)]
    run_id: Option<Uuid>,
}

fn load_config(path: Option<&Path>) -> anyhow::Result<OrchestratorConfig> {
    match path {
        Some(path) => OrchestratorConfig::from_path(path)
            .with_context(|| format!("loading config from {}", path.display())),
        None => Ok(OrchestratorConfig::default()),
    }
}

/// Runs the pipeline and prints the result document on stdout.
pub async fn run(args: RunArgs) -> anyhow::Result<()> {
    let config = load_config(args.config.as_deref())?;

    let mut gateway = GatewayConfig::new(args.gateway_cmd);
    gateway.args = args.gateway_args;
    gateway.cwd = args.gateway_cwd;

    let journal: Arc<dyn AttemptJournal> = match &args.journal {
        Some(path) => Arc::new(
            FileJournal::open(path)
                .with_context(|| format!("opening journal {}", path.display()))?,
        ),
        None => Arc::new(InMemoryJournal::new()),
    };
    if args.run_id.is_some() && args.journal.is_none() {
        tracing::warn!("--run-id without --journal has nothing to resume from");
    }

    let mut builder = PhaseCoordinator::builder()
        .executor(Arc::new(GatewayExecutor::new(gateway)))
        .config(config)
        .journal(journal)
        .event_sink(Arc::new(LoggingEventSink::info()));
    if let Some(run_id) = args.run_id {
        builder = builder.run_id(RunId::from_uuid(run_id));
    }
    let coordinator = builder.build()?;
    tracing::info!(run_id = %coordinator.run_id(), "Starting run");

    let input = PipelineInput::new(args.entity_a, args.entity_b, args.target_name, args.condition);
    match coordinator.run(&input).await {
        Ok(result) => {
            println!("{}", result.to_json()?);
            Ok(())
        }
        Err(PhaseflowError::AnchorFailed(failure)) => {
            println!("{}", failure.snapshot.to_json()?);
            Err(failure.into())
        }
        Err(e) => Err(e.into()),
    }
}

fn millis(duration: std::time::Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Prints the effective configuration and the backoff schedule it implies.
pub fn policy(config: Option<&Path>) -> anyhow::Result<()> {
    let config = load_config(config)?;

    let schedule: serde_json::Map<String, serde_json::Value> = StepCategory::ALL
        .into_iter()
        .map(|category| {
            let retry = &config.timeouts.lookup(category).retry;
            let delays: Vec<u64> = retry.delays().map(millis).collect();
            (
                category.to_string(),
                serde_json::json!({
                    "backoff_ms": delays,
                    "total_backoff_ms": millis(retry.total_backoff()),
                }),
            )
        })
        .collect();

    let document = serde_json::json!({
        "config": config,
        "schedule": schedule,
    });
    println!("{}", serde_json::to_string_pretty(&document)?);
    Ok(())
}
