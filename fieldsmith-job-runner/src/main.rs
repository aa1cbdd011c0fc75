use clap::Parser;
use color_eyre::eyre;
use fieldsmith_config::Configuration;
use fieldsmith_core::{consts::VERSION, traits::NoGeneration};
use fieldsmith_db::Db;
use fieldsmith_job_runner::dry_run::DryRunDriver;
use fieldsmith_jobs::JobRunnerContext;
use fieldsmith_service::{
    automation::AutomationService, dispatch::DispatchHandle, execution_log::ExecutionLogService,
    queue::TenantQueue, relay::TwoFactorRelay,
};
use std::{path::PathBuf, sync::Arc};
use tracing_subscriber::EnvFilter;

/// Standalone provisioning job runner
#[derive(Parser)]
#[command(about, author, version = VERSION)]
struct Args {
    /// Path to the configuration
    #[arg(long, short)]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let config = Configuration::load(args.config).await?;

    let db = Db::default();
    let (dispatch, requests) = DispatchHandle::channel();

    let relay = TwoFactorRelay::builder().db(db.clone()).build();
    let logs = ExecutionLogService::builder().db(db.clone()).build();
    let automation = AutomationService::builder()
        .db(db.clone())
        .queue(TenantQueue::default())
        .relay(relay.clone())
        .dispatch(dispatch)
        .text_generator(NoGeneration)
        .build();

    let ctx = Arc::new(JobRunnerContext {
        db,
        relay,
        logs,
        driver: DryRunDriver,
        config,
    });

    fieldsmith_job_runner::run_dispatcher(ctx, automation, requests).await;

    Ok(())
}
