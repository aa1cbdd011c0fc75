#[macro_use]
extern crate tracing;

use fieldsmith_core::traits::{RemoteDriver, TextGenerator};
use fieldsmith_jobs::{Job, JobRunnerContext, ProvisionSubaccount};
use fieldsmith_service::{automation::AutomationService, dispatch::DispatchRequest};
use std::{sync::Arc, time::Duration};
use tokio::sync::mpsc;
use tokio_util::task::TaskTracker;

pub mod dry_run;

const RETENTION_SWEEP_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Receive start requests and run them to completion.
///
/// Each run ends in the coordinator's finished hook, which advances the
/// tenant queue and emits the next start request over the same channel, so
/// chained jobs never recurse. Per-tenant exclusivity comes from the queue
/// itself: only a queue head is ever dispatched.
pub async fn run_dispatcher<D, G>(
    ctx: Arc<JobRunnerContext<D>>,
    automation: AutomationService<G>,
    mut requests: mpsc::UnboundedReceiver<DispatchRequest>,
) where
    D: RemoteDriver,
    G: TextGenerator + Clone,
{
    let tracker = TaskTracker::new();
    let mut sweep = tokio::time::interval(RETENTION_SWEEP_INTERVAL);

    loop {
        tokio::select! {
            request = requests.recv() => {
                let Some(DispatchRequest::Start { job_id }) = request else {
                    break;
                };
                debug!(%job_id, "starting provisioning run");

                let ctx = Arc::clone(&ctx);
                let automation = automation.clone();

                tracker.spawn(async move {
                    let job = Job::from(ProvisionSubaccount { job_id });
                    if let Err(error) = job.run(&ctx).await {
                        error!(%job_id, %error, "provisioning run failed");
                    }

                    // unconditional: a failed run must not stall the tenant's queue
                    if let Err(error) = automation.on_job_finished(job_id) {
                        error!(%job_id, %error, "queue state is inconsistent");
                    }
                });
            }
            _ = sweep.tick() => {
                let days = ctx.config.retention.log_retention_days;
                let purged = ctx.logs.purge_older_than(days);
                if purged > 0 {
                    info!(purged, "purged expired execution log entries");
                }
            }
        }
    }

    tracker.close();
    tracker.wait().await;
}
