#[macro_use]
extern crate tracing;

use derive_more::From;
use fieldsmith_config::Configuration;
use fieldsmith_core::traits::RemoteDriver;
use fieldsmith_db::Db;
use fieldsmith_error::Result;
use fieldsmith_service::{execution_log::ExecutionLogService, relay::TwoFactorRelay};
use serde::{Deserialize, Serialize};

pub use self::provision::ProvisionSubaccount;

pub mod provision;
pub mod schema;

/// Everything a running job may touch. The driver is the only handle to the
/// remote application; each run opens its own session from it.
pub struct JobRunnerContext<D> {
    pub db: Db,
    pub relay: TwoFactorRelay,
    pub logs: ExecutionLogService,
    pub driver: D,
    pub config: Configuration,
}

#[derive(Clone, Copy, Debug, Deserialize, From, Serialize)]
pub enum Job {
    ProvisionSubaccount(ProvisionSubaccount),
}

impl Job {
    pub async fn run<D>(&self, ctx: &JobRunnerContext<D>) -> Result<()>
    where
        D: RemoteDriver,
    {
        match self {
            Self::ProvisionSubaccount(job) => job.run(ctx).await,
        }
    }
}
