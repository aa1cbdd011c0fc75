pub mod model;

mod jobs;
mod logs;
mod two_factor;
mod workspaces;

use self::model::{
    execution_log::ExecutionLogEntry, job::Job, two_factor::TwoFactorRequest,
    workspace::Workspace,
};
use ahash::AHashMap;
use parking_lot::RwLock;
use std::sync::Arc;
use uuid::Uuid;

/// Handle to the record store, cheap to clone and injected everywhere.
///
/// Storage is in-memory and scoped to the process lifetime: queued work and
/// records do not survive a restart, callers re-submit. The behavioural
/// contract of the entities is what matters here, not the storage technology.
#[derive(Clone, Default)]
pub struct Db {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    workspaces: RwLock<AHashMap<Uuid, Workspace>>,
    jobs: RwLock<AHashMap<Uuid, Job>>,
    logs: RwLock<Vec<ExecutionLogEntry>>,
    two_factor: RwLock<AHashMap<Uuid, TwoFactorRequest>>,
}
