use tokio::sync::mpsc;
use uuid::Uuid;

/// Messages from the coordinator to the dispatcher loop. Completion of one
/// run emits the next `Start` instead of calling back into the executor, so
/// chained queues never grow the call stack.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DispatchRequest {
    Start { job_id: Uuid },
}

#[derive(Clone)]
pub struct DispatchHandle {
    tx: mpsc::UnboundedSender<DispatchRequest>,
}

impl DispatchHandle {
    #[must_use]
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<DispatchRequest>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Ask the dispatcher to start a run. Fire-and-forget: the caller gets
    /// its receipt regardless of when the run is picked up.
    pub fn start(&self, job_id: Uuid) {
        if self.tx.send(DispatchRequest::Start { job_id }).is_err() {
            warn!(%job_id, "dispatcher is not running, job stays pending");
        }
    }
}
