#[macro_use]
extern crate tracing;

pub mod automation;
pub mod dispatch;
pub mod execution_log;
pub mod queue;
pub mod relay;
