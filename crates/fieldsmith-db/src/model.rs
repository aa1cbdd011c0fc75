pub mod execution_log;
pub mod job;
pub mod two_factor;
pub mod workspace;
