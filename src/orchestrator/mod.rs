//! 编排层

pub mod answer_orchestrator;
pub mod job_worker;

pub use job_worker::{JobPhase, JobWorker, WorkerHandle};
