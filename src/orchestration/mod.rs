//! # Orchestration
//!
//! Worker fan-out/join, the serial/parallel driver and the run report.

pub mod driver;
pub mod fan_out;
pub mod report;

pub use driver::PreprocessDriver;
pub use fan_out::{fan_out, FanOut};
pub use report::{FanOutReport, WorkerOutcome, WorkerStatus};
