//! Pipeline entry points.
//!
//! - `run_cycle`: one fetch → diff → notify → persist pass
//! - `run_poll_loop`: repeat `run_cycle` on a fixed interval until shutdown

pub mod cycle;
pub mod scheduler;

pub use cycle::{CycleOutcome, CycleReport, log_outcome, run_cycle};
pub use scheduler::{PollSchedule, run_poll_loop};
