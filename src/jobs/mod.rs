//! Job module - launching backend jobs and following them to completion.
//!
//! - `launcher`: start a job, get a task handle
//! - `poller`: fixed-interval status stream with cancellation
//! - `progress`: pure projection of a snapshot into render state
//! - `operation`: shared idle/running/succeeded/failed state and the
//!   launch-and-watch driver
//! - `maintenance`: one-shot admin triggers

mod error;
mod launcher;
mod maintenance;
mod operation;
mod poller;
pub mod progress;
mod task;

pub use error::{JobError, LaunchError, PollError};
pub use launcher::{JobEndpoint, Launcher, TaskHandle};
pub use maintenance::{Maintenance, MaintenanceAction};
pub use operation::{track, AsyncOperation};
pub use poller::{poll_until, PollPolicy, Poller, DEFAULT_POLL_INTERVAL};
pub use progress::{format_eta, project, ProgressView};
pub use task::{StatusPayload, TaskId, TaskSnapshot, TaskStatus};
