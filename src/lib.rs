//! # Scholarship Console
//!
//! Admin client for the scholarship backend and its scraping engine.
//!
//! This library provides:
//! - Launching long-running backend jobs and polling them to completion
//! - Progress projection (percentage, counters, ETA) for job snapshots
//! - Majority-vote consensus over per-source field extractions
//! - The moderation queue, maintenance actions and the enrichment pipeline
//!
//! ## Architecture
//!
//! ```text
//!   Launcher ──POST──▶ backend ──{task_id}──▶ TaskHandle
//!                                                │
//!                                                ▼
//!   Poller ──GET status every interval──▶ Stream<TaskSnapshot>
//!                                                │
//!                                                ▼
//!                                    progress::project ─▶ ProgressView
//! ```
//!
//! Every request goes through a [`http::Transport`]; the production
//! transport attaches the admin bearer token from a
//! [`auth::CredentialProvider`].
//!
//! ## Modules
//! - `http`: request layer and classified API errors
//! - `auth`: token storage, login and session restore
//! - `jobs`: launcher, poller, progress projection, async operation state
//! - `enrichment`: fleet status, single-item test runs and consensus
//! - `scholarships`: moderation queue on the engine API
//! - `config`: environment configuration

pub mod auth;
pub mod config;
pub mod enrichment;
pub mod http;
pub mod jobs;
pub mod scholarships;
pub mod util;

pub use config::Config;
pub use http::{ApiError, ApiErrorKind, ApiRequest, HttpTransport, Transport};
pub use jobs::{JobError, LaunchError, PollError, TaskSnapshot, TaskStatus};
