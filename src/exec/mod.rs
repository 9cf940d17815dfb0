// src/exec/mod.rs

//! Execution layer between the dispatch core and the task pipeline.
//!
//! - [`backend`] provides the `ExecutorBackend` trait and the production
//!   `RealExecutorBackend`; tests replace it with a fake.
//! - [`executor_loop`] receives scheduled runs and spawns one Tokio task each.
//! - [`runner`] executes a run: tasks in series, then reload on success.

pub mod backend;
pub mod executor_loop;
pub mod runner;

pub use backend::{ExecutorBackend, RealExecutorBackend};
pub use executor_loop::spawn_executor;
pub use runner::execute_run;
