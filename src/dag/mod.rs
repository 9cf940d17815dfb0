// src/dag/mod.rs

//! Tasks and how they compose.
//!
//! - [`task`] defines the built-in tasks and their static metadata.
//! - [`graph`] holds tasks plus their `then` edges, validated acyclic.
//! - [`plan`] builds and runs series/parallel combinations of tasks.

pub mod graph;
pub mod plan;
pub mod task;

pub use graph::TaskGraph;
pub use plan::{run_plan, Plan};
pub use task::{TaskName, TaskSpec};
