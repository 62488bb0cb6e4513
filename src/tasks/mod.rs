//! Task outputs and the Task Graph.

pub mod task_graph;
pub mod task_output;

pub use task_graph::TaskGraph;
pub use task_output::TaskOutput;
