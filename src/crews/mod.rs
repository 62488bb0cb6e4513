//! Crew execution: the run state machine, the hierarchical manager and the
//! aggregated crew output.

pub mod crew_output;
pub mod execution;
pub mod manager;

pub use crew_output::CrewOutput;
pub use execution::{CrewRun, ExecutionState, PreparedRun, RunPlan, TaskCallback};
pub use manager::{Assignment, Manager};
