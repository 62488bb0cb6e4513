//! Agent tools for delegation.

pub mod delegate_work_tool;

pub use delegate_work_tool::{DelegateWorkTool, DelegateWorkToolSchema, DELEGATE_WORK_TOOL_NAME};
