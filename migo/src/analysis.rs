mod ctrlflow;

pub use crate::analysis::ctrlflow::{ControlFlowGraph, NodeId};
