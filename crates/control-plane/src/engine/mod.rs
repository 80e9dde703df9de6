//! Pipeline execution engine.
//!
//! - [`executor`]: the step executor abstraction and its native and bridge
//!   variants
//! - [`coordinator`]: starts executions and drives their steps to a
//!   terminal state

pub mod coordinator;
pub mod executor;

pub use coordinator::{PipelineCoordinator, RunError, TerminalWritePolicy};
pub use executor::{
    BridgeExecutor, NativeExecutor, NativeOperation, StepContext, StepError, StepExecutor,
    StepExecutors, StepOutput, SummarizeExecution,
};
