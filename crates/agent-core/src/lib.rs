//! Agent core: the step-execution control loop and the run history it
//! produces.
//!
//! The loop consumes a browser through `action_primitives` traits and an
//! oracle through [`DecisionOracle`]; every attempted step is recorded in a
//! [`HistoryStore`] that can be persisted, redacted and replayed.

pub mod agent_loop;
pub mod errors;
pub mod history;
pub mod variables;

pub use agent_loop::{
    AgentLoopConfig, AgentLoopController, AgentOutput, AgentRunState, DecisionContext,
    DecisionOracle, Interrupt, MultiActRunner, PauseStopController, RetryFallbackController,
    RunHooks, RunOutcome, StepStatus, Termination, TraceJudge,
};
pub use errors::{AgentError, DecisionError, HistoryError};
pub use history::{HistoryStore, SensitiveData, StateDigest, StepMetadata, StepRecord};
pub use variables::{detect_variables, substitute_variables, DetectedVariable, VariableType};
