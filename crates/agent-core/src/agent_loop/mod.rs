//! Agent Loop (Observe-Think-Act) execution mode.
//!
//! The oracle is consulted at each step to decide the next action(s) based
//! on the current browser state.
//!
//! # Architecture
//!
//! ```text
//! while !done && steps < max:
//!     snapshot = environment.snapshot()   // observe
//!     output = decider.decide(context)    // timeout, empty retry, fallback
//!     results = multi_act.run(actions)    // 1-3 actions, prefix semantics
//!     history.push(record)                // always, unless interrupted
//! ```
//!
//! # Key Components
//!
//! - [`AgentLoopConfig`]: Configuration for the agent loop
//! - [`RetryFallbackController`]: Decision acquisition policy
//! - [`MultiActRunner`]: Batch execution rules
//! - [`AgentLoopController`]: Step state machine and run loop
//! - [`PauseStopController`]: Cooperative pause/stop signal

pub mod config;
pub mod control;
pub mod controller;
pub mod decision;
pub mod hooks;
pub mod multi_act;
pub mod run_loop;
pub mod state;
pub mod types;

pub use config::AgentLoopConfig;
pub use control::{Interrupt, PauseStopController};
pub use controller::{AgentLoopController, StepStatus};
pub use decision::{
    DecisionOracle, RetryFallbackController, EMPTY_DECISION_CLARIFICATION, NO_ACTION_RETURNED,
};
pub use hooks::{NoopHooks, RunHooks, TraceJudge};
pub use multi_act::{BatchOutcome, MultiActRunner};
pub use run_loop::{RunOutcome, Termination, MAX_STEPS_ERROR};
pub use state::AgentRunState;
pub use types::{AgentOutput, DecisionContext};
