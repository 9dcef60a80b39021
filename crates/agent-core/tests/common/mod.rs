#![allow(dead_code)]

use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use action_primitives::{
    ActionError, ActionExecutor, ActionResult, AgentAction, BrowserEnvironment, BrowserSnapshot,
    ExecutionContext, SnapshotOptions,
};
use agent_core::{AgentOutput, DecisionContext, DecisionError, DecisionOracle};
use async_trait::async_trait;
use steptrail_core_types::{ElementIdentity, TabInfo};

pub fn login_page() -> BrowserSnapshot {
    let mut snapshot = BrowserSnapshot::new("https://app.example.com/login", "Sign in")
        .with_element(
            1,
            ElementIdentity::new("input", "/html/body/form/input[1]", [("name", "email")]),
        )
        .with_element(
            2,
            ElementIdentity::new(
                "button",
                "/html/body/form/button[1]",
                [("id", "submit"), ("class", "btn")],
            ),
        );
    snapshot
        .tabs
        .push(TabInfo::new("t1", "https://app.example.com/login", "Sign in"));
    snapshot
}

pub struct StaticEnvironment {
    snapshot: BrowserSnapshot,
    pub calls: AtomicUsize,
}

impl StaticEnvironment {
    pub fn new(snapshot: BrowserSnapshot) -> Arc<Self> {
        Arc::new(Self {
            snapshot,
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl BrowserEnvironment for StaticEnvironment {
    async fn snapshot(&self, _options: SnapshotOptions) -> Result<BrowserSnapshot, ActionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.snapshot.clone())
    }
}

/// Replies from a script, then repeats `fallback_reply` forever.
pub struct ScriptedOracle {
    name: &'static str,
    script: Mutex<VecDeque<Result<AgentOutput, DecisionError>>>,
    fallback_reply: Result<AgentOutput, DecisionError>,
    pub calls: AtomicUsize,
}

impl ScriptedOracle {
    pub fn new(
        script: Vec<Result<AgentOutput, DecisionError>>,
        then: Result<AgentOutput, DecisionError>,
    ) -> Arc<Self> {
        Self::named("primary", script, then)
    }

    pub fn named(
        name: &'static str,
        script: Vec<Result<AgentOutput, DecisionError>>,
        then: Result<AgentOutput, DecisionError>,
    ) -> Arc<Self> {
        Arc::new(Self {
            name,
            script: Mutex::new(script.into()),
            fallback_reply: then,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn always(output: AgentOutput) -> Arc<Self> {
        Self::new(Vec::new(), Ok(output))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DecisionOracle for ScriptedOracle {
    fn model_name(&self) -> &str {
        self.name
    }

    async fn invoke(&self, _ctx: &DecisionContext) -> Result<AgentOutput, DecisionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self.script.lock().unwrap().pop_front();
        next.unwrap_or_else(|| self.fallback_reply.clone())
    }
}

pub fn reply(actions: Vec<AgentAction>) -> Result<AgentOutput, DecisionError> {
    Ok(AgentOutput::with_actions(actions))
}

/// Executes everything successfully except clicks on `failing` indices.
#[derive(Default)]
pub struct RecordingExecutor {
    failing: HashSet<u32>,
    click_delay: Option<Duration>,
    pub executed: Mutex<Vec<AgentAction>>,
}

impl RecordingExecutor {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing_on(indices: &[u32]) -> Arc<Self> {
        Arc::new(Self {
            failing: indices.iter().copied().collect(),
            ..Self::default()
        })
    }

    pub fn slow_clicks(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            click_delay: Some(delay),
            ..Self::default()
        })
    }

    pub fn executed(&self) -> Vec<AgentAction> {
        self.executed.lock().unwrap().clone()
    }
}

#[async_trait]
impl ActionExecutor for RecordingExecutor {
    async fn execute(
        &self,
        action: &AgentAction,
        _ctx: &ExecutionContext,
    ) -> Result<ActionResult, ActionError> {
        self.executed.lock().unwrap().push(action.clone());
        Ok(match action {
            AgentAction::Done { success, text, .. } => ActionResult::done(*success, text.clone()),
            AgentAction::Click { index } => {
                if let Some(delay) = self.click_delay {
                    tokio::time::sleep(delay).await;
                }
                if self.failing.contains(index) {
                    ActionResult::error(format!("Element with index {index} not found"))
                } else {
                    ActionResult::extracted(format!("Clicked element {index}"))
                }
            }
            other => ActionResult::extracted(format!("{} ok", other.name())),
        })
    }
}

impl ScriptedOracle {
    pub fn always_err(error: DecisionError) -> Arc<Self> {
        Self::new(Vec::new(), Err(error))
    }
}
