//! Action payloads chosen by the decision oracle.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Closed set of operations the agent can perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Navigate,
    GoBack,
    Click,
    Input,
    SelectOption,
    Scroll,
    SendKeys,
    SwitchTab,
    CloseTab,
    Extract,
    Wait,
    UploadFile,
    Done,
    /// Empty slot in an oracle response. Never executed.
    Noop,
}

impl ActionKind {
    /// Kinds with a registered executor contract, in vocabulary order.
    pub const REGISTERED: [ActionKind; 13] = [
        ActionKind::Navigate,
        ActionKind::GoBack,
        ActionKind::Click,
        ActionKind::Input,
        ActionKind::SelectOption,
        ActionKind::Scroll,
        ActionKind::SendKeys,
        ActionKind::SwitchTab,
        ActionKind::CloseTab,
        ActionKind::Extract,
        ActionKind::Wait,
        ActionKind::UploadFile,
        ActionKind::Done,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Navigate => "navigate",
            ActionKind::GoBack => "go_back",
            ActionKind::Click => "click",
            ActionKind::Input => "input",
            ActionKind::SelectOption => "select_option",
            ActionKind::Scroll => "scroll",
            ActionKind::SendKeys => "send_keys",
            ActionKind::SwitchTab => "switch_tab",
            ActionKind::CloseTab => "close_tab",
            ActionKind::Extract => "extract",
            ActionKind::Wait => "wait",
            ActionKind::UploadFile => "upload_file",
            ActionKind::Done => "done",
            ActionKind::Noop => "noop",
        }
    }

    /// Whether the action addresses an element by snapshot index.
    pub fn targets_element(&self) -> bool {
        matches!(
            self,
            ActionKind::Click
                | ActionKind::Input
                | ActionKind::SelectOption
                | ActionKind::UploadFile
        )
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn default_true() -> bool {
    true
}

fn default_pages() -> f64 {
    1.0
}

fn default_wait_seconds() -> u64 {
    3
}

/// One operation with its parameters.
///
/// Serialized externally tagged, e.g. `{"click": {"index": 3}}`, which is
/// the shape oracle responses and history documents use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentAction {
    Navigate {
        url: String,
        #[serde(default)]
        new_tab: bool,
    },
    GoBack {},
    Click {
        index: u32,
    },
    Input {
        index: u32,
        text: String,
        #[serde(default = "default_true")]
        clear: bool,
    },
    SelectOption {
        index: u32,
        option: String,
    },
    Scroll {
        #[serde(default = "default_true")]
        down: bool,
        #[serde(default = "default_pages")]
        pages: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        index: Option<u32>,
    },
    SendKeys {
        keys: String,
    },
    SwitchTab {
        tab_id: String,
    },
    CloseTab {
        tab_id: String,
    },
    Extract {
        query: String,
        #[serde(default)]
        extract_links: bool,
    },
    Wait {
        #[serde(default = "default_wait_seconds")]
        seconds: u64,
    },
    UploadFile {
        index: u32,
        path: String,
    },
    Done {
        text: String,
        #[serde(default)]
        success: bool,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        files_to_display: Vec<String>,
    },
    Noop {},
}

impl AgentAction {
    pub fn done(success: bool, text: impl Into<String>) -> Self {
        AgentAction::Done {
            text: text.into(),
            success,
            files_to_display: Vec::new(),
        }
    }

    pub fn click(index: u32) -> Self {
        AgentAction::Click { index }
    }

    pub fn input(index: u32, text: impl Into<String>) -> Self {
        AgentAction::Input {
            index,
            text: text.into(),
            clear: true,
        }
    }

    pub fn navigate(url: impl Into<String>) -> Self {
        AgentAction::Navigate {
            url: url.into(),
            new_tab: false,
        }
    }

    pub fn kind(&self) -> ActionKind {
        match self {
            AgentAction::Navigate { .. } => ActionKind::Navigate,
            AgentAction::GoBack {} => ActionKind::GoBack,
            AgentAction::Click { .. } => ActionKind::Click,
            AgentAction::Input { .. } => ActionKind::Input,
            AgentAction::SelectOption { .. } => ActionKind::SelectOption,
            AgentAction::Scroll { .. } => ActionKind::Scroll,
            AgentAction::SendKeys { .. } => ActionKind::SendKeys,
            AgentAction::SwitchTab { .. } => ActionKind::SwitchTab,
            AgentAction::CloseTab { .. } => ActionKind::CloseTab,
            AgentAction::Extract { .. } => ActionKind::Extract,
            AgentAction::Wait { .. } => ActionKind::Wait,
            AgentAction::UploadFile { .. } => ActionKind::UploadFile,
            AgentAction::Done { .. } => ActionKind::Done,
            AgentAction::Noop {} => ActionKind::Noop,
        }
    }

    pub fn name(&self) -> &'static str {
        self.kind().as_str()
    }

    pub fn is_done(&self) -> bool {
        matches!(self, AgentAction::Done { .. })
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, AgentAction::Noop {})
    }

    /// Snapshot index this action addresses, if any.
    pub fn element_index(&self) -> Option<u32> {
        match self {
            AgentAction::Click { index }
            | AgentAction::Input { index, .. }
            | AgentAction::SelectOption { index, .. }
            | AgentAction::UploadFile { index, .. } => Some(*index),
            AgentAction::Scroll { index, .. } => *index,
            _ => None,
        }
    }

    /// Point the action at another snapshot index. Returns false when the
    /// action carries no index.
    pub fn set_element_index(&mut self, new_index: u32) -> bool {
        match self {
            AgentAction::Click { index }
            | AgentAction::Input { index, .. }
            | AgentAction::SelectOption { index, .. }
            | AgentAction::UploadFile { index, .. } => {
                *index = new_index;
                true
            }
            AgentAction::Scroll { index: Some(index), .. } => {
                *index = new_index;
                true
            }
            _ => false,
        }
    }
}
