//! Load state and renderer manager state
//!
//! ```text
//! NORMAL --navigate cross-site--> PENDING
//! PENDING --commit | cancel | abort--> NORMAL
//! ```

use serde::{Deserialize, Serialize};

/// What the network layer is doing for the tab's main resource.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadState {
    #[default]
    Idle,
    WaitingForCache,
    ResolvingProxy,
    ResolvingHost,
    Connecting,
    Sending,
    WaitingResponse,
    ReadingResponse,
}

impl LoadState {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoadState::Idle => "idle",
            LoadState::WaitingForCache => "waiting_for_cache",
            LoadState::ResolvingProxy => "resolving_proxy",
            LoadState::ResolvingHost => "resolving_host",
            LoadState::Connecting => "connecting",
            LoadState::Sending => "sending",
            LoadState::WaitingResponse => "waiting_response",
            LoadState::ReadingResponse => "reading_response",
        }
    }

    /// Status bar text. Idle and reading states have none.
    pub fn status_text(&self, host: &str) -> String {
        match self {
            LoadState::WaitingForCache => "Waiting for cache...".to_string(),
            LoadState::ResolvingProxy => "Resolving proxy...".to_string(),
            LoadState::ResolvingHost => "Resolving host...".to_string(),
            LoadState::Connecting => "Connecting...".to_string(),
            LoadState::Sending => "Sending request...".to_string(),
            LoadState::WaitingResponse => format!("Waiting for {}...", host),
            LoadState::Idle | LoadState::ReadingResponse => String::new(),
        }
    }
}

impl std::fmt::Display for LoadState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for LoadState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "idle" => Ok(LoadState::Idle),
            "waiting_for_cache" => Ok(LoadState::WaitingForCache),
            "resolving_proxy" => Ok(LoadState::ResolvingProxy),
            "resolving_host" => Ok(LoadState::ResolvingHost),
            "connecting" => Ok(LoadState::Connecting),
            "sending" => Ok(LoadState::Sending),
            "waiting_response" => Ok(LoadState::WaitingResponse),
            "reading_response" => Ok(LoadState::ReadingResponse),
            _ => Err(format!("Unknown load state: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ManagerState {
    /// Only the current endpoint exists.
    Normal,
    /// A cross-site navigation is in flight in a second endpoint.
    Pending,
}

impl ManagerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ManagerState::Normal => "normal",
            ManagerState::Pending => "pending",
        }
    }
}

impl std::fmt::Display for ManagerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
