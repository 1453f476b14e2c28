//! # DockMock Container Entity & Lifecycle
//!
//! File: cli/src/mock/lifecycle.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! The `Container` entity and its lifecycle state machine. Every transition the
//! container controller exposes is a method here, so the preconditions live in
//! one place and the controller only maps outcomes to status codes.
//!
//! | Transition | Precondition          | Effect                                                   |
//! |------------|-----------------------|----------------------------------------------------------|
//! | `start`    | not running or paused | running, `StartedAt = now`                                |
//! | `stop`     | none                  | exited, `Running = Paused = false`, `FinishedAt = now`    |
//! | `kill`     | running               | exited, `Running = false`                                 |
//! | `pause`    | none                  | paused, `Paused = true`                                   |
//! | `unpause`  | paused                | running, `Paused = false`                                 |
//! | `resize`   | none                  | `ConsoleSize = [rows, cols]`                              |
//!
//! `pause` deliberately has no `Running` precondition: pausing a created or
//! exited container succeeds, and `Running` keeps whatever value it had.
//!
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Status string reported in `State.Status` and list summaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerStatus {
    Created,
    Running,
    Paused,
    Exited,
}

impl ContainerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContainerStatus::Created => "created",
            ContainerStatus::Running => "running",
            ContainerStatus::Paused => "paused",
            ContainerStatus::Exited => "exited",
        }
    }

    /// Parses a status filter value. Unknown values yield `None`.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "created" => Some(ContainerStatus::Created),
            "running" => Some(ContainerStatus::Running),
            "paused" => Some(ContainerStatus::Paused),
            "exited" => Some(ContainerStatus::Exited),
            _ => None,
        }
    }
}

impl fmt::Display for ContainerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Live `State` block of a container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ContainerState {
    pub status: ContainerStatus,
    pub running: bool,
    pub paused: bool,
    pub dead: bool,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub error: String,
}

impl Default for ContainerState {
    fn default() -> Self {
        Self {
            status: ContainerStatus::Created,
            running: false,
            paused: false,
            dead: false,
            started_at: None,
            finished_at: None,
            error: String::new(),
        }
    }
}

/// Precondition failures of lifecycle transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("container already started")]
    AlreadyStarted,
    #[error("cannot start a paused container, try unpause instead")]
    StartWhilePaused,
    #[error("Container is not running")]
    NotRunning,
    #[error("Container is not paused")]
    NotPaused,
}

/// A synthetic container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Container {
    pub id: String,
    pub name: String,
    pub image: String,
    pub state: ContainerState,
    /// `HostConfig.ConsoleSize` as `[rows, cols]`.
    pub console_size: [u32; 2],
    pub created: DateTime<Utc>,
}

impl Container {
    /// A freshly created container: `created`, not running, not paused.
    pub fn new(id: impl Into<String>, name: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            image: image.into(),
            state: ContainerState::default(),
            console_size: [0, 0],
            created: Utc::now(),
        }
    }

    pub fn status(&self) -> ContainerStatus {
        self.state.status
    }

    pub fn is_running(&self) -> bool {
        self.state.running
    }

    /// True when `Name` equals `name`, with or without the daemon's leading `/`.
    pub fn has_name(&self, name: &str) -> bool {
        let stored = self.name.trim_start_matches('/');
        stored == name.trim_start_matches('/')
    }

    pub fn start(&mut self, now: DateTime<Utc>) -> Result<(), TransitionError> {
        if self.state.paused {
            return Err(TransitionError::StartWhilePaused);
        }
        if self.state.running {
            return Err(TransitionError::AlreadyStarted);
        }
        self.state.running = true;
        self.state.status = ContainerStatus::Running;
        self.state.started_at = Some(now);
        Ok(())
    }

    pub fn stop(&mut self, now: DateTime<Utc>) {
        self.state.running = false;
        self.state.paused = false;
        self.state.status = ContainerStatus::Exited;
        self.state.finished_at = Some(now);
    }

    pub fn kill(&mut self) -> Result<(), TransitionError> {
        if !self.state.running {
            return Err(TransitionError::NotRunning);
        }
        self.state.running = false;
        self.state.status = ContainerStatus::Exited;
        Ok(())
    }

    pub fn pause(&mut self) {
        self.state.paused = true;
        self.state.status = ContainerStatus::Paused;
    }

    pub fn unpause(&mut self) -> Result<(), TransitionError> {
        if !self.state.paused {
            return Err(TransitionError::NotPaused);
        }
        self.state.paused = false;
        self.state.status = ContainerStatus::Running;
        Ok(())
    }

    pub fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn resize(&mut self, rows: u32, cols: u32) {
        self.console_size = [rows, cols];
    }

    /// Human-readable `Status` column of `docker ps`.
    pub fn status_text(&self, now: DateTime<Utc>) -> String {
        match self.state.status {
            ContainerStatus::Created => "Created".to_string(),
            ContainerStatus::Running => format!("Up {} seconds", self.seconds_since_start(now)),
            ContainerStatus::Paused => {
                format!("Up {} seconds (Paused)", self.seconds_since_start(now))
            }
            ContainerStatus::Exited => {
                let since = self.state.finished_at.unwrap_or(self.created);
                format!("Exited (0) {} seconds ago", (now - since).num_seconds().max(0))
            }
        }
    }

    fn seconds_since_start(&self, now: DateTime<Utc>) -> i64 {
        let since = self.state.started_at.unwrap_or(self.created);
        (now - since).num_seconds().max(0)
    }
}
