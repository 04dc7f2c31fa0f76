use crate::config::LaunchSpec;
use crate::process::spawner::SpawnedProcess;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant, SystemTime};
use tokio::process::Child;

/// Unique identifier for a tracked process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TrackedId(pub u64);

impl TrackedId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for TrackedId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProcessState {
    /// Alive and under supervision
    Running,
    /// Exited on its own; exit code recorded where the OS reported one
    Exited,
    /// Force-terminated after exceeding the timeout
    TimedOut,
    /// Force-terminated outside the timeout path: stop request, supervisor
    /// shutdown, or an unqueryable-but-alive entry
    Halted,
    /// Status became permanently unqueryable and the pid is gone
    Lost,
}

impl ProcessState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ProcessState::Running)
    }
}

impl std::fmt::Display for ProcessState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProcessState::Running => write!(f, "running"),
            ProcessState::Exited => write!(f, "exited"),
            ProcessState::TimedOut => write!(f, "timed out"),
            ProcessState::Halted => write!(f, "halted"),
            ProcessState::Lost => write!(f, "lost"),
        }
    }
}

/// One supervised child process
#[derive(Debug)]
pub struct TrackedProcess {
    pub id: TrackedId,
    pub name: String,
    pub spec: LaunchSpec,
    pub state: ProcessState,
    pub child: Child,
    pub pid: u32,
    /// Monotonic launch time, used only for elapsed-time comparison
    pub started_at: Instant,
    /// Wall-clock launch time, for reporting only
    pub launched_at: SystemTime,
    pub exit_code: Option<i32>,
    /// Failed termination attempts so far
    pub kill_attempts: u32,
    /// Consecutive failed exit-status queries
    pub status_failures: u32,
}

impl TrackedProcess {
    pub fn new(id: TrackedId, spec: LaunchSpec, spawned: SpawnedProcess) -> Self {
        Self {
            id,
            name: spawned.name,
            spec,
            state: ProcessState::Running,
            child: spawned.child,
            pid: spawned.pid,
            started_at: Instant::now(),
            launched_at: SystemTime::now(),
            exit_code: None,
            kill_attempts: 0,
            status_failures: 0,
        }
    }

    pub fn is_running(&self) -> bool {
        self.state == ProcessState::Running
    }

    /// Time this process has been under supervision
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    pub fn mark_exited(&mut self, exit_code: Option<i32>) {
        self.exit_code = exit_code;
        self.state = ProcessState::Exited;
    }

    pub fn mark_timed_out(&mut self) {
        self.state = ProcessState::TimedOut;
    }

    pub fn mark_halted(&mut self) {
        self.state = ProcessState::Halted;
    }

    pub(crate) fn mark_lost(&mut self) {
        self.state = ProcessState::Lost;
    }

    /// Consume the entry into its terminal report, releasing the child
    /// handle. Called exactly once, by the sweep.
    pub fn into_report(self) -> ExitReport {
        ExitReport {
            id: self.id,
            name: self.name,
            pid: self.pid,
            state: self.state,
            exit_code: self.exit_code,
            runtime: self.started_at.elapsed(),
            launched_at: self.launched_at,
        }
    }
}

/// Terminal record for a process that left supervision
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExitReport {
    pub id: TrackedId,
    pub name: String,
    pub pid: u32,
    pub state: ProcessState,
    pub exit_code: Option<i32>,
    pub runtime: Duration,
    pub launched_at: SystemTime,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracked_id_display() {
        let id = TrackedId::new(42);
        assert_eq!(id.to_string(), "42");
        assert_eq!(id.as_u64(), 42);
    }

    #[test]
    fn test_state_terminal() {
        assert!(!ProcessState::Running.is_terminal());
        assert!(ProcessState::Exited.is_terminal());
        assert!(ProcessState::TimedOut.is_terminal());
        assert!(ProcessState::Halted.is_terminal());
        assert!(ProcessState::Lost.is_terminal());
    }

    #[test]
    fn test_state_display() {
        assert_eq!(ProcessState::Running.to_string(), "running");
        assert_eq!(ProcessState::TimedOut.to_string(), "timed out");
    }
}
