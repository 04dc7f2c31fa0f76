use crate::config::LaunchSpec;
use crate::error::{CorralError, Result};
use crate::process::liveness::ProcessProbe;
use crate::process::spawner::spawn_process;
use crate::process::types::{ExitReport, TrackedId, TrackedProcess};
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

/// Supervisor configuration
#[derive(Debug, Clone)]
pub struct SupervisorSettings {
    /// Maximum wall-clock runtime before a process is force-terminated
    pub timeout: Duration,
    /// How long to sleep between polling passes
    pub poll_interval: Duration,
    /// Signal sent when a process exceeds its timeout
    pub stop_signal: String,
    /// How long to wait after the stop signal before escalating to SIGKILL
    pub stop_grace: Duration,
    /// Failed termination attempts tolerated before giving up on an entry
    pub max_kill_attempts: u32,
    /// Consecutive failed status queries tolerated before the liveness
    /// probe decides the entry's fate
    pub max_status_failures: u32,
}

impl Default for SupervisorSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            poll_interval: Duration::from_millis(100),
            stop_signal: "SIGTERM".to_string(),
            stop_grace: Duration::from_secs(5),
            max_kill_attempts: 3,
            max_status_failures: 5,
        }
    }
}

/// Cloneable handle that stops a running monitor loop
///
/// Safe to trigger from any thread, including a ctrl-c handler. The loop
/// observes the request at its next iteration boundary and applies the same
/// forced-termination sweep as [`Supervisor::shutdown`].
#[derive(Debug, Clone, Default)]
pub struct StopHandle {
    flag: Arc<AtomicBool>,
}

impl StopHandle {
    pub fn stop(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Why a running entry is being force-terminated
enum KillCause {
    Timeout,
    Unqueryable,
}

/// Process supervisor: launches child processes, polls them for completion,
/// enforces the per-process timeout and reclaims every handle exactly once
pub struct Supervisor {
    settings: SupervisorSettings,
    /// Tracked entries in insertion order
    tracked: Vec<TrackedProcess>,
    next_id: u64,
    probe: ProcessProbe,
    stop: StopHandle,
}

impl Supervisor {
    /// Create a new supervisor
    pub fn new(settings: SupervisorSettings) -> Self {
        Self {
            settings,
            tracked: Vec::new(),
            next_id: 1,
            probe: ProcessProbe::new(),
            stop: StopHandle::default(),
        }
    }

    /// Create a supervisor with default settings
    pub fn with_defaults() -> Self {
        Self::new(SupervisorSettings::default())
    }

    /// Launch a process and place it under supervision
    ///
    /// On success the process is appended to the tracked collection with a
    /// fresh monotonic start time. On failure nothing is tracked; the error
    /// is not fatal to the supervisor and other launches may proceed.
    pub async fn launch(&mut self, spec: LaunchSpec) -> Result<TrackedId> {
        spec.validate()?;

        let spawned = match spawn_process(&spec).await {
            Ok(spawned) => spawned,
            Err(e) => {
                error!("failed to launch '{}': {}", spec.name, e);
                return Err(e);
            }
        };

        let id = TrackedId::new(self.next_id);
        self.next_id += 1;

        info!(
            "launched '{}' (id: {}, pid: {})",
            spawned.name, id, spawned.pid
        );

        self.tracked.push(TrackedProcess::new(id, spec, spawned));
        Ok(id)
    }

    /// Run the monitoring loop until no tracked processes remain
    ///
    /// Each iteration polls every running entry for completion, terminates
    /// entries past the timeout, sweeps terminal entries out of tracking and
    /// sleeps for the poll interval. With nothing tracked it returns
    /// immediately. A stop request (see [`Supervisor::stop_handle`]) halts
    /// everything still running and returns early.
    ///
    /// # Returns
    /// * `Ok(reports)` - Terminal report for every process that left tracking
    /// * `Err(CorralError::Unkillable)` - An entry survived the configured
    ///   number of termination attempts
    pub async fn monitor(&mut self) -> Result<Vec<ExitReport>> {
        let mut reports = Vec::new();

        loop {
            if self.tracked.is_empty() {
                break;
            }

            if self.stop.is_stopped() {
                info!(
                    "stop requested, halting {} tracked process(es)",
                    self.tracked.len()
                );
                reports.extend(self.shutdown().await);
                break;
            }

            reports.extend(self.poll_once().await?);

            if self.tracked.is_empty() {
                break;
            }

            sleep(self.settings.poll_interval).await;
        }

        Ok(reports)
    }

    /// Perform a single polling pass followed by a sweep
    ///
    /// Exposed so callers (and tests) can drive the loop manually.
    pub async fn poll_once(&mut self) -> Result<Vec<ExitReport>> {
        for entry in self.tracked.iter_mut() {
            if !entry.is_running() {
                continue;
            }

            let cause = match entry.child.try_wait() {
                Ok(Some(status)) => {
                    info!(
                        "process '{}' (pid: {}) completed with exit code: {}",
                        entry.name,
                        entry.pid,
                        status
                            .code()
                            .map(|c| c.to_string())
                            .unwrap_or_else(|| "unknown".to_string())
                    );
                    entry.mark_exited(status.code());
                    continue;
                }
                Ok(None) => {
                    entry.status_failures = 0;
                    if entry.elapsed() < self.settings.timeout {
                        continue;
                    }
                    info!(
                        "process '{}' (pid: {}) exceeded {:?} timeout, terminating",
                        entry.name, entry.pid, self.settings.timeout
                    );
                    KillCause::Timeout
                }
                Err(e) => {
                    entry.status_failures += 1;
                    warn!(
                        "status query for '{}' (pid: {}) failed ({}/{}): {}",
                        entry.name,
                        entry.pid,
                        entry.status_failures,
                        self.settings.max_status_failures,
                        e
                    );
                    if entry.status_failures < self.settings.max_status_failures {
                        continue;
                    }
                    if !self.probe.is_alive(entry.pid) {
                        warn!(
                            "process '{}' (pid: {}) is gone without an observable exit status",
                            entry.name, entry.pid
                        );
                        entry.mark_lost();
                        continue;
                    }
                    warn!(
                        "process '{}' (pid: {}) is unqueryable but still alive, terminating",
                        entry.name, entry.pid
                    );
                    KillCause::Unqueryable
                }
            };

            match Self::terminate(entry, &self.settings).await {
                Ok(exit_code) => {
                    entry.exit_code = exit_code;
                    match cause {
                        KillCause::Timeout => entry.mark_timed_out(),
                        KillCause::Unqueryable => entry.mark_halted(),
                    }
                    debug!("process '{}' (pid: {}) terminated", entry.name, entry.pid);
                }
                Err(e) => {
                    entry.kill_attempts += 1;
                    warn!(
                        "termination attempt {}/{} for '{}' (pid: {}) failed: {}",
                        entry.kill_attempts,
                        self.settings.max_kill_attempts,
                        entry.name,
                        entry.pid,
                        e
                    );
                    if entry.kill_attempts >= self.settings.max_kill_attempts {
                        error!(
                            "giving up on '{}' (pid: {}) after {} termination attempts",
                            entry.name, entry.pid, entry.kill_attempts
                        );
                        return Err(CorralError::Unkillable(
                            entry.name.clone(),
                            entry.pid,
                            entry.kill_attempts,
                        ));
                    }
                }
            }
        }

        Ok(self.sweep())
    }

    /// Force-terminate everything still running, then release and report
    /// every tracked entry
    ///
    /// This is the sweep a stop request triggers; callers can also invoke it
    /// directly for an explicit teardown.
    pub async fn shutdown(&mut self) -> Vec<ExitReport> {
        for entry in self.tracked.iter_mut() {
            if !entry.is_running() {
                continue;
            }

            info!("halting '{}' (pid: {})", entry.name, entry.pid);
            if let Err(e) = entry.child.start_kill() {
                warn!(
                    "kill request for '{}' (pid: {}) failed: {}",
                    entry.name, entry.pid, e
                );
            }

            match tokio::time::timeout(self.settings.stop_grace, entry.child.wait()).await {
                Ok(Ok(status)) => entry.exit_code = status.code(),
                Ok(Err(e)) => {
                    warn!("failed to reap '{}' (pid: {}): {}", entry.name, entry.pid, e)
                }
                Err(_) => warn!(
                    "process '{}' (pid: {}) did not exit within {:?} of being killed",
                    entry.name, entry.pid, self.settings.stop_grace
                ),
            }

            entry.mark_halted();
        }

        self.sweep()
    }

    /// Handle that can stop a running [`Supervisor::monitor`] loop
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Number of processes currently tracked
    pub fn tracked_count(&self) -> usize {
        self.tracked.len()
    }

    pub fn get(&self, id: TrackedId) -> Option<&TrackedProcess> {
        self.tracked.iter().find(|p| p.id == id)
    }

    pub fn list(&self) -> Vec<&TrackedProcess> {
        self.tracked.iter().collect()
    }

    /// Remove every terminal entry from tracking, consuming it into its
    /// report. Handles are released here, exactly once per entry; the
    /// relative order of the remainder is preserved.
    fn sweep(&mut self) -> Vec<ExitReport> {
        let mut reports = Vec::new();
        let mut remaining = Vec::with_capacity(self.tracked.len());

        for entry in std::mem::take(&mut self.tracked) {
            if entry.is_running() {
                remaining.push(entry);
            } else {
                debug!(
                    "reaped '{}' (id: {}, pid: {})",
                    entry.name, entry.id, entry.pid
                );
                reports.push(entry.into_report());
            }
        }

        self.tracked = remaining;
        reports
    }

    /// Terminate one entry: stop signal, bounded grace wait, SIGKILL
    /// escalation, final reap
    ///
    /// # Returns
    /// * `Ok(exit_code)` - The process is dead and reaped
    /// * `Err(CorralError::Terminate)` - The attempt failed; safe to retry
    async fn terminate(
        entry: &mut TrackedProcess,
        settings: &SupervisorSettings,
    ) -> Result<Option<i32>> {
        let nix_pid = Pid::from_raw(entry.pid as i32);
        let stop_signal = Self::parse_signal(&settings.stop_signal)?;

        debug!(
            "sending {} to '{}' (pid: {})",
            settings.stop_signal, entry.name, entry.pid
        );
        signal::kill(nix_pid, stop_signal).map_err(|e| {
            CorralError::Terminate(
                entry.name.clone(),
                format!("Failed to send {}: {}", settings.stop_signal, e),
            )
        })?;

        match tokio::time::timeout(settings.stop_grace, entry.child.wait()).await {
            Ok(Ok(status)) => Ok(status.code()),
            Ok(Err(e)) => Err(CorralError::Terminate(
                entry.name.clone(),
                format!("Wait failed: {}", e),
            )),
            Err(_) => {
                warn!(
                    "process '{}' (pid: {}) did not exit within {:?}, sending SIGKILL",
                    entry.name, entry.pid, settings.stop_grace
                );
                signal::kill(nix_pid, Signal::SIGKILL).map_err(|e| {
                    CorralError::Terminate(
                        entry.name.clone(),
                        format!("Failed to send SIGKILL after grace period: {}", e),
                    )
                })?;
                let status = entry.child.wait().await.map_err(|e| {
                    CorralError::Terminate(
                        entry.name.clone(),
                        format!("Wait after SIGKILL failed: {}", e),
                    )
                })?;
                Ok(status.code())
            }
        }
    }

    fn parse_signal(signal_name: &str) -> Result<Signal> {
        match signal_name {
            "SIGTERM" => Ok(Signal::SIGTERM),
            "SIGINT" => Ok(Signal::SIGINT),
            "SIGQUIT" => Ok(Signal::SIGQUIT),
            "SIGKILL" => Ok(Signal::SIGKILL),
            "SIGHUP" => Ok(Signal::SIGHUP),
            "SIGUSR1" => Ok(Signal::SIGUSR1),
            "SIGUSR2" => Ok(Signal::SIGUSR2),
            _ => Err(CorralError::Signal(format!(
                "Invalid signal name: {}",
                signal_name
            ))),
        }
    }
}

impl Drop for Supervisor {
    fn drop(&mut self) {
        // Last-resort termination attempt before the handles are released;
        // kill_on_drop on each child backs this up on panic paths.
        for entry in self.tracked.iter_mut() {
            if entry.is_running() {
                let _ = entry.child.start_kill();
            }
        }
    }
}
