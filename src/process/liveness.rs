use sysinfo::{Pid, ProcessRefreshKind, ProcessStatus, System};

/// Liveness oracle for OS processes
///
/// Backs the supervisor's fallback path when a direct exit-status query
/// keeps failing, and lets tests assert that a terminated pid is really
/// gone. A zombie counts as dead: an unreaped exit is not a live process.
pub struct ProcessProbe {
    system: System,
}

impl ProcessProbe {
    pub fn new() -> Self {
        Self {
            system: System::new(),
        }
    }

    /// Check if a process is still alive in the system
    ///
    /// # Arguments
    /// * `pid` - Process ID to check
    ///
    /// # Returns
    /// * `true` - Process is alive
    /// * `false` - Process has exited (or only a zombie entry remains)
    pub fn is_alive(&mut self, pid: u32) -> bool {
        let sys_pid = Pid::from_u32(pid);
        self.system.refresh_processes_specifics(
            sysinfo::ProcessesToUpdate::Some(&[sys_pid]),
            true,
            ProcessRefreshKind::everything(),
        );

        match self.system.process(sys_pid) {
            Some(process) => !matches!(process.status(), ProcessStatus::Zombie),
            None => false,
        }
    }
}

impl Default for ProcessProbe {
    fn default() -> Self {
        Self::new()
    }
}
