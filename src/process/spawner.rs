use crate::config::LaunchSpec;
use crate::error::{CorralError, Result};
use std::process::Stdio;
use tokio::process::{Child, Command};

/// Metadata returned when spawning a process
#[derive(Debug)]
pub struct SpawnedProcess {
    /// The child process handle
    pub child: Child,

    /// Process ID assigned by the OS
    pub pid: u32,

    /// Process name from the launch spec
    pub name: String,
}

/// Spawn a process from the provided launch spec
///
/// The child inherits the caller's environment and working directory unless
/// the spec overrides them. Stdin is detached; stdout and stderr pass
/// through untouched (output capture is not this crate's job). The handle is
/// armed with `kill_on_drop` so an abandoned child never outlives the
/// supervisor.
///
/// # Arguments
/// * `spec` - Launch spec with the command, arguments and environment
///
/// # Returns
/// * `Ok(SpawnedProcess)` - Successfully spawned process with metadata
/// * `Err(CorralError)` - Failed to spawn process
pub async fn spawn_process(spec: &LaunchSpec) -> Result<SpawnedProcess> {
    // Validate that the command exists
    if !spec.command.exists() {
        return Err(CorralError::Launch(format!(
            "Command does not exist: {}",
            spec.command.display()
        )));
    }

    let mut command = Command::new(&spec.command);

    if !spec.args.is_empty() {
        command.args(&spec.args);
    }

    if let Some(ref cwd) = spec.cwd {
        command.current_dir(cwd);
    }

    if !spec.env.is_empty() {
        for (key, value) in &spec.env {
            command.env(key, value);
        }
    }

    command.stdin(Stdio::null());
    command.kill_on_drop(true);

    let child = command.spawn().map_err(|e| {
        CorralError::Launch(format!("Failed to spawn process '{}': {}", spec.name, e))
    })?;

    let pid = child.id().ok_or_else(|| {
        CorralError::Launch(format!("Failed to get PID for process '{}'", spec.name))
    })?;

    Ok(SpawnedProcess {
        child,
        pid,
        name: spec.name.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_spawn_simple_process() {
        let spec = LaunchSpec::new("test-echo", "/bin/echo");

        let result = spawn_process(&spec).await;
        assert!(result.is_ok());

        let spawned = result.unwrap();
        assert_eq!(spawned.name, "test-echo");
        assert!(spawned.pid > 0);
    }

    #[tokio::test]
    async fn test_spawn_with_args() {
        let mut spec = LaunchSpec::new("test-echo-args", "/bin/echo");
        spec.args = vec!["hello".to_string(), "world".to_string()];

        let result = spawn_process(&spec).await;
        assert!(result.is_ok());

        let spawned = result.unwrap();
        assert_eq!(spawned.name, "test-echo-args");
    }

    #[tokio::test]
    async fn test_spawn_with_working_directory() {
        let temp_dir = TempDir::new().unwrap();
        let mut spec = LaunchSpec::new("test-pwd", "/bin/pwd");
        spec.cwd = Some(temp_dir.path().to_path_buf());

        let result = spawn_process(&spec).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_spawn_with_env_vars() {
        let mut spec = LaunchSpec::new("test-env", "/bin/sh");
        spec.args = vec!["-c".to_string(), "exit ${TEST_CODE}".to_string()];
        spec.env
            .insert("TEST_CODE".to_string(), "0".to_string());

        let result = spawn_process(&spec).await;
        assert!(result.is_ok());

        let mut spawned = result.unwrap();
        let status = spawned.child.wait().await.unwrap();
        assert_eq!(status.code(), Some(0));
    }

    #[tokio::test]
    async fn test_spawn_nonexistent_command() {
        let spec = LaunchSpec::new("test-nonexistent", "/nonexistent/command");

        let result = spawn_process(&spec).await;
        assert!(result.is_err());

        match result {
            Err(CorralError::Launch(msg)) => {
                assert!(msg.contains("does not exist"));
            }
            _ => panic!("Expected Launch error"),
        }
    }

    #[tokio::test]
    async fn test_spawn_invalid_working_directory() {
        let mut spec = LaunchSpec::new("test-invalid-cwd", "/bin/echo");
        spec.cwd = Some(PathBuf::from("/nonexistent/directory"));

        let result = spawn_process(&spec).await;
        assert!(result.is_err());

        match result {
            Err(CorralError::Launch(_)) => {}
            _ => panic!("Expected Launch error"),
        }
    }
}
