// CLI module - User-facing command-line interface

mod output;

use crate::config::LaunchSpec;
use crate::error::{CorralError, Result};
use crate::process::{Supervisor, SupervisorSettings};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Corral - launch a set of processes and supervise them to completion
#[derive(Parser)]
#[command(name = "corral")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Launch processes and supervise them until all exit
    Run {
        /// Configuration file listing processes to launch (.toml or .json)
        #[arg(short = 'f', long)]
        config: Option<PathBuf>,

        /// Command line to launch, split on whitespace (repeatable)
        #[arg(short = 'c', long = "command")]
        commands: Vec<String>,

        /// Seconds a process may run before forced termination
        #[arg(short, long, default_value = "10")]
        timeout: u64,

        /// Milliseconds between polling passes
        #[arg(long, default_value = "100")]
        poll_interval: u64,

        /// Signal sent to a process that exceeds its timeout
        #[arg(long, default_value = "SIGTERM")]
        stop_signal: String,

        /// Seconds to wait after the stop signal before SIGKILL
        #[arg(long, default_value = "5")]
        stop_grace: u64,

        /// Print the final report as JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Validate a configuration file without launching anything
    Check {
        /// Configuration file to validate
        config: PathBuf,
    },
}

impl Cli {
    /// Run the CLI application
    pub async fn run() -> Result<()> {
        let cli = Cli::parse();
        cli.execute().await
    }

    /// Execute the parsed command
    async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Run {
                config,
                commands,
                timeout,
                poll_interval,
                stop_signal,
                stop_grace,
                json,
            } => {
                let settings = SupervisorSettings {
                    timeout: Duration::from_secs(timeout),
                    poll_interval: Duration::from_millis(poll_interval),
                    stop_signal,
                    stop_grace: Duration::from_secs(stop_grace),
                    ..SupervisorSettings::default()
                };
                run_supervised(config, commands, settings, json).await
            }
            Commands::Check { config } => check_config(&config),
        }
    }
}

/// Assemble launch specs, start everything, supervise to completion and
/// render the final report
async fn run_supervised(
    config: Option<PathBuf>,
    commands: Vec<String>,
    settings: SupervisorSettings,
    json: bool,
) -> Result<()> {
    let mut specs = Vec::new();

    if let Some(ref path) = config {
        specs.extend(LaunchSpec::from_file(path)?);
    }
    for line in &commands {
        specs.push(LaunchSpec::from_command_line(line)?);
    }

    if specs.is_empty() {
        return Err(CorralError::Config(
            "nothing to launch; provide a config file or --command".to_string(),
        ));
    }

    let mut supervisor = Supervisor::new(settings);

    // All requested processes are started immediately and unconditionally;
    // a failed launch is reported and the rest proceed
    let mut launched = 0usize;
    for spec in specs {
        let name = spec.name.clone();
        match supervisor.launch(spec).await {
            Ok(id) => {
                let pid = supervisor.get(id).map(|p| p.pid).unwrap_or_default();
                output::print_success(&format!("launched '{}' (id: {}, pid: {})", name, id, pid));
                launched += 1;
            }
            Err(e) => output::print_error(&format!("failed to launch '{}': {}", name, e)),
        }
    }

    if launched == 0 {
        return Err(CorralError::Launch(
            "no process could be launched".to_string(),
        ));
    }

    // Ctrl-c triggers the same halt sweep as an explicit stop
    let handle = supervisor.stop_handle();
    ctrlc::set_handler(move || handle.stop())
        .map_err(|e| CorralError::Signal(format!("Failed to install ctrl-c handler: {}", e)))?;

    let spinner = output::create_progress_bar(&format!("supervising {} process(es)", launched));

    match supervisor.monitor().await {
        Ok(reports) => {
            output::finish_progress_success(spinner, "all processes accounted for");
            if json {
                output::print_report_json(&reports)?;
            } else {
                output::print_report_table(&reports);
            }
            Ok(())
        }
        Err(e) => {
            output::finish_progress_error(spinner, "supervision aborted");
            Err(e)
        }
    }
}

/// Load and validate a configuration file, printing what it would launch
fn check_config(path: &Path) -> Result<()> {
    let specs = LaunchSpec::from_file(path)?;

    output::print_success(&format!(
        "{} valid launch spec(s) in {}",
        specs.len(),
        path.display()
    ));

    for spec in &specs {
        output::print_info(&format!(
            "{}: {} {}",
            spec.name,
            spec.command.display(),
            spec.args.join(" ")
        ));
    }

    Ok(())
}
