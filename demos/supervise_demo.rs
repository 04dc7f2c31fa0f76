use corral::config::LaunchSpec;
use corral::process::{Supervisor, SupervisorSettings};
use std::time::Duration;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    println!("=== Corral Supervision Demo ===\n");

    let settings = SupervisorSettings {
        timeout: Duration::from_secs(5),
        ..SupervisorSettings::default()
    };
    let mut supervisor = Supervisor::new(settings);

    println!("Launching processes...");

    let mut quick = LaunchSpec::new("quick", "/bin/sh");
    quick.args = vec!["-c".to_string(), "echo 'quick job done'; exit 0".to_string()];
    supervisor.launch(quick).await?;

    let mut napper = LaunchSpec::new("napper", "/bin/sleep");
    napper.args = vec!["2".to_string()];
    supervisor.launch(napper).await?;

    // A failed launch is reported and skipped; supervision continues
    let ghost = LaunchSpec::new("ghost", "/nonexistent/tool");
    if supervisor.launch(ghost).await.is_err() {
        println!("  - 'ghost' failed to launch (expected)");
    }

    println!(
        "  {} process(es) under supervision\n",
        supervisor.tracked_count()
    );

    let reports = supervisor.monitor().await?;

    println!("\n=== Final Report ===");
    for report in &reports {
        println!(
            "  {} (pid {}): {} after {:?} (exit code: {:?})",
            report.name, report.pid, report.state, report.runtime, report.exit_code
        );
    }

    Ok(())
}
