use corral::config::LaunchSpec;
use corral::process::{ProcessProbe, Supervisor, SupervisorSettings};
use std::time::Duration;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    println!("=== Corral Timeout Demo ===\n");

    // Tight timeout so the demo finishes quickly
    let settings = SupervisorSettings {
        timeout: Duration::from_secs(3),
        stop_grace: Duration::from_secs(2),
        ..SupervisorSettings::default()
    };
    let mut supervisor = Supervisor::new(settings);

    let mut runaway = LaunchSpec::new("runaway", "/bin/sleep");
    runaway.args = vec!["60".to_string()];
    let id = supervisor.launch(runaway).await?;
    let pid = supervisor.get(id).map(|p| p.pid).unwrap_or_default();

    println!("Launched 'runaway' (pid {}), will be terminated after 3s...\n", pid);

    let reports = supervisor.monitor().await?;

    for report in &reports {
        println!(
            "{} (pid {}): {} after {:?}",
            report.name, report.pid, report.state, report.runtime
        );
    }

    let mut probe = ProcessProbe::new();
    println!(
        "\npid {} alive after supervision: {}",
        pid,
        probe.is_alive(pid)
    );

    Ok(())
}
