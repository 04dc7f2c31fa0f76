// Process module - supervised process lifecycle

mod liveness;
mod supervisor;
mod types;

pub mod spawner;

pub use liveness::ProcessProbe;
pub use spawner::{spawn_process, SpawnedProcess};
pub use supervisor::{StopHandle, Supervisor, SupervisorSettings};
pub use types::{ExitReport, ProcessState, TrackedId, TrackedProcess};
