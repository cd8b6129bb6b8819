pub mod builtins;
#[allow(clippy::module_inception)]
pub mod executor;
pub mod job_manager;
pub mod launch;

pub use executor::{run, RunOutcome};
