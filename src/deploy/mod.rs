// ABOUTME: Deployment orchestration using the type state pattern.
// ABOUTME: Exports state markers, the Deployment struct, the run driver, and the version gate.

mod deployment;
mod error;
mod runner;
mod state;
mod transitions;
mod version;

pub use deployment::{DeployOptions, Deployment};
pub use error::{DeployError, DeployErrorKind};
pub use runner::{RunReport, run};
pub use state::{
    Authenticated, Complete, ConfigFetched, Configured, Connected, DeploymentState, Idle,
    Packaged, Stage,
};
pub use transitions::TransitionResult;
pub use version::{CLI_VERSION, check_versions};
