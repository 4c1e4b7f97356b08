// ABOUTME: Command module aggregator for the fastack CLI.
// ABOUTME: Re-exports deploy and create command handlers.

mod create;
mod deploy;

pub use create::create;
pub use deploy::{DeployArgs, deploy};
