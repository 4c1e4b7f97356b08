// ABOUTME: Create command implementation.
// ABOUTME: Scaffolds a fastack.json for a new app in the current directory.

use fastack::config::init_config;
use fastack::error::Result;
use fastack::output::Output;
use std::env;

pub fn create(app_name: Option<String>, force: bool, output: &Output) -> Result<()> {
    let cwd = env::current_dir()?;
    let path = init_config(&cwd, app_name.as_deref(), force)?;
    output.success(&format!("Created {}", path.display()));
    Ok(())
}
