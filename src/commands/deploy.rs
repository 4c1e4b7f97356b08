// ABOUTME: Deploy command implementation.
// ABOUTME: Builds the session and deployment from CLI arguments, runs it, and reports the outcome.

use fastack::archive::ReadStrategy;
use fastack::config::ConfigError;
use fastack::credentials::default_provider;
use fastack::deploy::{DeployOptions, Deployment, run};
use fastack::error::{Error, Result};
use fastack::output::Output;
use fastack::remote::{HttpTransport, Session, SessionSettings};
use fastack::types::AppName;
use fastack::walk::{WalkMode, WalkOptions};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

/// Arguments of `fastack deploy`.
pub struct DeployArgs {
    pub directory: PathBuf,
    pub app: Option<String>,
    pub server: String,
    pub lenient: bool,
    pub stream: bool,
    pub skip_version_check: bool,
    pub max_concurrency: usize,
}

impl DeployArgs {
    fn options(&self) -> DeployOptions {
        let mode = if self.lenient {
            WalkMode::Lenient
        } else {
            WalkMode::Strict
        };
        let read_strategy = if self.stream {
            ReadStrategy::Streaming
        } else {
            ReadStrategy::Buffered
        };

        DeployOptions {
            walk: WalkOptions::default()
                .mode(mode)
                .max_concurrency(self.max_concurrency),
            read_strategy,
            version_check: !self.skip_version_check,
        }
    }
}

/// Deploy one directory.
pub async fn deploy(args: DeployArgs, mut output: Output, cancel: CancellationToken) -> Result<()> {
    output.start_timer();

    let directory = match tokio::fs::canonicalize(&args.directory).await {
        Ok(path) if path.is_dir() => path,
        _ => return Err(Error::DirectoryNotFound(args.directory)),
    };

    let app = args
        .app
        .as_deref()
        .map(AppName::new)
        .transpose()
        .map_err(ConfigError::from)?;

    let transport = HttpTransport::new(&args.server)?;
    let session = Session::new(transport, SessionSettings::default());

    let mut deployment = Deployment::new(directory.clone(), session, args.options(), cancel);
    if let Some(app) = app {
        deployment = deployment.with_app(app);
    }

    output.progress(&format!(
        "Deploying {} via {}",
        directory.display(),
        args.server
    ));

    let credentials = default_provider();
    let report = run(deployment, credentials.as_ref(), &output).await;

    for warning in report.diagnostics.warnings() {
        output.warning(warning);
    }

    report.outcome?;

    if let Some(manifest) = &report.manifest {
        output.manifest(manifest);
    }
    let target = report
        .app
        .as_ref()
        .map(|app| app.to_string())
        .unwrap_or_else(|| directory.display().to_string());
    output.success(&format!("Deployed {target}"));
    Ok(())
}
