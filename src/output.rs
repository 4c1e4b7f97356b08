// ABOUTME: Output formatting for CLI feedback.
// ABOUTME: Supports normal, quiet (CI), and JSON-lines output modes.

use serde::Serialize;
use std::path::Path;
use std::time::Instant;

use crate::archive::ArchiveManifest;
use crate::diagnostics::{Warning, WarningKind};

/// Output mode for CLI feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-friendly output with progress messages
    Normal,
    /// Minimal output for CI (only final result)
    Quiet,
    /// JSON lines for scripting
    Json,
}

impl OutputMode {
    /// Pick a mode from the global flags; `--json` wins over `--quiet`.
    pub fn from_flags(quiet: bool, json: bool) -> Self {
        match (quiet, json) {
            (_, true) => OutputMode::Json,
            (true, false) => OutputMode::Quiet,
            (false, false) => OutputMode::Normal,
        }
    }
}

/// Handles CLI output based on the configured mode.
#[derive(Debug)]
pub struct Output {
    mode: OutputMode,
    start_time: Option<Instant>,
}

impl Output {
    pub fn new(mode: OutputMode) -> Self {
        Self {
            mode,
            start_time: None,
        }
    }

    pub fn mode(&self) -> OutputMode {
        self.mode
    }

    /// Start timing an operation.
    pub fn start_timer(&mut self) {
        self.start_time = Some(Instant::now());
    }

    /// Get elapsed time since timer started.
    pub fn elapsed_secs(&self) -> f64 {
        self.start_time
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }

    fn duration(&self) -> Option<f64> {
        self.start_time.map(|_| self.elapsed_secs())
    }

    /// Print a progress message (suppressed in quiet/json mode).
    pub fn progress(&self, message: &str) {
        if self.mode == OutputMode::Normal {
            println!("{message}");
        }
    }

    /// Print a non-fatal warning.
    pub fn warning(&self, warning: &Warning) {
        match self.mode {
            OutputMode::Normal | OutputMode::Quiet => eprintln!("Warning: {warning}"),
            OutputMode::Json => emit_stderr(&WarningEvent::new(warning)),
        }
    }

    /// Describe the package that was built.
    pub fn manifest(&self, manifest: &ArchiveManifest) {
        match self.mode {
            OutputMode::Normal => {
                println!(
                    "  ✓ Packaged {} file(s) into {} ({} bytes, {} uncompressed)",
                    manifest.len(),
                    manifest.output_path().display(),
                    manifest.total_bytes(),
                    manifest.uncompressed_bytes()
                );
            }
            OutputMode::Quiet => {}
            OutputMode::Json => emit_stdout(&ManifestEvent {
                event: "manifest",
                manifest,
            }),
        }
    }

    /// Print a success message with optional timing.
    pub fn success(&self, message: &str) {
        match self.mode {
            OutputMode::Normal => {
                let elapsed = self.elapsed_secs();
                if elapsed > 0.0 {
                    println!("{message} ({:.1}s)", elapsed);
                } else {
                    println!("{message}");
                }
            }
            OutputMode::Quiet => {
                // Print only the essential result
                println!("{message}");
            }
            OutputMode::Json => emit_stdout(&JsonEvent {
                event: "success",
                message,
                duration_secs: self.duration(),
            }),
        }
    }

    /// Print an error message.
    pub fn error(&self, message: &str) {
        match self.mode {
            OutputMode::Normal | OutputMode::Quiet => {
                eprintln!("Error: {message}");
            }
            OutputMode::Json => emit_stderr(&JsonEvent {
                event: "error",
                message,
                duration_secs: self.duration(),
            }),
        }
    }
}

#[derive(Serialize)]
struct JsonEvent<'a> {
    event: &'a str,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    duration_secs: Option<f64>,
}

#[derive(Serialize)]
struct WarningEvent<'a> {
    event: &'a str,
    kind: WarningKind,
    path: &'a Path,
    message: String,
}

impl<'a> WarningEvent<'a> {
    fn new(warning: &'a Warning) -> Self {
        Self {
            event: "warning",
            kind: warning.kind(),
            path: warning.path(),
            message: warning.to_string(),
        }
    }
}

#[derive(Serialize)]
struct ManifestEvent<'a> {
    event: &'a str,
    manifest: &'a ArchiveManifest,
}

fn emit_stdout(event: &impl Serialize) {
    if let Ok(json) = serde_json::to_string(event) {
        println!("{json}");
    }
}

fn emit_stderr(event: &impl Serialize) {
    if let Ok(json) = serde_json::to_string(event) {
        eprintln!("{json}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn json_flag_wins() {
        assert_eq!(OutputMode::from_flags(true, true), OutputMode::Json);
        assert_eq!(OutputMode::from_flags(true, false), OutputMode::Quiet);
        assert_eq!(OutputMode::from_flags(false, false), OutputMode::Normal);
    }

    #[test]
    fn warning_event_carries_kind_and_path() {
        let warning = Warning::SkippedEntry {
            path: PathBuf::from("/srv/app/secret"),
            reason: "permission denied".to_string(),
        };
        let json = serde_json::to_value(WarningEvent::new(&warning)).unwrap();
        assert_eq!(json["event"], "warning");
        assert_eq!(json["kind"], "skipped_entry");
        assert_eq!(json["path"], "/srv/app/secret");
        assert_eq!(json["message"], "skipped /srv/app/secret: permission denied");
    }

    #[test]
    fn duration_only_after_timer_starts() {
        let mut output = Output::new(OutputMode::Json);
        assert!(output.duration().is_none());
        output.start_timer();
        assert!(output.duration().is_some());
    }
}
