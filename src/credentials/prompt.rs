// ABOUTME: Interactive username/password prompt on the controlling terminal.
// ABOUTME: Disables terminal echo while the password is typed.

use async_trait::async_trait;
use std::io::{self, BufRead, Write};

use super::{CredentialError, CredentialProvider, Credentials};

/// Prompts on stderr and reads answers from stdin.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalPrompt;

impl TerminalPrompt {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CredentialProvider for TerminalPrompt {
    async fn credentials(&self) -> Result<Credentials, CredentialError> {
        tokio::task::spawn_blocking(|| {
            let username = prompt_line("Username: ")?;
            let password = prompt_hidden("Password: ")?;
            Credentials::new(username, password)
        })
        .await
        .map_err(|e| CredentialError::Prompt(e.to_string()))?
    }
}

fn prompt_line(label: &str) -> io::Result<String> {
    let mut stderr = io::stderr();
    stderr.write_all(label.as_bytes())?;
    stderr.flush()?;
    read_line()
}

fn read_line() -> io::Result<String> {
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

#[cfg(unix)]
mod echo {
    use nix::sys::termios::{self, LocalFlags, SetArg, Termios};
    use std::os::fd::AsFd;
    use std::sync::Mutex;

    /// Terminal attributes from before echo was switched off.
    ///
    /// Kept outside the prompting thread so a cancelled prompt can still be
    /// undone while that thread sits blocked on input.
    static SUSPENDED: Mutex<Option<Termios>> = Mutex::new(None);

    /// Turn off echo on `fd`, remembering the previous attributes.
    ///
    /// Returns `Ok(false)` when `fd` is not a terminal.
    pub(super) fn suspend<Fd: AsFd>(fd: Fd) -> nix::Result<bool> {
        let Ok(original) = termios::tcgetattr(&fd) else {
            return Ok(false);
        };
        let mut hidden = original.clone();
        hidden.local_flags.remove(LocalFlags::ECHO);
        hidden.local_flags.insert(LocalFlags::ECHONL);

        let mut suspended = SUSPENDED.lock().unwrap_or_else(|e| e.into_inner());
        termios::tcsetattr(&fd, SetArg::TCSANOW, &hidden)?;
        *suspended = Some(original);
        Ok(true)
    }

    /// Put back the attributes saved by `suspend`. Does nothing when echo
    /// is not currently suspended.
    pub(super) fn resume<Fd: AsFd>(fd: Fd) -> nix::Result<()> {
        let mut suspended = SUSPENDED.lock().unwrap_or_else(|e| e.into_inner());
        match suspended.take() {
            Some(original) => termios::tcsetattr(&fd, SetArg::TCSANOW, &original),
            None => Ok(()),
        }
    }
}

#[cfg(unix)]
fn prompt_hidden(label: &str) -> io::Result<String> {
    // Not a terminal (piped input): nothing to hide.
    if !echo::suspend(io::stdin()).map_err(io::Error::from)? {
        return prompt_line(label);
    }
    let answer = prompt_line(label);
    restore_terminal();
    answer
}

#[cfg(not(unix))]
fn prompt_hidden(label: &str) -> io::Result<String> {
    prompt_line(label)
}

/// Turn terminal echo back on if a password prompt left it off.
///
/// Call before exiting when a run may have been interrupted mid-prompt.
#[cfg(unix)]
pub fn restore_terminal() {
    if let Err(e) = echo::resume(io::stdin()) {
        tracing::warn!("Failed to restore terminal echo: {}", e);
    }
}

#[cfg(not(unix))]
pub fn restore_terminal() {}
