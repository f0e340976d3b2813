//! Alert Adapters
//!
//! Concrete [`Notifier`] and [`LinkOpener`] implementations for the binary.

use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::ports::alerts::{LinkOpener, MatchAlert, Notifier, NotifyError};

/// Writes match alerts to the log
#[derive(Debug, Clone, Default)]
pub struct TracingNotifier;

#[async_trait]
impl Notifier for TracingNotifier {
    async fn notify_match(&self, alert: &MatchAlert) -> Result<(), NotifyError> {
        info!("🔔 {}: {} ({})", alert.title, alert.message, alert.url);
        Ok(())
    }
}

/// Ignores every url
#[derive(Debug, Clone, Default)]
pub struct NoopLinkOpener;

#[async_trait]
impl LinkOpener for NoopLinkOpener {
    async fn open_url(&self, url: &str) -> Result<(), NotifyError> {
        debug!("Link opening disabled, skipping {}", url);
        Ok(())
    }
}

/// Opens urls with the platform's default browser.
///
/// The opener process is spawned and reaped on a detached task, so a browser
/// that keeps the opener alive never stalls ingestion.
#[derive(Debug, Clone)]
pub struct BrowserLinkOpener {
    program: Option<String>,
    args: Vec<String>,
}

const NO_ARGS: &[&str] = &[];
const WINDOWS_START_ARGS: &[&str] = &["/C", "start", ""];

fn opener_command() -> Option<(&'static str, &'static [&'static str])> {
    if cfg!(target_os = "macos") {
        Some(("open", NO_ARGS))
    } else if cfg!(target_os = "windows") {
        Some(("cmd", WINDOWS_START_ARGS))
    } else if cfg!(unix) {
        Some(("xdg-open", NO_ARGS))
    } else {
        None
    }
}

impl Default for BrowserLinkOpener {
    fn default() -> Self {
        match opener_command() {
            Some((program, args)) => Self::with_command(program, args),
            None => Self {
                program: None,
                args: Vec::new(),
            },
        }
    }
}

impl BrowserLinkOpener {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `program args.. <url>` instead of the platform opener
    pub fn with_command(program: &str, args: &[&str]) -> Self {
        Self {
            program: Some(program.to_string()),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }
}

#[async_trait]
impl LinkOpener for BrowserLinkOpener {
    async fn open_url(&self, url: &str) -> Result<(), NotifyError> {
        if !(url.starts_with("https://") || url.starts_with("http://")) {
            return Err(NotifyError::Delivery(format!("refusing to open '{}'", url)));
        }

        let program = self
            .program
            .clone()
            .ok_or_else(|| NotifyError::Unsupported("no browser opener on this platform".to_string()))?;

        let mut child = Command::new(&program)
            .args(&self.args)
            .arg(url)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| NotifyError::Delivery(format!("{}: {}", program, e)))?;

        debug!("Opening {}", url);
        tokio::spawn(async move {
            match child.wait().await {
                Ok(status) if !status.success() => warn!("{} exited with {}", program, status),
                Ok(_) => {}
                Err(e) => warn!("{} did not finish: {}", program, e),
            }
        });
        Ok(())
    }
}
