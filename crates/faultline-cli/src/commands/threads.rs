//! Threads command - Capture a thread snapshot of this process
//!
//! Useful for checking project prefixes and the frame cap against real
//! symbol names before wiring the capturer into an application.

use std::path::Path;

use anyhow::Result;
use clap::Args;
use faultline_capture::{LaunchTracker, ProcessSnapshot, ThreadCapturer};
use faultline_core::{config::Config, domain::ThreadSendPolicy};

use crate::output::OutputFormat;

#[derive(Debug, Args)]
pub struct ThreadsCommand {
    /// Capture as if reporting an unhandled fault
    #[arg(long)]
    unhandled: bool,

    /// Override the configured send policy (always, unhandled_only, never)
    #[arg(long)]
    policy: Option<ThreadSendPolicy>,
}

impl ThreadsCommand {
    pub async fn execute(&self, format: OutputFormat, config_path: &Path) -> Result<()> {
        let formatter = format.formatter();
        let config = Config::load_or_default(config_path);

        let tracker = LaunchTracker::from_config(&config.launch);
        let mut capturer = ThreadCapturer::from_config(&config.threads);
        if let Some(policy) = self.policy {
            capturer = ThreadCapturer::new(policy, config.threads.project_packages.clone())
                .with_max_frames(config.threads.max_frames);
        }

        let state = capturer.capture(
            ProcessSnapshot::current_thread_only(),
            None,
            self.unhandled,
        );

        if format.is_json() {
            formatter.print_json(&serde_json::json!({
                "launching": tracker.is_launching(),
                "policy": capturer.policy(),
                "threads": state,
            }));
            return Ok(());
        }

        formatter.field("Launching", &tracker.is_launching().to_string());
        formatter.field("Policy", &capturer.policy().to_string());

        if state.is_empty() {
            formatter.info("No threads captured under this policy");
            return Ok(());
        }

        for thread in state.threads() {
            let marker = if thread.error_reporting_thread { " (reporting)" } else { "" };
            formatter.success(&format!(
                "Thread {} {}{}",
                thread.id,
                thread.name.as_deref().unwrap_or("<unnamed>"),
                marker
            ));
            for frame in thread.stacktrace.frames() {
                let location = match (&frame.file, frame.line_number) {
                    (Some(file), Some(line)) => format!(" at {file}:{line}"),
                    (Some(file), None) => format!(" at {file}"),
                    _ => String::new(),
                };
                let project = if frame.in_project == Some(true) { "*" } else { " " };
                formatter.info(&format!("{project} {}{location}", frame.method));
            }
        }

        Ok(())
    }
}
