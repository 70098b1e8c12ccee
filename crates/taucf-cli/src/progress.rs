//! Terminal progress for package installation, drawn with indicatif.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use taucf_runtime::ProgressReporter;

/// Shows install steps as a step counter with a spinner.
#[derive(Default)]
pub struct CliProgress {
    bar: Mutex<Option<ProgressBar>>,
}

impl CliProgress {
    pub fn new() -> Self {
        Self::default()
    }

    fn create_step_bar(total: u64) -> ProgressBar {
        let pb = ProgressBar::new(total);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{pos}/{len}] {msg}")
        {
            pb.set_style(style);
        }
        pb
    }

    fn create_spinner() -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}") {
            pb.set_style(style);
        }
        pb
    }
}

impl ProgressReporter for CliProgress {
    fn start(&self, message: &str, total: Option<u64>) {
        let pb = match total {
            Some(t) if t > 0 => Self::create_step_bar(t),
            _ => Self::create_spinner(),
        };
        pb.set_message(message.to_string());
        pb.enable_steady_tick(Duration::from_millis(120));
        *self.bar.lock().unwrap_or_else(PoisonError::into_inner) = Some(pb);
    }

    fn update(&self, current: u64, message: &str) {
        let guard = self.bar.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(pb) = guard.as_ref() {
            pb.set_position(current);
            pb.set_message(message.to_string());
        }
    }

    fn message(&self, msg: &str) {
        let guard = self.bar.lock().unwrap_or_else(PoisonError::into_inner);
        match guard.as_ref() {
            Some(pb) => pb.println(msg),
            None => println!("{msg}"),
        }
    }

    fn finish(&self, message: &str) {
        if let Some(pb) = self.bar.lock().unwrap_or_else(PoisonError::into_inner).take() {
            pb.finish_with_message(message.to_string());
        }
    }

    fn finish_with_error(&self, message: &str) {
        if let Some(pb) = self.bar.lock().unwrap_or_else(PoisonError::into_inner).take() {
            pb.abandon_with_message(message.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_progress_lifecycle() {
        let progress = CliProgress::new();
        progress.update(1, "ignored before start");
        progress.start("Installing libunwind", Some(5));
        progress.update(2, "Configuring");
        progress.finish("done");
        progress.finish_with_error("ignored after finish");
        assert!(progress.bar.lock().unwrap().is_none());
    }
}
