use crate::output::is_quiet;
use crate::ui::{theme, Icons};
use indicatif::{HumanDuration, ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use std::time::Duration;

/// Scan progress bar on stderr.
///
/// Hidden when disabled, when stderr is not a terminal, or when
/// `ROUTEMAP_QUIET` is set; a hidden bar accepts every call as a no-op.
pub struct ScanProgress {
    bar: ProgressBar,
    visible: bool,
}

impl ScanProgress {
    pub fn new(total_files: usize, enabled: bool) -> Self {
        let visible = enabled && !is_quiet() && console::Term::stderr().is_term();
        let bar = if visible {
            let bar = ProgressBar::new(total_files as u64).with_message("Extracting");
            if let Ok(style) = ProgressStyle::with_template("{spinner} [{bar:30}] {pos}/{len} {wide_msg}") {
                bar.set_style(style.progress_chars("=> "));
            }
            bar.enable_steady_tick(Duration::from_millis(100));
            bar
        } else {
            ProgressBar::hidden()
        };
        Self { bar, visible }
    }

    pub fn advance(&self, file_key: &str) {
        self.bar.inc(1);
        if self.visible {
            self.bar.set_message(file_key.to_string());
        }
    }

    pub fn finish(&self, files: usize, failures: usize, elapsed: Duration) {
        self.bar.finish_and_clear();
        if !self.visible {
            return;
        }
        eprintln!(
            "{} {}",
            Icons::CHECK.style(theme().success.clone()),
            format!("Scanned in {}", HumanDuration(elapsed)).style(theme().success.clone())
        );
        eprintln!(
            "  {} {}  {} {}",
            Icons::FILE.style(theme().info.clone()),
            files,
            Icons::WARN.style(theme().warn.clone()),
            failures
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_progress_is_hidden() {
        let progress = ScanProgress::new(3, false);
        assert!(!progress.visible);
        progress.advance("a.py");
        progress.finish(1, 0, Duration::from_millis(5));
        assert!(progress.bar.is_finished());
    }
}
