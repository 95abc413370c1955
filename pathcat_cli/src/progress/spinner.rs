use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Spinner shown on stderr while a catalog is being built
pub struct CrawlSpinner {
    bar: Option<ProgressBar>,
}

impl CrawlSpinner {
    /// Start a spinner; a disabled spinner does nothing
    pub fn start(enabled: bool, message: String) -> Self {
        if !enabled {
            return Self { bar: None };
        }

        let bar = ProgressBar::new_spinner();
        if let Ok(style) =
            ProgressStyle::default_spinner().template("{spinner:.green} {msg} [{elapsed}]")
        {
            bar.set_style(style);
        }
        bar.set_message(message);
        bar.enable_steady_tick(Duration::from_millis(100));
        Self { bar: Some(bar) }
    }

    pub fn is_enabled(&self) -> bool {
        self.bar.is_some()
    }

    pub fn set_message(&self, message: String) {
        if let Some(bar) = &self.bar {
            bar.set_message(message);
        }
    }

    /// Remove the spinner from the terminal
    pub fn finish(self) {
        if let Some(bar) = self.bar {
            bar.finish_and_clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_spinner_is_inert() {
        let spinner = CrawlSpinner::start(false, "Crawling".to_string());
        assert!(!spinner.is_enabled());
        spinner.set_message("still crawling".to_string());
        spinner.finish();
    }

    #[test]
    fn test_enabled_spinner_finishes() {
        let spinner = CrawlSpinner::start(true, "Crawling".to_string());
        assert!(spinner.is_enabled());
        spinner.finish();
    }
}
