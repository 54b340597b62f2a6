//! Progress bars for channel builds.

use channel::ProgressCallback;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::sync::Mutex;

const BAR_TEMPLATE: &str = "{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}";

/// One bar per channel, cleared when the channel finishes
pub struct ChannelBars {
    hidden: bool,
    current: Mutex<Option<ProgressBar>>,
}

impl ChannelBars {
    pub fn new(hidden: bool) -> Self {
        Self {
            hidden,
            current: Mutex::new(None),
        }
    }

    fn bar(&self, len: u64) -> ProgressBar {
        if self.hidden {
            return ProgressBar::hidden();
        }
        let bar = ProgressBar::new(len);
        if let Ok(style) = ProgressStyle::default_bar().template(BAR_TEMPLATE) {
            bar.set_style(style.progress_chars("=>-"));
        }
        bar
    }
}

impl ProgressCallback for ChannelBars {
    fn on_channel_start(&self, name: &str, files: usize) {
        let bar = self.bar(files as u64);
        bar.set_message(name.to_string());
        if let Ok(mut current) = self.current.lock() {
            *current = Some(bar);
        }
    }

    fn on_file_complete(&self, _path: &Path) {
        if let Ok(current) = self.current.lock()
            && let Some(bar) = current.as_ref()
        {
            bar.inc(1);
        }
    }

    fn on_channel_complete(&self, _name: &str, _succeeded: bool) {
        if let Ok(mut current) = self.current.lock()
            && let Some(bar) = current.take()
        {
            bar.finish_and_clear();
        }
    }
}
