//! Progress reporting for channel builds

use std::path::Path;

/// Receives progress updates while a channel is built.
///
/// Called from worker threads, so implementations take `&self`.
pub trait ProgressCallback: Send + Sync {
    /// Called once discovery has found `files` templates
    fn on_channel_start(&self, name: &str, files: usize);

    /// Called when one template has been processed, successfully or not
    fn on_file_complete(&self, path: &Path);

    /// Called when the channel has been joined and judged
    fn on_channel_complete(&self, name: &str, succeeded: bool);
}

/// No-op progress callback
pub struct NoProgress;

impl ProgressCallback for NoProgress {
    fn on_channel_start(&self, _name: &str, _files: usize) {}
    fn on_file_complete(&self, _path: &Path) {}
    fn on_channel_complete(&self, _name: &str, _succeeded: bool) {}
}
