//! Progress reporting utilities using indicatif.
//!
//! [`ProgressCallback`] is the hook the finder calls while it works;
//! [`Progress`] implements it with a spinner while walking and a bar over
//! size-classes while comparing.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use bytesize::ByteSize;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

/// Progress callback for duplicate finding phases.
///
/// Implement this trait to receive progress updates during
/// the duplicate detection pipeline. Phases are `"walking"` (total unknown,
/// reported as 0) and `"comparing"` (total = number of size-classes).
pub trait ProgressCallback: Send + Sync {
    /// Called when a phase starts.
    ///
    /// # Arguments
    ///
    /// * `phase` - Name of the phase
    /// * `total` - Total number of items to process, 0 if unknown
    fn on_phase_start(&self, phase: &str, total: usize);

    /// Called for each item processed.
    ///
    /// # Arguments
    ///
    /// * `current` - Number of items processed so far (1-based)
    /// * `item` - Description of the item just processed
    fn on_progress(&self, current: usize, item: &str);

    /// Called when an item has been processed, with the bytes it read.
    fn on_item_completed(&self, _bytes: u64) {}

    /// Called when a phase completes.
    fn on_phase_end(&self, phase: &str);

    /// Called to update the progress message.
    fn on_message(&self, _message: &str) {}
}

/// Progress reporter using indicatif.
pub struct Progress {
    multi: MultiProgress,
    walking: Mutex<Option<ProgressBar>>,
    comparing: Mutex<Option<ProgressBar>>,
    bytes_read: AtomicU64,
    quiet: bool,
}

impl Progress {
    /// Create a new progress reporter.
    ///
    /// # Arguments
    ///
    /// * `quiet` - If true, no progress bars will be displayed.
    ///
    /// # Examples
    ///
    /// ```
    /// use blockdupe::progress::Progress;
    ///
    /// let progress = Progress::new(false);
    /// ```
    #[must_use]
    pub fn new(quiet: bool) -> Self {
        Self {
            multi: MultiProgress::new(),
            walking: Mutex::new(None),
            comparing: Mutex::new(None),
            bytes_read: AtomicU64::new(0),
            quiet,
        }
    }

    /// Bytes reported through [`ProgressCallback::on_item_completed`].
    #[must_use]
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read.load(Ordering::Relaxed)
    }

    fn walking_style() -> ProgressStyle {
        ProgressStyle::with_template("{spinner:.green} {msg} [{elapsed_precise}] {pos} files")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
    }

    fn comparing_style() -> ProgressStyle {
        ProgressStyle::with_template(
            "[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} size-classes {msg} (ETA: {eta})",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█>-")
    }

    fn active(&self) -> Option<ProgressBar> {
        lock(&self.comparing)
            .clone()
            .or_else(|| lock(&self.walking).clone())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ProgressCallback for Progress {
    fn on_phase_start(&self, phase: &str, total: usize) {
        if self.quiet {
            return;
        }

        match phase {
            "walking" => {
                let pb = self.multi.add(ProgressBar::new_spinner());
                pb.set_style(Self::walking_style());
                pb.set_message("Collecting files");
                pb.enable_steady_tick(Duration::from_millis(100));
                *lock(&self.walking) = Some(pb);
            }
            "comparing" => {
                let pb = self.multi.add(ProgressBar::new(total as u64));
                pb.set_style(Self::comparing_style());
                *lock(&self.comparing) = Some(pb);
            }
            other => log::trace!("No progress bar for phase {}", other),
        }
    }

    fn on_progress(&self, current: usize, item: &str) {
        if self.quiet {
            return;
        }

        if let Some(pb) = lock(&self.comparing).as_ref() {
            pb.set_position(current as u64);
            pb.set_message(format!("{} read", ByteSize::b(self.bytes_read())));
        } else if let Some(pb) = lock(&self.walking).as_ref() {
            pb.set_position(current as u64);
            pb.set_message(truncate_path(item, 40));
        }
    }

    fn on_item_completed(&self, bytes: u64) {
        self.bytes_read.fetch_add(bytes, Ordering::Relaxed);
    }

    fn on_phase_end(&self, phase: &str) {
        if self.quiet {
            return;
        }

        match phase {
            "walking" => {
                if let Some(pb) = lock(&self.walking).take() {
                    pb.finish_with_message("Collection complete");
                }
            }
            "comparing" => {
                if let Some(pb) = lock(&self.comparing).take() {
                    pb.finish_with_message(format!(
                        "Comparison complete, {} read",
                        ByteSize::b(self.bytes_read())
                    ));
                }
            }
            _ => {}
        }
    }

    fn on_message(&self, message: &str) {
        if self.quiet {
            return;
        }
        if let Some(pb) = self.active() {
            pb.set_message(message.to_string());
        }
    }
}

/// Shorten a path for display, keeping the file name.
fn truncate_path(path: &str, max_len: usize) -> String {
    if path.chars().count() <= max_len {
        return path.to_string();
    }

    let file_name = std::path::Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    let name_len = file_name.chars().count();
    if name_len + 4 > max_len {
        let tail: String = file_name.chars().skip(name_len + 3 - max_len).collect();
        return format!("...{tail}");
    }

    format!(".../{file_name}")
}
