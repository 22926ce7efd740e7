//! Progress reporting for long-running operations.
//!
//! Splitting a large export can take a while. [`split_index`] and
//! [`split_archive`] accept a [`ProgressCallback`] that is invoked after each
//! entry is written to the output archive.
//!
//! [`split_index`]: crate::split::split_index
//! [`split_archive`]: crate::split::split_archive
//!
//! # Example
//!
//! ```rust
//! use chatzip::progress::{Progress, ProgressCallback};
//! use std::sync::Arc;
//!
//! let callback: ProgressCallback = Arc::new(|progress| {
//!     if let Some(pct) = progress.items_percentage() {
//!         println!("Written: {:.1}%", pct);
//!     }
//! });
//!
//! let sizes = [120u64, 4_000, 900];
//! let total: u64 = sizes.iter().sum();
//! let mut written = 0;
//! for (i, size) in sizes.iter().enumerate() {
//!     written += size;
//!     callback(Progress::new(written, Some(total), i + 1).with_items(sizes.len()));
//! }
//! ```

use std::sync::Arc;

/// Progress information for long-running operations.
///
/// For splits, items are output entries and bytes are uncompressed payload
/// bytes copied so far.
#[derive(Debug, Clone, Copy, Default)]
pub struct Progress {
    /// Number of bytes processed so far.
    pub bytes_processed: u64,

    /// Total bytes to process, if known.
    pub total_bytes: Option<u64>,

    /// Number of items (e.g., archive entries) processed so far.
    pub items_processed: usize,

    /// Total items to process, if known.
    pub total_items: Option<usize>,
}

impl Progress {
    /// Creates a new progress instance.
    pub fn new(bytes_processed: u64, total_bytes: Option<u64>, items_processed: usize) -> Self {
        Self {
            bytes_processed,
            total_bytes,
            items_processed,
            total_items: None,
        }
    }

    /// Creates a progress instance with total items.
    #[must_use]
    pub fn with_items(mut self, total_items: usize) -> Self {
        self.total_items = Some(total_items);
        self
    }

    /// Returns the progress as a percentage (0.0 - 100.0).
    ///
    /// Returns `None` if total bytes is not known.
    ///
    /// # Example
    ///
    /// ```rust
    /// use chatzip::progress::Progress;
    ///
    /// let progress = Progress::new(500, Some(1000), 50);
    /// assert_eq!(progress.percentage(), Some(50.0));
    ///
    /// let unknown = Progress::new(500, None, 50);
    /// assert_eq!(unknown.percentage(), None);
    /// ```
    pub fn percentage(&self) -> Option<f64> {
        self.total_bytes.map(|total| {
            if total == 0 {
                100.0
            } else {
                (self.bytes_processed as f64 / total as f64) * 100.0
            }
        })
    }

    /// Returns the items percentage (0.0 - 100.0).
    ///
    /// Returns `None` if total items is not known.
    pub fn items_percentage(&self) -> Option<f64> {
        self.total_items.map(|total| {
            if total == 0 {
                100.0
            } else {
                (self.items_processed as f64 / total as f64) * 100.0
            }
        })
    }

    /// Returns whether the operation is complete.
    ///
    /// Complete means every known item or byte total has been reached.
    pub fn is_complete(&self) -> bool {
        match (self.total_items, self.total_bytes) {
            (None, None) => false,
            (items, bytes) => {
                items.is_none_or(|total| self.items_processed >= total)
                    && bytes.is_none_or(|total| self.bytes_processed >= total)
            }
        }
    }

    /// Returns the remaining bytes to process.
    ///
    /// Returns `None` if total bytes is not known.
    pub fn remaining_bytes(&self) -> Option<u64> {
        self.total_bytes.map(|total| total.saturating_sub(self.bytes_processed))
    }
}

/// Callback type for receiving progress updates.
///
/// This is a thread-safe callback that receives [`Progress`] updates
/// during long-running operations.
///
/// # Example
///
/// ```rust
/// use chatzip::progress::{Progress, ProgressCallback};
/// use std::sync::Arc;
///
/// let callback: ProgressCallback = Arc::new(|progress| {
///     println!("Processed {} bytes", progress.bytes_processed);
/// });
///
/// // Call the callback
/// callback(Progress::new(1000, Some(2000), 10));
/// ```
pub type ProgressCallback = Arc<dyn Fn(Progress) + Send + Sync>;

/// Creates a no-op progress callback.
///
/// This is useful when you don't need progress updates but an API
/// requires a callback.
///
/// # Example
///
/// ```rust
/// use chatzip::progress::no_progress;
///
/// let callback = no_progress();
/// callback(chatzip::progress::Progress::default()); // Does nothing
/// ```
pub fn no_progress() -> ProgressCallback {
    Arc::new(|_| {})
}

/// Creates a progress callback that prints to stderr.
///
/// Used by the CLI for simple progress output.
///
/// # Example
///
/// ```rust
/// use chatzip::progress::{stderr_progress, Progress};
///
/// let callback = stderr_progress();
/// // Will print "Progress: 2/4 entries (50.0%)" to stderr
/// callback(Progress::new(500, Some(1000), 2).with_items(4));
/// ```
pub fn stderr_progress() -> ProgressCallback {
    Arc::new(|progress| {
        if let (Some(total), Some(pct)) = (progress.total_items, progress.items_percentage()) {
            eprintln!(
                "Progress: {}/{} entries ({:.1}%)",
                progress.items_processed, total, pct
            );
        }
    })
}
