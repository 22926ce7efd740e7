//! Async session support for tokio.
//!
//! [`AsyncChatSession`] runs loading and splitting on tokio's blocking pool
//! so an interactive front end stays responsive. Each operation works on an
//! immutable snapshot ([`Arc<LoadedArchive>`]) and returns a new value.
//!
//! Only the newest load counts: starting a load releases the current archive
//! at once, and a load that finishes after a newer one started is discarded
//! with [`ChatzipError::Superseded`].
//!
//! # Example
//!
//! ```rust,no_run
//! use chatzip::async_session::AsyncChatSession;
//! use chatzip::split::SplitOptions;
//!
//! # async fn example() -> chatzip::Result<()> {
//! let session = AsyncChatSession::new();
//! let loaded = session.load_file("WhatsApp Chat with Bob.zip").await?;
//! println!("{} messages", loaded.messages().len());
//!
//! let options = SplitOptions::from_inputs("2024-01-10", "2024-01-20")?;
//! let outcome = session.split(options).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Features
//!
//! This module requires the `async` feature to be enabled.

use std::io;
use std::path::Path;
use std::sync::Arc;

use tokio::sync::RwLock;
use tokio::task::JoinError;

use crate::config::ViewerConfig;
use crate::error::{ChatzipError, Result};
use crate::filter::{apply_filters, FilterConfig};
use crate::message::Message;
use crate::session::LoadedArchive;
use crate::split::{split_index, SplitOptions, SplitOutcome};

#[derive(Debug, Default)]
struct State {
    generation: u64,
    loaded: Option<Arc<LoadedArchive>>,
}

/// Async wrapper owning the currently loaded archive.
///
/// Cloning yields another handle to the same session.
#[derive(Debug, Clone, Default)]
pub struct AsyncChatSession {
    config: Arc<ViewerConfig>,
    state: Arc<RwLock<State>>,
}

fn task_failed(err: JoinError) -> ChatzipError {
    ChatzipError::Io(io::Error::other(err))
}

impl AsyncChatSession {
    /// Creates an empty session with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty session with custom configuration.
    pub fn with_config(config: ViewerConfig) -> Self {
        Self {
            config: Arc::new(config),
            state: Arc::default(),
        }
    }

    /// Reads an archive with tokio's async I/O and loads it.
    ///
    /// # Errors
    ///
    /// Returns [`ChatzipError::Io`] if the file cannot be read, otherwise
    /// the same errors as [`load_bytes`](Self::load_bytes).
    pub async fn load_file(&self, path: impl AsRef<Path>) -> Result<Arc<LoadedArchive>> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
        self.load_bytes(name, bytes).await
    }

    /// Loads an archive held in memory.
    ///
    /// The previous archive is released before work starts.
    ///
    /// # Errors
    ///
    /// Returns [`ChatzipError::ArchiveRead`] if the archive cannot be read
    /// and [`ChatzipError::Superseded`] if another load started meanwhile.
    pub async fn load_bytes(
        &self,
        name: impl Into<String>,
        bytes: impl Into<Arc<[u8]>>,
    ) -> Result<Arc<LoadedArchive>> {
        let name = name.into();
        let bytes: Arc<[u8]> = bytes.into();

        let generation = {
            let mut state = self.state.write().await;
            state.generation += 1;
            state.loaded = None;
            state.generation
        };

        let config = Arc::clone(&self.config);
        let build_name = name.clone();
        let loaded = tokio::task::spawn_blocking(move || {
            LoadedArchive::build(build_name, bytes, &config)
        })
        .await
        .map_err(task_failed)??;

        let mut state = self.state.write().await;
        if state.generation != generation {
            tracing::debug!(archive = name.as_str(), "discarding superseded load");
            return Err(ChatzipError::Superseded { name });
        }
        let loaded = Arc::new(loaded);
        state.loaded = Some(Arc::clone(&loaded));
        Ok(loaded)
    }

    /// Drops the loaded archive. Pending loads are invalidated too.
    pub async fn release(&self) {
        let mut state = self.state.write().await;
        state.generation += 1;
        state.loaded = None;
    }

    /// Returns the current archive snapshot, if any.
    pub async fn snapshot(&self) -> Option<Arc<LoadedArchive>> {
        self.state.read().await.loaded.clone()
    }

    /// Returns the messages passing `config`, cloned out of the snapshot.
    pub async fn filter(&self, config: &FilterConfig) -> Vec<Message> {
        match self.snapshot().await {
            Some(loaded) => apply_filters(loaded.messages().to_vec(), config),
            None => Vec::new(),
        }
    }

    /// Splits the current archive on the blocking pool.
    ///
    /// # Errors
    ///
    /// Returns [`ChatzipError::NotLoaded`] without an archive and
    /// [`ChatzipError::ArchiveWrite`] if the output cannot be assembled.
    pub async fn split(&self, options: SplitOptions) -> Result<SplitOutcome> {
        let loaded = self.snapshot().await.ok_or(ChatzipError::NotLoaded)?;
        tokio::task::spawn_blocking(move || {
            split_index(loaded.index(), loaded.messages(), &options)
        })
        .await
        .map_err(task_failed)?
    }
}
