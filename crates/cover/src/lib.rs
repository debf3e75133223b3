//! Menu cover art.
//!
//! The cover is a small text file loaded once at start-up, off the game
//! thread. Loading never blocks the game: the caller polls the returned
//! [`CoverFetch`] each frame and draws the placeholder until (and unless) the
//! real art arrives. A failed load is logged once and falls back to the
//! placeholder; there are no retries.

use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::oneshot;

/// Largest cover accepted, in lines. Longer files are truncated.
pub const MAX_LINES: usize = 12;
/// Widest cover line accepted, in characters.
pub const MAX_WIDTH: usize = 48;
/// How long a load may take before the placeholder is used instead.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);

const PLACEHOLDER: [&str; 5] = [
    "+---+---+---+",
    "| 4 | 9 | 2 |",
    "| 3 | 5 | 7 |",
    "| 8 | 1 | 6 |",
    "+---+---+---+",
];

#[derive(Debug, Error)]
pub enum CoverError {
    #[error("failed to read cover art {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cover art {0} has no visible content")]
    Empty(PathBuf),
    #[error("cover art load timed out after {0:?}")]
    Timeout(Duration),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoverSource {
    File(PathBuf),
    Placeholder,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverArt {
    lines: Vec<String>,
    source: CoverSource,
}

impl CoverArt {
    pub fn placeholder() -> Self {
        Self {
            lines: PLACEHOLDER.iter().map(|l| l.to_string()).collect(),
            source: CoverSource::Placeholder,
        }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn source(&self) -> &CoverSource {
        &self.source
    }

    pub fn is_placeholder(&self) -> bool {
        self.source == CoverSource::Placeholder
    }

    /// Build cover art from file text.
    ///
    /// Tabs become spaces, trailing whitespace and surrounding blank lines
    /// are dropped, and the result is clipped to `MAX_LINES` x `MAX_WIDTH`.
    pub fn from_text(text: &str, path: &Path) -> Result<Self, CoverError> {
        let mut lines: Vec<String> = text
            .lines()
            .map(|l| {
                l.replace('\t', "    ")
                    .trim_end()
                    .chars()
                    .take(MAX_WIDTH)
                    .collect::<String>()
            })
            .collect();

        while lines.last().is_some_and(|l| l.is_empty()) {
            lines.pop();
        }
        let leading = lines.iter().take_while(|l| l.is_empty()).count();
        lines.drain(..leading);
        lines.truncate(MAX_LINES);

        if lines.is_empty() {
            return Err(CoverError::Empty(path.to_path_buf()));
        }
        Ok(Self {
            lines,
            source: CoverSource::File(path.to_path_buf()),
        })
    }
}

impl Default for CoverArt {
    fn default() -> Self {
        Self::placeholder()
    }
}

/// Read cover art from `path`, giving up after `limit`.
pub async fn load(path: &Path, limit: Duration) -> Result<CoverArt, CoverError> {
    let text = tokio::time::timeout(limit, tokio::fs::read_to_string(path))
        .await
        .map_err(|_| CoverError::Timeout(limit))?
        .map_err(|source| CoverError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    CoverArt::from_text(&text, path)
}

/// Load cover art, falling back to the placeholder on any failure.
pub async fn load_or_placeholder(path: Option<&Path>, limit: Duration) -> CoverArt {
    let Some(path) = path else {
        log::debug!("no cover art configured, using placeholder");
        return CoverArt::placeholder();
    };
    match load(path, limit).await {
        Ok(art) => {
            log::debug!("loaded cover art from {} ({} lines)", path.display(), art.lines.len());
            art
        }
        Err(e) => {
            log::warn!("{}; using placeholder", e);
            CoverArt::placeholder()
        }
    }
}

/// Cover path from `SUMTILES_COVER`, if set and non-empty.
pub fn path_from_env() -> Option<PathBuf> {
    std::env::var_os("SUMTILES_COVER")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

/// Handle to an in-flight background cover load.
pub struct CoverFetch {
    rx: Option<oneshot::Receiver<CoverArt>>,
}

impl CoverFetch {
    /// Take the loaded art once it is ready.
    ///
    /// Returns `Some` exactly once. If the loader died without answering,
    /// that single answer is the placeholder.
    pub fn try_take(&mut self) -> Option<CoverArt> {
        let rx = self.rx.as_mut()?;
        match rx.try_recv() {
            Ok(art) => {
                self.rx = None;
                Some(art)
            }
            Err(oneshot::error::TryRecvError::Empty) => None,
            Err(oneshot::error::TryRecvError::Closed) => {
                self.rx = None;
                log::warn!("cover loader exited without a result; using placeholder");
                Some(CoverArt::placeholder())
            }
        }
    }

    pub fn is_pending(&self) -> bool {
        self.rx.is_some()
    }
}

/// Start loading cover art on a background thread.
///
/// The thread owns a single-threaded tokio runtime for the duration of the
/// load and exits once the result has been handed over.
pub fn fetch_cover_image(path: Option<PathBuf>, limit: Duration) -> CoverFetch {
    let (tx, rx) = oneshot::channel();

    let spawned = thread::Builder::new()
        .name("sumtiles-cover".into())
        .spawn(move || {
            let art = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(rt) => rt.block_on(load_or_placeholder(path.as_deref(), limit)),
                Err(e) => {
                    log::warn!("cover runtime unavailable: {}; using placeholder", e);
                    CoverArt::placeholder()
                }
            };
            let _ = tx.send(art);
        });

    if let Err(e) = spawned {
        // The closure, and with it `tx`, is gone: `try_take` yields the placeholder.
        log::warn!("failed to spawn cover loader: {}", e);
    }

    CoverFetch { rx: Some(rx) }
}
