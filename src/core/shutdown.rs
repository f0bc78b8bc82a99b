// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/gripwatch

//! Out-of-band stop requests for the acquisition loop

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::info;

use crate::error::Result;

/// A stop request visible to the polling loop.
///
/// `is_requested` is polled between reads and must not block.
pub trait ShutdownSignal: Send + Sync {
    fn is_requested(&self) -> bool;

    /// Raise the request (controller side)
    fn request(&self) -> Result<()>;

    /// Reset so the next run starts clean
    fn clear(&self) -> Result<()>;

    fn describe(&self) -> String;
}

/// Presence of a file means "stop"; removing it means "ready"
#[derive(Debug, Clone)]
pub struct FileSignal {
    path: PathBuf,
}

impl FileSignal {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ShutdownSignal for FileSignal {
    fn is_requested(&self) -> bool {
        self.path.exists()
    }

    fn request(&self) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, "stop")?;
        info!("Stop requested via {:?}", self.path);
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                info!("Removed stop signal {:?}", self.path);
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn describe(&self) -> String {
        format!("file {:?}", self.path)
    }
}

/// In-process flag, e.g. raised by a Ctrl-C handler
#[derive(Debug, Clone, Default)]
pub struct FlagSignal {
    flag: Arc<AtomicBool>,
}

impl FlagSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared handle; storing `true` requests a stop
    pub fn handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.flag)
    }
}

impl ShutdownSignal for FlagSignal {
    fn is_requested(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    fn request(&self) -> Result<()> {
        self.flag.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.flag.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn describe(&self) -> String {
        "in-process flag".to_string()
    }
}
