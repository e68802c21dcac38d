use std::fmt::Display;
use std::io::{ErrorKind, SeekFrom};
use std::path::{Path, PathBuf};

use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use tokio::sync::Mutex;
use tracing::warn;

use crate::{LedgerError, LedgerResult};

/// Shared append target. One call writes one whole line while holding the lock.
#[derive(Debug)]
pub(crate) struct LineSink {
    path: PathBuf,
    file: Mutex<Option<File>>,
}

impl LineSink {
    pub(crate) fn new(path: PathBuf) -> Self {
        Self {
            path,
            file: Mutex::new(None),
        }
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    /// Appends `line` plus a newline. A handle that fails a write is dropped, so
    /// the next append reopens the file and starts a fresh line.
    pub(crate) async fn append_line(&self, line: &str) -> LedgerResult<()> {
        let mut guard = self.file.lock().await;
        let (mut file, mid_line) = match guard.take() {
            Some(file) => (file, false),
            None => self.open_for_append().await?,
        };

        let mut record = String::with_capacity(line.len() + 2);
        if mid_line {
            record.push('\n');
        }
        record.push_str(line);
        record.push('\n');

        let written = async {
            file.write_all(record.as_bytes()).await?;
            file.flush().await
        }
        .await;
        match written {
            Ok(()) => {
                *guard = Some(file);
                Ok(())
            }
            Err(error) => {
                warn!(path = %self.path.display(), %error, "append failed; reopening on next write");
                Err(error.into())
            }
        }
    }

    /// Empties the file. Later appends reopen it.
    pub(crate) async fn reset(&self) -> LedgerResult<()> {
        let mut guard = self.file.lock().await;
        *guard = None;
        let truncated = async {
            self.create_parent().await?;
            OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&self.path)
                .await
        }
        .await;
        truncated.map_err(|error| LedgerError::Reset {
            path: self.path.clone(),
            reason: error.to_string(),
        })?;
        Ok(())
    }

    /// Runs a synchronous reader over the sink's file on the blocking pool.
    pub(crate) async fn load_blocking<T, E, F>(&self, read: F) -> LedgerResult<T>
    where
        F: FnOnce(&Path) -> Result<T, E> + Send + 'static,
        T: Send + 'static,
        E: Display + Send + 'static,
    {
        let path = self.path.clone();
        let loaded = tokio::task::spawn_blocking(move || read(&path))
            .await
            .map_err(|error| LedgerError::Load {
                path: self.path.clone(),
                reason: error.to_string(),
            })?;
        loaded.map_err(|error| LedgerError::Load {
            path: self.path.clone(),
            reason: format!("{error:#}"),
        })
    }

    async fn create_parent(&self) -> std::io::Result<()> {
        match self.path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            Some(parent) => tokio::fs::create_dir_all(parent).await,
            None => Ok(()),
        }
    }

    /// Opens in append mode and reports whether the file ends mid-line.
    async fn open_for_append(&self) -> LedgerResult<(File, bool)> {
        self.create_parent().await?;
        let mid_line = ends_mid_line(&self.path).await?;
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        Ok((file, mid_line))
    }
}

async fn ends_mid_line(path: &Path) -> std::io::Result<bool> {
    let mut file = match File::open(path).await {
        Ok(file) => file,
        Err(error) if error.kind() == ErrorKind::NotFound => return Ok(false),
        Err(error) => return Err(error),
    };
    if file.metadata().await?.len() == 0 {
        return Ok(false);
    }
    file.seek(SeekFrom::End(-1)).await?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last).await?;
    Ok(last[0] != b'\n')
}
