use std::io::SeekFrom;
use std::path::Path;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio::sync::Mutex;

use super::RangeReader;
use crate::error::IoError;

/// Local-file implementation of RangeReader.
///
/// The file size is captured once at open. Reads seek and read under a
/// mutex, so one reader can be shared by reference across the parser and
/// the tile loop. The file handle is closed when the reader is dropped.
pub struct LocalFileReader {
    file: Mutex<File>,
    size: u64,
    identifier: String,
}

impl LocalFileReader {
    /// Open a file for positioned reads.
    ///
    /// Fails with `NotFound` for missing paths and for paths that are not
    /// regular files (directories, sockets).
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, IoError> {
        let path = path.as_ref();
        let identifier = path.display().to_string();

        let file = File::open(path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => IoError::NotFound(identifier.clone()),
            _ => IoError::Read(format!("{}: {}", identifier, e)),
        })?;

        let metadata = file
            .metadata()
            .await
            .map_err(|e| IoError::Read(format!("{}: {}", identifier, e)))?;

        if !metadata.is_file() {
            return Err(IoError::NotFound(identifier));
        }

        Ok(Self {
            file: Mutex::new(file),
            size: metadata.len(),
            identifier,
        })
    }
}

#[async_trait]
impl RangeReader for LocalFileReader {
    async fn read_exact_at(&self, offset: u64, len: usize) -> Result<Bytes, IoError> {
        let end = offset.checked_add(len as u64);
        if end.map_or(true, |end| end > self.size) {
            return Err(IoError::RangeOutOfBounds {
                offset,
                requested: len as u64,
                size: self.size,
            });
        }

        if len == 0 {
            return Ok(Bytes::new());
        }

        let mut file = self.file.lock().await;
        file.seek(SeekFrom::Start(offset))
            .await
            .map_err(|e| IoError::Read(format!("{}: {}", self.identifier, e)))?;

        let mut buf = BytesMut::zeroed(len);
        file.read_exact(&mut buf)
            .await
            .map_err(|e| IoError::Read(format!("{}: {}", self.identifier, e)))?;

        Ok(buf.freeze())
    }

    fn size(&self) -> u64 {
        self.size
    }

    fn identifier(&self) -> &str {
        &self.identifier
    }
}
