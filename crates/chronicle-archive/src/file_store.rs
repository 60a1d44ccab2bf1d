//! Filesystem-backed archive store.
//!
//! Writes archive artifacts under a configured root directory using the
//! canonical [`ArchivePaths`] layout and `file://` locators. By default
//! writes are staged: bytes go to a `.partial` sibling and the final
//! artifact appears only when the sink finishes, so an aborted operation
//! never publishes a half-written archive.

use async_trait::async_trait;
use bytes::Bytes;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;

use chronicle_core::archive_paths::ArchivePaths;
use chronicle_core::error::{Error, Result};
use chronicle_core::id::AggregateId;
use chronicle_core::storage::{ArchiveLocator, ArchiveSink, ArchiveStore};

/// Configuration for [`FileArchiveStore`].
#[derive(Debug, Clone)]
pub struct FileArchiveStoreConfig {
    /// Directory under which the `archives/` layout is rooted.
    pub root_dir: PathBuf,

    /// Stage writes through a `.partial` file, renaming into place on
    /// finish. Disable only for destinations where rename is unavailable.
    pub stage_writes: bool,
}

impl FileArchiveStoreConfig {
    /// Creates a config rooted at `root_dir` with staged writes enabled.
    #[must_use]
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
            stage_writes: true,
        }
    }
}

/// Archive store writing artifacts to the local filesystem.
#[derive(Debug, Clone)]
pub struct FileArchiveStore {
    config: FileArchiveStoreConfig,
}

impl FileArchiveStore {
    /// Creates a store with the given configuration.
    #[must_use]
    pub fn new(config: FileArchiveStoreConfig) -> Self {
        Self { config }
    }

    /// Returns the filesystem path an aggregate's artifact resolves to.
    #[must_use]
    pub fn archive_path(&self, aggregate_id: &AggregateId) -> PathBuf {
        self.config
            .root_dir
            .join(ArchivePaths::archive_file(aggregate_id))
    }

    fn locator_path(locator: &ArchiveLocator) -> Result<PathBuf> {
        locator
            .as_str()
            .strip_prefix("file://")
            .map(PathBuf::from)
            .ok_or_else(|| {
                Error::InvalidInput(format!(
                    "file store cannot open non-file locator: {locator}"
                ))
            })
    }

    fn staging_path(final_path: &Path) -> PathBuf {
        let mut staged = final_path.as_os_str().to_os_string();
        staged.push(ArchivePaths::STAGING_SUFFIX);
        PathBuf::from(staged)
    }
}

#[async_trait]
impl ArchiveStore for FileArchiveStore {
    fn resolve_locator(&self, aggregate_id: &AggregateId) -> ArchiveLocator {
        ArchiveLocator::new(format!("file://{}", self.archive_path(aggregate_id).display()))
    }

    async fn create(
        &self,
        locator: &ArchiveLocator,
        overwrite: bool,
        cancel: &CancellationToken,
    ) -> Result<Box<dyn ArchiveSink>> {
        let final_path = Self::locator_path(locator)?;
        let stage_writes = self.config.stage_writes;

        let open = async {
            if !overwrite
                && fs::try_exists(&final_path).await.map_err(|e| {
                    Error::sink_io_with_source(
                        format!("failed to probe {}", final_path.display()),
                        e,
                    )
                })?
            {
                return Err(Error::AlreadyExists(locator.to_string()));
            }

            if let Some(parent) = final_path.parent() {
                fs::create_dir_all(parent).await.map_err(|e| {
                    Error::sink_io_with_source(
                        format!("failed to create archive directory {}", parent.display()),
                        e,
                    )
                })?;
            }

            let write_path = if stage_writes {
                Self::staging_path(&final_path)
            } else {
                final_path.clone()
            };

            let file = fs::File::create(&write_path).await.map_err(|e| {
                Error::sink_io_with_source(
                    format!("failed to create archive file {}", write_path.display()),
                    e,
                )
            })?;

            let publish = stage_writes.then(|| (write_path, final_path.clone()));
            Ok::<_, Error>(FileSink {
                file: Some(file),
                publish,
            })
        };

        let sink = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(Error::Cancelled),
            res = open => res?,
        };

        Ok(Box::new(sink))
    }
}

struct FileSink {
    /// `None` once the sink has been finished.
    file: Option<fs::File>,
    /// Staging-to-final rename performed on finish, when staged.
    publish: Option<(PathBuf, PathBuf)>,
}

#[async_trait]
impl ArchiveSink for FileSink {
    async fn write(&mut self, chunk: Bytes) -> Result<()> {
        let file = self
            .file
            .as_mut()
            .ok_or_else(|| Error::sink_io("write after finish"))?;
        file.write_all(&chunk)
            .await
            .map_err(|e| Error::sink_io_with_source("failed to write archive chunk", e))
    }

    async fn finish(&mut self) -> Result<()> {
        let mut file = self
            .file
            .take()
            .ok_or_else(|| Error::sink_io("sink already finished"))?;

        file.flush()
            .await
            .map_err(|e| Error::sink_io_with_source("failed to flush archive file", e))?;
        file.sync_all()
            .await
            .map_err(|e| Error::sink_io_with_source("failed to sync archive file", e))?;
        drop(file);

        if let Some((staged, final_path)) = self.publish.take() {
            fs::rename(&staged, &final_path).await.map_err(|e| {
                Error::sink_io_with_source(
                    format!(
                        "failed to publish archive {} -> {}",
                        staged.display(),
                        final_path.display()
                    ),
                    e,
                )
            })?;
        }

        Ok(())
    }
}
