//! Stored file retrieval
//!
//! Query results only carry the stored name of a file field. A
//! [`FileResolver`] turns such a name into a local file on demand.

use crate::transport::{HttpRequest, Method, Session};
use bulkapi_core::query::DOWNLOAD_SEGMENT;
use bulkapi_core::{Error, Result};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::info;

/// Resolves stored file names to local paths
pub trait FileResolver {
    /// Fetch the file named `name` into `dest_dir` and return its path
    fn resolve_file(&self, name: &str, dest_dir: &Path) -> Result<PathBuf>;
}

/// Downloads stored files from the API's download endpoint
#[derive(Debug, Clone)]
pub struct FileDownloader {
    session: Session,
}

impl FileDownloader {
    pub(crate) fn new(session: Session) -> Self {
        Self { session }
    }

    /// Download `file_name` into `dest_dir`.
    ///
    /// `file_name` is either a stored name (`vendor/ortho.tif`) or a full
    /// download url. The local file is named `local_name` if given, else the
    /// last segment of the stored name.
    pub fn download(
        &self,
        file_name: &str,
        dest_dir: &Path,
        local_name: Option<&str>,
    ) -> Result<PathBuf> {
        let stored = stored_name(file_name);
        if stored.is_empty() {
            return Err(Error::InvalidOperation(format!(
                "'{}' does not name a stored file",
                file_name
            )));
        }
        if !dest_dir.is_dir() {
            return Err(Error::Io(io::Error::new(
                io::ErrorKind::NotFound,
                format!("Local path {} does not exist.", dest_dir.display()),
            )));
        }

        let local_name = match local_name {
            Some(name) => name,
            None => stored.rsplit('/').next().unwrap_or(stored),
        };
        let target = dest_dir.join(local_name);

        let url = self.session.url(&format!("download/{}", stored));
        let response = self.session.execute(HttpRequest::new(Method::Get, url))?;
        fs::write(&target, &response.body)?;

        info!(
            file = stored,
            path = %target.display(),
            bytes = response.body.len(),
            "downloaded stored file"
        );
        Ok(target)
    }
}

impl FileResolver for FileDownloader {
    fn resolve_file(&self, name: &str, dest_dir: &Path) -> Result<PathBuf> {
        self.download(name, dest_dir, None)
    }
}

fn stored_name(file_name: &str) -> &str {
    match file_name.split_once(DOWNLOAD_SEGMENT) {
        Some((_, name)) => name,
        None => file_name.trim_start_matches('/'),
    }
}
