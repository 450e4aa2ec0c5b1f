use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use http::StatusCode;
use tracing::{debug, info, warn};

use crate::protocol::{CrawlPath, CrawlResult, SinkError};
use crate::sink::ResultSink;

const INDEX_FILE: &str = "index.html";

/// Saves the body of every `200` response below a root directory.
///
/// The file location mirrors the percent-decoded request path with its leading slash
/// stripped, so `/wiki/Main%20Page` lands in `<root>/wiki/Main Page`. Paths ending in
/// a slash are stored as `index.html`. Responses with another status, paths that would
/// escape the root and paths clashing with an already saved one (`/a` then `/a/b`) are
/// recorded as missing instead.
#[derive(Debug)]
pub struct FileSink {
    root: PathBuf,
    missing: Mutex<Vec<(CrawlPath, StatusCode)>>,
}

impl FileSink {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into(), missing: Mutex::new(Vec::new()) }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn lock(&self) -> MutexGuard<'_, Vec<(CrawlPath, StatusCode)>> {
        self.missing.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Paths that were not saved, with the status they were answered with.
    pub fn missing(&self) -> Vec<(CrawlPath, StatusCode)> {
        self.lock().clone()
    }

    /// Maps a request path onto a file below the root.
    pub fn target(&self, path: &CrawlPath) -> Result<PathBuf, SinkError> {
        let decoded = String::from_utf8(percent_decode(path.as_str()))
            .map_err(|e| SinkError::rejected(path, format!("not utf-8 once decoded: {}", e.utf8_error())))?;

        if decoded.contains('\0') {
            return Err(SinkError::rejected(path, "contains a nul byte"));
        }

        let relative = decoded.trim_start_matches('/');
        let mut target = self.root.clone();
        for component in Path::new(relative).components() {
            match component {
                Component::Normal(part) => target.push(part),
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                    return Err(SinkError::rejected(path, "escapes the output directory"));
                }
            }
        }

        if relative.is_empty() || relative.ends_with('/') {
            target.push(INDEX_FILE);
        }
        Ok(target)
    }

    fn save(&self, result: &CrawlResult) -> Result<PathBuf, SinkError> {
        let target = self.target(&result.path)?;
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|e| storage_error(&result.path, e))?;
        }
        fs::write(&target, &result.body).map_err(|e| storage_error(&result.path, e))?;
        Ok(target)
    }
}

/// A path that clashes with an already saved file or directory, e.g. `/a` and `/a/b`,
/// is rejected. Any other io error stays fatal.
fn storage_error(path: &CrawlPath, e: io::Error) -> SinkError {
    match e.kind() {
        io::ErrorKind::AlreadyExists | io::ErrorKind::NotADirectory | io::ErrorKind::IsADirectory => {
            SinkError::rejected(path, format!("collides with a saved path: {e}"))
        }
        _ => e.into(),
    }
}

impl ResultSink for FileSink {
    fn accept(&self, result: CrawlResult) -> Result<(), SinkError> {
        if result.status != StatusCode::OK {
            debug!(path = %result.path, status = result.status.as_u16(), "not saved");
            self.lock().push((result.path, result.status));
            return Ok(());
        }

        match self.save(&result) {
            Ok(target) => {
                debug!(path = %result.path, file = %target.display(), bytes = result.body.len(), "saved");
                Ok(())
            }
            Err(e @ SinkError::Rejected { .. }) => {
                warn!(cause = %e, "not saved");
                self.lock().push((result.path, result.status));
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    fn finish(&self) -> Result<(), SinkError> {
        let missing = self.lock();
        if missing.is_empty() {
            info!(root = %self.root.display(), "all results saved");
            return Ok(());
        }

        for (path, status) in missing.iter() {
            warn!(path = %path, status = status.as_u16(), "missing");
        }
        info!(root = %self.root.display(), missing = missing.len(), "finished saving results");
        Ok(())
    }
}

/// Decodes `%XX` escapes. A `%` not followed by two hex digits is kept as is.
fn percent_decode(input: &str) -> Vec<u8> {
    let bytes = input.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        let escaped = match bytes.get(i + 1..i + 3) {
            Some(&[hi, lo]) if bytes[i] == b'%' => hex_value(hi).zip(hex_value(lo)),
            _ => None,
        };
        match escaped {
            Some((hi, lo)) => {
                decoded.push((hi << 4) | lo);
                i += 3;
            }
            None => {
                decoded.push(bytes[i]);
                i += 1;
            }
        }
    }
    decoded
}

fn hex_value(digit: u8) -> Option<u8> {
    char::from(digit).to_digit(16).and_then(|value| u8::try_from(value).ok())
}
