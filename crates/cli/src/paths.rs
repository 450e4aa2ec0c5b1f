//! Loading the path list.
//!
//! One path per line. `start` and `count` select a window of lines, then surrounding
//! whitespace is trimmed and blank lines are dropped.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use micro_crawl::protocol::{ConfigError, CrawlPath};
use tracing::debug;

use crate::error::InputError;

pub fn load_paths(file: &Path, start: usize, count: Option<usize>) -> Result<Vec<CrawlPath>, InputError> {
    let reader = File::open(file).map(BufReader::new).map_err(|e| InputError::read_paths(file, e))?;
    let paths = read_paths(reader, start, count).map_err(|e| match e {
        InputError::ReadPaths { source, .. } => InputError::read_paths(file, source),
        e => e,
    })?;

    debug!(file = %file.display(), start, paths = paths.len(), "loaded paths");
    Ok(paths)
}

pub fn read_paths<R: BufRead>(reader: R, start: usize, count: Option<usize>) -> Result<Vec<CrawlPath>, InputError> {
    let mut paths = Vec::new();

    for (index, line) in reader.lines().enumerate().skip(start).take(count.unwrap_or(usize::MAX)) {
        let line = line.map_err(|e| InputError::read_paths("<input>", e))?;
        let path = line.trim();
        if path.is_empty() {
            continue;
        }
        let path = CrawlPath::new(path).map_err(|source| InputError::InvalidPath { line: index + 1, source })?;
        paths.push(path);
    }

    if paths.is_empty() {
        return Err(ConfigError::EmptyPaths.into());
    }
    Ok(paths)
}
