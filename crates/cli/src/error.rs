use std::io;
use std::path::PathBuf;

use micro_crawl::protocol::ConfigError;
use thiserror::Error;

/// Problems with the command line or the path file, reported before any network activity.
#[derive(Debug, Error)]
pub enum InputError {
    #[error(transparent)]
    Config {
        #[from]
        source: ConfigError,
    },

    #[error("number of pools must be greater than 0")]
    ZeroPools,

    #[error("unable to read path file {}: {source}", path.display())]
    ReadPaths { path: PathBuf, source: io::Error },

    #[error("invalid path on line {line}: {source}")]
    InvalidPath { line: usize, source: ConfigError },
}

impl InputError {
    pub fn read_paths<P: Into<PathBuf>>(path: P, source: io::Error) -> Self {
        Self::ReadPaths { path: path.into(), source }
    }
}
