use std::fmt;
use std::sync::Arc;

use crate::protocol::ConfigError;

/// An immutable request target: URL path plus optional query.
///
/// Cloning is cheap, the string is shared. A path is never empty and never contains
/// whitespace or control characters, so it can be written into a request line as is.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CrawlPath(Arc<str>);

impl CrawlPath {
    pub fn new(path: &str) -> Result<Self, ConfigError> {
        if path.is_empty() {
            return Err(ConfigError::invalid_path(path, "empty path"));
        }

        if let Some(c) = path.chars().find(|c| c.is_whitespace() || c.is_control()) {
            return Err(ConfigError::invalid_path(path, format!("contains {c:?}")));
        }

        Ok(Self(Arc::from(path)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for CrawlPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CrawlPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<&str> for CrawlPath {
    type Error = ConfigError;

    fn try_from(path: &str) -> Result<Self, Self::Error> {
        Self::new(path)
    }
}

impl TryFrom<String> for CrawlPath {
    type Error = ConfigError;

    fn try_from(path: String) -> Result<Self, Self::Error> {
        Self::new(&path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_path_with_query() {
        let path = CrawlPath::new("/wiki/index.php?namespace=0&title=Main_Page").unwrap();
        assert_eq!(path.as_str(), "/wiki/index.php?namespace=0&title=Main_Page");
    }

    #[test]
    fn rejects_empty_and_whitespace() {
        assert!(matches!(CrawlPath::new(""), Err(ConfigError::InvalidPath { .. })));
        assert!(matches!(CrawlPath::new("/a b"), Err(ConfigError::InvalidPath { .. })));
        assert!(matches!(CrawlPath::new("/a\r\nHost: evil"), Err(ConfigError::InvalidPath { .. })));
    }
}
