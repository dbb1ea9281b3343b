use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Address of a model resource.
///
/// Persisted as a bare string: remote locators keep their URI, local locators are
/// paths relative to the asset root using `/` separators.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Locator {
    Local(String),
    Remote(String),
}

impl Locator {
    /// Classify a raw catalog string.
    pub fn parse(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        if is_remote_uri(&raw) {
            Locator::Remote(raw)
        } else {
            Locator::Local(raw)
        }
    }

    pub fn local(path: impl Into<String>) -> Self {
        Locator::Local(path.into())
    }

    pub fn remote(uri: impl Into<String>) -> Self {
        Locator::Remote(uri.into())
    }

    pub fn as_str(&self) -> &str {
        match self {
            Locator::Local(path) => path,
            Locator::Remote(uri) => uri,
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, Locator::Remote(_))
    }

    /// First path segment of a local locator, i.e. the owning Collection.
    pub fn collection(&self) -> Option<&str> {
        match self {
            Locator::Local(path) => path
                .trim_start_matches('/')
                .split('/')
                .next()
                .filter(|s| !s.is_empty()),
            Locator::Remote(_) => None,
        }
    }
}

pub fn is_remote_uri(raw: &str) -> bool {
    raw.starts_with("http://") || raw.starts_with("https://")
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for Locator {
    fn from(s: &str) -> Self {
        Self::parse(s)
    }
}

impl From<String> for Locator {
    fn from(s: String) -> Self {
        Self::parse(s)
    }
}

impl Serialize for Locator {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Locator {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Locator::parse(raw))
    }
}
