//! Target list loading.

use crate::types::Target;
use common::{Error, Result};
use std::borrow::Cow;
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, warn};

/// Ordered, immutable list of probe targets
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetRegistry {
    targets: Vec<Target>,
}

impl TargetRegistry {
    /// Create a registry from already-parsed targets
    pub fn new(targets: Vec<Target>) -> Self {
        Self { targets }
    }

    /// Load targets from a newline-delimited file.
    ///
    /// Bytes that are not valid UTF-8 are replaced rather than rejected, so a
    /// stray Latin-1 comment does not hide the rest of the file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.is_dir() {
            return Err(Error::targets(format!("{} is a directory", path.display())));
        }

        let bytes = std::fs::read(path)?;
        let contents = String::from_utf8_lossy(&bytes);
        if let Cow::Owned(_) = contents {
            warn!(path = %path.display(), "Target file is not valid UTF-8, replacing invalid bytes");
        }

        let registry = Self::parse(&contents);
        debug!(path = %path.display(), count = registry.len(), "Loaded targets");
        Ok(registry)
    }

    /// Parse targets from text.
    ///
    /// Lines are trimmed; blank lines and `#` comments are skipped. Anything
    /// else is taken as a URL without validation. Repeated URLs keep their
    /// first position.
    pub fn parse(contents: &str) -> Self {
        let mut seen = HashSet::new();
        let mut targets = Vec::new();

        for line in contents.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if !seen.insert(line) {
                warn!(url = line, "Ignoring duplicate target");
                continue;
            }
            targets.push(Target::from(line));
        }

        Self { targets }
    }

    /// Iterate over targets in file order
    pub fn iter(&self) -> impl Iterator<Item = &Target> {
        self.targets.iter()
    }

    /// Targets as a slice
    pub fn as_slice(&self) -> &[Target] {
        &self.targets
    }

    /// Number of targets
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    /// Whether there is nothing to probe
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

impl FromIterator<Target> for TargetRegistry {
    fn from_iter<I: IntoIterator<Item = Target>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
