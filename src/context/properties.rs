//! INI-style properties parsing.
//!
//! Each configuration layer is parsed into an immutable [`PropertySet`]: a
//! two-level mapping of section name to `key = value` pairs. The format is
//! deliberately small: `[section]` headers, one `key = value` per line,
//! `#`/`;` comments, blank lines. No multi-line values, no nested sections,
//! no typed values.

use std::collections::BTreeMap;
use std::path::Path;

use tracing::debug;

use crate::error::{ContextError, DevbenchError, Result};

/// One immutable layer of configuration values.
///
/// Section and key identity is exact: no case folding, no trimming beyond
/// the surrounding whitespace of the raw line parts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertySet {
    sections: BTreeMap<String, BTreeMap<String, String>>,
}

impl PropertySet {
    /// Creates an empty property set.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            sections: BTreeMap::new(),
        }
    }

    /// Parses a property set from INI-style text.
    ///
    /// `path` is used only for error reporting.
    ///
    /// # Errors
    ///
    /// Returns [`ContextError::Malformed`] for a key/value line outside any
    /// section or a non-comment line with no `=` separator.
    pub fn parse(content: &str, path: &Path) -> Result<Self> {
        let mut sections: BTreeMap<String, BTreeMap<String, String>> = BTreeMap::new();
        let mut current: Option<String> = None;

        for (index, raw_line) in content.lines().enumerate() {
            let line = raw_line.trim();

            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }

            if let Some(headed) = line.strip_prefix('[') {
                let Some(name) = headed.strip_suffix(']') else {
                    return Err(malformed(path, index + 1, "unterminated section header"));
                };
                let name = name.trim();
                if name.is_empty() {
                    return Err(malformed(path, index + 1, "empty section name"));
                }
                sections.entry(name.to_string()).or_default();
                current = Some(name.to_string());
                continue;
            }

            let Some((key, value)) = line.split_once('=') else {
                return Err(malformed(path, index + 1, "expected 'key = value'"));
            };

            let Some(section) = current.as_ref() else {
                return Err(malformed(path, index + 1, "key/value line before any [section]"));
            };

            let key = key.trim();
            if key.is_empty() {
                return Err(malformed(path, index + 1, "empty property name"));
            }

            sections
                .entry(section.clone())
                .or_default()
                .insert(key.to_string(), value.trim().to_string());
        }

        debug!(
            "Parsed {} section(s) from {}",
            sections.len(),
            path.display()
        );

        Ok(Self { sections })
    }

    /// Loads a property set from a file.
    ///
    /// # Errors
    ///
    /// Returns [`ContextError::FileMissing`] when the file does not exist
    /// and [`ContextError::Malformed`] when it cannot be parsed.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(DevbenchError::Context(ContextError::FileMissing {
                path: path.to_path_buf(),
            }));
        }

        let content = std::fs::read_to_string(path)?;
        Self::parse(&content, path)
    }

    /// Returns the value for the exact (section, key) pair, if present.
    #[must_use]
    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.sections
            .get(section)
            .and_then(|s| s.get(key))
            .map(String::as_str)
    }

    /// Sets a value, creating the section when absent.
    pub fn set(
        &mut self,
        section: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<String>,
    ) {
        self.sections
            .entry(section.into())
            .or_default()
            .insert(key.into(), value.into());
    }

    /// Returns true when no section carries any value.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sections.values().all(BTreeMap::is_empty)
    }

    /// Folds layers into a single merged set, later layers winning per
    /// (section, key). None of the inputs is mutated.
    #[must_use]
    pub fn merge(layers: &[&Self]) -> Self {
        let mut merged = Self::new();
        for layer in layers {
            for (section, entries) in &layer.sections {
                for (key, value) in entries {
                    merged.set(section.clone(), key.clone(), value.clone());
                }
            }
        }
        merged
    }
}

fn malformed(path: &Path, line: usize, message: &str) -> DevbenchError {
    DevbenchError::Context(ContextError::Malformed {
        path: path.to_path_buf(),
        line,
        message: message.to_string(),
    })
}
