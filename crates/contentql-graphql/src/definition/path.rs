//! Definition path convention.
//!
//! A definition lives at `/<module>/<folder>/<relative path/><name>.<extension>`,
//! for example `/tours/graphqls/v1/tours.graphql`. The folder and extension
//! route a file to this engine instead of other definition loaders.

use std::fmt;

use regex::Regex;

use super::DefinitionError;

/// Identity of one definition, derived from its path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DefinitionMetadata {
    /// Full resource path.
    pub path: String,
    /// First path segment.
    pub module: String,
    /// File name without extension.
    pub name: String,
    /// Directories between the folder and the file, with a trailing `/`, or empty.
    pub relative_location: String,
    /// `relative_location` followed by `name`. Stable across edits.
    pub reference_id: String,
}

impl fmt::Display for DefinitionMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.module, self.reference_id)
    }
}

/// Matcher for definition resource paths.
#[derive(Debug, Clone)]
pub struct DefinitionPathPattern {
    regex: Regex,
    folder: String,
    extension: String,
}

impl DefinitionPathPattern {
    /// Builds the matcher for `folder` and `extension` (without the dot).
    ///
    /// # Errors
    ///
    /// Returns `DefinitionError::InvalidPattern` if either part is empty or
    /// contains a `/`.
    pub fn new(folder: &str, extension: &str) -> Result<Self, DefinitionError> {
        let extension = extension.trim_start_matches('.');
        for (label, value) in [("folder", folder), ("extension", extension)] {
            if value.is_empty() || value.contains('/') {
                return Err(DefinitionError::InvalidPattern(format!(
                    "{label} {value:?} is not a single path segment"
                )));
            }
        }

        let pattern = format!(
            r"^/(?P<module>[a-zA-Z0-9_-]+)/{}/(?P<rel>(?:[^/]+/)*)(?P<name>[a-zA-Z0-9_.-]+)\.{}$",
            regex::escape(folder),
            regex::escape(extension)
        );
        let regex =
            Regex::new(&pattern).map_err(|e| DefinitionError::InvalidPattern(e.to_string()))?;

        Ok(Self {
            regex,
            folder: folder.to_string(),
            extension: extension.to_string(),
        })
    }

    pub fn folder(&self) -> &str {
        &self.folder
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn matches(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }

    /// Metadata for `path`, or `None` if it does not follow the convention.
    pub fn metadata(&self, path: &str) -> Option<DefinitionMetadata> {
        let captures = self.regex.captures(path)?;
        let module = captures.name("module")?.as_str().to_string();
        let name = captures.name("name")?.as_str().to_string();
        let relative_location = captures
            .name("rel")
            .map(|m| m.as_str().to_string())
            .unwrap_or_default();

        Some(DefinitionMetadata {
            path: path.to_string(),
            reference_id: format!("{relative_location}{name}"),
            module,
            name,
            relative_location,
        })
    }
}
