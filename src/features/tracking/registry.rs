//! Per-user list of known projects.

use serde::Serialize;

use crate::bot::tokens;
use crate::error::ValidationError;

/// Ordered, deduplicated project names for one user.
///
/// First-added names come first, which is the order menus show them in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProjectRegistry {
    names: Vec<String>,
}

impl ProjectRegistry {
    /// Create an empty registry.
    #[must_use]
    pub const fn new() -> Self {
        Self { names: Vec::new() }
    }

    /// Check that `name` may be used as a project name and return it trimmed.
    ///
    /// # Errors
    ///
    /// Returns `EmptyProjectName` for blank input and `ReservedProjectName`
    /// for anything that reads as a command or control token.
    pub fn validate_name(name: &str) -> Result<&str, ValidationError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyProjectName);
        }
        if tokens::is_reserved(name) {
            return Err(ValidationError::ReservedProjectName(name.to_string()));
        }
        Ok(name)
    }

    /// Append a project unless it is already known.
    ///
    /// Returns `true` if the name was new.
    ///
    /// # Errors
    ///
    /// Returns an error if the name fails [`Self::validate_name`].
    pub fn register(&mut self, name: &str) -> Result<bool, ValidationError> {
        let name = Self::validate_name(name)?;
        if self.contains(name) {
            return Ok(false);
        }
        self.names.push(name.to_string());
        Ok(true)
    }

    /// Exact (trimmed) lookup.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&str> {
        let name = name.trim();
        self.names.iter().find(|n| *n == name).map(String::as_str)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }
}
