//! Problems attached to a definition.

use std::fmt;

use tracing::{debug, error, info, warn};

/// How bad a problem is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Minor,
    Major,
    /// The definition cannot be used.
    Severe,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Minor => write!(f, "minor"),
            Self::Major => write!(f, "major"),
            Self::Severe => write!(f, "severe"),
        }
    }
}

/// Where in a definition's life the problem arose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProblemKind {
    /// Reading or parsing the backing resource failed.
    Resolution,
    /// The definition parsed but is not usable as-is.
    Semantic,
}

impl fmt::Display for ProblemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Resolution => write!(f, "resolution"),
            Self::Semantic => write!(f, "semantic"),
        }
    }
}

/// A problem found while resolving a definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Problem {
    pub severity: Severity,
    pub kind: ProblemKind,
    pub title: String,
    pub details: String,
}

impl Problem {
    pub fn new(severity: Severity, kind: ProblemKind) -> Self {
        Self {
            severity,
            kind,
            title: String::new(),
            details: String::new(),
        }
    }

    pub fn severe(kind: ProblemKind) -> Self {
        Self::new(Severity::Severe, kind)
    }

    pub fn major(kind: ProblemKind) -> Self {
        Self::new(Severity::Major, kind)
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    #[must_use]
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = details.into();
        self
    }

    /// The problem raised when a definition file cannot be read or parsed.
    pub fn resolution_failed(path: &str, cause: impl fmt::Display) -> Self {
        Self::severe(ProblemKind::Resolution)
            .with_title(format!("Parsing configuration data from [{path}] failed"))
            .with_details(format!("Failed to parse GraphQL file:\n{cause}"))
    }
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{} {}] {}", self.severity, self.kind, self.title)?;
        if !self.details.is_empty() {
            write!(f, ": {}", self.details)?;
        }
        Ok(())
    }
}

/// Logs each problem at a level matching its severity.
pub fn log_problems(reference_id: &str, problems: &[Problem]) {
    if problems.is_empty() {
        debug!(reference_id, "Definition has no problems");
        return;
    }

    for problem in problems {
        match problem.severity {
            Severity::Severe => error!(
                reference_id,
                kind = %problem.kind,
                details = %problem.details,
                "{}",
                problem.title
            ),
            Severity::Major => warn!(
                reference_id,
                kind = %problem.kind,
                details = %problem.details,
                "{}",
                problem.title
            ),
            Severity::Minor => info!(
                reference_id,
                kind = %problem.kind,
                details = %problem.details,
                "{}",
                problem.title
            ),
        }
    }
}
