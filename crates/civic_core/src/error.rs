use std::fmt;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AssemblyError {
    #[error("malformed date in `{field}`: {raw:?}")]
    MalformedDate { field: &'static str, raw: String },

    #[error("malformed `{field}`: {reason}")]
    MalformedField { field: &'static str, reason: String },

    #[error("no local meeting key found (checked `meeting_id`, `id` and the source `Id` parameter)")]
    MissingKey,

    #[error("invalid location: {reason}")]
    InvalidLocation { reason: String },

    #[error("invalid link at links[{index}]: {reason}")]
    InvalidLink { index: usize, reason: String },

    #[error("invalid source {url:?}: must start with {origin:?}")]
    InvalidSource { url: String, origin: String },
}

impl AssemblyError {
    /// Output field the failure is attributed to.
    pub fn field(&self) -> &'static str {
        match self {
            AssemblyError::MalformedDate { field, .. } => *field,
            AssemblyError::MalformedField { field, .. } => *field,
            AssemblyError::MissingKey => "id",
            AssemblyError::InvalidLocation { .. } => "location",
            AssemblyError::InvalidLink { .. } => "links",
            AssemblyError::InvalidSource { .. } => "source",
        }
    }
}

/// An [`AssemblyError`] tied back to the fragment that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FragmentError {
    pub position: usize,
    pub id: Option<String>,
    pub kind: AssemblyError,
}

impl FragmentError {
    pub fn new(position: usize, id: Option<String>, kind: AssemblyError) -> Self {
        Self { position, id, kind }
    }

    pub fn subject(&self) -> String {
        match &self.id {
            Some(id) => format!("id {id}"),
            None => format!("fragment #{}", self.position),
        }
    }
}

impl fmt::Display for FragmentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]: {}", self.kind.field(), self.subject(), self.kind)
    }
}

impl std::error::Error for FragmentError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.kind)
    }
}
