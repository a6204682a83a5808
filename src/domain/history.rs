use chrono::{DateTime, Utc};
use serde::Serialize;

/// Identifier of the user on whose behalf an operation runs. Supplied by the
/// caller's identity context and recorded verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Actor(String);

impl Actor {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// One append-only entry of a document's status log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusChange<S> {
    /// `None` for the entry written when the document is created.
    pub from: Option<S>,
    pub status: S,
    pub changed_at: DateTime<Utc>,
    pub actor: String,
}

impl<S> StatusChange<S> {
    pub fn new(from: Option<S>, status: S, changed_at: DateTime<Utc>, actor: &Actor) -> Self {
        Self {
            from,
            status,
            changed_at,
            actor: actor.as_str().to_string(),
        }
    }
}
