//! Typed id aliases for the entities in the data model (spec.md §3).

use serde::{Deserialize, Serialize};
use std::fmt;

use super::id::{Id, V4, V7};

/// Marker type for Job entities.
pub struct Job;
/// Marker type for schema descriptor rows.
pub struct Schema;

/// Server-assigned, stable job identity (time-ordered — see spec.md §3 Job.job_id).
pub type JobId = Id<Job, V7>;
/// Identity of a schema descriptor row.
pub type SchemaId = Id<Schema, V4>;

/// Caller-supplied tenant identity (`client_user_id` in the API).
///
/// Callers are free to use whatever identifier scheme they like here (the
/// source system mixes UUIDs and slugs), so unlike `JobId`/`SchemaId` this is
/// not backed by a `Uuid` — it is an opaque, non-empty string.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(transparent)]
pub struct ClientId(pub String);

/// Caller-supplied actor identity (`actor_id` in the API). Opaque, same as [`ClientId`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(transparent)]
pub struct ActorId(pub String);

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for ClientId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<String> for ActorId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Logical caller an action runs on behalf of (spec.md Glossary: Actor).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "actor_type", rename_all = "snake_case")]
pub enum ActorType {
    Client,
    Synth,
    SynthClass,
    SkillModule,
    Human,
}
