pub mod entity_ids;
pub mod errors;
pub mod id;

pub use entity_ids::{ActorId, ActorType, ClientId, JobId, SchemaId};
pub use errors::OrchestratorError;
pub use id::{Id, V4, V7};
