pub mod registry;

pub use registry::{SchemaRegistry, ValidationOutcome};
