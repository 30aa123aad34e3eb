pub mod sink;
pub mod types;

pub use sink::{EventSink, PgEventSink};
pub use types::EventType;
