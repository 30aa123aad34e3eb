pub mod health;
pub mod jobs;

pub use health::health_handler;
pub use jobs::{cancel_job, create_job, get_job};
