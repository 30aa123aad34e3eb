pub mod gen_crew;
pub mod handler;
pub mod hello_crew;
pub mod registry;
pub mod remote;

pub use gen_crew::GenCrewHandler;
pub use handler::{Handler, HandlerContext, HandlerMetadata};
pub use hello_crew::HelloCrewHandler;
pub use registry::DispatchRegistry;
pub use remote::RemoteCrewHandler;
