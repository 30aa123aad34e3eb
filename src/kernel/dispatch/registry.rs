//! Static handler registry, resolved at boot (spec.md §4.5, §9 redesign guidance).

use std::collections::HashMap;
use std::sync::Arc;

use super::handler::Handler;

const GEN_CREW_OBJECT_TYPE: &str = "gen_crew";

/// Maps `job_key` to a handler; `gen_crew`-typed schemas always route to the
/// single generic handler regardless of `job_key`.
pub struct DispatchRegistry {
    handlers: HashMap<&'static str, Arc<dyn Handler>>,
    gen_crew: Arc<dyn Handler>,
}

impl DispatchRegistry {
    pub fn new(gen_crew: Arc<dyn Handler>) -> Self {
        Self {
            handlers: HashMap::new(),
            gen_crew,
        }
    }

    pub fn register(&mut self, job_key: &'static str, handler: Arc<dyn Handler>) {
        self.handlers.insert(job_key, handler);
    }

    /// Resolves the handler for a job, given the schema's `object_type`.
    pub fn resolve(&self, job_key: &str, object_type: &str) -> Option<Arc<dyn Handler>> {
        if object_type == GEN_CREW_OBJECT_TYPE {
            return Some(self.gen_crew.clone());
        }
        self.handlers.get(job_key).cloned()
    }

    pub fn is_registered(&self, job_key: &str) -> bool {
        self.handlers.contains_key(job_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::dispatch::gen_crew::GenCrewHandler;
    use crate::kernel::dispatch::handler::{Handler, HandlerContext, HandlerMetadata};
    use crate::common::OrchestratorError;
    use async_trait::async_trait;

    struct Dummy;

    #[async_trait]
    impl Handler for Dummy {
        fn metadata(&self) -> HandlerMetadata {
            HandlerMetadata { name: "dummy", ..Default::default() }
        }

        async fn execute(
            &self,
            _payload: serde_json::Value,
            _ctx: HandlerContext,
        ) -> Result<serde_json::Value, OrchestratorError> {
            Ok(serde_json::json!({}))
        }
    }

    #[test]
    fn gen_crew_object_type_always_routes_to_generic_handler() {
        let mut registry = DispatchRegistry::new(Arc::new(GenCrewHandler));
        registry.register("hello_crew", Arc::new(Dummy));

        let resolved = registry.resolve("hello_crew", "gen_crew");
        assert!(resolved.is_some());
        assert_eq!(resolved.unwrap().metadata().name, "gen_crew");
    }

    #[test]
    fn concrete_job_key_routes_to_registered_handler() {
        let mut registry = DispatchRegistry::new(Arc::new(GenCrewHandler));
        registry.register("hello_crew", Arc::new(Dummy));

        let resolved = registry.resolve("hello_crew", "crew");
        assert_eq!(resolved.unwrap().metadata().name, "dummy");
    }

    #[test]
    fn unregistered_job_key_resolves_to_none() {
        let registry = DispatchRegistry::new(Arc::new(GenCrewHandler));
        assert!(registry.resolve("nope", "crew").is_none());
        assert!(!registry.is_registered("nope"));
    }
}
