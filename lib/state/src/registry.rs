use crate::backing::{StateBacking, StateId};
use std::collections::BTreeMap;

/// Which backing instance serves which (service name, state id) pair.
///
/// Per-call [`crate::StateContainer`]s hold the `Arc<ServiceRegistry>` they
/// were built with, so replacing a registry never affects an in-flight call.
#[derive(Clone, Default)]
pub struct ServiceRegistry {
    services: BTreeMap<String, BTreeMap<StateId, StateBacking>>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces backing instances for `service`. Merge semantics:
    /// state ids already registered but absent from `states` are preserved.
    pub fn add_service(
        &mut self,
        service: impl Into<String>,
        states: BTreeMap<StateId, StateBacking>,
    ) {
        let entry = self.services.entry(service.into()).or_default();
        for (state_id, backing) in states {
            entry.insert(state_id, backing);
        }
    }

    pub fn service(&self, service: &str) -> Option<&BTreeMap<StateId, StateBacking>> {
        self.services.get(service)
    }

    pub fn services(&self) -> impl Iterator<Item = (&str, &BTreeMap<StateId, StateBacking>)> {
        self.services
            .iter()
            .map(|(name, states)| (name.as_str(), states))
    }

    pub fn service_names(&self) -> impl Iterator<Item = &str> {
        self.services.keys().map(String::as_str)
    }
}

impl PartialEq for ServiceRegistry {
    /// Registries are equal iff they contain the same services with the same
    /// backing instances (identity, not content).
    fn eq(&self, other: &Self) -> bool {
        if self.services.len() != other.services.len() {
            return false;
        }
        self.services.iter().all(|(name, states)| {
            other.services.get(name).is_some_and(|other_states| {
                states.len() == other_states.len()
                    && states.iter().all(|(id, backing)| {
                        other_states
                            .get(id)
                            .is_some_and(|other_backing| backing.same_instance(other_backing))
                    })
            })
        })
    }
}

impl Eq for ServiceRegistry {}

impl std::fmt::Debug for ServiceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut map = f.debug_map();
        for (name, states) in &self.services {
            map.entry(&name, &states.keys().collect::<Vec<_>>());
        }
        map.finish()
    }
}
