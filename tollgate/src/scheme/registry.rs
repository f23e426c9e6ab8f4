//! Adapter registry keyed by the (network, scheme) pair.
//!
//! The registry is filled once while the resource server is built and
//! never mutated afterwards. Dispatch is exact: no namespace wildcards,
//! no fallback chains.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fmt;

use super::SchemeAdapter;
use crate::chain::ChainId;
use crate::error::ConfigurationError;

/// Composite dispatch key: one concrete chain plus one scheme name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AdapterKey {
    network: ChainId,
    scheme: String,
}

impl AdapterKey {
    /// Creates a key from its components.
    pub fn new<S: Into<String>>(network: ChainId, scheme: S) -> Self {
        Self {
            network,
            scheme: scheme.into(),
        }
    }

    /// Returns the network component.
    #[must_use]
    pub const fn network(&self) -> &ChainId {
        &self.network
    }

    /// Returns the scheme component.
    #[must_use]
    pub fn scheme(&self) -> &str {
        &self.scheme
    }
}

impl fmt::Display for AdapterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} on {}", self.scheme, self.network)
    }
}

/// The scheme adapters a resource server dispatches to.
#[derive(Default)]
pub struct AdapterRegistry {
    adapters: HashMap<AdapterKey, Box<dyn SchemeAdapter>>,
}

impl fmt::Debug for AdapterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<String> = self.adapters.keys().map(ToString::to_string).collect();
        keys.sort();
        f.debug_struct("AdapterRegistry").field("keys", &keys).finish()
    }
}

impl AdapterRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an adapter for one concrete network.
    ///
    /// The key is derived from the network and the adapter's declared
    /// scheme name.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::AdapterFamilyMismatch`] when the
    /// network lies outside the adapter's declared family, and
    /// [`ConfigurationError::DuplicateAdapter`] when the (network, scheme)
    /// key is already taken.
    pub fn insert(
        &mut self,
        network: ChainId,
        adapter: Box<dyn SchemeAdapter>,
    ) -> Result<(), ConfigurationError> {
        if !network.in_namespace(adapter.namespace()) {
            return Err(ConfigurationError::AdapterFamilyMismatch {
                network,
                family: adapter.namespace().to_owned(),
                scheme: adapter.scheme().to_owned(),
            });
        }
        let key = AdapterKey::new(network, adapter.scheme());
        match self.adapters.entry(key) {
            Entry::Occupied(occupied) => Err(ConfigurationError::DuplicateAdapter {
                network: occupied.key().network().clone(),
                scheme: occupied.key().scheme().to_owned(),
            }),
            Entry::Vacant(vacant) => {
                vacant.insert(adapter);
                Ok(())
            }
        }
    }

    /// Looks up the adapter for a (network, scheme) pair.
    #[must_use]
    pub fn get(&self, network: &ChainId, scheme: &str) -> Option<&dyn SchemeAdapter> {
        self.adapters
            .get(&AdapterKey::new(network.clone(), scheme))
            .map(AsRef::as_ref)
    }

    /// Returns whether an adapter is registered for the pair.
    #[must_use]
    pub fn contains(&self, network: &ChainId, scheme: &str) -> bool {
        self.adapters
            .contains_key(&AdapterKey::new(network.clone(), scheme))
    }

    /// Returns the number of registered adapters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    /// Returns whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheme::{EXACT_SCHEME, MalformedPayload};

    struct StubAdapter {
        namespace: &'static str,
        scheme: &'static str,
    }

    impl StubAdapter {
        fn evm() -> Box<Self> {
            Box::new(Self {
                namespace: "eip155",
                scheme: EXACT_SCHEME,
            })
        }

        fn svm() -> Box<Self> {
            Box::new(Self {
                namespace: "solana",
                scheme: EXACT_SCHEME,
            })
        }
    }

    impl SchemeAdapter for StubAdapter {
        fn scheme(&self) -> &str {
            self.scheme
        }

        fn namespace(&self) -> &str {
            self.namespace
        }

        fn parse_payload(
            &self,
            raw: &serde_json::Value,
        ) -> Result<serde_json::Value, MalformedPayload> {
            Ok(raw.clone())
        }
    }

    #[test]
    fn registers_and_resolves_by_pair() {
        let mut registry = AdapterRegistry::new();
        let base = ChainId::new("eip155", "84532");
        registry.insert(base.clone(), StubAdapter::evm()).unwrap();

        assert!(registry.contains(&base, EXACT_SCHEME));
        assert!(registry.get(&base, EXACT_SCHEME).is_some());
        assert!(!registry.contains(&base, "upto"));
        assert!(!registry.contains(&ChainId::new("eip155", "1"), EXACT_SCHEME));
    }

    #[test]
    fn same_scheme_on_two_networks_is_two_entries() {
        let mut registry = AdapterRegistry::new();
        registry
            .insert(ChainId::new("eip155", "84532"), StubAdapter::evm())
            .unwrap();
        registry
            .insert(ChainId::new("solana", "devnet"), StubAdapter::svm())
            .unwrap();
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn duplicate_pair_is_rejected() {
        let mut registry = AdapterRegistry::new();
        let base = ChainId::new("eip155", "84532");
        registry.insert(base.clone(), StubAdapter::evm()).unwrap();

        let err = registry.insert(base, StubAdapter::evm()).unwrap_err();
        assert!(matches!(err, ConfigurationError::DuplicateAdapter { .. }));
    }

    #[test]
    fn family_mismatch_is_rejected() {
        let mut registry = AdapterRegistry::new();
        let err = registry
            .insert(ChainId::new("solana", "devnet"), StubAdapter::evm())
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigurationError::AdapterFamilyMismatch { .. }
        ));
    }
}
