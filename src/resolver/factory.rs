//! Resolver factory and inheritance declarations.

use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;

use super::LocalizationResolver;
use crate::culture::CultureTag;
use crate::store::SharedStore;

/// Namespaces each namespace falls back to, in lookup order.
///
/// ## Example
///
/// ```rust,ignore
/// let registry = InheritanceRegistry::new()
///     .declare("messages", ["common", "errors"])
///     .declare("admin", ["messages"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct InheritanceRegistry {
    declarations: HashMap<String, Vec<String>>,
}

impl InheritanceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare inherited namespaces. Repeated declarations for the same namespace are
    /// merged, keeping the first occurrence of each name.
    #[must_use]
    pub fn declare<I, S>(mut self, namespace: impl Into<String>, inherited: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let declared = self.declarations.entry(namespace.into()).or_default();
        for name in inherited {
            let name = name.into();
            if !declared.contains(&name) {
                declared.push(name);
            }
        }
        self
    }

    pub fn inherited(&self, namespace: &str) -> &[String] {
        self.declarations.get(namespace).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Builds resolvers sharing one store, caching them per descriptor.
pub struct ResolverFactory {
    store: SharedStore,
    registry: InheritanceRegistry,
    fallback_culture: Option<CultureTag>,
    resolvers: DashMap<String, Arc<LocalizationResolver>>,
}

impl ResolverFactory {
    pub fn new(store: SharedStore, registry: InheritanceRegistry, fallback_culture: Option<CultureTag>) -> Self {
        Self {
            store,
            registry,
            fallback_culture,
            resolvers: DashMap::new(),
        }
    }

    /// Resolver for a namespace, created on first request with its declared inherited
    /// namespaces.
    pub fn create(&self, descriptor: &str) -> Arc<LocalizationResolver> {
        let resolver = self.resolvers.entry(descriptor.to_string()).or_insert_with(|| {
            debug!("Creating resolver for {}", descriptor);
            Arc::new(LocalizationResolver::new(
                Arc::clone(&self.store),
                descriptor,
                self.registry.inherited(descriptor).to_vec(),
                self.fallback_culture.clone(),
            ))
        });
        Arc::clone(&resolver)
    }

    /// Uncached resolver for a base name under a location.
    pub fn create_for(&self, base_name: &str, location: &str) -> LocalizationResolver {
        LocalizationResolver::with_location(
            Arc::clone(&self.store),
            base_name,
            location,
            self.fallback_culture.clone(),
        )
    }

    /// Number of cached resolvers.
    pub fn cached(&self) -> usize {
        self.resolvers.len()
    }
}

impl std::fmt::Debug for ResolverFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolverFactory")
            .field("registry", &self.registry)
            .field("fallback_culture", &self.fallback_culture)
            .field("cached", &self.resolvers.len())
            .finish()
    }
}
