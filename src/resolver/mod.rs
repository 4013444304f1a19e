//! Culture-aware translation lookups.
//!
//! A [`LocalizationResolver`] reads what the refresher wrote. A lookup for one key walks:
//!
//! 1. the resolver's own namespace, then each inherited namespace in declared order
//! 2. the same again for the parent culture (`fr-CH` -> `fr`)
//! 3. the whole search for the fallback culture, when one is configured and differs
//!    from the requested culture

mod factory;
mod format;

use std::collections::HashSet;
use std::fmt;
use std::fmt::Display;

use tracing::{debug, error};

pub use factory::{InheritanceRegistry, ResolverFactory};
pub use format::format_positional;

use crate::culture::{CultureProvider, CultureTag};
use crate::error::FormatError;
use crate::store::{self, SharedStore};

/// Result of a lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalizedString {
    pub name: String,
    /// The translated value, or the bare name when nothing was found.
    pub value: String,
    pub resource_not_found: bool,
    /// `namespace.culture` an enumerated entry was merged from, for entries coming from
    /// another namespace.
    pub search_location: Option<String>,
}

impl LocalizedString {
    fn resolved(name: &str, value: Option<String>) -> Self {
        Self {
            name: name.to_string(),
            resource_not_found: value.is_none(),
            value: value.unwrap_or_else(|| name.to_string()),
            search_location: None,
        }
    }
}

impl fmt::Display for LocalizedString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

/// Read-only view of one namespace in the store.
pub struct LocalizationResolver {
    store: SharedStore,
    namespace: String,
    inherited: Vec<String>,
    fallback_culture: Option<CultureTag>,
    location: Option<String>,
}

impl LocalizationResolver {
    pub fn new(
        store: SharedStore,
        namespace: impl Into<String>,
        inherited: Vec<String>,
        fallback_culture: Option<CultureTag>,
    ) -> Self {
        Self {
            store,
            namespace: namespace.into(),
            inherited,
            fallback_culture,
            location: None,
        }
    }

    /// Resolver for a base name under a location. It inherits nothing.
    pub fn with_location(
        store: SharedStore,
        base_name: impl Into<String>,
        location: impl Into<String>,
        fallback_culture: Option<CultureTag>,
    ) -> Self {
        Self {
            location: Some(location.into()),
            ..Self::new(store, base_name, Vec::new(), fallback_culture)
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn inherited(&self) -> &[String] {
        &self.inherited
    }

    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    pub fn fallback_culture(&self) -> Option<&CultureTag> {
        self.fallback_culture.as_ref()
    }

    /// Resolve one key. Empty stored values count as missing.
    pub fn get(&self, key: &str, culture: &CultureTag) -> Option<String> {
        self.find(key, culture)
            .or_else(|| self.find(key, &culture.parent()?))
            .or_else(|| self.get(key, self.fallback_for(culture)?))
    }

    /// Resolve one key; a missing key yields its own name with the not-found flag set.
    pub fn lookup(&self, name: &str, culture: &CultureTag) -> LocalizedString {
        LocalizedString::resolved(name, self.get(name, culture))
    }

    /// Resolve one key and substitute `{0}`-style placeholders.
    ///
    /// A missing key is returned unformatted.
    pub fn lookup_with_args(
        &self,
        name: &str,
        args: &[&dyn Display],
        culture: &CultureTag,
    ) -> Result<LocalizedString, FormatError> {
        let mut found = self.lookup(name, culture);
        if !found.resource_not_found {
            found.value = format_positional(&found.value, args)?;
        }
        Ok(found)
    }

    /// Enumerate every string visible for `culture`.
    ///
    /// The own namespace comes first, then `included` or, when that is empty, the
    /// inherited namespaces. The first entry seen for a name wins. When nothing exists
    /// in the own namespace the fallback culture's strings are appended. The result is
    /// sorted by name, ignoring case, whenever other namespaces or the fallback culture took part.
    pub fn get_all(&self, include_parent: bool, culture: &CultureTag, included: &[String]) -> Vec<LocalizedString> {
        let mut result = Vec::new();
        let mut seen = HashSet::new();

        self.collect(&self.namespace, culture, include_parent, false, &mut result, &mut seen);
        let fallback = self.fallback_for(culture).filter(|_| result.is_empty());

        let sources: &[String] = if included.is_empty() { &self.inherited } else { included };
        let mut sort = !sources.is_empty();
        for namespace in sources {
            self.collect(namespace, culture, include_parent, true, &mut result, &mut seen);
        }

        if let Some(fallback) = fallback {
            debug!("No strings for {}.{}, appending {} strings", self.namespace, culture, fallback);
            for entry in self.get_all(include_parent, fallback, included) {
                if seen.insert(entry.name.clone()) {
                    result.push(entry);
                }
            }
            sort = true;
        }

        if sort {
            result.sort_by(|a, b| {
                a.name
                    .to_lowercase()
                    .cmp(&b.name.to_lowercase())
                    .then_with(|| a.name.cmp(&b.name))
            });
        }
        result
    }

    /// [`get_all`](Self::get_all) for a culture given by name.
    ///
    /// A missing or unparsable name falls back to the provider's current UI culture.
    pub fn get_all_named(
        &self,
        include_parent: bool,
        culture_name: Option<&str>,
        provider: &dyn CultureProvider,
        included: &[String],
    ) -> Vec<LocalizedString> {
        let requested = culture_name
            .filter(|name| !name.is_empty())
            .and_then(|name| match CultureTag::parse(name) {
                Ok(culture) => Some(culture),
                Err(e) => {
                    debug!("{}, using the current culture", e);
                    None
                }
            });

        match requested {
            Some(culture) => self.get_all(include_parent, &culture, included),
            None => self.get_all(include_parent, provider.current_ui_culture(), included),
        }
    }

    fn fallback_for(&self, culture: &CultureTag) -> Option<&CultureTag> {
        self.fallback_culture
            .as_ref()
            .filter(|fallback| !fallback.name().eq_ignore_ascii_case(culture.name()))
    }

    /// Own namespace first, then inherited ones, for exactly this culture.
    fn find(&self, key: &str, culture: &CultureTag) -> Option<String> {
        std::iter::once(&self.namespace)
            .chain(&self.inherited)
            .find_map(|namespace| self.read(&store::value_key(namespace, culture.name(), key)))
            .filter(|value| !value.is_empty())
    }

    fn collect(
        &self,
        namespace: &str,
        culture: &CultureTag,
        include_parent: bool,
        merged: bool,
        result: &mut Vec<LocalizedString>,
        seen: &mut HashSet<String>,
    ) {
        let parent = culture.parent().filter(|_| include_parent);
        for culture in std::iter::once(culture).chain(parent.as_ref()) {
            let keys = match store::read_key_index(self.store.as_ref(), namespace, culture.name()) {
                Ok(keys) => keys.unwrap_or_default(),
                Err(e) => {
                    error!("Unable to read key index of {}.{}: {}", namespace, culture, e);
                    continue;
                }
            };

            let search_location = merged.then(|| format!("{}.{}", namespace, culture));
            for key in keys {
                if seen.contains(&key) {
                    continue;
                }
                let full_key = store::value_key(namespace, culture.name(), &key);
                let value = self.read(&full_key).unwrap_or(full_key);

                seen.insert(key.clone());
                result.push(LocalizedString {
                    name: key,
                    value,
                    resource_not_found: false,
                    search_location: search_location.clone(),
                });
            }
        }
    }

    /// Store read; failures are logged and count as missing.
    fn read(&self, key: &str) -> Option<String> {
        match self.store.get_string(key) {
            Ok(value) => value,
            Err(e) => {
                error!("Unable to read {} from store: {}", key, e);
                None
            }
        }
    }
}

impl fmt::Debug for LocalizationResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalizationResolver")
            .field("namespace", &self.namespace)
            .field("inherited", &self.inherited)
            .field("fallback_culture", &self.fallback_culture)
            .field("location", &self.location)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::culture::RequestCulture;
    use crate::error::StoreError;
    use crate::store::{KeyValueStore, MemoryStore};

    /// Memory store whose reads of one key fail.
    struct FailingStore {
        inner: MemoryStore,
        broken: String,
    }

    impl KeyValueStore for FailingStore {
        fn get_string(&self, key: &str) -> Result<Option<String>, StoreError> {
            if key == self.broken {
                return Err(StoreError::Unavailable(format!("cannot read {}", key)));
            }
            self.inner.get_string(key)
        }

        fn set_string(&self, key: &str, value: &str) -> Result<(), StoreError> {
            self.inner.set_string(key, value)
        }

        fn remove(&self, key: &str) -> Result<(), StoreError> {
            self.inner.remove(key)
        }
    }

    fn tag(name: &str) -> CultureTag {
        name.parse().unwrap()
    }

    fn seed(backend: &MemoryStore, namespace: &str, culture: &str, pairs: &[(&str, &str)]) {
        for (key, value) in pairs {
            backend
                .set_string(&store::value_key(namespace, culture, key), value)
                .unwrap();
        }
        let keys: Vec<String> = pairs.iter().map(|(key, _)| key.to_string()).collect();
        store::write_key_index(backend, namespace, culture, &keys).unwrap();
    }

    fn resolver(store: &Arc<MemoryStore>, inherited: &[&str], fallback: Option<&str>) -> LocalizationResolver {
        LocalizationResolver::new(
            store.clone(),
            "messages",
            inherited.iter().map(|ns| ns.to_string()).collect(),
            fallback.map(tag),
        )
    }

    fn names(strings: &[LocalizedString]) -> Vec<&str> {
        strings.iter().map(|s| s.name.as_str()).collect()
    }

    #[test]
    fn test_parent_culture_lookup() {
        let store = Arc::new(MemoryStore::default());
        seed(&store, "messages", "fr", &[("hi", "Salut")]);

        let resolver = resolver(&store, &[], None);
        assert_eq!(resolver.get("hi", &tag("fr-CH")).as_deref(), Some("Salut"));
        assert_eq!(resolver.get("hi", &tag("de")), None);
    }

    #[test]
    fn test_inherited_namespace_lookup() {
        let store = Arc::new(MemoryStore::default());
        seed(&store, "common", "en", &[("ok", "OK"), ("hi", "Hey")]);
        seed(&store, "messages", "en", &[("hi", "Hello")]);

        let resolver = resolver(&store, &["common"], None);
        assert_eq!(resolver.get("ok", &tag("en")).as_deref(), Some("OK"));
        assert_eq!(resolver.get("hi", &tag("en")).as_deref(), Some("Hello"));
        // Inherited namespaces are searched for the parent culture too
        assert_eq!(resolver.get("ok", &tag("en-GB")).as_deref(), Some("OK"));
    }

    #[test]
    fn test_fallback_culture_lookup() {
        let store = Arc::new(MemoryStore::default());
        seed(&store, "messages", "en", &[("bye", "Bye")]);

        let resolver = resolver(&store, &[], Some("en"));
        assert_eq!(resolver.get("bye", &tag("de-AT")).as_deref(), Some("Bye"));
        assert_eq!(resolver.get("nope", &tag("de")), None);
        assert_eq!(resolver.get("nope", &tag("en")), None);
    }

    #[test]
    fn test_empty_value_keeps_searching() {
        let store = Arc::new(MemoryStore::default());
        seed(&store, "messages", "fr-CH", &[("hi", "")]);
        seed(&store, "messages", "fr", &[("hi", "Salut")]);

        let resolver = resolver(&store, &[], None);
        assert_eq!(resolver.get("hi", &tag("fr-CH")).as_deref(), Some("Salut"));
    }

    #[test]
    fn test_lookup_not_found_marker() {
        let store = Arc::new(MemoryStore::default());
        seed(&store, "messages", "en", &[("hi", "Hello")]);
        let resolver = resolver(&store, &[], None);

        let found = resolver.lookup("hi", &tag("en"));
        assert!(!found.resource_not_found);
        assert_eq!(found.to_string(), "Hello");

        let missing = resolver.lookup("missing.key", &tag("en"));
        assert!(missing.resource_not_found);
        assert_eq!(missing.value, "missing.key");
    }

    #[test]
    fn test_lookup_with_args() {
        let store = Arc::new(MemoryStore::default());
        seed(&store, "messages", "en", &[("greet", "Hello {0}, {1} new"), ("bad", "Hello {1}")]);
        let resolver = resolver(&store, &[], None);

        let greet = resolver.lookup_with_args("greet", &[&"Ana", &2], &tag("en")).unwrap();
        assert_eq!(greet.value, "Hello Ana, 2 new");

        // Not found is returned untouched, placeholders and all
        let missing = resolver.lookup_with_args("greet {0}", &[&"Ana"], &tag("fr")).unwrap();
        assert!(missing.resource_not_found);
        assert_eq!(missing.value, "greet {0}");

        assert!(resolver.lookup_with_args("bad", &[&"Ana"], &tag("en")).is_err());
    }

    #[test]
    fn test_get_all_child_culture_wins() {
        let store = Arc::new(MemoryStore::default());
        seed(&store, "messages", "fr-CH", &[("hi", "Grüezi")]);
        seed(&store, "messages", "fr", &[("hi", "Salut"), ("bye", "Au revoir")]);
        let resolver = resolver(&store, &[], None);

        let all = resolver.get_all(true, &tag("fr-CH"), &[]);
        // Natural index order: nothing was merged from elsewhere
        assert_eq!(names(&all), vec!["hi", "bye"]);
        assert_eq!(all[0].value, "Grüezi");
        assert!(all.iter().all(|s| s.search_location.is_none()));

        let own_only = resolver.get_all(false, &tag("fr-CH"), &[]);
        assert_eq!(names(&own_only), vec!["hi"]);
    }

    #[test]
    fn test_get_all_merges_inherited_sorted_and_tagged() {
        let store = Arc::new(MemoryStore::default());
        seed(&store, "messages", "en", &[("zeta", "Z")]);
        seed(&store, "common", "en", &[("alpha", "A"), ("zeta", "other")]);
        let resolver = resolver(&store, &["common"], None);

        let all = resolver.get_all(false, &tag("en"), &[]);
        assert_eq!(names(&all), vec!["alpha", "zeta"]);
        assert_eq!(all[0].search_location.as_deref(), Some("common.en"));
        assert_eq!(all[1].value, "Z");
        assert_eq!(all[1].search_location, None);
    }

    #[test]
    fn test_get_all_included_replaces_inherited() {
        let store = Arc::new(MemoryStore::default());
        seed(&store, "messages", "en", &[("hi", "Hello")]);
        seed(&store, "common", "en", &[("ok", "OK")]);
        seed(&store, "shared", "en", &[("cancel", "Cancel")]);
        let resolver = resolver(&store, &["common"], None);

        let all = resolver.get_all(false, &tag("en"), &["shared".to_string()]);
        assert_eq!(names(&all), vec!["cancel", "hi"]);
    }

    #[test]
    fn test_get_all_appends_fallback_when_own_namespace_empty() {
        let store = Arc::new(MemoryStore::default());
        seed(&store, "common", "de", &[("x", "X")]);
        seed(&store, "messages", "en", &[("a", "A"), ("x", "fallback")]);
        let resolver = resolver(&store, &["common"], Some("en"));

        let all = resolver.get_all(false, &tag("de"), &[]);
        assert_eq!(names(&all), vec!["a", "x"]);
        assert_eq!(all[1].value, "X");

        // Own strings present: no fallback
        seed(&store, "messages", "de", &[("b", "B")]);
        let all = resolver.get_all(false, &tag("de"), &[]);
        assert_eq!(names(&all), vec!["b", "x"]);
    }

    #[test]
    fn test_get_all_sorts_names_ignoring_case() {
        let store = Arc::new(MemoryStore::default());
        seed(&store, "messages", "en", &[("apple", "Apple"), ("Cherry", "Cherry")]);
        seed(&store, "common", "en", &[("Banana", "Banana"), ("banana", "lower")]);
        let resolver = resolver(&store, &["common"], None);

        let all = resolver.get_all(false, &tag("en"), &[]);
        assert_eq!(names(&all), vec!["apple", "Banana", "banana", "Cherry"]);
    }

    #[test]
    fn test_store_read_errors_count_as_missing() {
        let backend = MemoryStore::default();
        seed(&backend, "messages", "fr", &[("hi", "Salut")]);
        seed(&backend, "messages", "fr-CH", &[("hi", "Grüezi"), ("bye", "Adieu")]);
        let failing = Arc::new(FailingStore {
            inner: backend,
            broken: "messages.fr-CH.hi".to_string(),
        });
        let resolver = LocalizationResolver::new(failing.clone(), "messages", Vec::new(), None);

        // The failed read falls through to the parent culture
        assert_eq!(resolver.get("hi", &tag("fr-CH")).as_deref(), Some("Salut"));
        assert_eq!(resolver.get("bye", &tag("fr-CH")).as_deref(), Some("Adieu"));

        failing.inner.remove("messages.fr.hi").unwrap();
        let missing = resolver.lookup("hi", &tag("fr-CH"));
        assert!(missing.resource_not_found);
        assert_eq!(missing.value, "hi");
    }

    #[test]
    fn test_specific_fallback_culture_searches_its_parent() {
        let store = Arc::new(MemoryStore::default());
        seed(&store, "messages", "en-US", &[("color", "Color")]);
        seed(&store, "messages", "en", &[("hi", "Hello")]);
        let resolver = resolver(&store, &[], Some("en-US"));

        assert_eq!(resolver.get("color", &tag("de")).as_deref(), Some("Color"));
        assert_eq!(resolver.get("hi", &tag("de")).as_deref(), Some("Hello"));
        assert_eq!(resolver.fallback_culture(), Some(&tag("en-US")));
    }

    #[test]
    fn test_get_all_named_uses_current_culture_for_bad_names() {
        let store = Arc::new(MemoryStore::default());
        seed(&store, "messages", "en", &[("hi", "Hello")]);
        seed(&store, "messages", "fr", &[("hi", "Salut")]);
        let resolver = resolver(&store, &[], None);
        let request = RequestCulture::new(tag("en")).with_ui_culture(tag("fr"));

        let named = resolver.get_all_named(false, Some("en"), &request, &[]);
        assert_eq!(named[0].value, "Hello");

        let invalid = resolver.get_all_named(false, Some("not a culture"), &request, &[]);
        assert_eq!(invalid[0].value, "Salut");

        let unset = resolver.get_all_named(false, None, &request, &[]);
        assert_eq!(unset[0].value, "Salut");
    }

    #[test]
    fn test_location_resolver_inherits_nothing() {
        let store = Arc::new(MemoryStore::default());
        let resolver = LocalizationResolver::with_location(store, "Views.Home", "Resources", None);

        assert_eq!(resolver.namespace(), "Views.Home");
        assert_eq!(resolver.location(), Some("Resources"));
        assert!(resolver.inherited().is_empty());
    }
}
