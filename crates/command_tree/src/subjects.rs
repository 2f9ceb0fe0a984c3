//! Boundary to the host's subject model.

use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
    sync::Arc,
};

use serde::{Deserialize, Serialize};

/// Which subject store a lookup targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SubjectStore {
    /// Subjects saved to the backing data store.
    Persistent,
    /// Subjects that only live for the current session.
    Transient,
}

/// Identifier normalization for one subject type, such as player name to UUID.
pub type NameTransformer = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Read-only view of registered subjects consumed by subject elements.
pub trait SubjectRegistry: Send + Sync {
    /// Every registered subject type name.
    fn registered_subject_types(&self) -> BTreeSet<String>;

    /// Whether `identifier` exists in `store` for `subject_type`.
    fn is_registered(&self, store: SubjectStore, subject_type: &str, identifier: &str) -> bool;

    /// Every identifier in `store` for `subject_type`.
    fn all_identifiers(&self, store: SubjectStore, subject_type: &str) -> Vec<String>;

    /// Normalized form of `name` for `subject_type`, if the type defines one.
    fn transform_name(&self, subject_type: &str, name: &str) -> Option<String>;
}

#[derive(Default, Clone)]
struct SubjectTypeEntry {
    persistent: BTreeSet<String>,
    transient: BTreeSet<String>,
    transformer: Option<NameTransformer>,
}

impl SubjectTypeEntry {
    fn store(&self, store: SubjectStore) -> &BTreeSet<String> {
        match store {
            SubjectStore::Persistent => &self.persistent,
            SubjectStore::Transient => &self.transient,
        }
    }
}

/// In-memory [`SubjectRegistry`] for hosts without their own subject backend.
#[derive(Default, Clone)]
pub struct MemorySubjectRegistry {
    types: BTreeMap<String, SubjectTypeEntry>,
}

impl MemorySubjectRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a subject type with no subjects.
    pub fn with_type(mut self, subject_type: impl Into<String>) -> Self {
        self.types.entry(subject_type.into()).or_default();
        self
    }

    /// Adds one subject, registering its type when needed.
    pub fn with_subject(
        mut self,
        store: SubjectStore,
        subject_type: impl Into<String>,
        identifier: impl Into<String>,
    ) -> Self {
        let entry = self.types.entry(subject_type.into()).or_default();
        match store {
            SubjectStore::Persistent => entry.persistent.insert(identifier.into()),
            SubjectStore::Transient => entry.transient.insert(identifier.into()),
        };
        self
    }

    /// Installs the identifier normalization for `subject_type`.
    pub fn with_name_transformer<F>(
        mut self,
        subject_type: impl Into<String>,
        transformer: F,
    ) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        let entry = self.types.entry(subject_type.into()).or_default();
        entry.transformer = Some(Arc::new(transformer));
        self
    }
}

impl fmt::Debug for MemorySubjectRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemorySubjectRegistry")
            .field("types", &self.types.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl SubjectRegistry for MemorySubjectRegistry {
    fn registered_subject_types(&self) -> BTreeSet<String> {
        self.types.keys().cloned().collect()
    }

    fn is_registered(&self, store: SubjectStore, subject_type: &str, identifier: &str) -> bool {
        self.types
            .get(subject_type)
            .is_some_and(|entry| entry.store(store).contains(identifier))
    }

    fn all_identifiers(&self, store: SubjectStore, subject_type: &str) -> Vec<String> {
        self.types
            .get(subject_type)
            .map(|entry| entry.store(store).iter().cloned().collect())
            .unwrap_or_default()
    }

    fn transform_name(&self, subject_type: &str, name: &str) -> Option<String> {
        let transformer = self.types.get(subject_type)?.transformer.as_ref()?;
        transformer(name)
    }
}
