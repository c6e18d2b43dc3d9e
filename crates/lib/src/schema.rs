//! Field schema and the rules derived from it.
//!
//! A [`Schema`] declares, per user field, whether it is required, unique and/or
//! hashable. When a store opens, the schema is read once into [`FieldRules`]: the
//! `NotNull` set, the `Hashable` set and the list of indices to create.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::backend::IndexSpec;

/// Per-field metadata.
///
/// Built with chained setters:
///
/// ```
/// use userstore::FieldDescriptor;
///
/// let email = FieldDescriptor::new().required().unique();
/// assert!(email.is_required() && email.is_unique() && !email.is_hashable());
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldDescriptor {
    required: bool,
    unique: bool,
    hashable: bool,
}

impl FieldDescriptor {
    pub fn new() -> Self {
        Self::default()
    }

    /// The field must be present and non-null on every stored user.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// No two users may share a value for this field.
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// The field is stored as a hash record and verified on access.
    pub fn hashable(mut self) -> Self {
        self.hashable = true;
        self
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn is_unique(&self) -> bool {
        self.unique
    }

    pub fn is_hashable(&self) -> bool {
        self.hashable
    }
}

/// The set of field descriptors for a users collection.
///
/// Serializes as a plain map from field name to descriptor, so a schema can be read
/// from a JSON file such as `{"Email": {"required": true, "unique": true}}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schema {
    fields: BTreeMap<String, FieldDescriptor>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces the descriptor for `name`.
    pub fn field(mut self, name: impl Into<String>, descriptor: FieldDescriptor) -> Self {
        self.fields.insert(name.into(), descriptor);
        self
    }

    pub fn get(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldDescriptor)> {
        self.fields.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Derives the immutable rules a store enforces.
    ///
    /// `hash_only`, when given, restricts hashing to the named fields among those the
    /// schema marks hashable. `extra_indices` are caller-declared indices; one unique
    /// index per unique field is appended, sparse unless the field is also required.
    pub fn rules(
        &self,
        hash_only: Option<&BTreeSet<String>>,
        extra_indices: &[IndexSpec],
    ) -> FieldRules {
        let mut required = BTreeSet::new();
        let mut hashable = BTreeSet::new();
        let mut indices = extra_indices.to_vec();

        for (name, descriptor) in &self.fields {
            if descriptor.required {
                required.insert(name.clone());
            }
            if descriptor.hashable && hash_only.is_none_or(|only| only.contains(name)) {
                hashable.insert(name.clone());
            }
            if descriptor.unique {
                let index = IndexSpec::unique([name.as_str()]);
                indices.push(if descriptor.required {
                    index
                } else {
                    index.sparse()
                });
            }
        }

        if let Some(only) = hash_only {
            for name in only {
                if !self.get(name).is_some_and(FieldDescriptor::is_hashable) {
                    tracing::warn!(
                        field = %name,
                        "hash_only names a field the schema does not mark hashable; ignoring it"
                    );
                }
            }
        }

        FieldRules {
            required,
            hashable,
            indices,
        }
    }
}

impl<K: Into<String>> FromIterator<(K, FieldDescriptor)> for Schema {
    fn from_iter<I: IntoIterator<Item = (K, FieldDescriptor)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().map(|(k, d)| (k.into(), d)).collect(),
        }
    }
}

/// Rules computed once from a [`Schema`] when a store opens.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldRules {
    required: BTreeSet<String>,
    hashable: BTreeSet<String>,
    indices: Vec<IndexSpec>,
}

impl FieldRules {
    /// Fields that must be present and non-null (the `NotNull` set).
    pub fn required(&self) -> &BTreeSet<String> {
        &self.required
    }

    /// Fields stored as hash records.
    pub fn hashable(&self) -> &BTreeSet<String> {
        &self.hashable
    }

    pub fn is_hashable(&self, field: &str) -> bool {
        self.hashable.contains(field)
    }

    /// Indices created when the store bootstraps its collection.
    pub fn indices(&self) -> &[IndexSpec] {
        &self.indices
    }
}
