//! Schema combination and property-set diffing
//!
//! Both operations look only at the two reserved keys of a schema
//! (`properties` and `required`):
//!
//! - [`combine`] unions several schemas into one property set. On key
//!   collisions later schemas win; `required` is concatenated with
//!   duplicates removed, keeping the first occurrence.
//! - [`diff`] keeps the properties of `source` that `target` lacks, and the
//!   subset of `source.required` that survived.
//!
//! The build pipeline diffs the combined manifest schema against what a
//! backend declares; the import pipeline runs the same diff the other way
//! around.

use crate::error::Result;
use crate::schema::{SchemaMap, SchemaNode};

/// The `properties`/`required` projection of a schema
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertySet {
    pub properties: SchemaMap,
    pub required: Vec<String>,
}

/// Union of params, connections and generated metadata
pub type CombinedSchema = PropertySet;

/// One-directional diff between two property sets
pub type MissingSet = PropertySet;

impl PropertySet {
    /// Project a schema node onto its property set
    ///
    /// Missing `properties`/`required` keys default to empty.
    pub fn from_node(node: &SchemaNode) -> Result<Self> {
        Ok(Self {
            properties: node.properties()?.cloned().unwrap_or_default(),
            required: node.required()?,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    pub fn is_required(&self, name: &str) -> bool {
        self.required.iter().any(|r| r == name)
    }

    /// Property names, in order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.properties.keys().map(String::as_str)
    }

    /// Drop a property and its `required` entry
    pub fn remove(&mut self, name: &str) -> Option<SchemaNode> {
        self.required.retain(|r| r != name);
        self.properties.shift_remove(name)
    }

    /// Fold another set into this one without overriding existing entries
    ///
    /// Used when accumulating per-step diffs: the first step to report a
    /// property keeps it.
    pub fn absorb(&mut self, other: PropertySet) {
        for (name, schema) in other.properties {
            if !self.properties.contains_key(&name) {
                if other.required.contains(&name) && !self.is_required(&name) {
                    self.required.push(name.clone());
                }
                self.properties.insert(name, schema);
            }
        }
    }

    /// Render back into a schema node
    pub fn to_node(&self) -> SchemaNode {
        SchemaNode::from_parts(self.properties.clone(), &self.required)
    }
}

/// Combine several schemas into one property set
///
/// Later schemas override earlier ones on a property-name collision.
pub fn combine(schemas: &[&SchemaNode]) -> Result<CombinedSchema> {
    let mut combined = PropertySet::default();

    for schema in schemas {
        if let Some(properties) = schema.properties()? {
            for (name, property) in properties {
                combined.properties.insert(name.clone(), property.clone());
            }
        }
        for name in schema.required()? {
            if !combined.is_required(&name) {
                combined.required.push(name);
            }
        }
    }

    Ok(combined)
}

/// Properties of `source` that `target` does not declare
pub fn diff(source: &PropertySet, target: &PropertySet) -> MissingSet {
    let properties: SchemaMap = source
        .properties
        .iter()
        .filter(|(name, _)| !target.properties.contains_key(*name))
        .map(|(name, schema)| (name.clone(), schema.clone()))
        .collect();

    let mut required: Vec<String> = Vec::new();
    for name in &source.required {
        if properties.contains_key(name) && !required.contains(name) {
            required.push(name.clone());
        }
    }

    PropertySet {
        properties,
        required,
    }
}

/// [`diff`] over raw schema nodes
pub fn diff_nodes(source: &SchemaNode, target: &SchemaNode) -> Result<MissingSet> {
    Ok(diff(
        &PropertySet::from_node(source)?,
        &PropertySet::from_node(target)?,
    ))
}
