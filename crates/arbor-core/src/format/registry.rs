use std::collections::HashMap;

use super::field::FieldDef;
use super::node_format::NodeFormat;
use crate::errors::{ArborError, Result};

/// Name of the starter type present in a fresh document
pub const DEFAULT_TYPE_NAME: &str = "DEFAULT";

/// The set of node types in a document, keyed by type name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormatRegistry {
    formats: HashMap<String, NodeFormat>,
}

impl FormatRegistry {
    pub fn new() -> FormatRegistry {
        FormatRegistry::default()
    }

    /// Build a registry from an already-keyed format map
    pub(crate) fn from_map(formats: HashMap<String, NodeFormat>) -> FormatRegistry {
        FormatRegistry { formats }
    }

    /// A registry holding only the starter type
    pub fn with_default() -> FormatRegistry {
        let mut registry = FormatRegistry::new();
        registry
            .formats
            .insert(DEFAULT_TYPE_NAME.to_string(), NodeFormat::with_default_field(DEFAULT_TYPE_NAME));
        registry
    }

    pub fn get(&self, type_name: &str) -> Option<&NodeFormat> {
        self.formats.get(type_name)
    }

    pub fn get_mut(&mut self, type_name: &str) -> Option<&mut NodeFormat> {
        self.formats.get_mut(type_name)
    }

    /// Look up a type, failing if it is not registered
    pub fn require(&self, type_name: &str) -> Result<&NodeFormat> {
        self.formats
            .get(type_name)
            .ok_or_else(|| ArborError::TypeNotFound {
                type_name: type_name.to_string(),
            })
    }

    pub fn require_mut(&mut self, type_name: &str) -> Result<&mut NodeFormat> {
        self.formats
            .get_mut(type_name)
            .ok_or_else(|| ArborError::TypeNotFound {
                type_name: type_name.to_string(),
            })
    }

    /// Register a new type, rejecting duplicate names
    pub fn insert(&mut self, format: NodeFormat) -> Result<()> {
        if self.formats.contains_key(&format.name) {
            return Err(ArborError::DuplicateTypeName {
                type_name: format.name.clone(),
            });
        }
        self.formats.insert(format.name.clone(), format);
        Ok(())
    }

    /// Register a type, replacing any existing one with the same name
    pub fn insert_or_replace(&mut self, format: NodeFormat) {
        self.formats.insert(format.name.clone(), format);
    }

    pub fn remove(&mut self, type_name: &str) -> Option<NodeFormat> {
        self.formats.remove(type_name)
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.formats.contains_key(type_name)
    }

    pub fn len(&self) -> usize {
        self.formats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.formats.is_empty()
    }

    /// Type names in sorted order
    pub fn type_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.formats.keys().cloned().collect();
        names.sort();
        names
    }

    /// Formats in name-sorted order, the order used for persistence
    pub fn sorted_formats(&self) -> Vec<&NodeFormat> {
        let mut formats: Vec<&NodeFormat> = self.formats.values().collect();
        formats.sort_by(|a, b| a.name.cmp(&b.name));
        formats
    }

    pub fn iter(&self) -> impl Iterator<Item = &NodeFormat> {
        self.formats.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut NodeFormat> {
        self.formats.values_mut()
    }

    /// The type new top-level content starts with: the starter type when
    /// present, otherwise the first name in sorted order
    pub fn default_type_name(&self) -> Option<String> {
        if self.formats.contains_key(DEFAULT_TYPE_NAME) {
            return Some(DEFAULT_TYPE_NAME.to_string());
        }
        self.type_names().into_iter().next()
    }
}

/// The effect of a committed scratch edit, ready to apply to live data
///
/// Rename pairs always map checkout-time names to committed names, with
/// intermediate renames collapsed away.
#[derive(Debug, Clone)]
pub struct FormatChanges {
    pub formats: HashMap<String, NodeFormat>,
    /// (name at checkout, committed name)
    pub type_renames: Vec<(String, String)>,
    /// checkout-time type name -> (field name at checkout, committed name)
    pub field_renames: HashMap<String, Vec<(String, String)>>,
    /// checkout-time names of deleted types
    pub removed_types: Vec<String>,
}

/// A what-if copy of the registry for configuration editing
///
/// All type and field edits happen on the scratch copy; nothing touches
/// live data until the scratch is committed, which produces a
/// [`FormatChanges`] diff that the structure applies atomically. Dropping
/// the scratch discards every edit.
#[derive(Debug, Clone)]
pub struct FormatScratch {
    formats: HashMap<String, NodeFormat>,
    /// current type name -> name at checkout, for types that existed then
    type_origins: HashMap<String, String>,
    /// current type name -> (current field name -> field name at checkout)
    field_origins: HashMap<String, HashMap<String, String>>,
    removed_types: Vec<String>,
}

impl FormatScratch {
    /// Snapshot the live registry for editing
    pub fn checkout(registry: &FormatRegistry) -> FormatScratch {
        let mut type_origins = HashMap::new();
        let mut field_origins = HashMap::new();
        for format in registry.iter() {
            type_origins.insert(format.name.clone(), format.name.clone());
            let fields: HashMap<String, String> = format
                .fields
                .iter()
                .map(|field| (field.name.clone(), field.name.clone()))
                .collect();
            field_origins.insert(format.name.clone(), fields);
        }
        FormatScratch {
            formats: registry.formats.clone(),
            type_origins,
            field_origins,
            removed_types: Vec::new(),
        }
    }

    pub fn get(&self, type_name: &str) -> Option<&NodeFormat> {
        self.formats.get(type_name)
    }

    pub fn get_mut(&mut self, type_name: &str) -> Option<&mut NodeFormat> {
        self.formats.get_mut(type_name)
    }

    pub fn type_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.formats.keys().cloned().collect();
        names.sort();
        names
    }

    fn require_mut(&mut self, type_name: &str) -> Result<&mut NodeFormat> {
        self.formats
            .get_mut(type_name)
            .ok_or_else(|| ArborError::TypeNotFound {
                type_name: type_name.to_string(),
            })
    }

    /// Add a new type with the standard starter field
    pub fn add_type(&mut self, type_name: &str) -> Result<&mut NodeFormat> {
        if self.formats.contains_key(type_name) {
            return Err(ArborError::DuplicateTypeName {
                type_name: type_name.to_string(),
            });
        }
        self.field_origins
            .insert(type_name.to_string(), HashMap::new());
        Ok(self
            .formats
            .entry(type_name.to_string())
            .or_insert_with(|| NodeFormat::with_default_field(type_name)))
    }

    /// Delete a type from the scratch set
    pub fn remove_type(&mut self, type_name: &str) -> Result<()> {
        if self.formats.remove(type_name).is_none() {
            return Err(ArborError::TypeNotFound {
                type_name: type_name.to_string(),
            });
        }
        self.field_origins.remove(type_name);
        if let Some(origin) = self.type_origins.remove(type_name) {
            self.removed_types.push(origin);
        }
        Ok(())
    }

    /// Rename a type, rewriting child-type hints that pointed at it
    pub fn rename_type(&mut self, old_name: &str, new_name: &str) -> Result<()> {
        if old_name == new_name {
            return Ok(());
        }
        if self.formats.contains_key(new_name) {
            return Err(ArborError::DuplicateTypeName {
                type_name: new_name.to_string(),
            });
        }
        let mut format = self
            .formats
            .remove(old_name)
            .ok_or_else(|| ArborError::TypeNotFound {
                type_name: old_name.to_string(),
            })?;
        format.name = new_name.to_string();
        self.formats.insert(new_name.to_string(), format);
        if let Some(origin) = self.type_origins.remove(old_name) {
            self.type_origins.insert(new_name.to_string(), origin);
        }
        if let Some(fields) = self.field_origins.remove(old_name) {
            self.field_origins.insert(new_name.to_string(), fields);
        }
        for format in self.formats.values_mut() {
            if format.child_type_hint == old_name {
                format.child_type_hint = new_name.to_string();
            }
        }
        Ok(())
    }

    /// Add a field to a scratch type
    pub fn add_field(&mut self, type_name: &str, field: FieldDef) -> Result<()> {
        self.require_mut(type_name)?.add_field(field)
    }

    /// Rename a field on a scratch type
    pub fn rename_field(&mut self, type_name: &str, old_name: &str, new_name: &str) -> Result<()> {
        self.require_mut(type_name)?
            .rename_field(old_name, new_name)?;
        if let Some(fields) = self.field_origins.get_mut(type_name) {
            if let Some(origin) = fields.remove(old_name) {
                fields.insert(new_name.to_string(), origin);
            }
        }
        Ok(())
    }

    /// Remove a field from a scratch type
    pub fn remove_field(&mut self, type_name: &str, field_name: &str) -> Result<()> {
        self.require_mut(type_name)?.remove_field(field_name)?;
        if let Some(fields) = self.field_origins.get_mut(type_name) {
            fields.remove(field_name);
        }
        Ok(())
    }

    /// Collapse the edit history into an applicable change set
    pub fn into_changes(self) -> FormatChanges {
        let mut type_renames = Vec::new();
        let mut field_renames: HashMap<String, Vec<(String, String)>> = HashMap::new();
        for (current, origin) in &self.type_origins {
            if current != origin {
                type_renames.push((origin.clone(), current.clone()));
            }
            let renames: Vec<(String, String)> = self
                .field_origins
                .get(current)
                .map(|fields| {
                    fields
                        .iter()
                        .filter(|(name, orig)| name != orig)
                        .map(|(name, orig)| (orig.clone(), name.clone()))
                        .collect()
                })
                .unwrap_or_default();
            if !renames.is_empty() {
                field_renames.insert(origin.clone(), renames);
            }
        }
        type_renames.sort();
        FormatChanges {
            formats: self.formats,
            type_renames,
            field_renames,
            removed_types: self.removed_types,
        }
    }
}
