//! Name → template body registry.
//!
//! # Lifecycle
//!
//! A [`TemplateRegistry`] is built once at start-up, usually with the
//! built-in catalogue, optionally extended from YAML catalogue files, and
//! then handed by reference to whatever renders templates. Registration is
//! append/overwrite by name, last write wins.
//!
//! One name (the *dynamic slot*, `layer` by default) is reserved for content
//! staged by the caller immediately before rendering it. Writes go through
//! `&mut self`, so staging and rendering cannot interleave with another writer.
//!
//! # Catalogue file format
//!
//! ```yaml
//! greeting: "Hello, <% this.name %>!"
//! list:
//!   - "<ul>"
//!   - "<% for (var i = 0; i < this.items.length; i++) { %>"
//!   - "<li><% this.items[i] %></li>"
//!   - "<% } %>"
//!   - "</ul>"
//! ```

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use crate::catalogue;
use crate::error::RegistryError;
use crate::types::{CatalogueEntry, TemplateDefinition, TemplateName};

/// Owned mapping from template names to definitions.
#[derive(Debug, Clone)]
pub struct TemplateRegistry {
    templates: HashMap<TemplateName, TemplateDefinition>,
    dynamic_slot: TemplateName,
}

impl Default for TemplateRegistry {
    fn default() -> Self {
        Self::empty(catalogue::DYNAMIC_SLOT)
    }
}

impl TemplateRegistry {
    /// An empty registry reserving `dynamic_slot`.
    pub fn empty(dynamic_slot: impl Into<TemplateName>) -> Self {
        Self {
            templates: HashMap::new(),
            dynamic_slot: dynamic_slot.into(),
        }
    }

    /// A registry pre-populated with the built-in catalogue.
    pub fn with_builtins(dynamic_slot: impl Into<TemplateName>) -> Self {
        let mut registry = Self::empty(dynamic_slot);
        for def in catalogue::builtin() {
            registry.templates.insert(def.name.clone(), def);
        }
        registry
    }

    /// Raw body registered under `name`, or `None` if absent.
    pub fn get(&self, name: &str) -> Option<String> {
        self.templates
            .get(&TemplateName::from(name))
            .map(TemplateDefinition::body)
    }

    /// Full definition registered under `name`.
    pub fn definition(&self, name: &str) -> Option<&TemplateDefinition> {
        self.templates.get(&TemplateName::from(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.templates.contains_key(&TemplateName::from(name))
    }

    /// Register `def`, replacing any definition with the same name.
    ///
    /// Returns the replaced definition, if any.
    pub fn register(
        &mut self,
        def: TemplateDefinition,
    ) -> Result<Option<TemplateDefinition>, RegistryError> {
        if def.name.0.is_empty() {
            return Err(RegistryError::EmptyName);
        }
        let name = def.name.clone();
        let previous = self.templates.insert(name.clone(), def);
        tracing::debug!(
            template = %name,
            replaced = previous.is_some(),
            "registered template"
        );
        Ok(previous)
    }

    /// Name of the reserved dynamic slot.
    pub fn dynamic_slot(&self) -> &TemplateName {
        &self.dynamic_slot
    }

    /// Overwrite the dynamic slot with `body`.
    pub fn stage_dynamic(&mut self, body: impl Into<String>) {
        let def = TemplateDefinition::from_body(self.dynamic_slot.clone(), body);
        self.templates.insert(self.dynamic_slot.clone(), def);
        tracing::debug!(template = %self.dynamic_slot, "staged dynamic content");
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&TemplateName> {
        let mut names: Vec<_> = self.templates.keys().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Load every entry of the YAML catalogue at `path` into the registry.
    ///
    /// Returns the number of definitions loaded.
    pub fn load_catalogue_at(&mut self, path: &Path) -> Result<usize, RegistryError> {
        let defs = read_catalogue_at(path)?;
        let count = defs.len();
        for def in defs {
            self.register(def)?;
        }
        tracing::debug!(path = %path.display(), count, "loaded catalogue");
        Ok(count)
    }
}

/// Parse the YAML catalogue at `path` without registering anything.
///
/// Returns `RegistryError::CatalogueNotFound` if absent,
/// `RegistryError::Parse` (with path + line context) if malformed YAML.
pub fn read_catalogue_at(path: &Path) -> Result<Vec<TemplateDefinition>, RegistryError> {
    if !path.exists() {
        return Err(RegistryError::CatalogueNotFound {
            path: path.to_path_buf(),
        });
    }
    let contents = std::fs::read_to_string(path).map_err(|source| RegistryError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let entries: BTreeMap<String, CatalogueEntry> =
        serde_yaml::from_str(&contents).map_err(|source| RegistryError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(entries
        .into_iter()
        .map(|(name, entry)| entry.into_definition(TemplateName::from(name)))
        .collect())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_unknown_returns_none() {
        let registry = TemplateRegistry::with_builtins("layer");
        assert!(registry.get("nonexistent").is_none());
    }

    #[test]
    fn get_builtin_returns_flat_body() {
        let registry = TemplateRegistry::with_builtins("layer");
        assert_eq!(
            registry.get("loading").as_deref(),
            Some("<div class=\"loading\"></div>")
        );
    }

    #[test]
    fn register_last_write_wins() {
        let mut registry = TemplateRegistry::default();
        registry
            .register(TemplateDefinition::from_body("greet", "one"))
            .expect("first");
        let previous = registry
            .register(TemplateDefinition::from_body("greet", "two"))
            .expect("second");
        assert_eq!(previous.map(|d| d.body()).as_deref(), Some("one"));
        assert_eq!(registry.get("greet").as_deref(), Some("two"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn register_rejects_empty_name() {
        let mut registry = TemplateRegistry::default();
        let err = registry
            .register(TemplateDefinition::from_body("", "x"))
            .unwrap_err();
        assert!(matches!(err, RegistryError::EmptyName));
    }

    #[test]
    fn stage_dynamic_overwrites_reserved_slot() {
        let mut registry = TemplateRegistry::with_builtins("layer");
        registry.stage_dynamic("<p><% this.msg %></p>");
        assert_eq!(registry.get("layer").as_deref(), Some("<p><% this.msg %></p>"));
    }

    #[test]
    fn names_are_sorted() {
        let registry = TemplateRegistry::with_builtins("layer");
        let names: Vec<&str> = registry.names().into_iter().map(|n| n.0.as_str()).collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
        assert!(names.contains(&"pagingCommands"));
    }

    #[test]
    fn catalogue_not_found() {
        let dir = tempfile::TempDir::new().expect("tempdir");
        let err = read_catalogue_at(&dir.path().join("missing.yaml")).unwrap_err();
        assert!(matches!(err, RegistryError::CatalogueNotFound { .. }));
    }
}
