//! Stencil core library: template definitions, the registry, errors.
//!
//! - [`types`]: newtypes and definitions
//! - [`error`]: [`RegistryError`]
//! - [`registry`]: [`TemplateRegistry`] and catalogue loading
//! - [`catalogue`]: built-in templates

pub mod catalogue;
pub mod error;
pub mod registry;
pub mod types;

pub use error::RegistryError;
pub use registry::TemplateRegistry;
pub use types::{CatalogueEntry, TemplateDefinition, TemplateName};
