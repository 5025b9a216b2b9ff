//! Render context: the data a template sees as `this` and as bare names.

use std::rc::Rc;

use serde::Serialize;

use crate::error::RenderError;
use crate::value::Value;

/// Rendering payload built from any serializable value.
///
/// Objects expose their fields as bare names; any other root (an array, a
/// string) is still reachable through `this`.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderContext {
    root: Value,
}

impl Default for RenderContext {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderContext {
    /// An empty object context.
    pub fn new() -> Self {
        Self {
            root: Value::empty_object(),
        }
    }

    /// Build a [`RenderContext`] from any [`Serialize`] value.
    pub fn from_serialize<T: Serialize + ?Sized>(data: &T) -> Result<Self, RenderError> {
        let json = serde_json::to_value(data)?;
        Ok(Self::from_json(json))
    }

    pub fn from_json(json: serde_json::Value) -> Self {
        Self {
            root: Value::from(json),
        }
    }

    /// Set a top-level field. A non-object root is replaced by an empty
    /// object first.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        if !matches!(self.root, Value::Object(_)) {
            self.root = Value::empty_object();
        }
        if let Value::Object(map) = &mut self.root {
            Rc::make_mut(map).insert(key.into(), value.into());
        }
    }

    pub fn root(&self) -> &Value {
        &self.root
    }
}

impl From<Value> for RenderContext {
    fn from(root: Value) -> Self {
        Self { root }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;

    #[derive(Serialize)]
    struct Paging {
        #[serde(rename = "currentPage")]
        current_page: u32,
        last: u32,
    }

    #[test]
    fn struct_fields_become_properties() {
        let ctx = RenderContext::from_serialize(&Paging {
            current_page: 2,
            last: 5,
        })
        .expect("context conversion");
        assert_eq!(
            ctx.root().get_property("currentPage"),
            Ok(Value::Number(2.0))
        );
        assert!(ctx.root().has_property("last"));
    }

    #[test]
    fn unit_serializes_to_null_root() {
        let ctx = RenderContext::from_serialize(&()).expect("context conversion");
        assert_eq!(ctx.root(), &Value::Null);
    }

    #[test]
    fn insert_adds_fields_and_replaces_non_object_root() {
        let mut ctx = RenderContext::from_json(serde_json::json!([1, 2]));
        ctx.insert("msg", "saved");
        assert_eq!(ctx.root().get_property("msg"), Ok(Value::from("saved")));
        assert!(!ctx.root().has_property("0"));
    }

    #[test]
    fn insert_does_not_affect_clones() {
        let mut ctx = RenderContext::new();
        let before = ctx.clone();
        ctx.insert("a", 1.0);
        assert!(!before.root().has_property("a"));
        assert!(ctx.root().has_property("a"));
    }

    #[test]
    fn map_keys_are_serializable() {
        let data: std::collections::HashMap<&str, Vec<&str>> =
            [("items", vec!["a", "b"])].into_iter().collect();
        let ctx = RenderContext::from_serialize(&data).expect("context conversion");
        let items = ctx.root().get_property("items").expect("items");
        assert_eq!(items.to_display(), "a,b");
    }
}
