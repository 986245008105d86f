use std::path::PathBuf;

use thiserror::Error;

use crate::assets::AssetResolver;
use crate::context::{Context, Scope};
use crate::template::Template;
use crate::value::{Map, Value};

/// The one hard failure: everything data-driven (missing names, wrong
/// value types, malformed constructs) renders through without error.
#[derive(Debug, Error, PartialEq)]
pub enum RenderError {
    #[error("top-level template data must be a mapping")]
    NotAMapping,
}

/// Renders templates against constructor data merged with per-call
/// data. Stateless across calls apart from the idempotent asset-mtime
/// memo, so one engine may serve concurrent renders.
#[derive(Debug, Default)]
pub struct Engine {
    base: Map,
    assets: AssetResolver,
}

impl Engine {
    pub fn new() -> Self {
        Engine::default()
    }

    /// An engine whose `data` mapping is merged under every render
    /// call's own data.
    pub fn with_data(data: Value) -> Result<Self, RenderError> {
        Ok(Engine { base: into_map(data)?, assets: AssetResolver::default() })
    }

    /// Sets the public-asset root that `FilePath(...)` and the
    /// `filetime` filter resolve against.
    pub fn asset_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.assets = AssetResolver::new(Some(root.into()));
        self
    }

    pub fn render(&self, template: &str, data: Value) -> Result<String, RenderError> {
        self.render_parsed(&Template::from(template), data)
    }

    /// Renders an already-parsed [Template]; the loop-frame stack is
    /// created per call, so nothing leaks between renders.
    pub fn render_parsed(&self, template: &Template, data: Value) -> Result<String, RenderError> {
        let context = Context::build(&self.base, into_map(data)?);
        let mut scope = Scope::new(&context, &self.assets);
        Ok(template.render_internal(&mut scope))
    }
}

// Null is accepted as "no data"; anything else non-mapping is a
// caller contract violation
fn into_map(data: Value) -> Result<Map, RenderError> {
    match data {
        Value::Mapping(map) => Ok(map),
        Value::Null => Ok(Map::new()),
        _ => Err(RenderError::NotAMapping),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapping(entries: Vec<(&str, Value)>) -> Value {
        entries
            .into_iter()
            .map(|(k, v)| (k.to_owned(), v))
            .collect()
    }

    #[test]
    fn call_data_overrides_constructor_data() {
        let engine = Engine::with_data(mapping(vec![
            ("site", Value::from("base")),
            ("kept", Value::from("yes")),
        ]))
        .expect("mapping data");
        let result = engine
            .render("{{site}}/{{kept}}", mapping(vec![("site", Value::from("call"))]))
            .expect("mapping data");
        assert_eq!(result, "call/yes");
    }

    #[test]
    fn null_counts_as_no_data() {
        let engine = Engine::new();
        assert_eq!(engine.render("plain", Value::Null), Ok("plain".to_owned()));
    }

    #[test]
    fn non_mapping_data_is_rejected() {
        let engine = Engine::new();
        assert_eq!(
            engine.render("x", Value::from("scalar")),
            Err(RenderError::NotAMapping)
        );
        assert_eq!(
            Engine::with_data(Value::from(1)).map(|_| ()),
            Err(RenderError::NotAMapping)
        );
    }

    #[test]
    fn renders_are_independent() {
        let engine = Engine::new();
        let looped = engine
            .render(
                "{% foreach items %}{{key}}{% endforeach %}",
                mapping(vec![("items", mapping(vec![("a", Value::from(1))]))]),
            )
            .expect("mapping data");
        assert_eq!(looped, "a");
        // loop-relative names are unresolved again afterwards
        let probe = engine.render("{{key}}", Value::Null).expect("null data");
        assert_eq!(probe, "{{key}}");
    }
}
