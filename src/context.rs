use crate::assets::AssetResolver;
use crate::value::{Map, Value};

/// Name lookup table for one render call. Top-level scalar strings are
/// escaped exactly once here; nested values are escaped at resolution
/// time instead.
pub(crate) struct Context {
    entries: Map,
}

impl Context {
    pub(crate) fn build(base: &Map, call: Map) -> Self {
        let mut entries = Map::new();
        for (name, value) in base {
            entries.insert(name.clone(), prepare(value.clone()));
        }
        // call data wins on key collision
        for (name, value) in call {
            entries.insert(name, prepare(value));
        }
        Context { entries }
    }

    pub(crate) fn get(&self, name: &str) -> Option<&Value> {
        self.entries.get(name)
    }
}

// decode first so upstream entity-encoded input is not escaped twice
fn prepare(value: Value) -> Value {
    match value {
        Value::String(text) => Value::String(escape_html(&unescape_html(&text))),
        other => other,
    }
}

/// One loop iteration: the current key, the current element, and
/// implicitly the enclosing iteration one position down the stack.
pub(crate) struct Frame<'a> {
    pub(crate) key: String,
    pub(crate) value: &'a Value,
}

pub(crate) struct Scope<'a> {
    context: &'a Context,
    frames: Vec<Frame<'a>>,
    pub(crate) assets: &'a AssetResolver,
}

pub(crate) enum Lookup<'a> {
    Value(&'a Value),
    Key(String),
    Miss,
}

impl<'a> Scope<'a> {
    pub(crate) fn new(context: &'a Context, assets: &'a AssetResolver) -> Self {
        Scope { context, frames: Vec::new(), assets }
    }

    pub(crate) fn push(&mut self, key: String, value: &'a Value) {
        self.frames.push(Frame { key, value });
    }

    pub(crate) fn pop(&mut self) {
        self.frames.pop();
    }

    /// Dotted-path resolution: `parent.*` walks down the loop stack,
    /// `key`/`value` read the innermost frame, anything else is an
    /// absolute context lookup. Any miss is a [Lookup::Miss], never an
    /// error.
    pub(crate) fn lookup(&self, segments: &[String]) -> Lookup<'a> {
        if segments.is_empty() {
            return Lookup::Miss;
        }
        let mut levels = 0;
        while segments.get(levels).map(String::as_str) == Some("parent") {
            levels += 1;
        }
        if levels > 0 {
            // parent.N beyond the stack depth resolves to nothing
            return match self.frames.len().checked_sub(levels + 1) {
                Some(position) => frame_lookup(&self.frames[position], &segments[levels..]),
                None => Lookup::Miss,
            };
        }
        if !self.frames.is_empty() && matches!(segments[0].as_str(), "key" | "value") {
            return match self.frames.last() {
                Some(frame) => frame_lookup(frame, segments),
                None => Lookup::Miss,
            };
        }
        let context: &'a Context = self.context;
        match descend(context.get(&segments[0]), &segments[1..]) {
            Some(value) => Lookup::Value(value),
            None => Lookup::Miss,
        }
    }
}

fn frame_lookup<'a>(frame: &Frame<'a>, segments: &[String]) -> Lookup<'a> {
    match segments.first().map(String::as_str) {
        Some("key") if segments.len() == 1 => Lookup::Key(frame.key.clone()),
        Some("value") => match descend(Some(frame.value), &segments[1..]) {
            Some(value) => Lookup::Value(value),
            None => Lookup::Miss,
        },
        _ => Lookup::Miss,
    }
}

fn descend<'a>(start: Option<&'a Value>, segments: &[String]) -> Option<&'a Value> {
    let mut current = start?;
    for segment in segments {
        current = current.index(segment)?;
    }
    Some(current)
}

pub(crate) fn escape_html(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#039;")
}

// inverse of escape_html, tolerating the short apostrophe form;
// &amp; goes last so decoding is single-pass
pub(crate) fn unescape_html(input: &str) -> String {
    input
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#039;", "'")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Number;

    fn mapping(entries: Vec<(&str, Value)>) -> Map {
        entries
            .into_iter()
            .map(|(k, v)| (k.to_owned(), v))
            .collect()
    }

    #[test]
    fn build_escapes_top_level_strings() {
        let context = Context::build(&Map::new(), mapping(vec![("x", Value::from("<b>"))]));
        assert_eq!(context.get("x"), Some(&Value::from("&lt;b&gt;")));
    }

    #[test]
    fn build_keeps_nested_values_raw() {
        let nested = Value::Mapping(mapping(vec![("inner", Value::from("<i>"))]));
        let context = Context::build(&Map::new(), mapping(vec![("m", nested)]));
        assert_eq!(
            context.get("m").and_then(|m| m.index("inner")),
            Some(&Value::from("<i>"))
        );
    }

    #[test]
    fn call_data_wins_over_base() {
        let base = mapping(vec![("x", Value::from("base")), ("y", Value::from("kept"))]);
        let context = Context::build(&base, mapping(vec![("x", Value::from("call"))]));
        assert_eq!(context.get("x"), Some(&Value::from("call")));
        assert_eq!(context.get("y"), Some(&Value::from("kept")));
    }

    #[test]
    fn absolute_dotted_lookup() {
        let nested = Value::Mapping(mapping(vec![(
            "profile",
            Value::Mapping(mapping(vec![("city", Value::from("Pau"))])),
        )]));
        let context = Context::build(&Map::new(), mapping(vec![("user", nested)]));
        let assets = AssetResolver::default();
        let scope = Scope::new(&context, &assets);
        let path = vec!["user".to_owned(), "profile".to_owned(), "city".to_owned()];
        match scope.lookup(&path) {
            Lookup::Value(value) => assert_eq!(value, &Value::from("Pau")),
            _ => panic!("expected a value"),
        }
    }

    #[test]
    fn sequence_index_lookup() {
        let seq = Value::Sequence(vec![Value::from(10), Value::from(20)]);
        let context = Context::build(&Map::new(), mapping(vec![("seq", seq)]));
        let assets = AssetResolver::default();
        let scope = Scope::new(&context, &assets);
        let path = vec!["seq".to_owned(), "1".to_owned()];
        match scope.lookup(&path) {
            Lookup::Value(value) => assert_eq!(value, &Value::Number(Number::Int(20))),
            _ => panic!("expected a value"),
        }
    }

    #[test]
    fn frame_key_and_value() {
        let context = Context::build(&Map::new(), Map::new());
        let assets = AssetResolver::default();
        let mut scope = Scope::new(&context, &assets);
        let element = Value::Mapping(mapping(vec![("name", Value::from("Alex"))]));
        scope.push("dev".to_owned(), &element);

        match scope.lookup(&["key".to_owned()]) {
            Lookup::Key(key) => assert_eq!(key, "dev"),
            _ => panic!("expected the frame key"),
        }
        let path = vec!["value".to_owned(), "name".to_owned()];
        match scope.lookup(&path) {
            Lookup::Value(value) => assert_eq!(value, &Value::from("Alex")),
            _ => panic!("expected a value"),
        }
    }

    #[test]
    fn parent_chain_and_overflow() {
        let context = Context::build(&Map::new(), Map::new());
        let assets = AssetResolver::default();
        let mut scope = Scope::new(&context, &assets);
        let outer = Value::from("o");
        let inner = Value::from("i");
        scope.push("outer".to_owned(), &outer);
        scope.push("inner".to_owned(), &inner);

        let path = vec!["parent".to_owned(), "key".to_owned()];
        match scope.lookup(&path) {
            Lookup::Key(key) => assert_eq!(key, "outer"),
            _ => panic!("expected the parent key"),
        }
        let too_deep = vec!["parent".to_owned(), "parent".to_owned(), "key".to_owned()];
        assert!(matches!(scope.lookup(&too_deep), Lookup::Miss));
    }

    #[test]
    fn key_outside_loop_is_an_absolute_name() {
        let context = Context::build(&Map::new(), mapping(vec![("key", Value::from("k"))]));
        let assets = AssetResolver::default();
        let scope = Scope::new(&context, &assets);
        match scope.lookup(&["key".to_owned()]) {
            Lookup::Value(value) => assert_eq!(value, &Value::from("k")),
            _ => panic!("expected the context entry"),
        }
    }

    #[test]
    fn escape_round_trip() {
        let raw = "a & b < c > \"d\" 'e'";
        assert_eq!(unescape_html(&escape_html(raw)), raw);
        // escaping already-escaped text is undone by a single decode
        assert_eq!(unescape_html(&escape_html("&lt;")), "&lt;");
    }
}
