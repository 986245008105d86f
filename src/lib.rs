//! A small HTML template engine for a `{{ }}` / `{% %}` mini-language.
//!
//! A [Template] parsed from source is rendered against a [Value]
//! context: `{{ name }}` placeholders with dotted-path lookup and
//! HTML escaping, `{% if %}`/`{% else %}` conditionals with loose
//! comparisons, and nestable `{% foreach %}` loops exposing `key`,
//! `value` and `parent.*` back-references. A leading backslash turns
//! any token into literal output.
//!
//! Rendering is a pure function of the template text and the context:
//! missing names never fail, they leave the token visible (placeholders)
//! or produce nothing (loops, conditionals). The only hard error is
//! passing non-mapping top-level data. The `FilePath(...)` helper and
//! `filetime` filter append a cache-busting modification stamp to
//! static asset paths under a root configured on the [Engine].
//!
//!
//! # Samples
//!
//! ## Hello world
//!
//! ```
//! use stencil::{Engine, Value};
//!
//! let text = "hello, {{you}}!";
//! let data = r#"{
//!     "you": "world"
//! }"#;
//!
//! let engine = Engine::new();
//! let context = serde_json::from_str::<Value>(data).unwrap();
//!
//! let result = engine.render(text, context);
//!
//! assert_eq!(result.unwrap(), "hello, world!")
//! ```
//!
//! ## Hello team
//!
//! ```
//! use stencil::{Template, Value, YamlValue};
//!
//! let text = "{% foreach team %}hello, {{value.address}} {{value.name}}!\n{% endforeach %}";
//! let data = r#"
//!   team:
//!     - name: john
//!       address: little
//!     - name: jane
//!       address: citizen
//! "#;
//!
//! let template = Template::from(text);
//! let context = serde_yaml::from_str::<YamlValue>(data).unwrap();
//!
//! let result = template.render(Value::from(&context));
//!
//! assert_eq!(result.unwrap(), "hello, little john!\nhello, citizen jane!\n");
//! ```
mod assets;
mod context;
mod engine;
mod expr;
mod json;
mod reader;
mod template;
mod value;
mod yaml;

pub use self::engine::{Engine, RenderError};
pub use self::json::JsonValue;
pub use self::template::Template;
pub use self::value::{Map, Number, Value};
pub use self::yaml::YamlValue;
