use std::fmt::Debug;

use log::debug;

use crate::assets;
use crate::context::{escape_html, unescape_html, Lookup, Scope};
use crate::engine::{Engine, RenderError};
use crate::expr::{self, Expr};
use crate::reader::{Reader, Token};
use crate::value::Value;

/// A template parsed once into a segment tree, reusable across renders.
///
/// Parsing is total: malformed or unbalanced constructs degrade to
/// literal text instead of failing.
pub struct Template {
    segments: Segments,
}

impl From<&str> for Template {
    fn from(input: &str) -> Self {
        let mut reader = Reader::new(input);
        let (segments, _) = parse(&mut reader, Block::Top);
        Template { segments }
    }
}

impl Template {
    /// Renders against a throwaway [Engine] with no constructor data
    /// and no asset root.
    pub fn render(&self, data: Value) -> Result<String, RenderError> {
        Engine::new().render_parsed(self, data)
    }

    pub(crate) fn render_internal(&self, scope: &mut Scope) -> String {
        self.segments.render(scope)
    }
}

#[derive(Clone, Copy, PartialEq)]
enum Block {
    Top,
    Loop,
    Then,
    Alternative,
}

enum Close<'a> {
    End,
    Else(&'a str),
    Eof,
}

fn parse<'a>(reader: &mut Reader<'a>, block: Block) -> (Segments, Close<'a>) {
    let mut segments = Segments::new();
    while let Some(token) = reader.pop_front() {
        match token {
            Token::Text(text) | Token::Escaped(text) => {
                segments.push(Box::new(TextSegment::new(text)));
            }
            Token::Placeholder { raw, inner } => {
                segments.push(Box::new(PlaceholderSegment::new(raw, inner)));
            }
            Token::Foreach { raw, path } => {
                let (children, close) = parse(reader, Block::Loop);
                match close {
                    Close::End => segments.push(Box::new(ForeachSegment::new(path, children))),
                    _ => {
                        debug!("unterminated foreach left verbatim: {}", raw);
                        segments.push(Box::new(TextSegment::new(raw)));
                        segments.extend(children);
                    }
                }
            }
            Token::If { raw, expr } => {
                let cond = expr::parse(expr);
                let (children, close) = parse(reader, Block::Then);
                match close {
                    Close::End => {
                        segments.push(Box::new(IfSegment::new(cond, children, None)));
                    }
                    Close::Else(else_raw) => {
                        let (alternative, after_else) = parse(reader, Block::Alternative);
                        match after_else {
                            Close::End => segments.push(Box::new(IfSegment::new(
                                cond,
                                children,
                                Some(alternative),
                            ))),
                            _ => {
                                debug!("unterminated if/else left verbatim: {}", raw);
                                segments.push(Box::new(TextSegment::new(raw)));
                                segments.extend(children);
                                segments.push(Box::new(TextSegment::new(else_raw)));
                                segments.extend(alternative);
                            }
                        }
                    }
                    Close::Eof => {
                        debug!("unterminated if left verbatim: {}", raw);
                        segments.push(Box::new(TextSegment::new(raw)));
                        segments.extend(children);
                    }
                }
            }
            Token::Else { raw } => {
                if block == Block::Then {
                    return (segments, Close::Else(raw));
                }
                debug!("stray else left verbatim: {}", raw);
                segments.push(Box::new(TextSegment::new(raw)));
            }
            Token::EndIf { raw } => {
                if block == Block::Then || block == Block::Alternative {
                    return (segments, Close::End);
                }
                debug!("stray endif left verbatim: {}", raw);
                segments.push(Box::new(TextSegment::new(raw)));
            }
            Token::EndForeach { raw } => {
                if block == Block::Loop {
                    return (segments, Close::End);
                }
                debug!("stray endforeach left verbatim: {}", raw);
                segments.push(Box::new(TextSegment::new(raw)));
            }
        }
    }
    (segments, Close::Eof)
}

trait Segment: Debug {
    fn render(&self, scope: &mut Scope) -> String;
}

type Segments = Vec<Box<dyn Segment>>;

impl Segment for Segments {
    fn render(&self, scope: &mut Scope) -> String {
        self.iter()
            .map(|child| child.render(scope))
            .collect::<Vec<_>>()
            .concat()
    }
}

#[derive(Debug)]
struct TextSegment {
    text: String,
}

impl TextSegment {
    fn new(text: &str) -> Self {
        TextSegment { text: text.to_owned() }
    }
}

impl Segment for TextSegment {
    fn render(&self, _scope: &mut Scope) -> String {
        self.text.clone()
    }
}

#[derive(Debug)]
struct PlaceholderSegment {
    raw: String,
    target: Target,
    filter: Filter,
}

#[derive(Debug)]
enum Target {
    Path(Vec<String>),
    Asset(String),
    Invalid,
}

#[derive(Debug, Clone, Copy)]
enum Filter {
    Escape,
    Html,
    FileTime,
}

impl PlaceholderSegment {
    fn new(raw: &str, inner: &str) -> Self {
        let (path_text, filter) = match inner.split_once('|') {
            Some((path, filter)) => (path.trim(), Filter::from_name(filter.trim())),
            None => (inner, Filter::Escape),
        };
        let target = if path_text.starts_with("FilePath(") {
            match assets::parse_call(path_text) {
                Some(path) => Target::Asset(path),
                None => Target::Invalid,
            }
        } else {
            Target::Path(path_text.split('.').map(str::to_owned).collect())
        };
        PlaceholderSegment { raw: raw.to_owned(), target, filter }
    }
}

impl Filter {
    fn from_name(name: &str) -> Self {
        match name {
            "html" => Filter::Html,
            "filetime" => Filter::FileTime,
            other => {
                debug!("unknown filter '{}' falls back to escaping", other);
                Filter::Escape
            }
        }
    }
}

impl Segment for PlaceholderSegment {
    fn render(&self, scope: &mut Scope) -> String {
        let text = match &self.target {
            Target::Asset(path) => scope.assets.version(path),
            Target::Invalid => return self.raw.clone(),
            Target::Path(path) => match scope.lookup(path) {
                Lookup::Miss => {
                    // unresolved tokens stay visible in the output
                    debug!("unresolved placeholder left verbatim: {}", self.raw);
                    return self.raw.clone();
                }
                Lookup::Key(key) => key,
                Lookup::Value(value) => match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                },
            },
        };
        match self.filter {
            Filter::Html => unescape_html(&text),
            Filter::FileTime => scope.assets.version(&unescape_html(&text)),
            Filter::Escape => escape_html(&unescape_html(&text)),
        }
    }
}

#[derive(Debug)]
struct ForeachSegment {
    path: Vec<String>,
    children: Segments,
}

impl ForeachSegment {
    fn new(path: &str, children: Segments) -> Self {
        ForeachSegment {
            path: path.split('.').map(str::to_owned).collect(),
            children,
        }
    }
}

impl Segment for ForeachSegment {
    fn render(&self, scope: &mut Scope) -> String {
        // non-iterable or missing targets make zero iterations
        let items: Vec<(String, &Value)> = match scope.lookup(&self.path) {
            Lookup::Value(Value::Mapping(map)) => {
                map.iter().map(|(key, value)| (key.clone(), value)).collect()
            }
            Lookup::Value(Value::Sequence(seq)) => seq
                .iter()
                .enumerate()
                .map(|(index, value)| (index.to_string(), value))
                .collect(),
            _ => return String::new(),
        };
        let mut result = String::new();
        for (key, value) in items {
            scope.push(key, value);
            result.push_str(&self.children.render(scope));
            scope.pop();
        }
        result
    }
}

#[derive(Debug)]
struct IfSegment {
    cond: Expr,
    children: Segments,
    alternative: Option<Segments>,
}

impl IfSegment {
    fn new(cond: Expr, children: Segments, alternative: Option<Segments>) -> Self {
        IfSegment { cond, children, alternative }
    }
}

impl Segment for IfSegment {
    fn render(&self, scope: &mut Scope) -> String {
        if self.cond.eval(scope) {
            self.children.render(scope)
        } else {
            match &self.alternative {
                Some(alternative) => alternative.render(scope),
                None => String::new(),
            }
        }
    }
}
