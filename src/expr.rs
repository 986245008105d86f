use std::cmp::Ordering;

use crate::context::{unescape_html, Lookup, Scope};
use crate::value::Value;

/// A parsed `{% if ... %}` expression: bare truthiness test or binary
/// comparison, optionally negated as a whole.
#[derive(Debug)]
pub(crate) struct Expr {
    negated: bool,
    lhs: Operand,
    cmp: Option<(CmpOp, Operand)>,
}

#[derive(Debug)]
enum Operand {
    Literal(Value),
    Path(Vec<String>),
}

#[derive(Debug, Clone, Copy)]
enum CmpOp {
    Eq,
    Ne,
    Gt,
    Lt,
    Ge,
    Le,
}

pub(crate) fn parse(text: &str) -> Expr {
    let mut rest = text.trim();
    let negated = rest.starts_with('!') && !rest.starts_with("!=");
    if negated {
        rest = rest[1..].trim_start();
    }
    let (lhs_text, after_lhs) = split_operand(rest);
    let after_lhs = after_lhs.trim_start();
    if after_lhs.is_empty() {
        return Expr { negated, lhs: operand(lhs_text), cmp: None };
    }
    match split_operator(after_lhs) {
        Some((op, rhs_text)) => Expr {
            negated,
            lhs: operand(lhs_text),
            cmp: Some((op, operand(rhs_text.trim()))),
        },
        // no operator: not a recognizable comparison, fall back to a
        // truthiness test on the whole text (resolving to a miss)
        None => Expr { negated, lhs: operand(rest), cmp: None },
    }
}

// first operand of the expression; quoted literals may contain spaces
fn split_operand(text: &str) -> (&str, &str) {
    match text.chars().next() {
        Some(quote) if quote == '"' || quote == '\'' => match text[1..].find(quote) {
            Some(p) => (&text[..p + 2], &text[p + 2..]),
            None => (text, ""),
        },
        _ => {
            let end = text
                .find(|c: char| c.is_whitespace() || matches!(c, '=' | '!' | '<' | '>'))
                .unwrap_or(text.len());
            (&text[..end], &text[end..])
        }
    }
}

fn split_operator(text: &str) -> Option<(CmpOp, &str)> {
    static OPERATORS: [(&str, CmpOp); 6] = [
        ("==", CmpOp::Eq),
        ("!=", CmpOp::Ne),
        (">=", CmpOp::Ge),
        ("<=", CmpOp::Le),
        (">", CmpOp::Gt),
        ("<", CmpOp::Lt),
    ];
    OPERATORS
        .iter()
        .find_map(|(symbol, op)| text.strip_prefix(symbol).map(|rest| (*op, rest)))
}

fn operand(text: &str) -> Operand {
    if text.len() >= 2 {
        let bytes = text.as_bytes();
        if (bytes[0] == b'"' && bytes[text.len() - 1] == b'"')
            || (bytes[0] == b'\'' && bytes[text.len() - 1] == b'\'')
        {
            return Operand::Literal(Value::from(&text[1..text.len() - 1]));
        }
    }
    match text {
        "true" => return Operand::Literal(Value::Bool(true)),
        "false" => return Operand::Literal(Value::Bool(false)),
        _ => {}
    }
    if let Ok(i) = text.parse::<i64>() {
        return Operand::Literal(Value::from(i));
    }
    if let Ok(x) = text.parse::<f64>() {
        return Operand::Literal(Value::from(x));
    }
    Operand::Path(text.split('.').map(str::to_owned).collect())
}

impl Expr {
    pub(crate) fn eval(&self, scope: &Scope) -> bool {
        let result = match &self.cmp {
            None => self.lhs.truthy(scope),
            Some((op, rhs)) => compare(&self.lhs.scalar(scope), &rhs.scalar(scope), *op),
        };
        if self.negated {
            !result
        } else {
            result
        }
    }
}

impl Operand {
    fn truthy(&self, scope: &Scope) -> bool {
        match self {
            Operand::Literal(value) => value_truthy(value),
            Operand::Path(path) => match scope.lookup(path) {
                Lookup::Miss => false,
                Lookup::Key(key) => text_truthy(&key),
                Lookup::Value(value) => value_truthy(value),
            },
        }
    }

    fn scalar(&self, scope: &Scope) -> Scalar {
        match self {
            Operand::Literal(value) => scalarize(value),
            Operand::Path(path) => match scope.lookup(path) {
                Lookup::Miss => Scalar::Missing,
                Lookup::Key(key) => Scalar::Text(unescape_html(&key)),
                Lookup::Value(value) => scalarize(value),
            },
        }
    }
}

fn value_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64() != 0.0,
        Value::String(s) => text_truthy(s),
        Value::Sequence(seq) => !seq.is_empty(),
        Value::Mapping(map) => !map.is_empty(),
        Value::Object => true,
    }
}

fn text_truthy(text: &str) -> bool {
    !(text.is_empty() || text == "0" || text == "false")
}

// scalarized operand for the loose comparison
enum Scalar {
    Missing,
    Bool(bool),
    Number(f64),
    Text(String),
}

fn scalarize(value: &Value) -> Scalar {
    match value {
        Value::Null => Scalar::Text(String::new()),
        Value::Bool(b) => Scalar::Bool(*b),
        Value::Number(n) => Scalar::Number(n.as_f64()),
        Value::String(s) => Scalar::Text(unescape_html(s)),
        Value::Sequence(_) | Value::Mapping(_) => Scalar::Text("Array".to_owned()),
        Value::Object => Scalar::Text("Object".to_owned()),
    }
}

fn compare(lhs: &Scalar, rhs: &Scalar, op: CmpOp) -> bool {
    let ordering = loose_cmp(lhs, rhs);
    match op {
        CmpOp::Eq => ordering == Ordering::Equal,
        CmpOp::Ne => ordering != Ordering::Equal,
        CmpOp::Gt => ordering == Ordering::Greater,
        CmpOp::Lt => ordering == Ordering::Less,
        CmpOp::Ge => ordering != Ordering::Less,
        CmpOp::Le => ordering != Ordering::Greater,
    }
}

// documented loose total order: numeric when both sides look numeric,
// boolean when both sides look boolean, lexical otherwise
fn loose_cmp(lhs: &Scalar, rhs: &Scalar) -> Ordering {
    if let (Some(l), Some(r)) = (lhs.as_number(), rhs.as_number()) {
        return l.partial_cmp(&r).unwrap_or(Ordering::Equal);
    }
    if let (Some(l), Some(r)) = (lhs.as_bool(), rhs.as_bool()) {
        return l.cmp(&r);
    }
    lhs.as_text().cmp(&rhs.as_text())
}

impl Scalar {
    fn as_number(&self) -> Option<f64> {
        match self {
            Scalar::Number(n) => Some(*n),
            Scalar::Text(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    fn as_bool(&self) -> Option<bool> {
        match self {
            Scalar::Bool(b) => Some(*b),
            Scalar::Text(s) if s == "true" => Some(true),
            Scalar::Text(s) if s == "false" => Some(false),
            _ => None,
        }
    }

    fn as_text(&self) -> String {
        match self {
            Scalar::Missing => String::new(),
            Scalar::Bool(b) => b.to_string(),
            Scalar::Number(n) => n.to_string(),
            Scalar::Text(s) => s.clone(),
        }
    }
}
