use log::debug;

pub(crate) struct Reader<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Reader<'a> {
    pub(crate) fn new(input: &'a str) -> Self {
        Reader { input, pos: 0 }
    }

    pub(crate) fn pop_front(&mut self) -> Option<Token<'a>> {
        if self.pos == self.input.len() {
            None
        } else {
            let tail = &self.input[self.pos..];
            let token = if tail.starts_with("\\{{") || tail.starts_with("\\{%") {
                self.read_escaped(tail)
            } else if tail.starts_with("{{") {
                self.read_placeholder(tail)
            } else if tail.starts_with("{%") {
                self.read_block(tail)
            } else {
                self.read_text(tail)
            };
            Some(token)
        }
    }

    fn read_text(&mut self, tail: &'a str) -> Token<'a> {
        match next_marker(tail) {
            None => {
                self.pos = self.input.len();
                Token::Text(tail)
            }
            Some(marker) => {
                // a backslash directly before the marker belongs to the
                // escaped token, not to this text
                let end = if tail.as_bytes()[marker - 1] == b'\\' {
                    marker - 1
                } else {
                    marker
                };
                self.pos += end;
                Token::Text(&tail[..end])
            }
        }
    }

    fn read_escaped(&mut self, tail: &'a str) -> Token<'a> {
        let close = if tail[1..].starts_with("{{") { "}}" } else { "%}" };
        match tail[3..].find(close) {
            Some(p) => {
                let end = 3 + p + close.len();
                self.pos += end;
                Token::Escaped(&tail[1..end])
            }
            None => {
                // unterminated tag after the backslash: both stay literal
                self.pos += 1;
                Token::Text(&tail[..1])
            }
        }
    }

    fn read_placeholder(&mut self, tail: &'a str) -> Token<'a> {
        match tail[2..].find("}}") {
            Some(p) => {
                let raw = &tail[..p + 4];
                let inner = tail[2..2 + p].trim();
                self.pos += p + 4;
                if inner.is_empty() {
                    Token::Text(raw)
                } else {
                    Token::Placeholder { raw, inner }
                }
            }
            None => {
                self.pos += 2;
                Token::Text(&tail[..2])
            }
        }
    }

    fn read_block(&mut self, tail: &'a str) -> Token<'a> {
        match tail[2..].find("%}") {
            Some(p) => {
                let raw = &tail[..p + 4];
                let inner = tail[2..2 + p].trim();
                self.pos += p + 4;
                block_token(raw, inner)
            }
            None => {
                self.pos += 2;
                Token::Text(&tail[..2])
            }
        }
    }
}

// earliest opening delimiter in the tail, if any
fn next_marker(tail: &str) -> Option<usize> {
    match (tail.find("{{"), tail.find("{%")) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (Some(a), None) => Some(a),
        (None, Some(b)) => Some(b),
        (None, None) => None,
    }
}

fn block_token<'a>(raw: &'a str, inner: &'a str) -> Token<'a> {
    if inner == "endforeach" {
        return Token::EndForeach { raw };
    }
    if inner == "endif" {
        return Token::EndIf { raw };
    }
    if inner == "else" {
        return Token::Else { raw };
    }
    if let Some(rest) = inner.strip_prefix("foreach") {
        if rest.starts_with(|c: char| c.is_whitespace()) && !rest.trim().is_empty() {
            return Token::Foreach { raw, path: rest.trim() };
        }
    }
    if let Some(rest) = inner.strip_prefix("if") {
        if rest.starts_with(|c: char| c.is_whitespace()) && !rest.trim().is_empty() {
            return Token::If { raw, expr: rest.trim() };
        }
    }
    debug!("unrecognized block tag left verbatim: {}", raw);
    Token::Text(raw)
}

#[derive(PartialEq, Debug)]
pub(crate) enum Token<'a> {
    Text(&'a str),
    Escaped(&'a str),
    Placeholder { raw: &'a str, inner: &'a str },
    Foreach { raw: &'a str, path: &'a str },
    If { raw: &'a str, expr: &'a str },
    Else { raw: &'a str },
    EndIf { raw: &'a str },
    EndForeach { raw: &'a str },
}
