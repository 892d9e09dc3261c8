//! Template parser.
//!
//! Grammar, loosely:
//! - `$name` or `${name}` references a field
//! - `%name{arg,arg}` calls a template function; arguments are templates
//! - `$$`, `$%`, `$,` and `$}` produce the literal second character
//! - anything else is literal text; `,` and `}` are only special inside
//!   an argument list

use super::error::TemplateError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Node {
    Text(String),
    Field {
        name: String,
        original: String,
    },
    Call {
        name: String,
        args: Vec<Expression>,
        original: String,
    },
}

pub(crate) type Expression = Vec<Node>;

pub(crate) fn parse(template: &str) -> Result<Expression, TemplateError> {
    let mut parser = Parser {
        template,
        chars: template.chars().collect(),
        pos: 0,
    };
    parser.parse_expression(false)
}

struct Parser<'a> {
    template: &'a str,
    chars: Vec<char>,
    pos: usize,
}

impl Parser<'_> {
    fn slice(&self, start: usize, end: usize) -> String {
        self.chars[start..end].iter().collect()
    }

    fn flush(text: &mut String, nodes: &mut Expression) {
        if !text.is_empty() {
            nodes.push(Node::Text(std::mem::take(text)));
        }
    }

    fn parse_expression(&mut self, in_argument: bool) -> Result<Expression, TemplateError> {
        let mut nodes = Vec::new();
        let mut text = String::new();

        while let Some(&c) = self.chars.get(self.pos) {
            match c {
                '$' => {
                    self.pos += 1;
                    match self.chars.get(self.pos) {
                        None => text.push('$'),
                        Some(&next) if matches!(next, '$' | '%' | '}' | ',') => {
                            text.push(next);
                            self.pos += 1;
                        }
                        Some(_) => match self.parse_field()? {
                            Some(node) => {
                                Self::flush(&mut text, &mut nodes);
                                nodes.push(node);
                            }
                            None => text.push('$'),
                        },
                    }
                }
                '%' => {
                    let start = self.pos;
                    self.pos += 1;
                    match self.parse_call(start)? {
                        Some(node) => {
                            Self::flush(&mut text, &mut nodes);
                            nodes.push(node);
                        }
                        None => text.push_str(&self.slice(start, self.pos)),
                    }
                }
                ',' | '}' if in_argument => break,
                _ => {
                    text.push(c);
                    self.pos += 1;
                }
            }
        }

        Self::flush(&mut text, &mut nodes);
        Ok(nodes)
    }

    fn parse_ident(&mut self) -> String {
        let start = self.pos;
        while let Some(c) = self.chars.get(self.pos) {
            if c.is_alphanumeric() || *c == '_' {
                self.pos += 1;
            } else {
                break;
            }
        }
        self.slice(start, self.pos)
    }

    /// Parses a field reference; `self.pos` is just past the `$`.
    fn parse_field(&mut self) -> Result<Option<Node>, TemplateError> {
        let start = self.pos - 1;

        if self.chars.get(self.pos) == Some(&'{') {
            let close = self.chars[self.pos + 1..].iter().position(|c| *c == '}');
            let Some(offset) = close else {
                return Err(TemplateError::UnclosedField {
                    template: self.template.to_string(),
                    position: start,
                });
            };
            let name = self.slice(self.pos + 1, self.pos + 1 + offset);
            self.pos += offset + 2;
            return Ok(Some(Node::Field {
                name,
                original: self.slice(start, self.pos),
            }));
        }

        let name = self.parse_ident();
        if name.is_empty() {
            return Ok(None);
        }
        Ok(Some(Node::Field {
            original: self.slice(start, self.pos),
            name,
        }))
    }

    /// Parses a function call; `self.pos` is just past the `%`.
    fn parse_call(&mut self, start: usize) -> Result<Option<Node>, TemplateError> {
        let name = self.parse_ident();
        if name.is_empty() || self.chars.get(self.pos) != Some(&'{') {
            return Ok(None);
        }
        self.pos += 1;

        let mut args = Vec::new();
        loop {
            args.push(self.parse_expression(true)?);
            match self.chars.get(self.pos) {
                Some(',') => self.pos += 1,
                Some('}') => {
                    self.pos += 1;
                    break;
                }
                _ => {
                    return Err(TemplateError::UnclosedCall {
                        template: self.template.to_string(),
                        name,
                        position: start,
                    })
                }
            }
        }

        Ok(Some(Node::Call {
            name,
            args,
            original: self.slice(start, self.pos),
        }))
    }
}
