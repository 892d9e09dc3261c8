//! Path templates.
//!
//! A template such as `$albumpath/%lower{$album}/$filename` is parsed once
//! and evaluated against a set of fields. Field values are formatted for use
//! in a path: opaque text has its path separators replaced with `_`, while a
//! raw path value keeps them.
//!
//! Unknown fields and unknown functions are left in the output verbatim.

mod error;
mod functions;
mod parser;

pub use error::TemplateError;
pub use functions::{TemplateFn, TemplateFunctions};

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use parser::{Expression, Node};

/// Replacement for path separators inside opaque field values.
pub const PATH_SEP_REPLACEMENT: char = '_';

/// A field value as seen by a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue<'a> {
    /// Opaque text; may never introduce a path separator.
    Text(Cow<'a, str>),
    /// A full path whose separators are kept.
    RawPath(&'a str),
}

impl<'a> FieldValue<'a> {
    pub fn text(value: impl Into<Cow<'a, str>>) -> Self {
        Self::Text(value.into())
    }

    /// The value as it is substituted into a path template.
    pub fn format_for_path(&self) -> String {
        match self {
            Self::Text(value) => value
                .chars()
                .map(|c| {
                    if std::path::is_separator(c) {
                        PATH_SEP_REPLACEMENT
                    } else {
                        c
                    }
                })
                .collect(),
            Self::RawPath(path) => (*path).to_string(),
        }
    }
}

/// Anything that can supply named fields to a template.
pub trait FieldSource {
    fn field(&self, name: &str) -> Option<FieldValue<'_>>;
}

/// A parsed path template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTemplate {
    source: String,
    nodes: Expression,
}

impl PathTemplate {
    pub fn parse(template: &str) -> Result<Self, TemplateError> {
        Ok(Self {
            source: template.to_string(),
            nodes: parser::parse(template)?,
        })
    }

    /// The template text this was parsed from.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Evaluates the template.
    pub fn substitute(&self, fields: &dyn FieldSource, functions: &TemplateFunctions) -> String {
        evaluate(&self.nodes, fields, functions)
    }
}

impl FromStr for PathTemplate {
    type Err = TemplateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for PathTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

fn evaluate(nodes: &[Node], fields: &dyn FieldSource, functions: &TemplateFunctions) -> String {
    let mut out = String::new();
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Field { name, original } => match fields.field(name) {
                Some(value) => out.push_str(&value.format_for_path()),
                None => out.push_str(original),
            },
            Node::Call {
                name,
                args,
                original,
            } => match functions.get(name) {
                Some(function) => {
                    let args: Vec<String> = args
                        .iter()
                        .map(|arg| evaluate(arg, fields, functions))
                        .collect();
                    out.push_str(&function(&args, fields));
                }
                None => out.push_str(original),
            },
        }
    }
    out
}
