//! Built-in template functions.

use std::collections::HashMap;

use super::FieldSource;

/// A template function: evaluated arguments plus the fields in scope.
pub type TemplateFn = fn(&[String], &dyn FieldSource) -> String;

/// Registry of functions callable as `%name{...}`.
#[derive(Clone)]
pub struct TemplateFunctions {
    functions: HashMap<String, TemplateFn>,
}

impl std::fmt::Debug for TemplateFunctions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<_> = self.functions.keys().collect();
        names.sort();
        f.debug_struct("TemplateFunctions")
            .field("functions", &names)
            .finish()
    }
}

impl Default for TemplateFunctions {
    fn default() -> Self {
        let mut functions = Self::empty();
        functions.register("lower", tmpl_lower);
        functions.register("upper", tmpl_upper);
        functions.register("capitalize", tmpl_capitalize);
        functions.register("title", tmpl_title);
        functions.register("left", tmpl_left);
        functions.register("right", tmpl_right);
        functions.register("if", tmpl_if);
        functions.register("ifdef", tmpl_ifdef);
        functions.register("first", tmpl_first);
        functions
    }
}

impl TemplateFunctions {
    /// A registry without any functions.
    pub fn empty() -> Self {
        Self {
            functions: HashMap::new(),
        }
    }

    /// Adds or replaces a function.
    pub fn register(&mut self, name: impl Into<String>, function: TemplateFn) {
        self.functions.insert(name.into(), function);
    }

    pub fn get(&self, name: &str) -> Option<TemplateFn> {
        self.functions.get(name).copied()
    }
}

fn arg(args: &[String], index: usize) -> &str {
    args.get(index).map(String::as_str).unwrap_or("")
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

fn tmpl_lower(args: &[String], _: &dyn FieldSource) -> String {
    arg(args, 0).to_lowercase()
}

fn tmpl_upper(args: &[String], _: &dyn FieldSource) -> String {
    arg(args, 0).to_uppercase()
}

fn tmpl_capitalize(args: &[String], _: &dyn FieldSource) -> String {
    capitalize(arg(args, 0))
}

fn tmpl_title(args: &[String], _: &dyn FieldSource) -> String {
    arg(args, 0)
        .split_whitespace()
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

/// `%left{text,n}`: the first `n` characters.
fn tmpl_left(args: &[String], _: &dyn FieldSource) -> String {
    let text = arg(args, 0);
    match arg(args, 1).trim().parse::<usize>() {
        Ok(n) => text.chars().take(n).collect(),
        Err(_) => text.to_string(),
    }
}

/// `%right{text,n}`: the last `n` characters.
fn tmpl_right(args: &[String], _: &dyn FieldSource) -> String {
    let text = arg(args, 0);
    match arg(args, 1).trim().parse::<usize>() {
        Ok(n) => {
            let len = text.chars().count();
            text.chars().skip(len.saturating_sub(n)).collect()
        }
        Err(_) => text.to_string(),
    }
}

/// Empty, `0` and `false` are false; everything else is true.
fn truthy(condition: &str) -> bool {
    let condition = condition.trim();
    match condition.parse::<i64>() {
        Ok(n) => n != 0,
        Err(_) => !condition.is_empty() && !condition.eq_ignore_ascii_case("false"),
    }
}

/// `%if{condition,then[,else]}`
fn tmpl_if(args: &[String], _: &dyn FieldSource) -> String {
    if truthy(arg(args, 0)) {
        arg(args, 1).to_string()
    } else {
        arg(args, 2).to_string()
    }
}

/// `%ifdef{field[,then[,else]]}`: `then` defaults to the field's value.
fn tmpl_ifdef(args: &[String], fields: &dyn FieldSource) -> String {
    let value = fields
        .field(arg(args, 0))
        .map(|v| v.format_for_path())
        .filter(|v| !v.is_empty());

    match value {
        Some(value) if arg(args, 1).is_empty() => value,
        Some(_) => arg(args, 1).to_string(),
        None => arg(args, 2).to_string(),
    }
}

/// `%first{text[,count[,skip[,sep[,join]]]]}`: picks entries from a
/// separated list. Defaults: one entry, none skipped, `"; "` for both
/// separators.
fn tmpl_first(args: &[String], _: &dyn FieldSource) -> String {
    let count = arg(args, 1).trim().parse::<usize>().unwrap_or(1);
    let skip = arg(args, 2).trim().parse::<usize>().unwrap_or(0);
    let sep = args.get(3).map(String::as_str).unwrap_or("; ");
    let join = args.get(4).map(String::as_str).unwrap_or("; ");

    if sep.is_empty() {
        return arg(args, 0).to_string();
    }
    arg(args, 0)
        .split(sep)
        .skip(skip)
        .take(count)
        .collect::<Vec<_>>()
        .join(join)
}
