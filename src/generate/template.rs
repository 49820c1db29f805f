// src/generate/template.rs

//! In-process expansion of `.pyx.in` templates.
//!
//! This implements the subset of Tempita syntax that generated Cython code
//! relies on:
//!
//! ```text
//! {{# a comment}}
//! {{default precision = double}}
//! {{name}}
//! {{for kind in float, 'double'}} ... {{endfor}}
//! {{for name, ctype in [(f32, float), (f64, double)]}} ... {{endfor}}
//! {{if name}} ... {{elif other == 'x'}} ... {{else}} ... {{endif}}
//! ```
//!
//! A loop over a single bare identifier (`{{for x in kinds}}`) iterates over
//! the comma-separated value of that variable. Directive tags that sit alone
//! on a line swallow that whole line, so they do not leave blank lines in the
//! generated source. Reading an undefined name, in a substitution or in a
//! condition, is an error. Expansion is pure: it reads nothing but its
//! arguments and returns a string.

use std::collections::BTreeMap;

use crate::errors::{RegenError, Result};

/// Variables visible to a template.
pub type TemplateVars = BTreeMap<String, String>;

/// Expand `text` with the given variables.
pub fn expand(text: &str, vars: &TemplateVars) -> Result<String> {
    let mut tokens = lex(text)?;
    trim_directive_lines(&mut tokens);
    let mut parser = Parser { tokens, pos: 0 };
    let nodes = parser.parse_block(&[])?.0;

    let mut scope = vars.clone();
    let mut out = String::with_capacity(text.len());
    render(&nodes, &mut scope, &mut out)?;
    Ok(out)
}

fn template_error(line: usize, message: impl Into<String>) -> RegenError {
    RegenError::Template {
        line,
        message: message.into(),
    }
}

// ---------------------------------------------------------------------------
// Lexing
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
enum Token {
    Text(String),
    Tag { body: String, line: usize },
}

fn lex(text: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut rest = text;
    let mut line = 1;

    while let Some(start) = rest.find("{{") {
        let (before, after_open) = rest.split_at(start);
        if !before.is_empty() {
            tokens.push(Token::Text(before.to_string()));
        }
        line += before.matches('\n').count();

        let after_open = &after_open[2..];
        let end = after_open
            .find("}}")
            .ok_or_else(|| template_error(line, "unterminated '{{' tag"))?;
        let body = &after_open[..end];
        tokens.push(Token::Tag {
            body: body.trim().to_string(),
            line,
        });
        line += body.matches('\n').count();
        rest = &after_open[end + 2..];
    }

    if !rest.is_empty() {
        tokens.push(Token::Text(rest.to_string()));
    }
    Ok(tokens)
}

fn is_directive(body: &str) -> bool {
    let keyword = body.split_whitespace().next().unwrap_or("");
    body.starts_with('#')
        || matches!(
            keyword,
            "for" | "endfor" | "if" | "elif" | "else" | "endif" | "default"
        )
}

/// Remove the indentation and line break around directives that occupy a
/// line on their own.
fn trim_directive_lines(tokens: &mut [Token]) {
    // Decide on the untouched token stream first: trimming one directive's
    // line must not hide the line start of the next one.
    let alone: Vec<bool> = (0..tokens.len())
        .map(|i| directive_alone_on_line(tokens, i))
        .collect();

    for (i, _) in alone.iter().enumerate().filter(|(_, alone)| **alone) {
        if i > 0 {
            if let Token::Text(prev) = &mut tokens[i - 1] {
                let keep = prev.rfind('\n').map(|p| p + 1).unwrap_or(0);
                prev.truncate(keep);
            }
        }
        if let Some(Token::Text(next)) = tokens.get_mut(i + 1) {
            match next.find('\n') {
                Some(p) => {
                    next.drain(..=p);
                }
                None => next.clear(),
            }
        }
    }
}

fn directive_alone_on_line(tokens: &[Token], i: usize) -> bool {
    if !matches!(&tokens[i], Token::Tag { body, .. } if is_directive(body)) {
        return false;
    }

    let blank = |s: &str| s.chars().all(|c| c == ' ' || c == '\t' || c == '\r');

    let starts_line = match i.checked_sub(1).map(|j| &tokens[j]) {
        None => true,
        Some(Token::Text(prev)) => {
            let tail = prev.rsplit('\n').next().unwrap_or("");
            blank(tail) && (prev.contains('\n') || i == 1)
        }
        Some(Token::Tag { .. }) => false,
    };
    let ends_line = match tokens.get(i + 1) {
        None => true,
        Some(Token::Text(next)) => blank(next.split('\n').next().unwrap_or("")),
        Some(Token::Tag { .. }) => false,
    };
    starts_line && ends_line
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
enum Item {
    Scalar(String),
    Tuple(Vec<String>),
}

#[derive(Debug, Clone)]
enum ListSource {
    Literal(Vec<Item>),
    /// A variable whose value is a comma-separated list.
    Variable(String),
}

#[derive(Debug, Clone)]
enum Cond {
    Truthy(String),
    Not(String),
    Eq(String, String),
    Ne(String, String),
}

#[derive(Debug, Clone)]
enum Node {
    Text(String),
    Var {
        name: String,
        line: usize,
    },
    For {
        targets: Vec<String>,
        source: ListSource,
        body: Vec<Node>,
        line: usize,
    },
    If {
        /// Condition, line of its tag, body.
        branches: Vec<(Cond, usize, Vec<Node>)>,
        otherwise: Vec<Node>,
    },
    Default {
        name: String,
        value: String,
    },
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    /// Parse nodes until one of `terminators` (a directive keyword) or EOF.
    ///
    /// Returns the nodes and the terminating tag (`keyword`, full body, line).
    fn parse_block(
        &mut self,
        terminators: &[&str],
    ) -> Result<(Vec<Node>, Option<(String, String, usize)>)> {
        let mut nodes = Vec::new();

        while let Some(token) = self.tokens.get(self.pos).cloned() {
            self.pos += 1;
            let (body, line) = match token {
                Token::Text(text) => {
                    if !text.is_empty() {
                        nodes.push(Node::Text(text));
                    }
                    continue;
                }
                Token::Tag { body, line } => (body, line),
            };

            if body.starts_with('#') {
                continue;
            }

            let keyword = body.split_whitespace().next().unwrap_or("").to_string();
            if terminators.contains(&keyword.as_str()) {
                return Ok((nodes, Some((keyword, body, line))));
            }

            match keyword.as_str() {
                "for" => nodes.push(self.parse_for(&body, line)?),
                "if" => nodes.push(self.parse_if(&body, line)?),
                "default" => nodes.push(parse_default(&body, line)?),
                "endfor" | "endif" | "elif" | "else" => {
                    return Err(template_error(line, format!("unexpected '{keyword}'")));
                }
                _ if body.starts_with("py:") => {
                    return Err(template_error(line, "python blocks are not supported"));
                }
                _ => {
                    if !is_identifier(&body) {
                        return Err(template_error(
                            line,
                            format!("unsupported expression '{body}'"),
                        ));
                    }
                    nodes.push(Node::Var { name: body, line });
                }
            }
        }

        if terminators.is_empty() {
            Ok((nodes, None))
        } else {
            Err(template_error(
                self.last_line(),
                format!("missing '{}'", terminators.last().copied().unwrap_or("end")),
            ))
        }
    }

    fn last_line(&self) -> usize {
        self.tokens
            .iter()
            .rev()
            .find_map(|t| match t {
                Token::Tag { line, .. } => Some(*line),
                Token::Text(_) => None,
            })
            .unwrap_or(1)
    }

    fn parse_for(&mut self, body: &str, line: usize) -> Result<Node> {
        let header = body["for".len()..].trim();
        let (targets_str, list_str) = split_keyword(header, "in")
            .ok_or_else(|| template_error(line, "expected 'for <names> in <list>'"))?;

        let targets: Vec<String> = targets_str
            .split(',')
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();
        if targets.is_empty() || !targets.iter().all(|t| is_identifier(t)) {
            return Err(template_error(
                line,
                format!("invalid loop variables '{targets_str}'"),
            ));
        }

        let source = if is_identifier(list_str) {
            ListSource::Variable(list_str.to_string())
        } else {
            ListSource::Literal(parse_list(list_str, line)?)
        };

        let (body_nodes, _) = self.parse_block(&["endfor"])?;
        Ok(Node::For {
            targets,
            source,
            body: body_nodes,
            line,
        })
    }

    fn parse_if(&mut self, body: &str, line: usize) -> Result<Node> {
        let mut branches = Vec::new();
        let mut cond = parse_cond(body["if".len()..].trim(), line)?;
        let mut cond_line = line;

        loop {
            let (nodes, end) = self.parse_block(&["elif", "else", "endif"])?;
            let (keyword, end_body, end_line) = end.unwrap_or_default();
            branches.push((cond, cond_line, nodes));
            match keyword.as_str() {
                "elif" => {
                    cond = parse_cond(end_body["elif".len()..].trim(), end_line)?;
                    cond_line = end_line;
                }
                "else" => {
                    let (otherwise, _) = self.parse_block(&["endif"])?;
                    return Ok(Node::If {
                        branches,
                        otherwise,
                    });
                }
                _ => {
                    return Ok(Node::If {
                        branches,
                        otherwise: Vec::new(),
                    });
                }
            }
        }
    }
}

fn parse_default(body: &str, line: usize) -> Result<Node> {
    let rest = body["default".len()..].trim();
    let (name, value) = rest
        .split_once('=')
        .ok_or_else(|| template_error(line, "expected 'default <name> = <value>'"))?;
    let name = name.trim();
    if !is_identifier(name) {
        return Err(template_error(line, format!("invalid variable name '{name}'")));
    }
    Ok(Node::Default {
        name: name.to_string(),
        value: unquote(value.trim()),
    })
}

fn parse_cond(expr: &str, line: usize) -> Result<Cond> {
    if let Some((lhs, rhs)) = expr.split_once("==") {
        let lhs = lhs.trim();
        if is_identifier(lhs) {
            return Ok(Cond::Eq(lhs.to_string(), unquote(rhs.trim())));
        }
    } else if let Some((lhs, rhs)) = expr.split_once("!=") {
        let lhs = lhs.trim();
        if is_identifier(lhs) {
            return Ok(Cond::Ne(lhs.to_string(), unquote(rhs.trim())));
        }
    } else if let Some(name) = expr.strip_prefix("not ") {
        let name = name.trim();
        if is_identifier(name) {
            return Ok(Cond::Not(name.to_string()));
        }
    } else if is_identifier(expr) {
        return Ok(Cond::Truthy(expr.to_string()));
    }
    Err(template_error(line, format!("unsupported condition '{expr}'")))
}

/// Split `s` around the first standalone occurrence of `keyword`.
fn split_keyword<'a>(s: &'a str, keyword: &str) -> Option<(&'a str, &'a str)> {
    let padded = format!(" {keyword} ");
    let idx = s.find(&padded)?;
    Some((s[..idx].trim(), s[idx + padded.len()..].trim()))
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

fn unquote(s: &str) -> String {
    let bytes = s.as_bytes();
    if bytes.len() >= 2
        && (bytes[0] == b'\'' || bytes[0] == b'"')
        && bytes[bytes.len() - 1] == bytes[0]
    {
        s[1..s.len() - 1].to_string()
    } else {
        s.to_string()
    }
}

/// Parse a literal list: `a, 'b c', (x, y)` optionally wrapped in `[...]`.
fn parse_list(s: &str, line: usize) -> Result<Vec<Item>> {
    let s = s.trim();
    let inner = match (s.strip_prefix('['), s.ends_with(']')) {
        (Some(rest), true) => &rest[..rest.len() - 1],
        _ => s,
    };

    let mut items = Vec::new();
    let mut chars = inner.chars().peekable();
    loop {
        skip_spaces(&mut chars);
        match chars.peek() {
            None => break,
            Some('(') => {
                chars.next();
                let mut fields = Vec::new();
                loop {
                    skip_spaces(&mut chars);
                    match chars.peek() {
                        Some(')') => {
                            chars.next();
                            break;
                        }
                        None => return Err(template_error(line, "unterminated tuple in list")),
                        _ => {
                            fields.push(read_scalar(&mut chars, line)?);
                            skip_spaces(&mut chars);
                            if chars.peek() == Some(&',') {
                                chars.next();
                            }
                        }
                    }
                }
                items.push(Item::Tuple(fields));
            }
            _ => items.push(Item::Scalar(read_scalar(&mut chars, line)?)),
        }
        skip_spaces(&mut chars);
        match chars.next() {
            None => break,
            Some(',') => continue,
            Some(c) => {
                return Err(template_error(line, format!("unexpected '{c}' in list")));
            }
        }
    }
    Ok(items)
}

fn skip_spaces(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) {
    while chars.peek().is_some_and(|c| c.is_whitespace()) {
        chars.next();
    }
}

fn read_scalar(chars: &mut std::iter::Peekable<std::str::Chars<'_>>, line: usize) -> Result<String> {
    let mut value = String::new();
    match chars.peek().copied() {
        Some(quote @ ('\'' | '"')) => {
            chars.next();
            loop {
                match chars.next() {
                    Some(c) if c == quote => return Ok(value),
                    Some(c) => value.push(c),
                    None => return Err(template_error(line, "unterminated string literal")),
                }
            }
        }
        _ => {
            while let Some(&c) = chars.peek() {
                if c == ',' || c == ')' || c == '(' || c.is_whitespace() {
                    break;
                }
                value.push(c);
                chars.next();
            }
            if value.is_empty() {
                Err(template_error(line, "empty list item"))
            } else {
                Ok(value)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

fn truthy(value: &str) -> bool {
    !matches!(value.trim(), "" | "0" | "false" | "False")
}

fn lookup<'s>(scope: &'s TemplateVars, name: &str, line: usize) -> Result<&'s str> {
    scope
        .get(name)
        .map(String::as_str)
        .ok_or_else(|| template_error(line, format!("undefined variable '{name}'")))
}

fn eval_cond(cond: &Cond, line: usize, scope: &TemplateVars) -> Result<bool> {
    Ok(match cond {
        Cond::Truthy(name) => truthy(lookup(scope, name, line)?),
        Cond::Not(name) => !truthy(lookup(scope, name, line)?),
        Cond::Eq(name, lit) => lookup(scope, name, line)? == lit.as_str(),
        Cond::Ne(name, lit) => lookup(scope, name, line)? != lit.as_str(),
    })
}

fn render(nodes: &[Node], scope: &mut TemplateVars, out: &mut String) -> Result<()> {
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Var { name, line } => {
                out.push_str(lookup(scope, name, *line)?);
            }
            Node::Default { name, value } => {
                scope.entry(name.clone()).or_insert_with(|| value.clone());
            }
            Node::If {
                branches,
                otherwise,
            } => {
                let mut chosen = otherwise;
                for (cond, line, body) in branches {
                    if eval_cond(cond, *line, scope)? {
                        chosen = body;
                        break;
                    }
                }
                render(chosen, scope, out)?;
            }
            Node::For {
                targets,
                source,
                body,
                line,
            } => {
                let items = match source {
                    ListSource::Literal(items) => items.clone(),
                    ListSource::Variable(name) => lookup(scope, name, *line)?
                        .split(',')
                        .map(|v| v.trim())
                        .filter(|v| !v.is_empty())
                        .map(|v| Item::Scalar(v.to_string()))
                        .collect(),
                };

                let saved: Vec<Option<String>> =
                    targets.iter().map(|t| scope.get(t).cloned()).collect();

                for item in &items {
                    let values: Vec<&String> = match item {
                        Item::Scalar(v) => vec![v],
                        Item::Tuple(fields) => fields.iter().collect(),
                    };
                    if values.len() != targets.len() {
                        return Err(template_error(
                            *line,
                            format!(
                                "cannot unpack {} value(s) into {} loop variable(s)",
                                values.len(),
                                targets.len()
                            ),
                        ));
                    }
                    for (target, value) in targets.iter().zip(values) {
                        scope.insert(target.clone(), value.clone());
                    }
                    render(body, scope, out)?;
                }

                for (target, previous) in targets.iter().zip(saved) {
                    match previous {
                        Some(v) => {
                            scope.insert(target.clone(), v);
                        }
                        None => {
                            scope.remove(target);
                        }
                    }
                }
            }
        }
    }
    Ok(())
}
