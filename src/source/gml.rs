//! Graph Modelling Language (GML) reader
//!
//! GML is a tree of `key value` pairs where a value is an integer, a real,
//! a quoted string or a bracketed list of further pairs:
//!
//! ```text
//! graph [
//!   directed 1
//!   node [ id 0 label "a" color "red" ]
//!   node [ id 1 label "b" ]
//!   edge [ source 0 target 1 weight 2.5 ]
//! ]
//! ```
//!
//! Nodes are keyed by their `label` when present, else by their `id`.

use super::{SourceError, SourceResult};
use crate::graph::{GraphStore, PropertyMap, PropertyValue};
use flate2::read::GzDecoder;
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::iter::Peekable;
use std::path::Path;
use std::str::Chars;
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
enum GmlValue {
    Int(i64),
    Real(f64),
    Str(String),
    List(Vec<(String, GmlValue)>),
}

impl GmlValue {
    fn into_property(self) -> PropertyValue {
        match self {
            GmlValue::Int(i) => PropertyValue::Integer(i),
            GmlValue::Real(f) => PropertyValue::Float(f),
            GmlValue::Str(s) => PropertyValue::String(s),
            GmlValue::List(items) => PropertyValue::Map(
                items
                    .into_iter()
                    .map(|(k, v)| (k, v.into_property()))
                    .collect(),
            ),
        }
    }

    /// Identifier form used to match edge endpoints against node ids
    fn as_id(&self) -> Option<String> {
        match self {
            GmlValue::Int(i) => Some(i.to_string()),
            GmlValue::Str(s) => Some(s.clone()),
            GmlValue::Real(f) => Some(f.to_string()),
            GmlValue::List(_) => None,
        }
    }
}

fn parse_error(message: impl Into<String>) -> SourceError {
    SourceError::Parse {
        format: "GML",
        message: message.into(),
    }
}

#[derive(Debug, PartialEq)]
enum Token {
    Key(String),
    Int(i64),
    Real(f64),
    Str(String),
    Open,
    Close,
}

struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
    line: usize,
}

impl<'a> Lexer<'a> {
    fn new(text: &'a str) -> Self {
        Lexer {
            chars: text.chars().peekable(),
            line: 1,
        }
    }

    fn skip_trivia(&mut self) {
        while let Some(&c) = self.chars.peek() {
            if c == '\n' {
                self.line += 1;
                self.chars.next();
            } else if c.is_whitespace() {
                self.chars.next();
            } else if c == '#' {
                // comment to end of line
                while let Some(&c) = self.chars.peek() {
                    if c == '\n' {
                        break;
                    }
                    self.chars.next();
                }
            } else {
                break;
            }
        }
    }

    fn next_token(&mut self) -> SourceResult<Option<Token>> {
        self.skip_trivia();
        let Some(&c) = self.chars.peek() else {
            return Ok(None);
        };
        match c {
            '[' => {
                self.chars.next();
                Ok(Some(Token::Open))
            }
            ']' => {
                self.chars.next();
                Ok(Some(Token::Close))
            }
            '"' => {
                self.chars.next();
                let mut text = String::new();
                loop {
                    match self.chars.next() {
                        Some('"') => break,
                        Some(c) => {
                            if c == '\n' {
                                self.line += 1;
                            }
                            text.push(c);
                        }
                        None => {
                            return Err(parse_error(format!(
                                "line {}: unterminated string",
                                self.line
                            )))
                        }
                    }
                }
                Ok(Some(Token::Str(unescape_entities(&text))))
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let mut key = String::new();
                while let Some(&c) = self.chars.peek() {
                    if c.is_ascii_alphanumeric() || c == '_' {
                        key.push(c);
                        self.chars.next();
                    } else {
                        break;
                    }
                }
                Ok(Some(Token::Key(key)))
            }
            c if c.is_ascii_digit() || c == '-' || c == '+' || c == '.' => {
                let mut number = String::new();
                while let Some(&c) = self.chars.peek() {
                    if c.is_ascii_alphanumeric() || matches!(c, '-' | '+' | '.') {
                        number.push(c);
                        self.chars.next();
                    } else {
                        break;
                    }
                }
                if let Ok(i) = number.parse::<i64>() {
                    Ok(Some(Token::Int(i)))
                } else if let Ok(f) = number.parse::<f64>() {
                    Ok(Some(Token::Real(f)))
                } else {
                    Err(parse_error(format!(
                        "line {}: invalid number '{}'",
                        self.line, number
                    )))
                }
            }
            other => Err(parse_error(format!(
                "line {}: unexpected character '{}'",
                self.line, other
            ))),
        }
    }
}

/// Decode the character entities GML writers use inside strings
fn unescape_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find('&') {
        out.push_str(&rest[..start]);
        let after = &rest[start..];
        let decoded = after.find(';').and_then(|end| {
            let entity = &after[1..end];
            let c = match entity {
                "amp" => Some('&'),
                "quot" => Some('"'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "apos" => Some('\''),
                _ => entity
                    .strip_prefix("#x")
                    .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                    .or_else(|| entity.strip_prefix('#').and_then(|dec| dec.parse().ok()))
                    .and_then(char::from_u32),
            }?;
            Some((c, end + 1))
        });
        match decoded {
            Some((c, consumed)) => {
                out.push(c);
                rest = &after[consumed..];
            }
            None => {
                out.push('&');
                rest = &after[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn parse_list(lexer: &mut Lexer<'_>, nested: bool) -> SourceResult<Vec<(String, GmlValue)>> {
    let mut items = Vec::new();
    loop {
        let key = match lexer.next_token()? {
            Some(Token::Key(key)) => key,
            Some(Token::Close) if nested => return Ok(items),
            None if !nested => return Ok(items),
            None => return Err(parse_error("unexpected end of file inside a list")),
            Some(other) => {
                return Err(parse_error(format!(
                    "line {}: expected a key, found {:?}",
                    lexer.line, other
                )))
            }
        };
        let value = match lexer.next_token()? {
            Some(Token::Int(i)) => GmlValue::Int(i),
            Some(Token::Real(f)) => GmlValue::Real(f),
            Some(Token::Str(s)) => GmlValue::Str(s),
            Some(Token::Open) => GmlValue::List(parse_list(lexer, true)?),
            other => {
                return Err(parse_error(format!(
                    "line {}: expected a value for '{}', found {:?}",
                    lexer.line, key, other
                )))
            }
        };
        items.push((key, value));
    }
}

/// Parse GML text into a graph
pub fn parse_gml(text: &str) -> SourceResult<GraphStore> {
    let mut lexer = Lexer::new(text);
    let top = parse_list(&mut lexer, false)?;
    let graph = top
        .into_iter()
        .find_map(|(k, v)| match (k.as_str(), v) {
            ("graph", GmlValue::List(items)) => Some(items),
            _ => None,
        })
        .ok_or_else(|| parse_error("no 'graph' list found"))?;

    let directed = graph
        .iter()
        .any(|(k, v)| k == "directed" && *v == GmlValue::Int(1));
    let mut store = GraphStore::new(directed);
    // GML id -> node key
    let mut keys: HashMap<String, String> = HashMap::new();
    let mut pending_edges = Vec::new();

    for (key, value) in graph {
        match (key.as_str(), value) {
            ("node", GmlValue::List(attrs)) => {
                let mut id = None;
                let mut label = None;
                let mut properties = PropertyMap::new();
                for (k, v) in attrs {
                    match k.as_str() {
                        "id" => id = v.as_id(),
                        "label" => label = v.as_id(),
                        _ => {
                            properties.insert(k, v.into_property());
                        }
                    }
                }
                let id = id.ok_or_else(|| parse_error("node without an 'id'"))?;
                let node_key = label.unwrap_or_else(|| id.clone());
                if store.node_id(&node_key).is_some() {
                    return Err(parse_error(format!("node label '{}' is duplicated", node_key)));
                }
                if keys.insert(id.clone(), node_key.clone()).is_some() {
                    return Err(parse_error(format!("node id '{}' is duplicated", id)));
                }
                let node_id = store.add_node(node_key);
                if let Some(node) = store.get_node_mut(node_id) {
                    node.properties = properties;
                }
            }
            ("edge", GmlValue::List(attrs)) => pending_edges.push(attrs),
            _ => {}
        }
    }

    for attrs in pending_edges {
        let mut source = None;
        let mut target = None;
        let mut properties = PropertyMap::new();
        for (k, v) in attrs {
            match k.as_str() {
                "source" => source = v.as_id(),
                "target" => target = v.as_id(),
                _ => {
                    properties.insert(k, v.into_property());
                }
            }
        }
        let endpoint = |id: Option<String>, role: &str| -> SourceResult<String> {
            let id = id.ok_or_else(|| parse_error(format!("edge without a '{}'", role)))?;
            keys.get(&id)
                .cloned()
                .ok_or_else(|| parse_error(format!("edge {} '{}' is not a node id", role, id)))
        };
        let source = endpoint(source, "source")?;
        let target = endpoint(target, "target")?;
        store.add_edge(source, target, properties);
    }

    debug!(
        directed,
        nodes = store.node_count(),
        edges = store.edge_count(),
        "parsed GML"
    );
    Ok(store)
}

/// Read a GML file, transparently decompressing `.gz` files
pub fn load_gml(path: &Path, compressed: bool) -> SourceResult<GraphStore> {
    let mut text = String::new();
    let file = File::open(path)?;
    if compressed {
        GzDecoder::new(file).read_to_string(&mut text)?;
    } else {
        let mut file = file;
        file.read_to_string(&mut text)?;
    }
    parse_gml(&text)
}
