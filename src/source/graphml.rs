//! GraphML reader built on `quick-xml` events
//!
//! Handles `<key>` declarations (name, type, domain and `<default>`), the
//! `edgedefault` of the first `<graph>`, and typed `<data>` values on nodes
//! and edges. Nested graphs and hyperedges are not supported.

use super::{SourceError, SourceResult};
use crate::graph::{GraphStore, PropertyMap, PropertyValue};
use flate2::read::GzDecoder;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
struct KeyDef {
    name: String,
    ty: String,
    domain: String,
    default: Option<String>,
}

impl KeyDef {
    fn applies_to(&self, element: Element) -> bool {
        match element {
            Element::Node => self.domain == "node" || self.domain == "all",
            Element::Edge => self.domain == "edge" || self.domain == "all",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Element {
    Node,
    Edge,
}

fn parse_error(message: impl std::fmt::Display) -> SourceError {
    SourceError::Parse {
        format: "GraphML",
        message: message.to_string(),
    }
}

fn attribute(element: &BytesStart<'_>, name: &str) -> SourceResult<Option<String>> {
    for attr in element.attributes() {
        let attr = attr.map_err(parse_error)?;
        if attr.key.as_ref() == name.as_bytes() {
            let value = attr.unescape_value().map_err(parse_error)?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

fn required_attribute(element: &BytesStart<'_>, name: &str) -> SourceResult<String> {
    attribute(element, name)?.ok_or_else(|| {
        parse_error(format!(
            "<{}> is missing the '{}' attribute",
            String::from_utf8_lossy(element.local_name().as_ref()),
            name
        ))
    })
}

/// Convert a raw `<data>` text according to its declared `attr.type`
fn typed_value(raw: &str, ty: &str) -> SourceResult<PropertyValue> {
    let trimmed = raw.trim();
    let invalid = || parse_error(format!("'{}' is not a valid {}", raw, ty));
    match ty {
        "int" | "long" => trimmed
            .parse::<i64>()
            .map(PropertyValue::Integer)
            .map_err(|_| invalid()),
        "float" | "double" => trimmed
            .parse::<f64>()
            .map(PropertyValue::Float)
            .map_err(|_| invalid()),
        "boolean" => match trimmed.to_ascii_lowercase().as_str() {
            "true" | "1" => Ok(PropertyValue::Boolean(true)),
            "false" | "0" => Ok(PropertyValue::Boolean(false)),
            _ => Err(invalid()),
        },
        _ => Ok(PropertyValue::String(raw.to_string())),
    }
}

#[derive(Default)]
struct Document {
    keys: HashMap<String, KeyDef>,
    directed: Option<bool>,
    nodes: Vec<(String, PropertyMap)>,
    edges: Vec<(String, String, PropertyMap)>,
}

impl Document {
    fn properties_of(&mut self, element: Element) -> Option<&mut PropertyMap> {
        match element {
            Element::Node => self.nodes.last_mut().map(|(_, p)| p),
            Element::Edge => self.edges.last_mut().map(|(_, _, p)| p),
        }
    }

    fn fill_defaults(&self, element: Element, properties: &mut PropertyMap) -> SourceResult<()> {
        let mut keys: Vec<&KeyDef> = self
            .keys
            .values()
            .filter(|k| k.applies_to(element) && k.default.is_some())
            .collect();
        keys.sort_by(|a, b| a.name.cmp(&b.name));
        for key in keys {
            if properties.contains_key(&key.name) {
                continue;
            }
            if let Some(default) = &key.default {
                properties.insert(key.name.clone(), typed_value(default, &key.ty)?);
            }
        }
        Ok(())
    }

    fn into_store(mut self) -> SourceResult<GraphStore> {
        let mut nodes = std::mem::take(&mut self.nodes);
        let mut edges = std::mem::take(&mut self.edges);
        let mut store = GraphStore::new(self.directed.unwrap_or(false));

        for (key, properties) in nodes.iter_mut() {
            self.fill_defaults(Element::Node, properties)?;
            let id = store.add_node(key.clone());
            if let Some(node) = store.get_node_mut(id) {
                node.properties = std::mem::take(properties);
            }
        }
        for (source, target, properties) in edges.iter_mut() {
            self.fill_defaults(Element::Edge, properties)?;
            store.add_edge(source.clone(), target.clone(), std::mem::take(properties));
        }
        Ok(store)
    }
}

/// Parse GraphML text into a graph
pub fn parse_graphml(text: &str) -> SourceResult<GraphStore> {
    let mut reader = Reader::from_str(text);
    reader.trim_text(true);

    let mut doc = Document::default();
    // element currently receiving <data>
    let mut owner: Option<Element> = None;
    // key id of the open <data> element, or the key whose <default> is open
    let mut open_data: Option<String> = None;
    let mut open_default: Option<String> = None;
    let mut open_key: Option<String> = None;
    let mut text_buf = String::new();
    let mut graph_depth = 0usize;

    loop {
        match reader.read_event().map_err(parse_error)? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"graph" => {
                graph_depth += 1;
                if graph_depth > 1 {
                    warn!("nested GraphML graphs are flattened into the outer graph");
                }
                if doc.directed.is_none() {
                    let edge_default = attribute(&e, "edgedefault")?;
                    doc.directed = Some(edge_default.as_deref() == Some("directed"));
                }
            }
            Event::Start(e) => match e.local_name().as_ref() {
                b"key" => {
                    let id = read_key(&e, &mut doc)?;
                    open_key = Some(id);
                }
                b"default" => open_default = open_key.clone(),
                b"node" => {
                    doc.nodes.push((required_attribute(&e, "id")?, PropertyMap::new()));
                    owner = Some(Element::Node);
                }
                b"edge" => {
                    push_edge(&e, &mut doc)?;
                    owner = Some(Element::Edge);
                }
                b"data" => {
                    open_data = Some(required_attribute(&e, "key")?);
                    text_buf.clear();
                }
                _ => {}
            },
            Event::Empty(e) => match e.local_name().as_ref() {
                b"key" => {
                    read_key(&e, &mut doc)?;
                }
                b"node" => {
                    doc.nodes.push((required_attribute(&e, "id")?, PropertyMap::new()));
                }
                b"edge" => push_edge(&e, &mut doc)?,
                _ => {}
            },
            Event::Text(t) => {
                let unescaped = t.unescape().map_err(parse_error)?;
                text_buf.push_str(&unescaped);
            }
            Event::CData(c) => {
                text_buf.push_str(&String::from_utf8_lossy(&c.into_inner()));
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"graph" => graph_depth = graph_depth.saturating_sub(1),
                b"key" => open_key = None,
                b"default" => {
                    if let Some(key_id) = open_default.take() {
                        if let Some(key) = doc.keys.get_mut(&key_id) {
                            key.default = Some(std::mem::take(&mut text_buf));
                        }
                    }
                    text_buf.clear();
                }
                b"node" | b"edge" => owner = None,
                b"data" => {
                    if let (Some(key_id), Some(element)) = (open_data.take(), owner) {
                        let (name, value) = match doc.keys.get(&key_id) {
                            Some(key) => (key.name.clone(), typed_value(&text_buf, &key.ty)?),
                            // undeclared keys keep their id and a string value
                            None => (key_id, PropertyValue::String(text_buf.clone())),
                        };
                        if let Some(properties) = doc.properties_of(element) {
                            properties.insert(name, value);
                        }
                    }
                    text_buf.clear();
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    if doc.directed.is_none() {
        return Err(parse_error("no <graph> element found"));
    }
    let store = doc.into_store()?;
    debug!(
        directed = store.is_directed(),
        nodes = store.node_count(),
        edges = store.edge_count(),
        "parsed GraphML"
    );
    Ok(store)
}

fn read_key(element: &BytesStart<'_>, doc: &mut Document) -> SourceResult<String> {
    let id = required_attribute(element, "id")?;
    let name = attribute(element, "attr.name")?.unwrap_or_else(|| id.clone());
    let ty = attribute(element, "attr.type")?.unwrap_or_else(|| "string".to_string());
    let domain = attribute(element, "for")?.unwrap_or_else(|| "all".to_string());
    doc.keys.insert(
        id.clone(),
        KeyDef {
            name,
            ty,
            domain,
            default: None,
        },
    );
    Ok(id)
}

fn push_edge(element: &BytesStart<'_>, doc: &mut Document) -> SourceResult<()> {
    let source = required_attribute(element, "source")?;
    let target = required_attribute(element, "target")?;
    doc.edges.push((source, target, PropertyMap::new()));
    Ok(())
}

/// Read a GraphML file, transparently decompressing `.gz` files
pub fn load_graphml(path: &Path, compressed: bool) -> SourceResult<GraphStore> {
    let mut text = String::new();
    let file = File::open(path)?;
    if compressed {
        GzDecoder::new(file).read_to_string(&mut text)?;
    } else {
        let mut file = file;
        file.read_to_string(&mut text)?;
    }
    parse_graphml(&text)
}
