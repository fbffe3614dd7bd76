//! Property value types for graph nodes, edges and query results

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Property value type supporting the data types graph files carry
///
/// Supports:
/// - String
/// - Integer (i64)
/// - Float (f64)
/// - Boolean
/// - Array (Vec<PropertyValue>)
/// - Map (ordered, String -> PropertyValue)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PropertyValue {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Array(Vec<PropertyValue>),
    Map(PropertyMap),
    Null,
}

/// Property map for storing node and edge attributes, in insertion order
pub type PropertyMap = IndexMap<String, PropertyValue>;

impl PropertyValue {
    /// Check if value is null
    pub fn is_null(&self) -> bool {
        matches!(self, PropertyValue::Null)
    }

    /// Get string value if this is a string
    pub fn as_string(&self) -> Option<&str> {
        match self {
            PropertyValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get integer value if this is an integer
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            PropertyValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Get float value if this is a float
    pub fn as_float(&self) -> Option<f64> {
        match self {
            PropertyValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Get boolean value if this is a boolean
    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            PropertyValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Get array value if this is an array
    pub fn as_array(&self) -> Option<&Vec<PropertyValue>> {
        match self {
            PropertyValue::Array(arr) => Some(arr),
            _ => None,
        }
    }

    /// Get map value if this is a map
    pub fn as_map(&self) -> Option<&PropertyMap> {
        match self {
            PropertyValue::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Numeric view of integers and floats
    pub fn as_number(&self) -> Option<f64> {
        match self {
            PropertyValue::Integer(i) => Some(*i as f64),
            PropertyValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Get type name as string
    pub fn type_name(&self) -> &'static str {
        match self {
            PropertyValue::String(_) => "String",
            PropertyValue::Integer(_) => "Integer",
            PropertyValue::Float(_) => "Float",
            PropertyValue::Boolean(_) => "Boolean",
            PropertyValue::Array(_) => "Array",
            PropertyValue::Map(_) => "Map",
            PropertyValue::Null => "Null",
        }
    }

    /// Interpret a raw text field: integers and floats become numbers,
    /// everything else stays a string.
    pub fn parse_scalar(raw: &str) -> PropertyValue {
        let trimmed = raw.trim();
        if let Ok(i) = trimmed.parse::<i64>() {
            return PropertyValue::Integer(i);
        }
        if let Ok(f) = trimmed.parse::<f64>() {
            if f.is_finite() {
                return PropertyValue::Float(f);
            }
        }
        PropertyValue::String(raw.to_string())
    }

    /// Convert to a JSON value without type tags
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as Json;
        match self {
            PropertyValue::String(s) => Json::String(s.clone()),
            PropertyValue::Integer(i) => Json::from(*i),
            PropertyValue::Float(f) => serde_json::Number::from_f64(*f)
                .map(Json::Number)
                .unwrap_or(Json::Null),
            PropertyValue::Boolean(b) => Json::Bool(*b),
            PropertyValue::Array(arr) => Json::Array(arr.iter().map(|v| v.to_json()).collect()),
            PropertyValue::Map(map) => Json::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
            PropertyValue::Null => Json::Null,
        }
    }

    fn type_rank(&self) -> u8 {
        match self {
            PropertyValue::Map(_) => 0,
            PropertyValue::Array(_) => 1,
            PropertyValue::String(_) => 2,
            PropertyValue::Boolean(_) => 3,
            PropertyValue::Integer(_) | PropertyValue::Float(_) => 4,
            PropertyValue::Null => 5,
        }
    }

    /// Total ordering used for sorting: values of one type compare
    /// naturally, numbers compare across int/float, nulls sort last.
    pub fn sort_cmp(&self, other: &PropertyValue) -> Ordering {
        match (self, other) {
            (PropertyValue::String(a), PropertyValue::String(b)) => a.cmp(b),
            (PropertyValue::Boolean(a), PropertyValue::Boolean(b)) => a.cmp(b),
            (PropertyValue::Integer(a), PropertyValue::Integer(b)) => a.cmp(b),
            (a, b) if a.as_number().is_some() && b.as_number().is_some() => {
                let (x, y) = (a.as_number().unwrap_or(0.0), b.as_number().unwrap_or(0.0));
                x.total_cmp(&y)
            }
            (PropertyValue::Array(a), PropertyValue::Array(b)) => {
                for (x, y) in a.iter().zip(b.iter()) {
                    let ord = x.sort_cmp(y);
                    if ord != Ordering::Equal {
                        return ord;
                    }
                }
                a.len().cmp(&b.len())
            }
            (a, b) => a.type_rank().cmp(&b.type_rank()),
        }
    }
}

// Floats compare by bit pattern so values can key hash maps (DISTINCT, grouping)
impl PartialEq for PropertyValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (PropertyValue::String(a), PropertyValue::String(b)) => a == b,
            (PropertyValue::Integer(a), PropertyValue::Integer(b)) => a == b,
            (PropertyValue::Float(a), PropertyValue::Float(b)) => a.to_bits() == b.to_bits(),
            (PropertyValue::Boolean(a), PropertyValue::Boolean(b)) => a == b,
            (PropertyValue::Array(a), PropertyValue::Array(b)) => a == b,
            (PropertyValue::Map(a), PropertyValue::Map(b)) => {
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x == y)
            }
            (PropertyValue::Null, PropertyValue::Null) => true,
            _ => false,
        }
    }
}

impl Eq for PropertyValue {}

impl Hash for PropertyValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            PropertyValue::String(s) => s.hash(state),
            PropertyValue::Integer(i) => i.hash(state),
            PropertyValue::Float(f) => f.to_bits().hash(state),
            PropertyValue::Boolean(b) => b.hash(state),
            PropertyValue::Array(arr) => arr.hash(state),
            PropertyValue::Map(map) => {
                for (k, v) in map {
                    k.hash(state);
                    v.hash(state);
                }
            }
            PropertyValue::Null => {}
        }
    }
}

/// Cell rendering: strings are shown bare, nested values as JSON
impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::String(s) => write!(f, "{}", s),
            PropertyValue::Integer(i) => write!(f, "{}", i),
            PropertyValue::Float(fl) => write!(f, "{:?}", fl),
            PropertyValue::Boolean(b) => write!(f, "{}", b),
            PropertyValue::Array(_) | PropertyValue::Map(_) => write!(f, "{}", self.to_json()),
            PropertyValue::Null => write!(f, "null"),
        }
    }
}

// Convenience conversions
impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        PropertyValue::String(s)
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        PropertyValue::String(s.to_string())
    }
}

impl From<i64> for PropertyValue {
    fn from(i: i64) -> Self {
        PropertyValue::Integer(i)
    }
}

impl From<i32> for PropertyValue {
    fn from(i: i32) -> Self {
        PropertyValue::Integer(i as i64)
    }
}

impl From<f64> for PropertyValue {
    fn from(f: f64) -> Self {
        PropertyValue::Float(f)
    }
}

impl From<bool> for PropertyValue {
    fn from(b: bool) -> Self {
        PropertyValue::Boolean(b)
    }
}

impl From<Vec<PropertyValue>> for PropertyValue {
    fn from(arr: Vec<PropertyValue>) -> Self {
        PropertyValue::Array(arr)
    }
}

impl From<PropertyMap> for PropertyValue {
    fn from(map: PropertyMap) -> Self {
        PropertyValue::Map(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_property_value_conversions() {
        let string_prop: PropertyValue = "hello".into();
        assert_eq!(string_prop.as_string(), Some("hello"));

        let int_prop: PropertyValue = 42i64.into();
        assert_eq!(int_prop.as_integer(), Some(42));
        assert_eq!(int_prop.as_number(), Some(42.0));

        let bool_prop: PropertyValue = true.into();
        assert_eq!(bool_prop.as_boolean(), Some(true));
        assert_eq!(PropertyValue::Null.type_name(), "Null");
    }

    #[test]
    fn test_parse_scalar() {
        assert_eq!(PropertyValue::parse_scalar("7"), PropertyValue::Integer(7));
        assert_eq!(PropertyValue::parse_scalar("2.5"), PropertyValue::Float(2.5));
        assert_eq!(PropertyValue::parse_scalar("abc"), PropertyValue::String("abc".into()));
        // Non-finite spellings stay text
        assert_eq!(PropertyValue::parse_scalar("inf"), PropertyValue::String("inf".into()));
    }

    #[test]
    fn test_map_keeps_insertion_order() {
        let mut props = PropertyMap::new();
        props.insert("zeta".to_string(), 1i64.into());
        props.insert("alpha".to_string(), 2i64.into());
        let keys: Vec<&String> = props.keys().collect();
        assert_eq!(keys, vec!["zeta", "alpha"]);
        assert_eq!(
            PropertyValue::Map(props).to_json().to_string(),
            r#"{"zeta":1,"alpha":2}"#
        );
    }

    #[test]
    fn test_hash_and_eq_are_consistent() {
        let mut set = HashSet::new();
        set.insert(PropertyValue::Float(1.5));
        set.insert(PropertyValue::Float(1.5));
        set.insert(PropertyValue::Integer(1));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_sort_cmp_mixed_numbers_and_nulls() {
        let mut values = vec![
            PropertyValue::Null,
            PropertyValue::Float(2.5),
            PropertyValue::Integer(1),
            PropertyValue::Integer(3),
        ];
        values.sort_by(|a, b| a.sort_cmp(b));
        assert_eq!(
            values,
            vec![
                PropertyValue::Integer(1),
                PropertyValue::Float(2.5),
                PropertyValue::Integer(3),
                PropertyValue::Null,
            ]
        );
    }

    #[test]
    fn test_display_cells() {
        assert_eq!(PropertyValue::from("Alice").to_string(), "Alice");
        assert_eq!(PropertyValue::Float(5.0).to_string(), "5.0");
        assert_eq!(
            PropertyValue::Array(vec![1i64.into(), "x".into()]).to_string(),
            r#"[1,"x"]"#
        );
    }
}
