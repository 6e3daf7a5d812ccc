use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::runtime::Format;

/// Type name carried by records decoded from JSON
pub const DYNAMIC_RECORD: &str = "any";

/// Runtime value representation
#[derive(Debug, Clone)]
pub enum Value {
    // Primitives
    /// Null value
    Null,
    /// Integer value (every integer width is stored as i64)
    Int(i64),
    /// Floating-point value (float32 and float64)
    Float(f64),
    /// Single character
    Char(char),
    /// String value
    String(String),

    // Collections (use Arc for large values)
    /// Array of values (reference-counted)
    Array(Arc<Vec<Value>>),
    /// Struct instance: fields in declaration order
    Struct {
        /// Struct type name (`any` for decoded JSON objects)
        type_name: String,
        /// Field values
        fields: Arc<IndexMap<String, Value>>,
    },

    // Deprecated result wrappers
    /// `Ok(value)`
    Ok(Box<Value>),
    /// `Err(value)`
    Err(Box<Value>),
}

impl Value {
    /// Creates an array value from a vector of values
    pub fn array(values: Vec<Value>) -> Self {
        Value::Array(Arc::new(values))
    }

    /// Creates a struct instance
    pub fn record(type_name: impl Into<String>, fields: IndexMap<String, Value>) -> Self {
        Value::Struct {
            type_name: type_name.into(),
            fields: Arc::new(fields),
        }
    }

    /// Creates a string value
    pub fn string(s: impl Into<String>) -> Self {
        Value::String(s.into())
    }

    /// Returns the type name as a string
    pub fn type_name(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Int(_) => "int64".to_string(),
            Value::Float(_) => "float64".to_string(),
            Value::Char(_) => "char".to_string(),
            Value::String(_) => "string".to_string(),
            Value::Array(_) => "array".to_string(),
            Value::Struct { type_name, .. } => type_name.clone(),
            Value::Ok(_) | Value::Err(_) => "Result".to_string(),
        }
    }

    /// Returns true if the value is truthy in a boolean context
    ///
    /// Zero, null, `'\0'` and empty strings/arrays/structs are false.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Int(n) => *n != 0,
            Value::Float(f) => *f != 0.0,
            Value::Char(c) => *c != '\0',
            Value::String(s) => !s.is_empty(),
            Value::Array(arr) => !arr.is_empty(),
            Value::Struct { fields, .. } => !fields.is_empty(),
            Value::Ok(_) | Value::Err(_) => true,
        }
    }

    /// Integer view of the value (no string parsing)
    pub fn as_int(&self) -> Result<i64> {
        match self {
            Value::Int(n) => Ok(*n),
            _ => Err(Error::TypeError {
                expected: "integer".to_string(),
                got: self.type_name(),
            }),
        }
    }

    /// Numeric view of the value
    pub fn as_float(&self) -> Result<f64> {
        match self {
            Value::Float(f) => Ok(*f),
            Value::Int(n) => Ok(*n as f64),
            _ => Err(Error::TypeError {
                expected: "number".to_string(),
                got: self.type_name(),
            }),
        }
    }

    /// Returns a reference to the string value
    pub fn as_string(&self) -> Result<&str> {
        match self {
            Value::String(s) => Ok(s),
            _ => Err(Error::TypeError {
                expected: "string".to_string(),
                got: self.type_name(),
            }),
        }
    }

    /// Returns a reference to the array value
    pub fn as_array(&self) -> Result<&Vec<Value>> {
        match self {
            Value::Array(arr) => Ok(arr),
            _ => Err(Error::TypeError {
                expected: "array".to_string(),
                got: self.type_name(),
            }),
        }
    }

    /// Whether the value is an integer or float
    pub fn is_numeric(&self) -> bool {
        matches!(self, Value::Int(_) | Value::Float(_))
    }

    /// Gets a field from a struct instance
    pub fn get_field(&self, field: &str) -> Result<Value> {
        match self {
            Value::Struct { type_name, fields } => {
                fields.get(field).cloned().ok_or_else(|| Error::MissingField {
                    struct_name: type_name.clone(),
                    field: field.to_string(),
                })
            }
            _ => Err(Error::NotAStruct {
                name: self.to_string(),
            }),
        }
    }

    /// Gets an element from an array (or a character from a string) by index
    pub fn get_index(&self, index: i64) -> Result<Value> {
        let (length, item) = match self {
            Value::Array(arr) => (
                arr.len(),
                usize::try_from(index).ok().and_then(|i| arr.get(i).cloned()),
            ),
            Value::String(s) => (
                s.chars().count(),
                usize::try_from(index)
                    .ok()
                    .and_then(|i| s.chars().nth(i))
                    .map(Value::Char),
            ),
            _ => {
                return Err(Error::TypeError {
                    expected: "array or string".to_string(),
                    got: self.type_name(),
                })
            }
        };
        item.ok_or(Error::IndexOutOfBounds { index, length })
    }

    /// Stringification used by `string` coercion and concatenation
    ///
    /// Strings and characters come out raw; everything else as displayed.
    pub fn to_string_value(&self) -> String {
        match self {
            Value::String(s) => s.clone(),
            Value::Char(c) => c.to_string(),
            other => other.render(Format::Pretty),
        }
    }

    /// Top-level rendering for `print`
    pub fn render(&self, format: Format) -> String {
        let mut out = String::new();
        self.write_rendered(&mut out, format, true);
        out
    }

    fn write_rendered(&self, out: &mut String, format: Format, top_level: bool) {
        use std::fmt::Write;
        match self {
            Value::Null => out.push_str("null"),
            Value::Int(n) => {
                let _ = write!(out, "{}", n);
            }
            Value::Float(x) => out.push_str(&format_float(*x)),
            Value::Char(c) if top_level => out.push(*c),
            Value::Char(c) => {
                let _ = write!(out, "'{}'", c.escape_default());
            }
            Value::String(s) if top_level => out.push_str(s),
            Value::String(s) => {
                let _ = write!(out, "\"{}\"", s.escape_default());
            }
            Value::Array(items) => {
                out.push('[');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    item.write_rendered(out, format, false);
                }
                out.push(']');
            }
            Value::Struct { type_name, fields } => {
                let (open, close) = match format {
                    Format::Pretty => {
                        out.push_str(type_name);
                        out.push(' ');
                        ("{ ", " }")
                    }
                    Format::Plain => ("{", "}"),
                };
                if fields.is_empty() {
                    out.push_str("{}");
                    return;
                }
                out.push_str(open);
                for (i, (name, value)) in fields.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    out.push_str(name);
                    out.push_str(": ");
                    value.write_rendered(out, format, false);
                }
                out.push_str(close);
            }
            Value::Ok(inner) => {
                out.push_str("Ok(");
                inner.write_rendered(out, format, false);
                out.push(')');
            }
            Value::Err(inner) => {
                out.push_str("Err(");
                inner.write_rendered(out, format, false);
                out.push(')');
            }
        }
    }

    /// Converts the value into JSON
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as Json;
        match self {
            Value::Null => Json::Null,
            Value::Int(n) => Json::from(*n),
            Value::Float(x) => serde_json::Number::from_f64(*x)
                .map(Json::Number)
                .unwrap_or(Json::Null),
            Value::Char(c) => Json::String(c.to_string()),
            Value::String(s) => Json::String(s.clone()),
            Value::Array(items) => Json::Array(items.iter().map(Value::to_json).collect()),
            Value::Struct { fields, .. } => Json::Object(
                fields
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
            Value::Ok(inner) => serde_json::json!({ "Ok": inner.to_json() }),
            Value::Err(inner) => serde_json::json!({ "Err": inner.to_json() }),
        }
    }

    /// Builds a value from JSON; objects become `any` records
    pub fn from_json(json: &serde_json::Value) -> Value {
        use serde_json::Value as Json;
        match json {
            Json::Null => Value::Null,
            Json::Bool(b) => Value::Int(i64::from(*b)),
            Json::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Json::String(s) => Value::String(s.clone()),
            Json::Array(items) => Value::array(items.iter().map(Value::from_json).collect()),
            Json::Object(map) => Value::record(
                DYNAMIC_RECORD,
                map.iter()
                    .map(|(k, v)| (k.clone(), Value::from_json(v)))
                    .collect(),
            ),
        }
    }
}

/// Floats always show a fractional part (`6.0`)
fn format_float(x: f64) -> String {
    format!("{:?}", x)
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.render(Format::Pretty))
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => {
                (*a as f64) == *b
            }
            (Value::Char(a), Value::Char(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            // a character equals the one-character string holding it
            (Value::Char(c), Value::String(s)) | (Value::String(s), Value::Char(c)) => {
                let mut chars = s.chars();
                chars.next() == Some(*c) && chars.next().is_none()
            }
            (Value::Array(a), Value::Array(b)) => a == b,
            (
                Value::Struct {
                    type_name: ta,
                    fields: fa,
                },
                Value::Struct {
                    type_name: tb,
                    fields: fb,
                },
            ) => ta == tb && fa == fb,
            (Value::Ok(a), Value::Ok(b)) => a == b,
            (Value::Err(a), Value::Err(b)) => a == b,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(x: i64, y: i64) -> Value {
        let mut fields = IndexMap::new();
        fields.insert("x".to_string(), Value::Int(x));
        fields.insert("y".to_string(), Value::Int(y));
        Value::record("Point", fields)
    }

    #[test]
    fn test_truthiness() {
        assert!(!Value::Null.is_truthy());
        assert!(!Value::Int(0).is_truthy());
        assert!(Value::Int(-1).is_truthy());
        assert!(!Value::Float(0.0).is_truthy());
        assert!(!Value::String(String::new()).is_truthy());
        assert!(!Value::array(vec![]).is_truthy());
        assert!(Value::array(vec![Value::Null]).is_truthy());
        assert!(!Value::Char('\0').is_truthy());
    }

    #[test]
    fn test_render() {
        assert_eq!(Value::Float(6.0).render(Format::Pretty), "6.0");
        assert_eq!(Value::Float(3.5).to_string(), "3.5");
        assert_eq!(Value::Null.to_string(), "null");
        assert_eq!(Value::string("hi").to_string(), "hi");
        assert_eq!(
            Value::array(vec![Value::Int(1), Value::string("a"), Value::Char('c')]).to_string(),
            "[1, \"a\", 'c']"
        );
        assert_eq!(point(3, 0).render(Format::Pretty), "Point { x: 3, y: 0 }");
        assert_eq!(point(3, 0).render(Format::Plain), "{x: 3, y: 0}");
        assert_eq!(Value::Ok(Box::new(Value::Int(1))).to_string(), "Ok(1)");
    }

    #[test]
    fn test_equality_is_numeric_across_kinds() {
        assert_eq!(Value::Int(1), Value::Float(1.0));
        assert_eq!(Value::Char('a'), Value::string("a"));
        assert_ne!(Value::Char('a'), Value::string("ab"));
        assert_ne!(Value::Int(1), Value::string("1"));
        assert_eq!(point(1, 2), point(1, 2));
        assert_ne!(point(1, 2), point(2, 1));
    }

    #[test]
    fn test_index_bounds() {
        let arr = Value::array(vec![Value::Int(10), Value::Int(20)]);
        assert_eq!(arr.get_index(1).unwrap(), Value::Int(20));
        assert!(matches!(
            arr.get_index(2),
            Err(Error::IndexOutOfBounds {
                index: 2,
                length: 2
            })
        ));
        assert!(matches!(
            arr.get_index(-1),
            Err(Error::IndexOutOfBounds { .. })
        ));
        assert_eq!(Value::string("abc").get_index(2).unwrap(), Value::Char('c'));
    }

    #[test]
    fn test_get_field() {
        assert_eq!(point(5, 6).get_field("y").unwrap(), Value::Int(6));
        assert!(matches!(
            point(5, 6).get_field("z"),
            Err(Error::MissingField { .. })
        ));
        assert!(matches!(
            Value::Int(1).get_field("x"),
            Err(Error::NotAStruct { .. })
        ));
    }

    #[test]
    fn test_json_conversion() {
        let json: serde_json::Value =
            serde_json::from_str(r#"{"name": "gx", "tags": [1, 2.5, true, null]}"#).unwrap();
        let value = Value::from_json(&json);
        assert_eq!(value.type_name(), DYNAMIC_RECORD);
        assert_eq!(value.get_field("name").unwrap(), Value::string("gx"));
        assert_eq!(
            value.get_field("tags").unwrap(),
            Value::array(vec![
                Value::Int(1),
                Value::Float(2.5),
                Value::Int(1),
                Value::Null
            ])
        );
        assert_eq!(point(1, 2).to_json(), serde_json::json!({"x": 1, "y": 2}));
    }
}
