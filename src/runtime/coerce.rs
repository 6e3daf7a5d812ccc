//! Type registry, coercion and default values
//!
//! Declared types are enforced dynamically: every store into a typed slot
//! (declaration, assignment, parameter, return value, field) goes through
//! [`TypeRegistry::coerce`].

use indexmap::IndexMap;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::parser::{EnumDef, StructDef};
use crate::runtime::Value;

/// Signed and unsigned integer type names
pub const INTEGER_TYPES: &[&str] = &[
    "int8", "int16", "int32", "int64", "uint8", "uint16", "uint32", "uint64",
];

/// Floating-point type names
pub const FLOAT_TYPES: &[&str] = &["float32", "float64"];

/// Whether `name` is an integer type
pub fn is_integer_type(name: &str) -> bool {
    INTEGER_TYPES.contains(&name)
}

/// Whether `name` is a float type
pub fn is_float_type(name: &str) -> bool {
    FLOAT_TYPES.contains(&name)
}

/// Struct and enum definitions known to an interpreter
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    structs: HashMap<String, Arc<StructDef>>,
    enums: HashMap<String, Arc<EnumDef>>,
}

impl TypeRegistry {
    /// Creates an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a struct, rejecting duplicate field names
    pub fn register_struct(&mut self, def: Arc<StructDef>) -> Result<()> {
        let mut seen = HashSet::new();
        for field in &def.fields {
            if !seen.insert(field.name.as_str()) {
                return Err(Error::Redeclaration {
                    name: field.name.clone(),
                    context: format!("struct '{}'", def.name),
                });
            }
        }
        self.structs.insert(def.name.clone(), def);
        Ok(())
    }

    /// Registers an enum, rejecting duplicate members
    pub fn register_enum(&mut self, def: Arc<EnumDef>) -> Result<()> {
        let mut seen = HashSet::new();
        for member in &def.members {
            if !seen.insert(member.as_str()) {
                return Err(Error::Redeclaration {
                    name: member.clone(),
                    context: format!("enum '{}'", def.name),
                });
            }
        }
        self.enums.insert(def.name.clone(), def);
        Ok(())
    }

    /// Looks up a struct definition
    pub fn struct_def(&self, name: &str) -> Option<&Arc<StructDef>> {
        self.structs.get(name)
    }

    /// Looks up an enum definition
    pub fn enum_def(&self, name: &str) -> Option<&Arc<EnumDef>> {
        self.enums.get(name)
    }

    /// Copies every definition of `other` into this registry
    pub fn merge(&mut self, other: TypeRegistry) {
        self.structs.extend(other.structs);
        self.enums.extend(other.enums);
    }

    /// Converts `value` to the declared type `target`
    pub fn coerce(&self, value: Value, target: &str) -> Result<Value> {
        let fail = |value: &Value| Error::TypeCast {
            value: value.to_string_value(),
            target: target.to_string(),
        };

        if is_integer_type(target) {
            return match &value {
                Value::Int(_) => Ok(value),
                Value::Float(x) if x.is_finite() => Ok(Value::Int(x.trunc() as i64)),
                Value::String(s) => s.trim().parse().map(Value::Int).map_err(|_| fail(&value)),
                Value::Char(c) => c
                    .to_digit(10)
                    .map(|d| Value::Int(i64::from(d)))
                    .ok_or_else(|| fail(&value)),
                _ => Err(fail(&value)),
            };
        }

        if is_float_type(target) {
            return match &value {
                Value::Float(_) => Ok(value),
                Value::Int(n) => Ok(Value::Float(*n as f64)),
                Value::String(s) => s
                    .trim()
                    .parse()
                    .map(Value::Float)
                    .map_err(|_| fail(&value)),
                Value::Char(c) => c
                    .to_digit(10)
                    .map(|d| Value::Float(f64::from(d)))
                    .ok_or_else(|| fail(&value)),
                _ => Err(fail(&value)),
            };
        }

        match target {
            "char" => Ok(Value::Char(match &value {
                Value::Char(c) => *c,
                other => other.to_string_value().chars().next().unwrap_or('\0'),
            })),
            "string" => Ok(match value {
                Value::String(_) => value,
                other => Value::String(other.to_string_value()),
            }),
            "array" => match &value {
                Value::Array(_) => Ok(value),
                Value::String(s) => Ok(Value::array(s.chars().map(Value::Char).collect())),
                _ => Err(fail(&value)),
            },
            "any" => Ok(value),
            "null" => match value {
                Value::Null => Ok(Value::Null),
                other => Err(fail(&other)),
            },
            "Result" => Err(Error::Deprecated {
                feature: "Result".to_string(),
                advice: "use try/catch instead".to_string(),
            }),
            _ if self.structs.contains_key(target) => match &value {
                Value::Struct { type_name, .. } if type_name == target => Ok(value),
                _ => Err(fail(&value)),
            },
            _ if self.enums.contains_key(target) => Ok(value),
            _ => Err(fail(&value)),
        }
    }

    /// Zero value of a declared type
    pub fn default_value(&self, type_name: &str) -> Value {
        self.default_value_guarded(type_name, &mut Vec::new())
    }

    /// `stack` holds the structs being built, so a self-referential field defaults to null
    fn default_value_guarded<'a>(&'a self, type_name: &str, stack: &mut Vec<&'a str>) -> Value {
        if is_integer_type(type_name) {
            return Value::Int(0);
        }
        if is_float_type(type_name) {
            return Value::Float(0.0);
        }
        if type_name == "char" {
            return Value::Char('\0');
        }
        match self.structs.get(type_name) {
            Some(def) if !stack.contains(&def.name.as_str()) => {
                stack.push(def.name.as_str());
                let fields: IndexMap<String, Value> = def
                    .fields
                    .iter()
                    .map(|f| {
                        (
                            f.name.clone(),
                            self.default_value_guarded(&f.type_name, stack),
                        )
                    })
                    .collect();
                stack.pop();
                Value::record(def.name.clone(), fields)
            }
            _ => Value::Null,
        }
    }
}
