//! Array, string and record helpers

use crate::error::{Error, Result};
use crate::runtime::Value;
use crate::tools::{Arity, Tool, ToolContext, ToolRegistry};

/// _array_push - append a value to an array variable in place
pub struct ArrayPushTool;

impl Tool for ArrayPushTool {
    fn name(&self) -> &str {
        "_array_push"
    }

    fn description(&self) -> &str {
        "Append a value to the array, updating the variable passed in"
    }

    fn arity(&self) -> Arity {
        Arity::Exact(2)
    }

    fn returns(&self) -> &str {
        "array"
    }

    fn updates_first_argument(&self) -> bool {
        true
    }

    fn execute(&self, _ctx: &mut ToolContext<'_>, args: &[Value]) -> Result<Value> {
        let items = args[0].as_array().map_err(|_| {
            Error::invalid_args(
                "_array_push",
                format!("first argument must be an array, got {}", args[0].type_name()),
            )
        })?;
        let mut items = items.clone();
        items.push(args[1].clone());
        Ok(Value::array(items))
    }
}

/// _element_get - array index or record key
pub struct ElementGetTool;

impl Tool for ElementGetTool {
    fn name(&self) -> &str {
        "_element_get"
    }

    fn description(&self) -> &str {
        "Element of an array or string by index, or of a record by key"
    }

    fn arity(&self) -> Arity {
        Arity::Exact(2)
    }

    fn execute(&self, _ctx: &mut ToolContext<'_>, args: &[Value]) -> Result<Value> {
        match (&args[0], &args[1]) {
            (Value::Array(_) | Value::String(_), Value::Int(index)) => args[0].get_index(*index),
            (Value::Struct { .. }, key) => args[0].get_field(&key.to_string_value()),
            (container, key) => Err(Error::invalid_args(
                "_element_get",
                format!(
                    "cannot index {} with {}",
                    container.type_name(),
                    key.type_name()
                ),
            )),
        }
    }
}

/// len - number of characters, elements or fields
pub struct LenTool;

impl Tool for LenTool {
    fn name(&self) -> &str {
        "len"
    }

    fn description(&self) -> &str {
        "Length of a string, array or record"
    }

    fn arity(&self) -> Arity {
        Arity::Exact(1)
    }

    fn returns(&self) -> &str {
        "int64"
    }

    fn execute(&self, _ctx: &mut ToolContext<'_>, args: &[Value]) -> Result<Value> {
        let length = match &args[0] {
            Value::String(s) => s.chars().count(),
            Value::Array(items) => items.len(),
            Value::Struct { fields, .. } => fields.len(),
            other => {
                return Err(Error::TypeError {
                    expected: "string, array or record".to_string(),
                    got: other.type_name(),
                })
            }
        };
        Ok(Value::Int(length as i64))
    }
}

/// split - string pieces around a separator
pub struct SplitTool;

impl Tool for SplitTool {
    fn name(&self) -> &str {
        "split"
    }

    fn description(&self) -> &str {
        "Split a string by a separator"
    }

    fn arity(&self) -> Arity {
        Arity::Exact(2)
    }

    fn returns(&self) -> &str {
        "array"
    }

    fn execute(&self, _ctx: &mut ToolContext<'_>, args: &[Value]) -> Result<Value> {
        let text = args[0].as_string()?;
        let separator = args[1].to_string_value();
        if separator.is_empty() {
            return Err(Error::invalid_args("split", "empty separator"));
        }
        Ok(Value::array(
            text.split(separator.as_str()).map(Value::string).collect(),
        ))
    }
}

/// Register collection tools
pub fn register(registry: &mut ToolRegistry) {
    registry.register(ArrayPushTool);
    registry.register(ElementGetTool);
    registry.register(LenTool);
    registry.register(SplitTool);
}
