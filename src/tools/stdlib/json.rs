//! JSON encode/decode builtin

use crate::error::{Error, Result};
use crate::runtime::Value;
use crate::tools::{Arity, Tool, ToolContext, ToolRegistry};

/// _json_exec - `("dump", value)` or `("load", text)`
pub struct JsonExecTool;

impl Tool for JsonExecTool {
    fn name(&self) -> &str {
        "_json_exec"
    }

    fn description(&self) -> &str {
        "Serialize a value to JSON (dump) or parse JSON text (load)"
    }

    fn arity(&self) -> Arity {
        Arity::Exact(2)
    }

    fn execute(&self, _ctx: &mut ToolContext<'_>, args: &[Value]) -> Result<Value> {
        let failed = |reason: String| Error::ToolExecutionError {
            tool: "_json_exec".to_string(),
            reason,
        };

        match args[0].to_string_value().as_str() {
            "dump" => serde_json::to_string(&args[1].to_json())
                .map(Value::String)
                .map_err(|e| failed(e.to_string())),
            "load" => {
                let text = args[1].to_string_value();
                let json: serde_json::Value =
                    serde_json::from_str(&text).map_err(|e| failed(e.to_string()))?;
                Ok(Value::from_json(&json))
            }
            _ => Err(failed("Unknown operation".to_string())),
        }
    }
}

/// Register JSON tools
pub fn register(registry: &mut ToolRegistry) {
    registry.register(JsonExecTool);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::{Format, Heap};
    use std::io::Cursor;

    fn exec(args: &[Value]) -> Result<Value> {
        let mut output = Vec::new();
        let mut input = Cursor::new(Vec::new());
        let heap = Heap::new(8);
        let mut ctx = ToolContext {
            output: &mut output,
            input: &mut input,
            heap: &heap,
            format: Format::Pretty,
        };
        JsonExecTool.execute(&mut ctx, args)
    }

    #[test]
    fn test_dump() {
        let value = Value::array(vec![Value::Int(1), Value::string("a"), Value::Null]);
        assert_eq!(
            exec(&[Value::string("dump"), value]).unwrap(),
            Value::string("[1,\"a\",null]")
        );
    }

    #[test]
    fn test_load_object_is_dynamic_record() {
        let loaded = exec(&[Value::string("load"), Value::string(r#"{"n": 3}"#)]).unwrap();
        assert_eq!(loaded.type_name(), "any");
        assert_eq!(loaded.get_field("n").unwrap(), Value::Int(3));
    }

    #[test]
    fn test_errors() {
        assert!(exec(&[Value::string("load"), Value::string("{oops")]).is_err());
        let err = exec(&[Value::string("zip"), Value::Null]).unwrap_err();
        assert!(err.to_string().contains("Unknown operation"));
    }
}
