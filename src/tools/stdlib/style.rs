//! ANSI color and style codes
//!
//! These only build escape strings; printing them is up to the program.

use crate::error::{Error, Result};
use crate::runtime::Value;
use crate::tools::{Arity, Tool, ToolContext, ToolRegistry};

const COLORS: &[&str] = &[
    "black", "red", "green", "yellow", "blue", "magenta", "cyan", "white",
];

fn escape(code: u8) -> Value {
    Value::string(format!("\x1b[{}m", code))
}

/// Offset of `name` in the 8-color table, or 9 for `reset`
fn color_offset(tool: &str, name: &Value) -> Result<u8> {
    let name = name.to_string_value().to_ascii_lowercase();
    if name == "reset" {
        return Ok(9);
    }
    COLORS
        .iter()
        .position(|c| *c == name)
        .map(|i| i as u8)
        .ok_or_else(|| Error::invalid_args(tool, format!("unknown color '{}'", name)))
}

/// fore - foreground color
pub struct ForeTool;

impl Tool for ForeTool {
    fn name(&self) -> &str {
        "fore"
    }

    fn description(&self) -> &str {
        "ANSI foreground color code"
    }

    fn arity(&self) -> Arity {
        Arity::Exact(1)
    }

    fn returns(&self) -> &str {
        "string"
    }

    fn execute(&self, _ctx: &mut ToolContext<'_>, args: &[Value]) -> Result<Value> {
        Ok(escape(30 + color_offset("fore", &args[0])?))
    }
}

/// back - background color
pub struct BackTool;

impl Tool for BackTool {
    fn name(&self) -> &str {
        "back"
    }

    fn description(&self) -> &str {
        "ANSI background color code"
    }

    fn arity(&self) -> Arity {
        Arity::Exact(1)
    }

    fn returns(&self) -> &str {
        "string"
    }

    fn execute(&self, _ctx: &mut ToolContext<'_>, args: &[Value]) -> Result<Value> {
        Ok(escape(40 + color_offset("back", &args[0])?))
    }
}

/// style - text attribute
pub struct StyleTool;

impl Tool for StyleTool {
    fn name(&self) -> &str {
        "style"
    }

    fn description(&self) -> &str {
        "ANSI style code (bold, dim, italic, underline, reset)"
    }

    fn arity(&self) -> Arity {
        Arity::Exact(1)
    }

    fn returns(&self) -> &str {
        "string"
    }

    fn execute(&self, _ctx: &mut ToolContext<'_>, args: &[Value]) -> Result<Value> {
        let name = args[0].to_string_value().to_ascii_lowercase();
        let code = match name.as_str() {
            "reset" => 0,
            "bold" | "bright" => 1,
            "dim" => 2,
            "italic" => 3,
            "underline" => 4,
            "normal" => 22,
            _ => {
                return Err(Error::invalid_args(
                    "style",
                    format!("unknown style '{}'", name),
                ))
            }
        };
        Ok(escape(code))
    }
}

/// Register style tools
pub fn register(registry: &mut ToolRegistry) {
    registry.register(ForeTool);
    registry.register(BackTool);
    registry.register(StyleTool);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::{Format, Heap};
    use std::io::Cursor;

    fn exec(tool: &dyn Tool, arg: &str) -> Result<Value> {
        let mut output = Vec::new();
        let mut input = Cursor::new(Vec::new());
        let heap = Heap::new(8);
        let mut ctx = ToolContext {
            output: &mut output,
            input: &mut input,
            heap: &heap,
            format: Format::Pretty,
        };
        tool.execute(&mut ctx, &[Value::string(arg)])
    }

    #[test]
    fn test_codes() {
        assert_eq!(exec(&ForeTool, "red").unwrap(), Value::string("\x1b[31m"));
        assert_eq!(exec(&BackTool, "WHITE").unwrap(), Value::string("\x1b[47m"));
        assert_eq!(exec(&ForeTool, "reset").unwrap(), Value::string("\x1b[39m"));
        assert_eq!(exec(&StyleTool, "bold").unwrap(), Value::string("\x1b[1m"));
        assert_eq!(exec(&StyleTool, "reset").unwrap(), Value::string("\x1b[0m"));
    }

    #[test]
    fn test_unknown_names() {
        assert!(matches!(
            exec(&ForeTool, "chartreuse"),
            Err(Error::InvalidArguments { .. })
        ));
        assert!(exec(&StyleTool, "blink").is_err());
    }
}
