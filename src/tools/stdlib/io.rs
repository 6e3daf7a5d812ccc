//! File access builtin

use std::fs;

use tracing::debug;

use crate::error::{Error, Result};
use crate::runtime::Value;
use crate::tools::{Arity, Tool, ToolContext, ToolRegistry};

/// _file_exec - read (`"r"`) or overwrite (`"w+"`) a file
pub struct FileExecTool;

impl Tool for FileExecTool {
    fn name(&self) -> &str {
        "_file_exec"
    }

    fn description(&self) -> &str {
        "Read a file with mode \"r\" or overwrite it with mode \"w+\""
    }

    fn arity(&self) -> Arity {
        Arity::Range(2, 3)
    }

    fn execute(&self, _ctx: &mut ToolContext<'_>, args: &[Value]) -> Result<Value> {
        let path = args[0].to_string_value();
        let mode = args[1].to_string_value();
        debug!(path = %path, mode = %mode, "file exec");

        let failed = |e: std::io::Error| Error::ToolExecutionError {
            tool: "_file_exec".to_string(),
            reason: format!("{}: {}", path, e),
        };

        match mode.as_str() {
            "r" => fs::read_to_string(&path).map(Value::String).map_err(failed),
            "w+" => {
                let data = args.get(2).map(Value::to_string_value).unwrap_or_default();
                fs::write(&path, data).map_err(failed)?;
                Ok(Value::Int(1))
            }
            _ => Err(Error::ToolExecutionError {
                tool: "_file_exec".to_string(),
                reason: "No such mode for file execution.".to_string(),
            }),
        }
    }
}

/// Register file tools
pub fn register(registry: &mut ToolRegistry) {
    registry.register(FileExecTool);
}
