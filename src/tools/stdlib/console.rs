//! Console output and input
//!
//! `print` here is the same routine the `print(...)` statement uses, so both
//! spellings produce identical output.

use std::io::Write;

use crate::error::Result;
use crate::runtime::{Format, Value};
use crate::tools::{Arity, Tool, ToolContext, ToolRegistry};

/// ANSI sequence that clears the terminal and homes the cursor
pub const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

/// Writes `values` space-separated, without a trailing newline
pub fn write_joined(out: &mut dyn Write, values: &[Value], format: Format) -> Result<()> {
    for (i, value) in values.iter().enumerate() {
        if i > 0 {
            out.write_all(b" ")?;
        }
        out.write_all(value.render(format).as_bytes())?;
    }
    Ok(())
}

/// Writes `values` space-separated followed by a newline
pub fn write_line(out: &mut dyn Write, values: &[Value], format: Format) -> Result<()> {
    write_joined(out, values, format)?;
    out.write_all(b"\n")?;
    Ok(())
}

/// print - values separated by spaces, then a newline
pub struct PrintTool;

impl Tool for PrintTool {
    fn name(&self) -> &str {
        "print"
    }

    fn description(&self) -> &str {
        "Print values separated by spaces, followed by a newline"
    }

    fn returns(&self) -> &str {
        "null"
    }

    fn execute(&self, ctx: &mut ToolContext<'_>, args: &[Value]) -> Result<Value> {
        write_line(ctx.output, args, ctx.format)?;
        Ok(Value::Null)
    }
}

/// debug_print - the argument list rendered as one array
pub struct DebugPrintTool;

impl Tool for DebugPrintTool {
    fn name(&self) -> &str {
        "debug_print"
    }

    fn description(&self) -> &str {
        "Print the argument list in debug form"
    }

    fn returns(&self) -> &str {
        "null"
    }

    fn execute(&self, ctx: &mut ToolContext<'_>, args: &[Value]) -> Result<Value> {
        let listing = Value::array(args.to_vec());
        writeln!(ctx.output, "{}", listing.render(ctx.format))?;
        Ok(Value::Null)
    }
}

/// raw_print - like print but without the newline
pub struct RawPrintTool;

impl Tool for RawPrintTool {
    fn name(&self) -> &str {
        "raw_print"
    }

    fn description(&self) -> &str {
        "Print values separated by spaces, without a newline"
    }

    fn returns(&self) -> &str {
        "null"
    }

    fn execute(&self, ctx: &mut ToolContext<'_>, args: &[Value]) -> Result<Value> {
        write_joined(ctx.output, args, ctx.format)?;
        ctx.output.flush()?;
        Ok(Value::Null)
    }
}

/// input - show a prompt and read one line
pub struct InputTool;

impl Tool for InputTool {
    fn name(&self) -> &str {
        "input"
    }

    fn description(&self) -> &str {
        "Print a prompt and read a line from standard input"
    }

    fn arity(&self) -> Arity {
        Arity::Exact(1)
    }

    fn returns(&self) -> &str {
        "string"
    }

    fn execute(&self, ctx: &mut ToolContext<'_>, args: &[Value]) -> Result<Value> {
        ctx.output.write_all(args[0].render(ctx.format).as_bytes())?;
        ctx.output.flush()?;

        // end of input reads as an empty line
        let mut line = String::new();
        ctx.input.read_line(&mut line)?;
        let trimmed = line.trim_end_matches(['\n', '\r']);
        Ok(Value::string(trimmed))
    }
}

/// clear_screen - ANSI clear
pub struct ClearScreenTool;

impl Tool for ClearScreenTool {
    fn name(&self) -> &str {
        "clear_screen"
    }

    fn description(&self) -> &str {
        "Clear the terminal"
    }

    fn arity(&self) -> Arity {
        Arity::Exact(0)
    }

    fn returns(&self) -> &str {
        "null"
    }

    fn execute(&self, ctx: &mut ToolContext<'_>, _args: &[Value]) -> Result<Value> {
        ctx.output.write_all(CLEAR_SCREEN.as_bytes())?;
        ctx.output.flush()?;
        Ok(Value::Null)
    }
}

/// Register console tools
pub fn register(registry: &mut ToolRegistry) {
    registry.register(PrintTool);
    registry.register(DebugPrintTool);
    registry.register(RawPrintTool);
    registry.register(InputTool);
    registry.register(ClearScreenTool);
}
