//! Wall-clock builtin

use chrono::Utc;

use crate::error::Result;
use crate::runtime::Value;
use crate::tools::{Arity, Tool, ToolContext, ToolRegistry};

/// time - seconds since the Unix epoch
pub struct TimeTool;

impl Tool for TimeTool {
    fn name(&self) -> &str {
        "time"
    }

    fn description(&self) -> &str {
        "Current time in seconds since the Unix epoch"
    }

    fn arity(&self) -> Arity {
        Arity::Exact(0)
    }

    fn returns(&self) -> &str {
        "float64"
    }

    fn execute(&self, _ctx: &mut ToolContext<'_>, _args: &[Value]) -> Result<Value> {
        let now = Utc::now();
        let seconds = now.timestamp() as f64 + f64::from(now.timestamp_subsec_micros()) / 1e6;
        Ok(Value::Float(seconds))
    }
}

/// Register time tools
pub fn register(registry: &mut ToolRegistry) {
    registry.register(TimeTool);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::{Format, Heap};
    use std::io::Cursor;

    #[test]
    fn test_time_is_after_2020() {
        let mut output = Vec::new();
        let mut input = Cursor::new(Vec::new());
        let heap = Heap::new(8);
        let mut ctx = ToolContext {
            output: &mut output,
            input: &mut input,
            heap: &heap,
            format: Format::Pretty,
        };
        let now = TimeTool.execute(&mut ctx, &[]).unwrap().as_float().unwrap();
        assert!(now > 1_577_836_800.0);
    }
}
