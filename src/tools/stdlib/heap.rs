//! Heap introspection builtins

use crate::error::Result;
use crate::runtime::Value;
use crate::tools::{Arity, Tool, ToolContext, ToolRegistry};

/// gravox_heapusage - bytes handed out so far
pub struct HeapUsageTool;

impl Tool for HeapUsageTool {
    fn name(&self) -> &str {
        "gravox_heapusage"
    }

    fn description(&self) -> &str {
        "Next address the allocator will hand out"
    }

    fn arity(&self) -> Arity {
        Arity::Exact(0)
    }

    fn returns(&self) -> &str {
        "int64"
    }

    fn execute(&self, ctx: &mut ToolContext<'_>, _args: &[Value]) -> Result<Value> {
        Ok(Value::Int(ctx.heap.next_address()))
    }
}

/// gravox_heapsize - configured capacity
pub struct HeapSizeTool;

impl Tool for HeapSizeTool {
    fn name(&self) -> &str {
        "gravox_heapsize"
    }

    fn description(&self) -> &str {
        "Heap capacity in bytes"
    }

    fn arity(&self) -> Arity {
        Arity::Exact(0)
    }

    fn returns(&self) -> &str {
        "int64"
    }

    fn execute(&self, ctx: &mut ToolContext<'_>, _args: &[Value]) -> Result<Value> {
        Ok(Value::Int(
            i64::try_from(ctx.heap.capacity()).unwrap_or(i64::MAX),
        ))
    }
}

/// gravox_heapdump - live cells as text
pub struct HeapDumpTool;

impl Tool for HeapDumpTool {
    fn name(&self) -> &str {
        "gravox_heapdump"
    }

    fn description(&self) -> &str {
        "Every live heap cell as 'address: value' lines"
    }

    fn arity(&self) -> Arity {
        Arity::Exact(0)
    }

    fn returns(&self) -> &str {
        "string"
    }

    fn execute(&self, ctx: &mut ToolContext<'_>, _args: &[Value]) -> Result<Value> {
        Ok(Value::string(ctx.heap.dump()))
    }
}

/// Register heap tools
pub fn register(registry: &mut ToolRegistry) {
    registry.register(HeapUsageTool);
    registry.register(HeapSizeTool);
    registry.register(HeapDumpTool);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::{Format, Heap};
    use std::io::Cursor;

    #[test]
    fn test_heap_stats() {
        let mut heap = Heap::new(32);
        let address = heap.allocate("int32");
        heap.write(address, Value::Int(5)).unwrap();
        heap.allocate("char");

        let mut output = Vec::new();
        let mut input = Cursor::new(Vec::new());
        let mut ctx = ToolContext {
            output: &mut output,
            input: &mut input,
            heap: &heap,
            format: Format::Pretty,
        };

        assert_eq!(HeapUsageTool.execute(&mut ctx, &[]).unwrap(), Value::Int(5));
        assert_eq!(HeapSizeTool.execute(&mut ctx, &[]).unwrap(), Value::Int(32));
        assert_eq!(
            HeapDumpTool.execute(&mut ctx, &[]).unwrap(),
            Value::string("0: 5\n")
        );
    }
}
