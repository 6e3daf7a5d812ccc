use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser as _;

use gravox::{tokenize, Format, Interpreter, InterpreterConfig, Parser};

/// Run a Gravox script
#[derive(Debug, clap::Parser)]
#[clap(author, version, about)]
struct Args {
    /// Script to run
    file: PathBuf,

    /// Dump tokens and AST before running, and show failures in debug form
    #[clap(short, long)]
    debug: bool,

    /// Simulated heap capacity in bytes
    #[clap(long, default_value_t = gravox::runtime::DEFAULT_HEAP_SIZE)]
    heap_size: usize,

    /// Directory `import` resolves modules against (defaults to the working directory)
    #[clap(long)]
    module_root: Option<PathBuf>,

    /// Maximum nesting of function calls
    #[clap(long, default_value_t = gravox::runtime::DEFAULT_MAX_CALL_DEPTH)]
    max_call_depth: usize,

    /// Print structs as bare field maps
    #[clap(long)]
    plain: bool,

    /// Report lexer and parser failures as JSON diagnostics
    #[clap(long)]
    lsp: bool,
}

fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();

    let source = std::fs::read_to_string(&args.file)
        .with_context(|| format!("failed to read {}", args.file.display()))?;

    let mut config = InterpreterConfig::new()
        .with_heap_size(args.heap_size)
        .with_max_call_depth(args.max_call_depth)
        .with_format(if args.plain { Format::Plain } else { Format::Pretty });
    if let Some(root) = &args.module_root {
        config = config.with_module_root(root);
    }

    let front = tokenize(&source, args.lsp).and_then(|tokens| {
        if args.debug {
            eprintln!("Tokens:");
            eprintln!("{}", serde_json::to_string_pretty(&tokens).unwrap_or_default());
        }
        Parser::new(tokens).with_lsp_mode(args.lsp).parse()
    });
    let program = match front {
        Ok(program) => program,
        Err(err) => {
            println!("error at 0 ({}): {}", args.file.display(), err);
            if args.debug {
                eprintln!("{:?}", err);
            }
            return Ok(ExitCode::FAILURE);
        }
    };
    if args.debug {
        eprintln!("AST:");
        eprintln!("{}", serde_json::to_string_pretty(&program).unwrap_or_default());
    }

    let mut interpreter = Interpreter::new(config);
    match interpreter.execute(&program) {
        Ok(_) => Ok(ExitCode::SUCCESS),
        Err(err) => {
            println!("{}", interpreter.report(&err));
            if args.debug {
                eprintln!("{:?}", err);
            }
            Ok(ExitCode::FAILURE)
        }
    }
}
