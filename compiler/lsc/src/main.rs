//! LuaScript compiler CLI.

use lsc::{transpile, Options, Target};
use std::path::Path;
use std::process::ExitCode;

fn main() -> ExitCode {
    lsc::tracing_setup::init();
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        return ExitCode::FAILURE;
    }

    match args[1].as_str() {
        "build" => build(&args[2..], true),
        "check" => build(&args[2..], false),
        "emit-ir" => emit_ir(&args[2..]),
        "--help" | "-h" | "help" => {
            print_usage();
            ExitCode::SUCCESS
        }
        other => {
            eprintln!("unknown command `{other}`");
            print_usage();
            ExitCode::FAILURE
        }
    }
}

fn print_usage() {
    eprintln!("LuaScript compiler");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  lsc build <file.ls> [-o out.lua] [flags]   compile to Lua");
    eprintln!("  lsc check <file.ls> [flags]                report diagnostics only");
    eprintln!("  lsc emit-ir <file.ls> [flags]              dump the IR as JSON");
    eprintln!();
    eprintln!("Flags:");
    eprintln!("  --strict        treat warnings and recoverable errors as fatal");
    eprintln!("  --debug-info    annotate output with source line comments");
    eprintln!("  --no-cache      disable output memoization");
    eprintln!("  --target=<t>    lua | wasm | mlir | llvm (default lua)");
}

/// Parse common flags, returning the input path and options.
fn parse_flags(args: &[String]) -> Result<(String, Options, Option<String>), String> {
    let mut options = Options::default();
    let mut input: Option<String> = None;
    let mut output: Option<String> = None;
    let mut index = 0;
    while index < args.len() {
        let arg = &args[index];
        if arg == "--strict" {
            options.strict = true;
        } else if arg == "--debug-info" {
            options.emit_debug_info = true;
        } else if arg == "--no-cache" {
            options.cache = false;
        } else if let Some(target) = arg.strip_prefix("--target=") {
            options.target = target.parse::<Target>()?;
        } else if arg == "-o" {
            index += 1;
            match args.get(index) {
                Some(path) => output = Some(path.clone()),
                None => return Err("`-o` needs a path".to_string()),
            }
        } else if arg.starts_with('-') {
            return Err(format!("unknown flag `{arg}`"));
        } else if input.is_none() {
            input = Some(arg.clone());
        } else {
            return Err(format!("unexpected argument `{arg}`"));
        }
        index += 1;
    }
    match input {
        Some(input) => Ok((input, options, output)),
        None => Err("missing input file".to_string()),
    }
}

fn read_source(path: &str) -> Result<String, String> {
    std::fs::read_to_string(path).map_err(|error| format!("cannot read `{path}`: {error}"))
}

fn report(result: &lsc::TranspileResult) {
    for diagnostic in &result.diagnostics {
        eprintln!("{diagnostic}");
    }
}

fn build(args: &[String], write_output: bool) -> ExitCode {
    let (input, options, output) = match parse_flags(args) {
        Ok(parsed) => parsed,
        Err(message) => {
            eprintln!("{message}");
            return ExitCode::FAILURE;
        }
    };
    let source = match read_source(&input) {
        Ok(source) => source,
        Err(message) => {
            eprintln!("{message}");
            return ExitCode::FAILURE;
        }
    };

    let result = transpile(&source, &options);
    report(&result);
    if result.has_errors() {
        return ExitCode::FAILURE;
    }

    if write_output {
        let out_path = output.unwrap_or_else(|| {
            Path::new(&input)
                .with_extension("lua")
                .to_string_lossy()
                .to_string()
        });
        if let Err(error) = std::fs::write(&out_path, &result.output) {
            eprintln!("cannot write `{out_path}`: {error}");
            return ExitCode::FAILURE;
        }
        eprintln!(
            "wrote {out_path} ({} nodes, {} ms{})",
            result.stats.node_count,
            result.stats.duration_ms,
            if result.stats.cache_hit { ", cached" } else { "" }
        );
    }
    ExitCode::SUCCESS
}

fn emit_ir(args: &[String]) -> ExitCode {
    let (input, options, _) = match parse_flags(args) {
        Ok(parsed) => parsed,
        Err(message) => {
            eprintln!("{message}");
            return ExitCode::FAILURE;
        }
    };
    let source = match read_source(&input) {
        Ok(source) => source,
        Err(message) => {
            eprintln!("{message}");
            return ExitCode::FAILURE;
        }
    };

    let result = transpile(&source, &options);
    report(&result);
    match result.ir_to_json() {
        Ok(json) => {
            println!("{json}");
            if result.has_errors() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(error) => {
            eprintln!("cannot serialize IR: {error}");
            ExitCode::FAILURE
        }
    }
}
