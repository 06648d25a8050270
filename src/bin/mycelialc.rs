//! `mycelialc`: compiles Mycelial source text into a binary descriptor.
//!
//! `mycelialc <input> [<output>]`, with `--input`/`--output` overriding
//! the positionals when both are given. Exit codes: 0 success, 1
//! argument error or `--help`, 2 parse error, 3 semantic error, 4 I/O
//! error.

use std::io::Write as _;
use std::path::PathBuf;

use clap::Parser;
use mycelial::error::CompileError;
use mycelial::{compile, init_tracing};

#[derive(Parser, Debug)]
#[command(name = "mycelialc", version, about, disable_help_flag = false)]
struct Cli {
    /// Source file to compile.
    input_positional: Option<PathBuf>,

    /// Output path for the compiled descriptor.
    output_positional: Option<PathBuf>,

    /// Source file to compile. Overrides the positional argument.
    #[arg(long = "input")]
    input_named: Option<PathBuf>,

    /// Output path for the compiled descriptor. Overrides the positional
    /// argument.
    #[arg(long = "output")]
    output_named: Option<PathBuf>,

    /// Target architecture or artifact kind. Any value other than the
    /// default descriptor target marks the output as executable.
    #[arg(long)]
    target: Option<String>,

    /// Emit a per-stage trace of compilation on stderr.
    #[arg(long)]
    verbose: bool,
}

fn default_output_for(input: &std::path::Path) -> PathBuf {
    input.with_extension("mycb")
}

fn main() -> std::process::ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            return std::process::ExitCode::from(1);
        }
    };

    if cli.verbose {
        init_tracing();
    }

    let Some(input) = cli.input_named.or(cli.input_positional) else {
        eprintln!("mycelialc: no input file given");
        return std::process::ExitCode::from(1);
    };
    let output = cli
        .output_named
        .or(cli.output_positional)
        .unwrap_or_else(|| default_output_for(&input));

    let source = match std::fs::read_to_string(&input) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("mycelialc: failed to read {}: {err}", input.display());
            return std::process::ExitCode::from(4);
        }
    };

    if cli.verbose {
        tracing::info!(path = %input.display(), bytes = source.len(), "read source");
    }

    let descriptor = match compile(&source) {
        Ok(descriptor) => descriptor,
        Err(CompileError::Syntax(err)) => {
            eprintln!("mycelialc: {err}");
            return std::process::ExitCode::from(2);
        }
        Err(CompileError::Semantic(err)) => {
            eprintln!("mycelialc: {err}");
            return std::process::ExitCode::from(3);
        }
    };

    let bytes = descriptor.encode();
    let executable_target = cli.target.as_deref().is_some_and(|t| t != "descriptor");
    let write_result = std::fs::File::create(&output).and_then(|mut file| {
        file.write_all(&bytes)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt as _;
            let mode = if executable_target { 0o755 } else { 0o644 };
            file.set_permissions(std::fs::Permissions::from_mode(mode))?;
        }
        Ok(())
    });

    if let Err(err) = write_result {
        eprintln!("mycelialc: failed to write {}: {err}", output.display());
        return std::process::ExitCode::from(4);
    }

    if cli.verbose {
        tracing::info!(path = %output.display(), bytes = bytes.len(), "wrote descriptor");
    }
    println!(
        "compiled {} -> {} ({} agents, {} frequencies, {} sockets)",
        input.display(),
        output.display(),
        descriptor.agents.len(),
        descriptor.frequencies.len(),
        descriptor.sockets.len(),
    );

    std::process::ExitCode::SUCCESS
}
