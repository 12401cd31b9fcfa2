use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use ksl::config::{parse_variable, CompileOptions};
use ksl::span::SourceFile;
use ksl::sql::{self, Dialect};
use ksl::{compile_files, Compilation, CompileError};
use tracing::{debug, info};

#[derive(Parser, Debug)]
#[command(author, version, about = "Compile KSL schemas to SQL DDL", long_about = None)]
struct Args {
    /// Dialect used when the schema has no @backend directive
    #[arg(long, global = true, default_value = "postgres")]
    dialect: Dialect,

    /// Value for a `$KEY` reference, as KEY=VALUE
    #[arg(long = "var", global = true, value_parser = parse_variable)]
    vars: Vec<(String, String)>,

    /// Log pass boundaries to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check schemas and print diagnostics
    Check {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Print the DDL or the lowered schema as JSON
    Sql {
        #[arg(required = true)]
        files: Vec<PathBuf>,

        #[arg(long, value_enum, default_value_t = Format::Sql)]
        format: Format,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    Sql,
    Json,
}

fn setup_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("ksl=debug,info")
        } else {
            EnvFilter::new("warn")
        }
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let args = Args::parse();
    setup_tracing(args.verbose);

    match run(args) {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(err) => {
            eprintln!("error: {err}");
            process::exit(1);
        }
    }
}

/// Returns whether the schema compiled without errors.
fn run(args: Args) -> Result<bool, CompileError> {
    let mut options = CompileOptions::new().with_dialect(args.dialect);
    for (key, value) in args.vars {
        options = options.with_variable(key, value);
    }

    match args.command {
        Command::Check { files } => {
            let compilation = compile(&files, &options)?;
            report(&compilation);
            Ok(!compilation.has_errors())
        }
        Command::Sql {
            files,
            format,
            output,
        } => {
            let compilation = compile(&files, &options)?;
            report(&compilation);
            if compilation.has_errors() {
                return Ok(false);
            }

            let schema = compilation.lift()?;
            let text = match format {
                Format::Sql => sql::render(&schema),
                Format::Json => serde_json::to_string_pretty(&schema)? + "\n",
            };
            match output {
                Some(path) => {
                    fs::write(&path, text).map_err(|source| CompileError::Io { path, source })?
                }
                None => print!("{text}"),
            }
            Ok(true)
        }
    }
}

fn compile(paths: &[PathBuf], options: &CompileOptions) -> Result<Compilation, CompileError> {
    let files = paths
        .iter()
        .map(|path| read_source(path))
        .collect::<Result<Vec<_>, _>>()?;
    info!(files = files.len(), dialect = %options.dialect, "compiling");
    Ok(compile_files(files, options))
}

fn read_source(path: &Path) -> Result<SourceFile, CompileError> {
    debug!(path = %path.display(), "reading");
    let contents = fs::read_to_string(path).map_err(|source| CompileError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(SourceFile::new(path.display().to_string(), contents))
}

fn report(compilation: &Compilation) {
    if !compilation.diagnostics.is_empty() {
        eprintln!("{}", compilation.render_diagnostics());
    }
}
