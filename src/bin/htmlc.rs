use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use htmlc::{Builder, CompileOptions, HtmlCompiler, CONFIG_FILE_NAME};

#[derive(Parser)]
#[command(name = "htmlc", version, about = "Compile markup template blocks into runtime construction calls")]
struct Cli {
    /// Increase log verbosity (-v: debug, -vv: trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile every source file under a directory.
    Build {
        /// Root directory (default: current directory)
        #[arg(default_value = ".")]
        dir: PathBuf,
        /// Configuration file (default: <DIR>/htmlc.json)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Ignore and do not update the incremental cache
        #[arg(long)]
        no_cache: bool,
        /// Runtime package identifier used in emitted calls
        #[arg(long)]
        runtime: Option<String>,
    },
    /// Compile a single source file.
    Compile {
        file: PathBuf,
        /// Print the result instead of writing it next to the source
        #[arg(long)]
        stdout: bool,
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "htmlc=info",
        1 => "htmlc=debug",
        _ => "htmlc=trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_options(config: Option<&Path>, root: &Path) -> Result<CompileOptions> {
    let path = config
        .map(Path::to_path_buf)
        .unwrap_or_else(|| root.join(CONFIG_FILE_NAME));
    CompileOptions::load(&path).with_context(|| format!("failed to load {}", path.display()))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Build {
            dir,
            config,
            no_cache,
            runtime,
        } => build_cmd(&dir, config.as_deref(), no_cache, runtime),
        Commands::Compile {
            file,
            stdout,
            config,
        } => compile_cmd(&file, config.as_deref(), stdout),
    }
}

fn build_cmd(dir: &Path, config: Option<&Path>, no_cache: bool, runtime: Option<String>) -> Result<()> {
    let mut options = load_options(config, dir)?;
    if no_cache {
        options.use_cache = false;
    }
    if let Some(runtime) = runtime {
        options.runtime = runtime;
    }

    let compiler = HtmlCompiler::new(options);
    let builder = Builder::new(&compiler, dir)?;
    let report = builder.build_dir(dir)?;

    tracing::info!(
        compiled = report.compiled,
        cached = report.cached,
        "build finished"
    );
    Ok(())
}

fn compile_cmd(file: &Path, config: Option<&Path>, stdout: bool) -> Result<()> {
    let root = file.parent().unwrap_or_else(|| Path::new("."));
    let mut options = load_options(config, root)?;
    options.use_cache = false;

    let compiler = HtmlCompiler::new(options);
    let builder = Builder::new(&compiler, root)?;
    let output = builder.compile_file(file)?;

    if stdout {
        print!("{}", output);
        return Ok(());
    }

    let ext = file
        .extension()
        .map(|e| e.to_string_lossy().to_string())
        .unwrap_or_default();
    let target = htmlc::SourceFile {
        path: file.to_path_buf(),
        extension: ext,
    }
    .output_path(&compiler.options.output_suffix);
    fs::write(&target, output).with_context(|| format!("failed to write {}", target.display()))?;
    tracing::info!(output = %target.display(), "compiled");
    Ok(())
}
