use std::path::PathBuf;

use clap::Parser;
use tracing::debug;

use docpipe::backend::MemoryBackend;
use docpipe::pipeline::{parser, validator};
use docpipe::{run_pipeline, RunConfig, RunContext, StageRegistry};

/// Validate and execute a document-transformation pipeline
#[derive(Parser)]
#[command(name = "docpipe")]
#[command(about = "Validate and execute single-line document pipelines", long_about = None)]
struct Cli {
    /// Pipeline text, e.g. 'Load{source:"a.pdf"} | Select{mode:each} | Save'
    pipeline: String,

    /// Enable verbose output (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Parse and validate only; print the stage plan without executing
    #[arg(long)]
    check: bool,

    /// Log per-step progress during execution
    #[arg(long)]
    debug: bool,

    /// Default rasterization resolution in DPI
    #[arg(long, default_value = "150")]
    resolution: u32,

    /// Directory external packaging collaborators pick artifacts up from
    #[arg(long, default_value = "./output")]
    output_dir: PathBuf,

    /// Page count of the synthetic demonstration documents
    #[arg(long, default_value = "4")]
    pages: usize,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 if cli.debug => "debug",
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .with_target(cli.verbose >= 2)
        .init();

    debug!("docpipe started with verbosity level: {}", cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let registry = StageRegistry::with_builtins();

    if cli.check {
        let stages = parser::parse(&cli.pipeline)?;
        let bound = registry.resolve_all(&stages)?;
        validator::validate(&bound)?;
        println!("pipeline is valid ({} stages):", bound.len());
        for stage in &bound {
            println!("  {}. {} ({})", stage.index + 1, stage.name, stage.capability);
        }
        return Ok(());
    }

    // Execution runs against the in-memory backend; wiring in a real
    // document backend is the embedding application's job.
    let backend = MemoryBackend::new().with_default_page_count(cli.pages);
    let mut ctx = RunContext::new(RunConfig {
        default_resolution: cli.resolution,
        output_dir: cli.output_dir,
        debug: cli.debug || cli.verbose > 0,
    });

    let stream = run_pipeline(&cli.pipeline, &registry, &backend, &mut ctx).await?;

    println!("pipeline complete: {}", stream.describe());
    if let Some(files) = ctx.metadata.get("saved_files").and_then(|v| v.as_array()) {
        println!(
            "{} artifact(s) written (scoped temp directory, removed at teardown):",
            files.len()
        );
        for file in files {
            if let Some(path) = file.as_str() {
                println!("  {path}");
            }
        }
    }
    Ok(())
}
