use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use mermaid_munger::Munger;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "munge")]
#[command(about = "Convert Markdown with embedded Mermaid diagrams to PDF")]
#[command(version = "0.1.0")]
struct Cli {
    /// Input Markdown file
    input: PathBuf,

    /// Output PDF path (defaults to the input path with a .pdf extension)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let munger = Munger::new(&cli.input, cli.output.as_deref())?;
    let pdf = munger.convert()?;

    println!("✅ Wrote {}", pdf.display());

    Ok(())
}
