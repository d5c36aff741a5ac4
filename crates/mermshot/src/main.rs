//! mermshot CLI - Mermaid diagrams in markdown to images.
//!
//! Renders every ```` ```mermaid ```` block of a markdown file to PNG or JPEG
//! and writes a copy of the document with image references in their place.

mod convert;
mod error;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use convert::ConvertArgs;
use output::Output;

/// mermshot - Convert Mermaid diagrams in markdown files to images.
#[derive(Parser)]
#[command(name = "mermshot", version, about)]
struct Cli {
    #[command(flatten)]
    args: ConvertArgs,
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    tracing_subscriber::fmt()
        .with_env_filter(log_filter(cli.args.verbose))
        .with_writer(std::io::stderr)
        .init();

    let rt = tokio::runtime::Runtime::new().expect("Failed to create tokio runtime");
    let result = rt.block_on(cli.args.execute());

    if let Err(err) = result {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}

/// Log filter for the run.
///
/// `--verbose` enables INFO level plus the renderer's debug output, which
/// carries the forwarded browser console. Otherwise use `RUST_LOG` or
/// default to WARN.
fn log_filter(verbose: bool) -> EnvFilter {
    if verbose {
        EnvFilter::new("info,mermshot_render=debug")
    } else {
        EnvFilter::from_default_env()
    }
}
