//! Conversion command implementation.

use std::path::{Path, PathBuf};

use clap::Args;
use mermshot_config::{CliSettings, Config};
use mermshot_convert::{ConversionOptions, ConversionResult, Converter};
use mermshot_render::{
    ChromiumLauncher, ChromiumSession, DEFAULT_SCRIPT_URL, ImageFormat, RenderTimeouts,
    SessionOptions,
};
use tracing::{info, warn};

use crate::error::CliError;
use crate::output::Output;

/// Arguments for converting a markdown file.
#[derive(Args)]
pub(crate) struct ConvertArgs {
    /// Markdown file containing Mermaid diagrams.
    #[arg(value_name = "MARKDOWN_FILE")]
    input: PathBuf,

    /// Directory to save the generated images (default: ./images).
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Image format, png or jpeg (default: png).
    #[arg(short, long)]
    format: Option<String>,

    /// JPEG quality, 1-100 (default: 85).
    #[arg(short, long)]
    quality: Option<u8>,

    /// Device scale factor for higher resolution, 1-5 (default: 2).
    #[arg(short, long)]
    scale: Option<f64>,

    /// Enable verbose output (syntax checks, browser console and render logs).
    #[arg(short, long)]
    pub verbose: bool,

    /// Only check diagrams for syntax issues; render and write nothing.
    #[arg(long)]
    validate_only: bool,

    /// Repair common syntax issues before rendering.
    #[arg(long)]
    fix: bool,

    /// Path to configuration file (default: auto-discover mermshot.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Browser executable (default: auto-detect Chrome or Chromium).
    #[arg(long, env = "MERMSHOT_BROWSER")]
    browser: Option<PathBuf>,
}

impl ConvertArgs {
    /// Execute the conversion.
    ///
    /// The browser is closed on every path, including Ctrl-C.
    ///
    /// # Errors
    ///
    /// Returns an error if the input or configuration is invalid or the
    /// conversion fails.
    pub(crate) async fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        validate_input(&self.input)?;

        let cli_settings = CliSettings {
            output_dir: self.output.clone(),
            format: self.format.clone(),
            quality: self.quality,
            scale: self.scale,
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;
        if let Some(path) = &config.config_path {
            info!(path = %path.display(), "Loaded configuration");
        }

        let options = self.conversion_options(&config)?;

        let mut launcher = ChromiumLauncher::new();
        if let Some(browser) = &self.browser {
            launcher = launcher.with_executable(browser);
        }
        let session =
            ChromiumSession::new(launcher).with_options(session_options(&config, self.verbose));
        let mut converter = Converter::new(session);

        output.highlight("Starting Mermaid conversion...");

        let outcome = tokio::select! {
            result = converter.convert_file(&self.input, &options) => Some(result),
            _ = tokio::signal::ctrl_c() => None,
        };

        if let Err(err) = converter.shutdown().await {
            warn!(error = %err, "Failed to close browser");
        }

        let Some(result) = outcome else {
            output.warning("Interrupted, browser closed");
            return Ok(());
        };

        report(&output, &result?, &options);
        Ok(())
    }

    /// Build conversion options from the validated configuration.
    fn conversion_options(&self, config: &Config) -> Result<ConversionOptions, CliError> {
        let settings = &config.output_resolved;
        let format = ImageFormat::parse(&settings.format).ok_or_else(|| {
            CliError::Validation(r#"Format must be either "png" or "jpeg""#.to_owned())
        })?;

        Ok(ConversionOptions::new(std::path::absolute(&settings.dir)?)
            .format(format)
            .quality(settings.quality)
            .scale(settings.scale)
            .verbose(self.verbose)
            .validate_only(self.validate_only)
            .auto_fix(self.fix))
    }
}

/// Session options from the configuration.
fn session_options(config: &Config, verbose: bool) -> SessionOptions {
    SessionOptions {
        script_url: config
            .mermaid
            .script_url
            .clone()
            .unwrap_or_else(|| DEFAULT_SCRIPT_URL.to_owned()),
        timeouts: RenderTimeouts {
            page_load: config.timeouts.page_load(),
            render: config.timeouts.render(),
            settle: config.timeouts.settle(),
        },
        verbose,
    }
}

/// Check that `path` is a readable markdown file.
fn validate_input(path: &Path) -> Result<(), CliError> {
    let metadata = std::fs::metadata(path).map_err(|_| {
        CliError::Validation(format!("Cannot read markdown file: {}", path.display()))
    })?;

    if !metadata.is_file() {
        return Err(CliError::Validation(format!(
            "{} is not a file",
            path.display()
        )));
    }

    let is_markdown = path
        .extension()
        .is_some_and(|ext| ext == "md" || ext == "markdown");
    if !is_markdown {
        return Err(CliError::Validation(
            "Input file must be a markdown file (.md or .markdown)".to_owned(),
        ));
    }

    std::fs::File::open(path).map_err(|_| {
        CliError::Validation(format!("Cannot read markdown file: {}", path.display()))
    })?;

    Ok(())
}

/// Print the conversion summary.
fn report(output: &Output, result: &ConversionResult, options: &ConversionOptions) {
    for block in &result.issues {
        output.warning(&format!("Diagram {}:", block.index));
        for issue in &block.issues {
            output.item(issue);
        }
        for fix in &block.fixes {
            output.item(&format!("fixed: {fix}"));
        }
    }

    if options.validate_only {
        if result.issues.is_empty() {
            output.success("No syntax issues found");
        } else {
            output.warning(&format!(
                "Found issues in {} diagram(s)",
                result.issues.len()
            ));
        }
        return;
    }

    output.success(&format!(
        "Successfully converted {} Mermaid diagram(s)",
        result.converted_count
    ));
    if let Some(output_file) = &result.output_file {
        output.success(&format!("Output file: {}", output_file.display()));
    }
    output.success(&format!(
        "Images saved to: {}",
        result.image_directory.display()
    ));
    if let Some(fixed_file) = &result.fixed_file {
        output.info(&format!("Fixed document: {}", fixed_file.display()));
    }
}
