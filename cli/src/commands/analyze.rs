//! `layerscan analyze` command.

use clap::{Args, ValueEnum};
use layerscan_core::ScanConfig;
use layerscan_engine::{select_manifest_source, ScanSession};

use crate::output::{layers_table, severity_table};

/// Report format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

#[derive(Args)]
pub struct AnalyzeArgs {
    /// Image reference (e.g., "alpine:3.4", "quay.io/org/image:tag")
    pub image: String,

    /// Read the image from a local `docker save` export and serve its blobs locally
    #[arg(long)]
    pub local: bool,

    /// Report format
    #[arg(long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

pub async fn execute(
    args: AnalyzeArgs,
    mut config: ScanConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    config.local |= args.local;

    let source = select_manifest_source(&config)?;
    let (image, manifest) = source.retrieve(&args.image).await?;

    // Push first so the service has every layer and its blob source
    let session = ScanSession::from_config(&config)?;
    match session.push(&image, &manifest).await {
        Ok(report) => tracing::debug!(
            image = %image,
            pushed = report.pushed.len(),
            skipped = report.skipped.len(),
            "Layers pushed before analysis"
        ),
        Err(e) if e.is_recoverable() => {
            tracing::warn!(image = %image, error = %e, "Push incomplete, analyzing anyway")
        }
        Err(e) => return Err(e.into()),
    }

    let analysis = session.analyze(&image, &manifest).await?;

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&analysis)?),
        OutputFormat::Table => {
            println!(
                "Image: {}/{}:{}",
                analysis.registry, analysis.image_name, analysis.tag
            );
            println!("{} layers analyzed\n", analysis.layers.len());
            println!("{}", layers_table(&analysis));
            if analysis.vulnerabilities().is_empty() {
                println!("\nNo vulnerabilities found");
            } else {
                println!("\n{}", severity_table(&analysis));
            }
        }
    }

    Ok(())
}
