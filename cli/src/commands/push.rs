//! `layerscan push` command.

use clap::Args;
use layerscan_core::ScanConfig;
use layerscan_engine::{select_manifest_source, ScanSession};

use crate::output::new_table;

#[derive(Args)]
pub struct PushArgs {
    /// Image reference (e.g., "alpine:3.4", "quay.io/org/image:tag")
    pub image: String,

    /// Read the image from a local `docker save` export and serve its blobs locally
    #[arg(long)]
    pub local: bool,

    /// Print where the analysis service will fetch each layer from
    #[arg(long)]
    pub show_sources: bool,
}

pub async fn execute(
    args: PushArgs,
    mut config: ScanConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    config.local |= args.local;

    let source = select_manifest_source(&config)?;
    let (image, manifest) = source.retrieve(&args.image).await?;

    let session = ScanSession::from_config(&config)?;
    let report = session.push(&image, &manifest).await?;

    println!(
        "{}: pushed {} of {} layers",
        image,
        report.pushed.len(),
        report.total()
    );
    if !report.skipped.is_empty() {
        println!("{} layers could not be analyzed", report.skipped.len());
    }

    if args.show_sources {
        let mut table = new_table(&["LAYER", "SOURCE"]);
        for layer in &report.pushed {
            let source = session.blob_url(&image.repository, layer)?;
            table.add_row([layer.as_str(), source.as_str()]);
        }
        println!("{table}");
    }

    Ok(())
}
