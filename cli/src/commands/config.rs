//! `layerscan config` command.

use clap::Args;
use layerscan_core::ScanConfig;

#[derive(Args)]
pub struct ConfigArgs;

pub async fn execute(
    _args: ConfigArgs,
    config: ScanConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    print!("{}", serde_yaml::to_string(&config)?);
    Ok(())
}
