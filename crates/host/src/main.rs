use std::path::PathBuf;

use anyhow::Context;

use statusdb_infra::HostConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = HostConfig::from_env();
    let log_format = config
        .as_ref()
        .map(|c| c.log_format)
        .unwrap_or_default();
    statusdb_observability::init_with(log_format);
    let config = config.context("invalid configuration")?;

    let paths: Vec<PathBuf> = std::env::args_os().skip(1).map(PathBuf::from).collect();
    if paths.is_empty() {
        tracing::warn!("no invoice files given; printing an empty collection");
    }

    let documents = statusdb_host::run(&config, &paths).await?;
    println!("{}", serde_json::to_string_pretty(&documents)?);
    Ok(())
}
