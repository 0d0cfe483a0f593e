use anyhow::Context;
use log::info;
use std::io::Write;

mod cloud_provider;
mod compute;
mod config;
mod managed;
mod report;
mod util;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = config::Config::from_env().context("Failed to read configuration")?;
    info!("Using region {}", config.region.name());

    let ec2 = cloud_provider::ec2_client(config.region.clone())
        .context("Failed to create EC2 client")?;
    let ssm = cloud_provider::ssm_client(config.region.clone())
        .context("Failed to create SSM client")?;

    let report = report::find_unmanaged_instances(&ec2, &ssm, &config)
        .await
        .context("Failed to list unmanaged instances")?;
    info!(
        "{} of {} instances are not managed by SSM ({} registered)",
        report.unmanaged.len(),
        report.compute.len(),
        report.managed.len()
    );

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    report.write_to(&mut out)?;
    out.flush()?;

    Ok(())
}
