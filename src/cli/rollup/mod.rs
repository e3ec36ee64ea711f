//! One-shot rollup for external schedulers

use clap::Args;
use tracing::info;

#[derive(Args, Debug, Clone, Default)]
pub struct RollupArgs {
    /// Also re-snapshot this many previous days (overrides `rollup.lookback_days`)
    #[arg(long)]
    pub lookback_days: Option<u32>,
}

/// Run the rollup once and print the report as JSON.
///
/// Exits non-zero when any key failed, so cron surfaces partial runs.
pub async fn run(args: RollupArgs) -> anyhow::Result<()> {
    let mut config = super::bootstrap()?;
    if let Some(days) = args.lookback_days {
        config.rollup.lookback_days = days;
    }

    let state = crate::create_app_state_with_config(&config).await?;
    let report = state.rollup_job.run().await?;

    println!("{}", serde_json::to_string_pretty(&report)?);

    if report.failures > 0 {
        anyhow::bail!(
            "rollup finished with {} failed key(s) out of {}",
            report.failures,
            report.keys_scanned
        );
    }

    info!("Rollup complete");
    Ok(())
}
