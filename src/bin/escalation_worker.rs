use chrono::Utc;
use clap::Parser;
use grievance_backend::{
    cache::AnalyticsCache, config::Config, db, error::AppError, init_tracing,
    services::IssueWorkflowService,
};
use std::time::Duration;

/// Periodically escalates issues that have blown their SLA.
#[derive(Parser, Debug)]
#[command(name = "escalation_worker", version, about)]
struct Args {
    /// Seconds between sweeps.
    #[arg(long, default_value_t = 300)]
    interval_secs: u64,

    /// Run a single sweep and exit.
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    if let Err(e) = run(args).await {
        eprintln!("escalation_worker failed: {}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), AppError> {
    let config = Config::from_env()?;
    init_tracing(&config);

    if args.interval_secs == 0 {
        return Err(AppError::Config("--interval-secs must be > 0".to_string()));
    }

    let pool = db::build_pool(&config.database())?;
    let cache = AnalyticsCache::new(
        redis::Client::open(config.redis_url.as_str())?,
        config.analytics_cache_ttl_secs,
    );
    let escalation_interval = config.escalation_interval();

    tracing::info!(
        interval_secs = args.interval_secs,
        once = args.once,
        escalation_interval_hours = config.escalation_interval_hours,
        "Escalation worker started"
    );

    let mut ticker = tokio::time::interval(Duration::from_secs(args.interval_secs));
    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Escalation worker shutting down");
                return Ok(());
            }
        }

        let pool = pool.clone();
        let sweep = tokio::task::spawn_blocking(move || {
            let mut conn = pool.get()?;
            IssueWorkflowService::run_escalation_sweep(&mut conn, Utc::now(), escalation_interval)
        })
        .await
        .map_err(|e| AppError::internal(format!("Sweep task panicked: {}", e)))?;

        match sweep {
            Ok(report) if report.escalated > 0 => cache.invalidate_best_effort().await,
            Ok(_) => {}
            Err(e) if args.once => return Err(e),
            Err(e) => tracing::error!(error = %e, "Escalation sweep failed"),
        }

        if args.once {
            return Ok(());
        }
    }
}
