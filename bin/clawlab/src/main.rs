use tracing::info;
use tracing_subscriber::EnvFilter;

use backtest::BacktestEngine;
use common::{AppConfig, RunMode};
use data::BinanceCandleSource;

#[tokio::main]
async fn main() {
    // ── Logging ──────────────────────────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse().unwrap()))
        .init();

    // ── Config ────────────────────────────────────────────────────────────────
    let cfg = AppConfig::from_env();
    info!(mode = ?cfg.mode, symbol = %cfg.symbol, "ClawLab starting");

    let source = BinanceCandleSource::new();
    let emit_json = std::env::var("CLAWLAB_JSON").map(|v| v == "1").unwrap_or(false);

    match cfg.mode {
        RunMode::Run => {
            let config = cfg.backtest_config(&cfg.variant);
            let engine = BacktestEngine::new(config)
                .unwrap_or_else(|e| panic!("Invalid backtest config: {e}"));
            let result = engine
                .run(&source)
                .await
                .unwrap_or_else(|e| panic!("Backtest failed: {e}"));

            println!("{}", result.summary);
            if emit_json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&result)
                        .unwrap_or_else(|e| panic!("Failed to serialize result: {e}"))
                );
            }
        }
        RunMode::Compare => {
            let variant_b = cfg
                .variant_b
                .as_deref()
                .unwrap_or_else(|| panic!("compare mode requires 'variant_b' in the run config"));
            let config_a = cfg.backtest_config(&cfg.variant);
            let config_b = cfg.backtest_config(variant_b);

            let report = stats::compare_runs(config_a, config_b, &source)
                .await
                .unwrap_or_else(|e| panic!("Comparison failed: {e}"));

            println!("{}", report.summary);
            if emit_json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&report)
                        .unwrap_or_else(|e| panic!("Failed to serialize report: {e}"))
                );
            }
        }
    }

    info!("Done");
}
