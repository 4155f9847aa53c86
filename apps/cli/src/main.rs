mod config;
mod main_lib;

use clap::Parser;
use config::Config;
use fundamentals_core::{NonFinitePolicy, ReportMode};
use main_lib::{
    build_service, fatal_payload, init_tracing, run_request, symbol_required, SymbolRequest,
};
use serde_json::Value;

#[derive(Parser)]
#[command(
    name = "fundamentals",
    about = "Company fundamentals as JSON, with statement figures converted to USD"
)]
struct Args {
    /// Ticker symbol, or a comma-separated list for batch mode.
    symbols: Option<String>,

    /// Price, profile and headline ratios only.
    #[arg(long, default_value_t = false)]
    basic: bool,

    /// What NaN and infinite values become: zero or null.
    #[arg(long, default_value = "zero")]
    nan_policy: NonFinitePolicy,

    /// Print JSON on a single line.
    #[arg(long, default_value_t = false)]
    compact: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    let config = Config::from_env();
    init_tracing(&config.log_format);

    let compact = args.compact;
    match run(args, &config).await {
        Ok(payload) => print_json(&payload, compact),
        Err(err) => {
            tracing::error!("Fatal error: {:#}", err);
            print_json(&fatal_payload(&err), compact);
            std::process::exit(1);
        }
    }
}

async fn run(args: Args, config: &Config) -> anyhow::Result<Value> {
    let Some(request) = args.symbols.as_deref().and_then(SymbolRequest::parse) else {
        return Ok(symbol_required());
    };
    let mode = if args.basic {
        ReportMode::Basic
    } else {
        ReportMode::Full
    };

    let service = build_service(config).await?;
    run_request(&service, &request, mode, args.nan_policy).await
}

fn print_json(payload: &Value, compact: bool) {
    let rendered = if compact {
        serde_json::to_string(payload)
    } else {
        serde_json::to_string_pretty(payload)
    };
    match rendered {
        Ok(text) => println!("{}", text),
        Err(err) => tracing::error!("Failed to render output: {}", err),
    }
}
