use finsight::config::Config;
use finsight::tui::{run_tui, TuiOptions};
use finsight::types::fmt_opt;
use finsight::{api, AppState};
use std::fs::File;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const LOG_FILE: &str = "finsight.log";

const USAGE: &str = "usage: finsight [serve | tui [symbols.csv] [chart.png] | analyze SYMBOL...]";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| "finsight=debug,tower_http=debug".into())
}

/// Log to stderr, or to a file while the terminal UI owns the screen.
fn init_tracing(to_file: bool) -> anyhow::Result<()> {
    if to_file {
        let file = File::create(LOG_FILE)?;
        tracing_subscriber::registry()
            .with(env_filter())
            .with(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter())
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
    Ok(())
}

async fn serve(state: AppState) -> anyhow::Result<()> {
    let config = state.config.clone();

    // Warn early when the language model is down; requests still fall back
    state.pipeline.llm().probe(1).await;

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Finsight server listening on {}", addr);

    axum::serve(listener, api::app(state)).await?;
    Ok(())
}

async fn analyze(state: AppState, symbols: &[String]) -> anyhow::Result<()> {
    if symbols.is_empty() {
        anyhow::bail!("{}", USAGE);
    }

    for report in state.pipeline.analyze_portfolio(symbols).await {
        println!("== {} ==", report.ticker);
        if let Some(signal) = &report.signal {
            println!(
                "Rule verdict: {} (short MA {}, long MA {}, expected {}%)",
                signal.direction,
                fmt_opt(signal.short_ma),
                fmt_opt(signal.long_ma),
                fmt_opt(signal.expected_pct_change)
            );
        }
        println!("{}\n", report.insight);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let mode = args.first().map(String::as_str).unwrap_or("serve");

    init_tracing(mode == "tui")?;

    let config = Config::from_env();
    info!(
        "Starting Finsight ({}) with model {} via {}",
        mode, config.llm.model_name, config.llm.endpoint_url
    );
    let state = AppState::from_config(config);

    match mode {
        "serve" => serve(state).await,
        "tui" => {
            let options = TuiOptions {
                symbols_path: args.get(1).map(PathBuf::from),
                image_path: args.get(2).map(PathBuf::from),
            };
            run_tui(state, options).await?;
            Ok(())
        }
        "analyze" => analyze(state, &args[1..]).await,
        _ => anyhow::bail!("{}", USAGE),
    }
}
