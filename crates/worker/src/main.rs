use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use finsight_core::analytics;
use finsight_core::chat::{format, DialogueRouter};
use finsight_core::config::Settings;
use finsight_core::domain::chat::ConversationLog;
use finsight_core::market::http::HttpMarketData;
use finsight_core::market::movers::MoversBoard;
use finsight_core::market::MarketDataClient;
use finsight_core::projection::Projector;
use finsight_core::recommend::SectorRanker;

mod transactions;

#[derive(Debug, Parser)]
#[command(name = "finsight_worker")]
struct Args {
    /// JSON array of exported transactions.
    #[arg(long, global = true)]
    transactions: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print income, expense, balance and monthly buckets.
    Summary,
    /// Rank sectors and print the investment report for the current balance.
    Recommend,
    /// Project a short-horizon price for SYMBOL.
    Predict { symbol: String },
    /// Ask the assistant one question.
    Ask { message: String },
    /// Print trending gainers and losers.
    Movers {
        /// Keep refreshing on MOVERS_REFRESH_SECS until interrupted.
        #[arg(long)]
        watch: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();

    if let Err(err) = run(args, settings).await {
        sentry_anyhow::capture_anyhow(&err);
        tracing::error!(error = %err, "worker run failed");
        return Err(err);
    }
    Ok(())
}

async fn run(args: Args, settings: Settings) -> anyhow::Result<()> {
    let txs = match args.transactions.as_deref() {
        Some(path) => transactions::load(path)?,
        None => Vec::new(),
    };
    let metrics = analytics::financial_metrics(&txs);

    let client: Arc<dyn MarketDataClient> = Arc::new(HttpMarketData::from_settings(&settings)?);
    let deadline = settings.fetch_timeout();

    match args.command {
        Command::Summary => {
            let dashboard = analytics::dashboard(&txs);
            if let Err(err) = dashboard.metrics.require_savings_rate() {
                tracing::warn!(error = %err, "no income recorded");
            }
            println!("{}", format::balance_summary(&dashboard.metrics));
            println!();
            for bucket in &dashboard.monthly {
                println!(
                    "{:<10} revenue {:>14} expenses {:>14} net {:>14}",
                    bucket.month,
                    format::money(bucket.revenue),
                    format::money(bucket.expenses),
                    format::money(bucket.net())
                );
            }
        }
        Command::Recommend => {
            let ranker = SectorRanker::new(client.as_ref(), deadline, &settings.news_query);
            let outcome = ranker.recommend(metrics.balance).await;
            if outcome.used_fallback {
                tracing::info!("live sector data unavailable; showing standard picks");
            }
            println!("{}", format::investment_report(metrics.balance, &outcome));
        }
        Command::Predict { symbol } => {
            let projector = Projector::new(client, deadline);
            let p = projector
                .predict(&symbol)
                .await
                .with_context(|| format!("prediction for {symbol} failed"))?;
            println!("{} Stock Analysis", p.symbol);
            println!("Current Price: ${:.2}", p.current_price);
            println!("Predicted Price: ${:.2}", p.predicted_price);
            println!("Confidence: {:.2}%", p.confidence_percent);
            for point in &p.historical_series {
                println!("  {}  {:.2}", point.date, point.close);
            }
        }
        Command::Ask { message } => {
            let router = DialogueRouter::new(client, deadline, &settings.news_query);
            let mut log = ConversationLog::new();
            let reply = router.handle_message(&mut log, &message, &metrics).await;
            println!("{}", reply.text);
        }
        Command::Movers { watch } => {
            let board = Arc::new(MoversBoard::new(client, deadline));
            if !watch {
                board.refresh().await;
                print_movers(&board).await;
                return Ok(());
            }

            let interval = settings.movers_refresh_interval();
            let mut ticker = tokio::time::interval(interval);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let outcome = board.refresh().await;
                        tracing::info!(?outcome, "movers refresh");
                        print_movers(&board).await;
                    }
                    _ = tokio::signal::ctrl_c() => break,
                }
            }
        }
    }

    Ok(())
}

async fn print_movers(board: &MoversBoard) {
    let movers = board.current().await;
    for (label, list) in [("Top Gainers", &movers.gainers), ("Top Losers", &movers.losers)] {
        println!("{label}:");
        for m in list {
            println!(
                "  {:<6} {:<28} ${:>9.2} {:>+8.2} ({:+.2}%)",
                m.ticker, m.company_name, m.price, m.change_amount, m.change_percent
            );
        }
    }
}

fn init_sentry(settings: &Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
