//! Alpha Vantage and NewsAPI payload shapes and their decoding into domain types.

use crate::domain::market::{
    Mover, NewsArticle, PricePoint, Quote, SectorPerformanceTable, TopMovers,
};
use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

pub const SECTOR_RANK_KEY: &str = "Rank A: Real-Time Performance";
const QUOTE_KEY: &str = "Global Quote";
const DAILY_SERIES_KEY: &str = "Time Series (Daily)";

#[derive(Debug, Deserialize)]
struct RawQuote {
    #[serde(rename = "05. price")]
    price: String,
    #[serde(rename = "06. volume")]
    volume: String,
    #[serde(rename = "10. change percent")]
    change_percent: String,
}

#[derive(Debug, Deserialize)]
struct RawDailyBar {
    #[serde(rename = "4. close")]
    close: String,
}

#[derive(Debug, Deserialize)]
struct RawMovers {
    #[serde(default)]
    top_gainers: Vec<RawMover>,
    #[serde(default)]
    top_losers: Vec<RawMover>,
}

#[derive(Debug, Deserialize)]
struct RawMover {
    ticker: String,
    #[serde(default)]
    company_name: Option<String>,
    price: String,
    change_amount: String,
    change_percentage: String,
}

#[derive(Debug, Deserialize)]
struct RawNewsResponse {
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    articles: Vec<RawArticle>,
}

#[derive(Debug, Deserialize)]
struct RawArticle {
    title: Option<String>,
    url: Option<String>,
    source: RawArticleSource,
}

#[derive(Debug, Deserialize)]
struct RawArticleSource {
    name: Option<String>,
}

/// Parses `"1.25"`, `"-0.4%"` or `" +3 % "` into a number.
pub fn parse_decimal(text: &str) -> Option<f64> {
    let v = text.trim().trim_end_matches('%').trim().parse::<f64>().ok()?;
    v.is_finite().then_some(v)
}

/// Alpha Vantage reports throttling and bad keys inside a 200 response.
pub fn ensure_no_api_notice(raw: &Value) -> Result<()> {
    for key in ["Error Message", "Note", "Information"] {
        if let Some(msg) = raw.get(key).and_then(Value::as_str) {
            bail!("alpha vantage {key}: {msg}");
        }
    }
    Ok(())
}

pub fn decode_quote(raw: &Value) -> Result<Quote> {
    ensure_no_api_notice(raw)?;
    let quote = raw
        .get(QUOTE_KEY)
        .filter(|v| v.as_object().is_some_and(|o| !o.is_empty()))
        .context("response has no Global Quote")?;
    let quote: RawQuote =
        serde_json::from_value(quote.clone()).context("Global Quote has unexpected shape")?;

    Ok(Quote {
        price: parse_decimal(&quote.price)
            .with_context(|| format!("invalid price: {}", quote.price))?,
        change_percent: parse_decimal(&quote.change_percent)
            .with_context(|| format!("invalid change percent: {}", quote.change_percent))?,
        volume: quote
            .volume
            .trim()
            .parse::<u64>()
            .with_context(|| format!("invalid volume: {}", quote.volume))?,
    })
}

pub fn decode_sector_performance(raw: &Value) -> Result<SectorPerformanceTable> {
    ensure_no_api_notice(raw)?;
    let rank = raw
        .get(SECTOR_RANK_KEY)
        .and_then(Value::as_object)
        .with_context(|| format!("response has no {SECTOR_RANK_KEY}"))?;

    // Non-string values are kept as their JSON text; the ranker discards them.
    Ok(rank
        .iter()
        .map(|(k, v)| {
            let text = v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string());
            (k.clone(), text)
        })
        .collect())
}

/// Daily closes sorted most recent first.
pub fn decode_time_series(raw: &Value) -> Result<Vec<PricePoint>> {
    ensure_no_api_notice(raw)?;
    let series = raw
        .get(DAILY_SERIES_KEY)
        .context("response has no daily time series")?;
    let bars: BTreeMap<String, RawDailyBar> =
        serde_json::from_value(series.clone()).context("daily time series has unexpected shape")?;

    let mut out = Vec::with_capacity(bars.len());
    for (date, bar) in bars {
        let date = NaiveDate::parse_from_str(&date, "%Y-%m-%d")
            .with_context(|| format!("invalid series date: {date}"))?;
        let close = parse_decimal(&bar.close)
            .with_context(|| format!("invalid close on {date}: {}", bar.close))?;
        out.push(PricePoint { date, close });
    }
    out.sort_by(|a, b| b.date.cmp(&a.date));
    Ok(out)
}

pub fn decode_top_movers(raw: &Value) -> Result<TopMovers> {
    ensure_no_api_notice(raw)?;
    let movers: RawMovers =
        serde_json::from_value(raw.clone()).context("top movers has unexpected shape")?;

    Ok(TopMovers {
        gainers: movers
            .top_gainers
            .into_iter()
            .map(decode_mover)
            .collect::<Result<_>>()?,
        losers: movers
            .top_losers
            .into_iter()
            .map(decode_mover)
            .collect::<Result<_>>()?,
    })
}

fn decode_mover(raw: RawMover) -> Result<Mover> {
    let parse = |field: &str, text: &str| {
        parse_decimal(text).with_context(|| format!("{}: invalid {field}: {text}", raw.ticker))
    };

    Ok(Mover {
        price: parse("price", &raw.price)?,
        change_amount: parse("change_amount", &raw.change_amount)?,
        change_percent: parse("change_percentage", &raw.change_percentage)?,
        company_name: raw.company_name.clone().unwrap_or_else(|| raw.ticker.clone()),
        ticker: raw.ticker,
    })
}

pub fn decode_news(raw: &Value) -> Result<Vec<NewsArticle>> {
    let resp: RawNewsResponse =
        serde_json::from_value(raw.clone()).context("news response has unexpected shape")?;
    if resp.status != "ok" {
        bail!(
            "news api status {}: {}",
            resp.status,
            resp.message.as_deref().unwrap_or("no message")
        );
    }

    // Removed articles come back with null titles.
    Ok(resp
        .articles
        .into_iter()
        .filter_map(|a| {
            Some(NewsArticle {
                title: a.title.filter(|t| !t.trim().is_empty())?,
                source_name: a.source.name.unwrap_or_default(),
                url: a.url.unwrap_or_default(),
            })
        })
        .collect())
}
