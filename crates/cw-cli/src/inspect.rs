use std::path::Path;

use cw_core::badge::{Badge, BadgeSummary};
use cw_core::background::BadgeAggregator;
use cw_core::popup::{load, PopupModel};
use cw_core::store::load_lists;
use cw_core::view::{
    detail_fields, domain_label, expiry_label, meta_line, truncate, VALUE_PREVIEW_CHARS,
};

use crate::fixture::{read_cookies, FileStore, FixturePlatform, FIXTURE_TAB};

pub struct InspectOptions {
    pub store: String,
    pub cookies: String,
    pub url: String,
    pub search: Option<String>,
    pub details: bool,
}

pub fn format_timestamp(secs: f64) -> String {
    chrono::DateTime::from_timestamp(secs as i64, 0)
        .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| format!("{}", secs))
}

fn platform(store: &str, cookies: &str, url: &str) -> Result<FixturePlatform, String> {
    let cookies = read_cookies(Path::new(cookies))?;
    Ok(FixturePlatform::new(
        FileStore::new(store),
        Some(url.to_string()),
        cookies,
    ))
}

fn runtime() -> Result<tokio::runtime::Runtime, String> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("Failed to start tokio runtime: {}", e))
}

/// Run the popup flow once and print what the popup would show.
pub fn run_inspect(opts: InspectOptions) -> Result<(), String> {
    let platform = platform(&opts.store, &opts.cookies, &opts.url)?;

    let mut model = PopupModel::new();
    model.finish_load(runtime()?.block_on(load(&platform)));
    if let Some(query) = &opts.search {
        model.set_query(query);
    }

    let stats = model.stats();
    println!("Site: {}", model.site_label());
    println!(
        "  Total: {}  First-party: {}  Third-party: {}  Blacklisted: {}  Greylisted: {}",
        stats.total, stats.first_party, stats.third_party, stats.blacklisted, stats.greylisted
    );
    println!();

    if let Some(message) = model.error() {
        return Err(message.to_string());
    }
    if let Some(empty) = model.empty_state() {
        println!("{}", empty.message());
        println!("{}", empty.hint());
        return Ok(());
    }

    for entry in model.visible() {
        let cookie = &entry.cookie;
        let marker = match (entry.class.greylisted, entry.class.blacklisted) {
            (true, true) => "G+B",
            (true, false) => "G",
            (false, true) => "B",
            (false, false) => "",
        };
        let party = if entry.third_party { "3P" } else { "1P" };
        println!("[{:>3}] {} {}", marker, party, cookie.name);
        println!(
            "        {}  Expires: {}",
            domain_label(cookie),
            expiry_label(cookie, format_timestamp)
        );
        println!("        {}", meta_line(cookie));
        println!("        {}", truncate(&cookie.value, VALUE_PREVIEW_CHARS));
        if opts.details {
            for (label, value) in detail_fields(cookie, format_timestamp) {
                println!("          {:<9} {}", label, value);
            }
        }
    }

    Ok(())
}

/// Run the badge aggregator for the fixture tab and print the result.
pub fn run_badge(store: &str, cookies: &str, url: &str) -> Result<(), String> {
    let platform = platform(store, cookies, url)?;
    let aggregator = BadgeAggregator::new(platform);

    let rt = runtime()?;
    let badge = rt.block_on(aggregator.update_badge_for_tab(FIXTURE_TAB));
    print_badge(&badge);

    // Counts behind the badge, for scripting
    let platform = aggregator.platform();
    let summary = rt.block_on(async {
        let lists = load_lists(platform).await.map_err(|e| e.to_string())?;
        let cookies = cw_core::CookieSource::cookies_for_url(platform, url)
            .await
            .map_err(|e| e.to_string())?;
        Ok::<_, String>(BadgeSummary::compute(&cookies, &lists))
    });
    if let Ok(summary) = summary {
        println!(
            "  Blacklisted: {}  Greylisted: {}  Distinct: {}",
            summary.blacklisted, summary.greylisted, summary.distinct
        );
    }
    Ok(())
}

pub fn print_badge(badge: &Badge) {
    if badge.is_cleared() {
        println!("Badge: (cleared)");
    } else {
        println!("Badge: {} ({})", badge.text, badge.color.unwrap_or("-"));
    }
}
