use std::{fs, time::Duration};

use anyhow::Result;
use cmc_ics_core::{
    CalendarEntry, IcsOptions, config::ScrapeConfig, ics::IcsGenerator, scrape::CalendarScraper,
};

/// Floor for the user-supplied request delay. The target site rate limits
/// aggressively; a near-zero delay gets the scraper blocked.
const MIN_DELAY_MS: u64 = 500;

fn scrape_config(delay_ms: Option<u64>) -> ScrapeConfig {
    let mut config = ScrapeConfig::default();
    if let Some(ms) = delay_ms {
        config.mean_request_delay = Duration::from_millis(ms.max(MIN_DELAY_MS));
    }
    config
}

/// Dump command parameters
pub struct DumpParams {
    pub output: String,
    pub calendar_name: Option<String>,
    pub delay_ms: Option<u64>,
}

/// Scrape the calendar and write the ICS feed to a file.
pub async fn dump_command(params: DumpParams) -> Result<()> {
    tracing::info!(output = %params.output, "starting calendar scrape");
    let scraper = CalendarScraper::with_config(scrape_config(params.delay_ms));

    println!("Scraping the calendar (requests are rate limited; this takes a while)...");
    let entries = scraper.scrape().await?;
    println!("✓ Parsed {} entries", entries.len());

    let mut options = IcsOptions::default();
    if let Some(name) = params.calendar_name {
        options.calendar_name = Some(name);
    }

    let generator = IcsGenerator::new(options);
    let ics_content = generator.generate(&entries);

    fs::write(&params.output, ics_content)?;
    println!("✓ ICS file saved to: {}", params.output);

    Ok(())
}

/// Scrape the calendar and print the entries to stdout.
pub async fn list_command(json: bool, upcoming: bool, delay_ms: Option<u64>) -> Result<()> {
    let config = scrape_config(delay_ms);
    let timezone = config.timezone;
    let scraper = CalendarScraper::with_config(config);

    let mut entries = scraper.scrape().await?;

    if upcoming {
        let today = chrono::Utc::now().with_timezone(&timezone).date_naive();
        tracing::debug!(%today, "filtering to upcoming entries");
        entries.retain(|entry| entry.date >= today);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else {
        println!("Total parsed entries: {}", entries.len());
        for entry in &entries {
            print_entry(entry);
        }
    }

    Ok(())
}

fn print_entry(entry: &CalendarEntry) {
    let trip_type = if entry.trip_type.is_empty() {
        "-"
    } else {
        &entry.trip_type
    };
    println!(
        "{}  {:<12} {:>3} open  [{}] {}",
        entry.date, trip_type, entry.remaining, entry.event_id, entry.title
    );
}
