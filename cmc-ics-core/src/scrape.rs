//! Two-phase scraper for the CMC event calendar.
//!
//! The calendar is a legacy ASP.NET page and is notoriously awkward to
//! scrape: the page must be visited once to collect hidden form-state
//! tokens, then posted back with those tokens before the server renders
//! the list view that actually carries the event table. Event rows link to
//! detail pages, which are fetched one hop deeper to recover the trip
//! type.

use std::{collections::HashMap, sync::LazyLock};

use chrono::NaiveDate;
use reqwest::{Url, multipart::Form};
use scraper::{ElementRef, Html, Selector};

use crate::{
    CalendarEntry, Error, PostbackTokens, Result, client::ScrapeClient, config::ScrapeConfig,
};

/// Hidden fields required by the ASP.NET postback mechanism.
const VIEWSTATE: &str = "__VIEWSTATE";
const VIEWSTATE_GENERATOR: &str = "__VIEWSTATEGENERATOR";
const EVENT_VALIDATION: &str = "__EVENTVALIDATION";
const VIEWSTATE_ENCRYPTED: &str = "__VIEWSTATEENCRYPTED";

/// Row dates render like `1/2/2026`.
const DATE_FORMAT: &str = "%m/%d/%Y";

static ROW_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("tbody tr").unwrap());
static LINK_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("td a").unwrap());
static DATE_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("td:nth-child(2)").unwrap());
static REMAINING_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("td:nth-child(3)").unwrap());
static TYPE_CELL_SPAN_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("tr td:nth-child(2) span").unwrap());

/// Scraper for the CMC event calendar.
pub struct CalendarScraper {
    client: ScrapeClient,
    config: ScrapeConfig,
}

impl CalendarScraper {
    pub fn new() -> Self {
        Self::with_config(ScrapeConfig::default())
    }

    pub fn with_config(config: ScrapeConfig) -> Self {
        Self {
            client: ScrapeClient::new(&config),
            config,
        }
    }

    /// First visit: collect the hidden form-state tokens.
    ///
    /// Inputs absent from the page come back as empty strings. An empty
    /// token is not an error here; a bad token surfaces later, when the
    /// postback fails to render the event table.
    pub async fn fetch_postback_tokens(&self) -> Result<PostbackTokens> {
        let body = self.client.get_text(&self.config.calendar_url).await?;
        let tokens = extract_postback_tokens(&body);
        if tokens.is_empty() {
            tracing::warn!("no form-state tokens found on the calendar page");
        }
        tracing::debug!(
            view_state_len = tokens.view_state.len(),
            generator_len = tokens.generator.len(),
            event_validation_len = tokens.event_validation.len(),
            "collected postback tokens"
        );
        Ok(tokens)
    }

    /// Retrieve calendar metadata from the CMC website.
    ///
    /// Runs the full sequence: token fetch, postback, row parsing, then one
    /// detail-page visit per row to recover trip types. Requests after the
    /// first are rate limited; a full scrape takes on the order of a
    /// minute. Any transport failure aborts and discards what was parsed.
    pub async fn scrape(&self) -> Result<Vec<CalendarEntry>> {
        let tokens = self.fetch_postback_tokens().await?;

        self.client.pace().await;
        let body = self
            .client
            .post_multipart_text(
                &self.config.calendar_url,
                build_postback_form(&tokens, &self.config),
            )
            .await?;

        let (mut entries, detail_links) = parse_event_table(&body, &self.config)?;
        tracing::info!(count = entries.len(), "parsed calendar entries");

        let base = Url::parse(&self.config.calendar_url)
            .map_err(|e| Error::Config(format!("invalid calendar URL: {e}")))?;

        let mut id_to_trip_type: HashMap<String, String> = HashMap::new();
        for link in detail_links {
            let url = base
                .join(&link)
                .map_err(|e| Error::Config(format!("invalid detail link {link:?}: {e}")))?;
            let Some(event_id) = id_from_query(&url) else {
                tracing::warn!(link = %link, "detail link has no ID parameter, skipping");
                continue;
            };

            self.client.pace().await;
            let page = self.client.get_text(url.as_str()).await?;
            match extract_trip_type(&page, &self.config) {
                Some(trip_type) => {
                    id_to_trip_type.insert(event_id, trip_type);
                }
                None => tracing::debug!(%event_id, "no trip type label on detail page"),
            }
        }

        join_trip_types(&mut entries, &id_to_trip_type);

        Ok(entries)
    }
}

impl Default for CalendarScraper {
    fn default() -> Self {
        Self::new()
    }
}

/// The postback field set, in the order it is sent.
///
/// All of the `__`-prefixed fields are required by ASP.NET, including the
/// empty encrypted one. The two coordinate fields belong to the list-view
/// image button; the page fails to render the list without them.
pub(crate) fn postback_fields(
    tokens: &PostbackTokens,
    config: &ScrapeConfig,
) -> Vec<(String, String)> {
    let (x, y) = &config.list_button_coords;
    vec![
        (VIEWSTATE.to_string(), tokens.view_state.clone()),
        (VIEWSTATE_GENERATOR.to_string(), tokens.generator.clone()),
        (EVENT_VALIDATION.to_string(), tokens.event_validation.clone()),
        (VIEWSTATE_ENCRYPTED.to_string(), String::new()),
        (format!("{}.x", config.list_button_field), x.clone()),
        (format!("{}.y", config.list_button_field), y.clone()),
    ]
}

fn build_postback_form(tokens: &PostbackTokens, config: &ScrapeConfig) -> Form {
    postback_fields(tokens, config)
        .into_iter()
        .fold(Form::new(), |form, (name, value)| form.text(name, value))
}

/// Pull the three hidden-input values out of the calendar page by element
/// id. Missing inputs yield empty strings.
pub(crate) fn extract_postback_tokens(body: &str) -> PostbackTokens {
    let html = Html::parse_document(body);
    PostbackTokens {
        view_state: hidden_input_value(&html, VIEWSTATE),
        generator: hidden_input_value(&html, VIEWSTATE_GENERATOR),
        event_validation: hidden_input_value(&html, EVENT_VALIDATION),
    }
}

fn hidden_input_value(html: &Html, id: &str) -> String {
    let Ok(selector) = Selector::parse(&format!("#{id}")) else {
        return String::new();
    };
    html.select(&selector)
        .next()
        .and_then(|input| input.attr("value"))
        .unwrap_or_default()
        .to_string()
}

/// Parse the postback response into entries plus the detail links to visit.
///
/// Rows with missing fields are logged and dropped; the batch continues.
/// A date that fails to parse aborts the whole scrape instead, since it
/// means the table no longer looks the way this scraper assumes.
pub(crate) fn parse_event_table(
    body: &str,
    config: &ScrapeConfig,
) -> Result<(Vec<CalendarEntry>, Vec<String>)> {
    let html = Html::parse_document(body);
    let table_selector = parse_selector(&config.event_table_selector)?;

    let mut entries = Vec::new();
    let mut detail_links = Vec::new();

    let Some(table) = html.select(&table_selector).next() else {
        tracing::warn!(
            selector = %config.event_table_selector,
            "event table not found in postback response"
        );
        return Ok((entries, detail_links));
    };

    for row in table.select(&ROW_SEL) {
        match entry_from_row(row, config) {
            Ok((entry, href)) => {
                entries.push(entry);
                detail_links.push(href);
            }
            Err(err @ Error::Date(_)) => return Err(err),
            Err(err) => {
                tracing::warn!(error = %err, row = %row.html(), "failed to parse calendar entry");
            }
        }
    }

    Ok((entries, detail_links))
}

/// Build one entry from a table row, also returning the raw detail href.
fn entry_from_row(row: ElementRef<'_>, config: &ScrapeConfig) -> Result<(CalendarEntry, String)> {
    let raw_title = child_text(row, &LINK_SEL);
    let raw_event_id = child_href(row, &LINK_SEL);
    let raw_date = child_text(row, &DATE_SEL);
    let raw_remaining = child_text(row, &REMAINING_SEL);

    if raw_title.is_empty()
        || raw_event_id.is_empty()
        || raw_date.is_empty()
        || raw_remaining.is_empty()
    {
        return Err(Error::MissingRowField(format!(
            "title: {raw_title:?}, event id: {raw_event_id:?}, date: {raw_date:?}, remaining: {raw_remaining:?}"
        )));
    }

    // A non-numeric value here is a message like "Full"; treat the trip as
    // having no open spots.
    let remaining = raw_remaining.parse::<u32>().unwrap_or(0);

    let date = NaiveDate::parse_from_str(&raw_date, DATE_FORMAT)?;

    let event_id = raw_event_id
        .strip_prefix(&config.event_base)
        .unwrap_or(&raw_event_id)
        .to_string();

    let entry = CalendarEntry {
        title: raw_title,
        event_id,
        date,
        remaining,
        trip_type: String::new(),
    };
    Ok((entry, raw_event_id))
}

/// Find the trip-type label on a detail page.
///
/// The label is a span in the second cell of a layout table row, with a
/// generated control id containing the configured marker (case-sensitive).
pub(crate) fn extract_trip_type(body: &str, config: &ScrapeConfig) -> Option<String> {
    let html = Html::parse_document(body);
    html.select(&TYPE_CELL_SPAN_SEL)
        .find(|span| {
            span.attr("id")
                .is_some_and(|id| id.contains(&config.type_label_marker))
        })
        .map(element_text)
}

/// Attach trip types onto entries by event id. Entries with no match keep
/// an empty trip type.
pub(crate) fn join_trip_types(
    entries: &mut [CalendarEntry],
    id_to_trip_type: &HashMap<String, String>,
) {
    for entry in entries.iter_mut() {
        if let Some(trip_type) = id_to_trip_type.get(&entry.event_id) {
            entry.trip_type = trip_type.clone();
        }
    }
}

/// Pull the event id out of a detail URL's query string.
fn id_from_query(url: &Url) -> Option<String> {
    url.query_pairs()
        .find(|(key, _)| key == "ID")
        .map(|(_, value)| value.into_owned())
}

fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector)
        .map_err(|e| Error::Config(format!("invalid selector {selector:?}: {e}")))
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

fn child_text(row: ElementRef<'_>, selector: &Selector) -> String {
    row.select(selector).next().map(element_text).unwrap_or_default()
}

fn child_href(row: ElementRef<'_>, selector: &Selector) -> String {
    row.select(selector)
        .next()
        .and_then(|el| el.attr("href"))
        .unwrap_or_default()
        .to_string()
}
