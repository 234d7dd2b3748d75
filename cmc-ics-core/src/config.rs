use std::time::Duration;

use chrono_tz::Tz;

/// Scraper configuration, with defaults matching the live CMC site.
///
/// Everything that depends on the target's markup or server-side control
/// tree lives here, so a site change means a config change rather than an
/// edit spread through the scraping logic.
#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    /// Calendar page URL, used for both the initial GET and the postback
    pub calendar_url: String,
    /// Href prefix stripped from row links to obtain the canonical event id
    pub event_base: String,
    /// CSS selector for the event list table
    pub event_table_selector: String,
    /// Name of the server-side list-view button control. The postback must
    /// carry this control's `.x`/`.y` coordinate fields.
    pub list_button_field: String,
    /// Values sent for the `.x`/`.y` coordinate fields. Required for the
    /// page to render the list view; their semantics are undocumented
    /// upstream, so they are sent verbatim and never interpreted.
    pub list_button_coords: (String, String),
    /// Substring identifying the trip-type label span on detail pages
    /// (case-sensitive)
    pub type_label_marker: String,
    /// Timezone the site's dates are expressed in
    pub timezone: Tz,
    /// Mean of the randomized delay applied before each automated request.
    /// The target has little tolerance for scraping; keep this generous.
    pub mean_request_delay: Duration,
    /// HTTP client timeout
    pub request_timeout: Duration,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            calendar_url: "https://www.cmc.org/calendar".to_string(),
            event_base: "EventDetails.aspx?ID=".to_string(),
            event_table_selector: "#dnn_ctr907_EventList_gridList".to_string(),
            list_button_field: "dnn$ctr907$EventList$btnListView".to_string(),
            list_button_coords: ("0".to_string(), "100".to_string()),
            type_label_marker: "lblType".to_string(),
            timezone: chrono_tz::America::Denver,
            mean_request_delay: Duration::from_secs(3),
            request_timeout: Duration::from_secs(30),
        }
    }
}
