use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Metadata for one entry in the CMC event calendar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEntry {
    /// Display name of the trip
    pub title: String,
    /// Identifier extracted from the row link, with the detail-page URL
    /// prefix stripped
    pub event_id: String,
    /// Trip date. The site publishes civil dates in Mountain Time at day
    /// precision; there is no time-of-day component.
    pub date: NaiveDate,
    /// Open spots; 0 when the site shows a message ("Full") instead of a
    /// number
    pub remaining: u32,
    /// Trip classification joined on from the detail page; empty when the
    /// detail page carries no type label
    pub trip_type: String,
}

/// Hidden form-state tokens collected from the initial calendar page load.
///
/// ASP.NET requires these to be echoed back on the postback unmodified.
/// They are opaque byte strings; their contents are never parsed.
#[derive(Debug, Clone, Default)]
pub struct PostbackTokens {
    /// `__VIEWSTATE` value
    pub view_state: String,
    /// `__VIEWSTATEGENERATOR` value
    pub generator: String,
    /// `__EVENTVALIDATION` value
    pub event_validation: String,
}

impl PostbackTokens {
    /// True when every token came back empty.
    pub fn is_empty(&self) -> bool {
        self.view_state.is_empty() && self.generator.is_empty() && self.event_validation.is_empty()
    }
}

/// ICS generation options
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IcsOptions {
    /// Calendar name (X-WR-CALNAME)
    pub calendar_name: Option<String>,
    /// Timezone label (X-WR-TIMEZONE)
    pub timezone: Option<String>,
    /// Prefix prepended to the event id to form each event's URL
    pub event_url_base: String,
}

impl Default for IcsOptions {
    fn default() -> Self {
        Self {
            calendar_name: Some("CMC Trip Calendar".to_string()),
            timezone: Some("America/Denver".to_string()),
            event_url_base: "https://www.cmc.org/EventDetails.aspx?ID=".to_string(),
        }
    }
}
