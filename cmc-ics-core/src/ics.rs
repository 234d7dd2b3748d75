use chrono::{DateTime, Utc};

use crate::{CalendarEntry, IcsOptions};

/// ICS calendar generator
pub struct IcsGenerator {
    options: IcsOptions,
}

impl IcsGenerator {
    pub fn new(options: IcsOptions) -> Self {
        Self { options }
    }

    /// Generate the calendar document for a set of entries.
    pub fn generate(&self, entries: &[CalendarEntry]) -> String {
        self.generate_at(entries, Utc::now())
    }

    /// Generate with an explicit timestamp for the created/modified stamps.
    ///
    /// Output is deterministic for a fixed `now`: the same entries and the
    /// same timestamp produce identical documents.
    pub fn generate_at(&self, entries: &[CalendarEntry], now: DateTime<Utc>) -> String {
        let mut ics_content = String::new();

        ics_content.push_str("BEGIN:VCALENDAR\r\n");
        ics_content.push_str("VERSION:2.0\r\n");
        ics_content.push_str("PRODID:-//CMC ICS//CMC Trip Calendar//EN\r\n");
        ics_content.push_str("CALSCALE:GREGORIAN\r\n");
        ics_content.push_str("METHOD:REQUEST\r\n");

        if let Some(ref name) = self.options.calendar_name {
            ics_content.push_str(&format!("X-WR-CALNAME:{}\r\n", self.escape_text(name)));
        }

        if let Some(ref timezone) = self.options.timezone {
            ics_content.push_str(&format!("X-WR-TIMEZONE:{timezone}\r\n"));
        }

        for entry in entries {
            self.add_entry_event(&mut ics_content, entry, now);
        }

        ics_content.push_str("END:VCALENDAR\r\n");

        ics_content
    }

    /// Append one all-day event spanning exactly the entry's date.
    fn add_entry_event(&self, ics_content: &mut String, entry: &CalendarEntry, now: DateTime<Utc>) {
        let stamp = now.format("%Y%m%dT%H%M%SZ").to_string();
        let day = entry.date.format("%Y%m%d").to_string();

        ics_content.push_str("BEGIN:VEVENT\r\n");
        ics_content.push_str(&format!("UID:{}\r\n", entry.event_id));
        ics_content.push_str(&format!("DTSTAMP:{stamp}\r\n"));
        ics_content.push_str(&format!("CREATED:{stamp}\r\n"));
        ics_content.push_str(&format!("LAST-MODIFIED:{stamp}\r\n"));
        ics_content.push_str(&format!("DTSTART;VALUE=DATE:{day}\r\n"));
        ics_content.push_str(&format!("DTEND;VALUE=DATE:{day}\r\n"));
        ics_content.push_str(&format!("SUMMARY:{}\r\n", self.escape_text(&entry.title)));
        ics_content.push_str(&format!(
            "DESCRIPTION:{}\r\n",
            self.escape_text(&self.build_description(entry))
        ));
        ics_content.push_str(&format!(
            "URL:{}{}\r\n",
            self.options.event_url_base, entry.event_id
        ));
        ics_content.push_str("END:VEVENT\r\n");
    }

    /// Two-line body combining the trip type and the open spot count.
    pub fn build_description(&self, entry: &CalendarEntry) -> String {
        format!(
            "Type: {}\nSpots remaining: {}",
            entry.trip_type, entry.remaining
        )
    }

    /// Escape ICS text content
    fn escape_text(&self, text: &str) -> String {
        text.replace('\\', "\\\\")
            .replace('\n', "\\n")
            .replace('\r', "\\r")
            .replace(',', "\\,")
            .replace(';', "\\;")
    }
}

impl Default for IcsGenerator {
    fn default() -> Self {
        Self::new(IcsOptions::default())
    }
}

#[cfg(test)]
mod tests;
