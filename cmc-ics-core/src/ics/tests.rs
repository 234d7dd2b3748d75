use chrono::{NaiveDate, TimeZone, Utc};
use ical::parser::ical::component::IcalEvent;

use super::*;
use crate::CalendarEntry;

fn sample_entries() -> Vec<CalendarEntry> {
    vec![
        CalendarEntry {
            title: "Winter Hike".to_string(),
            event_id: "4821".to_string(),
            date: NaiveDate::from_ymd_opt(2026, 1, 2).unwrap(),
            remaining: 5,
            trip_type: "Hiking".to_string(),
        },
        CalendarEntry {
            title: "Spring Climb".to_string(),
            event_id: "4822".to_string(),
            date: NaiveDate::from_ymd_opt(2026, 4, 10).unwrap(),
            remaining: 12,
            trip_type: String::new(),
        },
    ]
}

fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 15, 12, 0, 0).unwrap()
}

fn event_prop<'a>(event: &'a IcalEvent, name: &str) -> Option<&'a str> {
    event
        .properties
        .iter()
        .find(|p| p.name == name)
        .and_then(|p| p.value.as_deref())
}

#[test]
fn calendar_envelope_and_headers() {
    let generator = IcsGenerator::default();
    let ics_content = generator.generate_at(&sample_entries(), fixed_now());

    assert!(ics_content.starts_with("BEGIN:VCALENDAR\r\n"));
    assert!(ics_content.ends_with("END:VCALENDAR\r\n"));
    assert!(ics_content.contains("VERSION:2.0\r\n"));
    assert!(ics_content.contains("METHOD:REQUEST\r\n"));
    assert!(ics_content.contains("X-WR-CALNAME:CMC Trip Calendar\r\n"));
    assert!(ics_content.contains("X-WR-TIMEZONE:America/Denver\r\n"));
}

#[test]
fn all_day_event_fields() {
    let generator = IcsGenerator::default();
    let ics_content = generator.generate_at(&sample_entries(), fixed_now());

    assert!(ics_content.contains("UID:4821\r\n"));
    assert!(ics_content.contains("DTSTAMP:20260115T120000Z\r\n"));
    assert!(ics_content.contains("CREATED:20260115T120000Z\r\n"));
    assert!(ics_content.contains("LAST-MODIFIED:20260115T120000Z\r\n"));
    assert!(ics_content.contains("DTSTART;VALUE=DATE:20260102\r\n"));
    assert!(ics_content.contains("DTEND;VALUE=DATE:20260102\r\n"));
    assert!(ics_content.contains("SUMMARY:Winter Hike\r\n"));
    assert!(ics_content.contains("DESCRIPTION:Type: Hiking\\nSpots remaining: 5\r\n"));
    assert!(ics_content.contains("URL:https://www.cmc.org/EventDetails.aspx?ID=4821\r\n"));
}

#[test]
fn same_timestamp_is_idempotent() {
    let generator = IcsGenerator::default();
    let entries = sample_entries();

    let first = generator.generate_at(&entries, fixed_now());
    let second = generator.generate_at(&entries, fixed_now());

    assert_eq!(first, second);
}

#[test]
fn summary_text_is_escaped() {
    let mut entries = sample_entries();
    entries[0].title = "Climb, Ski; Repeat".to_string();

    let generator = IcsGenerator::default();
    let ics_content = generator.generate_at(&entries, fixed_now());

    assert!(ics_content.contains("SUMMARY:Climb\\, Ski\\; Repeat\r\n"));
}

#[test]
fn round_trip_recovers_entry_fields() {
    let entries = sample_entries();
    let generator = IcsGenerator::default();
    let ics_content = generator.generate_at(&entries, fixed_now());

    let mut events: Vec<IcalEvent> = Vec::new();
    for calendar in ical::IcalParser::new(ics_content.as_bytes()) {
        events.extend(calendar.expect("generated calendar should parse").events);
    }
    assert_eq!(events.len(), entries.len());

    for entry in &entries {
        let event = events
            .iter()
            .find(|e| event_prop(e, "UID") == Some(entry.event_id.as_str()))
            .unwrap_or_else(|| panic!("no VEVENT with UID {}", entry.event_id));

        assert_eq!(event_prop(event, "SUMMARY"), Some(entry.title.as_str()));

        let dtstart = event_prop(event, "DTSTART").expect("DTSTART present");
        let date = NaiveDate::parse_from_str(dtstart, "%Y%m%d").expect("DTSTART is a date");
        assert_eq!(date, entry.date);

        let description = event_prop(event, "DESCRIPTION").expect("DESCRIPTION present");
        assert!(description.contains(&format!("Type: {}", entry.trip_type)));
        assert!(description.contains(&format!("Spots remaining: {}", entry.remaining)));
    }
}
