use crate::error::AssemblyError;
use crate::fragment::RawFragment;
use crate::schema::Timestamp;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime, Time};

const WEEKDAYS: &[&str] = &[
    "monday", "mon", "tuesday", "tue", "tues", "wednesday", "wed", "thursday", "thu", "thur",
    "thurs", "friday", "fri", "saturday", "sat", "sunday", "sun",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedFields {
    pub title: String,
    pub description: String,
    pub start: Timestamp,
    pub end: Option<Timestamp>,
    pub all_day: bool,
    pub time_notes: String,
    pub status_text: String,
}

pub fn normalize(fragment: &RawFragment) -> Result<NormalizedFields, AssemblyError> {
    let start = normalize_start(fragment)?;
    let end = normalize_end(fragment, start)?;
    Ok(NormalizedFields {
        title: clean_line(fragment.title.as_deref()),
        description: clean_block(fragment.description.as_deref()),
        start,
        end,
        all_day: fragment.all_day,
        time_notes: clean_block(fragment.time_notes.as_deref()),
        status_text: clean_line(fragment.status_text.as_deref()),
    })
}

pub fn clean_line(raw: Option<&str>) -> String {
    raw.map(|s| s.split_whitespace().collect::<Vec<_>>().join(" "))
        .unwrap_or_default()
}

pub fn clean_block(raw: Option<&str>) -> String {
    let Some(raw) = raw else {
        return String::new();
    };
    let mut lines: Vec<String> = Vec::new();
    for line in raw.lines() {
        let line = clean_line(Some(line));
        if line.is_empty() && lines.last().is_none_or(|prev| prev.is_empty()) {
            continue;
        }
        lines.push(line);
    }
    while lines.last().is_some_and(|line| line.is_empty()) {
        lines.pop();
    }
    lines.join("\n")
}

fn normalize_start(fragment: &RawFragment) -> Result<Timestamp, AssemblyError> {
    let raw = match non_blank(fragment.start.as_deref()) {
        Some(start) => start.to_string(),
        None => {
            let date = non_blank(fragment.date.as_deref()).unwrap_or_default();
            let time = non_blank(fragment.time.as_deref()).unwrap_or_default();
            format!("{date} {time}").trim().to_string()
        }
    };
    parse_timestamp(&raw, fragment.all_day).ok_or(AssemblyError::MalformedDate {
        field: "start",
        raw,
    })
}

fn normalize_end(fragment: &RawFragment, start: Timestamp) -> Result<Option<Timestamp>, AssemblyError> {
    if let Some(raw) = non_blank(fragment.end.as_deref()) {
        return parse_timestamp(raw, fragment.all_day)
            .map(Some)
            .ok_or_else(|| AssemblyError::MalformedDate {
                field: "end",
                raw: raw.to_string(),
            });
    }
    if let Some(raw) = non_blank(fragment.end_time.as_deref()) {
        return parse_time_of_day(raw)
            .and_then(|time| Timestamp::new(PrimitiveDateTime::new(start.get().date(), time)))
            .map(Some)
            .ok_or_else(|| AssemblyError::MalformedDate {
                field: "end",
                raw: raw.to_string(),
            });
    }
    Ok(None)
}

fn non_blank(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|s| !s.is_empty())
}

/// Parses scraped date/time text into a canonical timestamp.
///
/// Date-only text is accepted as midnight when `all_day` is set.
pub fn parse_timestamp(raw: &str, all_day: bool) -> Option<Timestamp> {
    let parsed = parse_datetime(raw).or_else(|| {
        if all_day {
            parse_date(raw).map(|date| PrimitiveDateTime::new(date, Time::MIDNIGHT))
        } else {
            None
        }
    })?;
    Timestamp::new(parsed)
}

fn parse_datetime(raw: &str) -> Option<PrimitiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    // ISO forms carry a literal `T` and must be tried before lowercasing.
    let iso = [
        format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
        format_description!("[year]-[month]-[day]T[hour]:[minute]"),
    ];
    if let Some(dt) = iso.into_iter().find_map(|f| PrimitiveDateTime::parse(raw, f).ok()) {
        return Some(dt);
    }
    if let Ok(dt) = PrimitiveDateTime::parse(
        raw,
        format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond]"),
    ) {
        return dt.replace_nanosecond(0).ok();
    }
    if let Ok(odt) = OffsetDateTime::parse(raw, &Rfc3339) {
        // Keep the wall clock the portal published; drop the offset.
        return PrimitiveDateTime::new(odt.date(), odt.time())
            .replace_nanosecond(0)
            .ok();
    }

    let text = clean_datetime_text(raw);
    let formats = [
        format_description!(
            "[month repr:long case_sensitive:false] [day padding:none] [year] [hour repr:12 padding:none]:[minute] [period case_sensitive:false]"
        ),
        format_description!(
            "[month repr:short case_sensitive:false] [day padding:none] [year] [hour repr:12 padding:none]:[minute] [period case_sensitive:false]"
        ),
        format_description!(
            "[month repr:long case_sensitive:false] [day padding:none] [year] [hour padding:none]:[minute]"
        ),
        format_description!(
            "[month repr:short case_sensitive:false] [day padding:none] [year] [hour padding:none]:[minute]"
        ),
        format_description!(
            "[month padding:none]/[day padding:none]/[year] [hour repr:12 padding:none]:[minute] [period case_sensitive:false]"
        ),
        format_description!("[month padding:none]/[day padding:none]/[year] [hour padding:none]:[minute]:[second]"),
        format_description!("[month padding:none]/[day padding:none]/[year] [hour padding:none]:[minute]"),
        format_description!(
            "[year]-[month]-[day] [hour repr:12 padding:none]:[minute] [period case_sensitive:false]"
        ),
        format_description!("[year]-[month]-[day] [hour padding:none]:[minute]:[second]"),
        format_description!("[year]-[month]-[day] [hour padding:none]:[minute]"),
    ];
    formats
        .into_iter()
        .find_map(|f| PrimitiveDateTime::parse(&text, f).ok())
}

fn parse_date(raw: &str) -> Option<Date> {
    let text = clean_datetime_text(raw);
    let formats = [
        format_description!("[year]-[month]-[day]"),
        format_description!("[month repr:long case_sensitive:false] [day padding:none] [year]"),
        format_description!("[month repr:short case_sensitive:false] [day padding:none] [year]"),
        format_description!("[month padding:none]/[day padding:none]/[year]"),
    ];
    formats.into_iter().find_map(|f| Date::parse(&text, f).ok())
}

fn parse_time_of_day(raw: &str) -> Option<Time> {
    let text = clean_datetime_text(raw);
    let formats = [
        format_description!("[hour repr:12 padding:none]:[minute] [period case_sensitive:false]"),
        format_description!("[hour padding:none]:[minute]:[second]"),
        format_description!("[hour padding:none]:[minute]"),
    ];
    formats.into_iter().find_map(|f| Time::parse(&text, f).ok())
}

/// `"Monday, Dec. 8, 2025 at 5:30p.m."` becomes `"dec 8 2025 5:30 pm"`.
fn clean_datetime_text(raw: &str) -> String {
    let lowered = raw
        .to_lowercase()
        .replace(',', " ")
        .replace("a. m.", "am")
        .replace("p. m.", "pm")
        .replace("a.m.", "am")
        .replace("p.m.", "pm")
        .replace("noon", "12:00 pm");

    let mut tokens: Vec<String> = Vec::new();
    for token in lowered.split_whitespace() {
        if matches!(token, "at" | "@" | "-" | "–" | "—") {
            continue;
        }
        // "5:30pm" -> "5:30" "pm"
        let split = ["am", "pm"].into_iter().find_map(|suffix| {
            token
                .strip_suffix(suffix)
                .filter(|head| head.ends_with(|c: char| c.is_ascii_digit()))
                .map(|head| (head, suffix))
        });
        match split {
            Some((head, suffix)) => {
                tokens.push(head.to_string());
                tokens.push(suffix.to_string());
            }
            None => {
                let token = if token.chars().all(|c| c.is_alphabetic() || c == '.') {
                    token.trim_end_matches('.')
                } else {
                    token
                };
                tokens.push(if token == "sept" { "sep".to_string() } else { token.to_string() });
            }
        }
    }

    if tokens.first().is_some_and(|t| WEEKDAYS.contains(&t.as_str())) {
        tokens.remove(0);
    }

    // "5 pm" -> "5:00 pm"
    for i in 1..tokens.len() {
        if matches!(tokens[i].as_str(), "am" | "pm")
            && !tokens[i - 1].is_empty()
            && tokens[i - 1].len() <= 2
            && tokens[i - 1].chars().all(|c| c.is_ascii_digit())
        {
            tokens[i - 1].push_str(":00");
        }
    }

    tokens.join(" ")
}
