use crate::errors::{SimError, SimResult};
use crate::state::PricePoint;
use chrono::{DateTime, NaiveDate, Utc};
use std::path::Path;

/// One row of a daily price export. Only `Date` and `Close` are read;
/// other columns (Open, High, Volume, ...) are ignored.
#[derive(Debug, serde::Deserialize)]
struct CsvRow {
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Close", default, deserialize_with = "csv::invalid_option")]
    close: Option<f64>,
}

/// Load closes dated in [start, end) from a CSV file, sorted ascending.
pub fn load_closes(path: &Path, start: NaiveDate, end: NaiveDate) -> SimResult<Vec<PricePoint>> {
    let file = std::fs::File::open(path)
        .map_err(|e| SimError::Feed(format!("{}: {e}", path.display())))?;
    read_closes(file, start, end)
}

fn read_closes<R: std::io::Read>(
    reader: R,
    start: NaiveDate,
    end: NaiveDate,
) -> SimResult<Vec<PricePoint>> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut points = Vec::new();

    for row in rdr.deserialize::<CsvRow>() {
        let row = row?;
        let timestamp = parse_date(&row.date)?;
        let day = timestamp.date_naive();
        if day < start || day >= end {
            continue;
        }
        match row.close {
            Some(close) if close.is_finite() && close > 0.0 => {
                points.push(PricePoint { timestamp, close });
            }
            _ => tracing::warn!(date = %row.date, "skipping row without a positive close"),
        }
    }

    points.sort_by_key(|p| p.timestamp);
    Ok(points)
}

/// Accepts `YYYY-MM-DD` (midnight UTC) or RFC 3339.
fn parse_date(raw: &str) -> SimResult<DateTime<Utc>> {
    if let Ok(d) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(d.and_time(chrono::NaiveTime::MIN).and_utc());
    }
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| SimError::Parse(format!("date {raw:?}: {e}")))
}
