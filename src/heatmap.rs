//! Day-of-week by hour-of-day bucketing of submission times.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Timelike, Utc};
use log::{debug, warn};
use serde::Serialize;

pub const DAYS: usize = 7;
pub const HOURS: usize = 24;

/// Number of discrete shades used when rendering a cell.
pub const INTENSITY_LEVELS: usize = 7;

const DAY_LABELS: [&str; DAYS] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PeakCell {
    pub day: usize,
    pub hour: usize,
}

impl PeakCell {
    pub fn day_label(&self) -> &'static str {
        day_label(self.day)
    }

    pub fn hour_label(&self) -> String {
        format_hour(self.hour)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeatmapGrid {
    /// Rows are days (0 = Sunday), columns are hours.
    pub cells: [[u32; HOURS]; DAYS],
    pub max: u32,
    /// Inputs that could not be parsed and were left out of the grid.
    pub skipped: usize,
}

impl Default for HeatmapGrid {
    fn default() -> Self {
        HeatmapGrid {
            cells: [[0; HOURS]; DAYS],
            max: 0,
            skipped: 0,
        }
    }
}

impl HeatmapGrid {
    /// Buckets ISO-8601 timestamps by their day and hour in `tz`.
    /// Strings that do not parse are counted in `skipped`.
    pub fn from_timestamps<I, S, Tz>(timestamps: I, tz: &Tz) -> HeatmapGrid
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
        Tz: TimeZone,
    {
        let mut grid = HeatmapGrid::default();
        for timestamp in timestamps {
            let timestamp = timestamp.as_ref();
            match parse_timestamp_in(timestamp, tz) {
                Some(local) => grid.record(&local),
                None => {
                    warn!("skipping unparseable timestamp {timestamp:?}");
                    grid.skipped += 1;
                }
            }
        }
        debug!(
            "bucketed {} timestamps, skipped {}",
            grid.total(),
            grid.skipped
        );
        grid
    }

    pub fn from_instants<I, Tz>(instants: I, tz: &Tz) -> HeatmapGrid
    where
        I: IntoIterator<Item = DateTime<Utc>>,
        Tz: TimeZone,
    {
        let mut grid = HeatmapGrid::default();
        for instant in instants {
            grid.record(&instant.with_timezone(tz));
        }
        grid
    }

    fn record<Tz: TimeZone>(&mut self, local: &DateTime<Tz>) {
        let day = local.weekday().num_days_from_sunday() as usize;
        let hour = local.hour() as usize;
        let cell = &mut self.cells[day][hour];
        *cell += 1;
        self.max = self.max.max(*cell);
    }

    pub fn get(&self, day: usize, hour: usize) -> u32 {
        self.cells[day][hour]
    }

    pub fn total(&self) -> u64 {
        self.cells
            .iter()
            .flat_map(|row| row.iter())
            .map(|&count| u64::from(count))
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.max == 0
    }

    /// First cell, scanning days then hours, that holds the maximum count.
    /// `None` when nothing was recorded.
    pub fn peak(&self) -> Option<PeakCell> {
        if self.max == 0 {
            return None;
        }
        (0..DAYS)
            .flat_map(|day| (0..HOURS).map(move |hour| PeakCell { day, hour }))
            .find(|cell| self.cells[cell.day][cell.hour] == self.max)
    }

    pub fn intensity(&self, day: usize, hour: usize) -> usize {
        intensity_level(self.cells[day][hour], self.max, INTENSITY_LEVELS)
    }
}

/// A parsed timestamp: either a fixed instant, or a wall-clock time with no
/// offset that still has to be placed in a time zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParsedTimestamp {
    Instant(DateTime<Utc>),
    Wall(NaiveDateTime),
}

const WALL_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

fn parse_wall(value: &str) -> Option<NaiveDateTime> {
    WALL_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
}

/// Reads the ISO-8601 shapes a browser accepts. Date-only values are UTC
/// midnight; date-times without an offset are wall-clock times.
pub fn parse_iso8601(value: &str) -> Option<ParsedTimestamp> {
    let value = value.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(ParsedTimestamp::Instant(parsed.with_timezone(&Utc)));
    }
    if let Ok(parsed) = DateTime::parse_from_str(value, "%Y-%m-%dT%H:%M%:z") {
        return Some(ParsedTimestamp::Instant(parsed.with_timezone(&Utc)));
    }
    if let Some(utc) = value.strip_suffix(|c: char| matches!(c, 'Z' | 'z')) {
        return parse_wall(utc).map(|naive| ParsedTimestamp::Instant(naive.and_utc()));
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        let midnight = date.and_time(NaiveTime::MIN).and_utc();
        return Some(ParsedTimestamp::Instant(midnight));
    }
    parse_wall(value).map(ParsedTimestamp::Wall)
}

/// Places a timestamp in `tz`. Wall-clock values are read as local to `tz`;
/// a time skipped by a DST jump yields `None`, an ambiguous one the earlier.
pub fn parse_timestamp_in<Tz: TimeZone>(value: &str, tz: &Tz) -> Option<DateTime<Tz>> {
    match parse_iso8601(value)? {
        ParsedTimestamp::Instant(instant) => Some(instant.with_timezone(tz)),
        ParsedTimestamp::Wall(naive) => tz.from_local_datetime(&naive).earliest(),
    }
}

/// [`parse_timestamp_in`] with UTC, for values stored as instants such as
/// the CSV `created_at` column.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    parse_timestamp_in(value, &Utc)
}

pub fn day_label(day: usize) -> &'static str {
    DAY_LABELS[day % DAYS]
}

/// 12-hour clock label without leading zero: 0 -> "12a", 13 -> "1p".
pub fn format_hour(hour: usize) -> String {
    match hour {
        0 => "12a".to_string(),
        1..=11 => format!("{hour}a"),
        12 => "12p".to_string(),
        _ => format!("{}p", hour - 12),
    }
}

/// Maps a count to one of `levels` shades; zero is always level 0 and the
/// grid maximum is always the top level.
pub fn intensity_level(count: u32, max: u32, levels: usize) -> usize {
    if count == 0 || max == 0 || levels < 2 {
        return 0;
    }
    let top = levels - 1;
    let ratio = f64::from(count) / f64::from(max);
    let level = (ratio * (levels - 2) as f64).floor() as usize + 1;
    level.min(top)
}
