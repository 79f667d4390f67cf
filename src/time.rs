// File: ./src/time.rs
//! Conversions between the reference (business) timezone and absolute instants.
//!
//! Schedules are authored in a fixed reference zone (US Eastern by default)
//! whatever the viewer's own zone is. The reference offset is never looked up
//! directly: it is derived by formatting the same instant in two zones and
//! diffing the resulting wall-clock fields.
use chrono::{
    DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, TimeZone, Utc,
};
use chrono_tz::Tz;

pub const REFERENCE_TIMEZONE: &str = "America/New_York";

/// Correction passes allowed when resolving wall-clock fields to an instant.
const MAX_PASSES: usize = 4;

/// Wall-clock fields in the reference zone.
///
/// When produced from an instant, the offset observed at that instant is kept
/// so the conversion back is exact even inside a repeated (fall-back) hour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WallClock {
    pub naive: NaiveDateTime,
    offset_secs: Option<i64>,
}

impl WallClock {
    /// Wall-clock fields typed by an operator; the offset is resolved on conversion.
    pub fn new(naive: NaiveDateTime) -> Self {
        Self {
            naive,
            offset_secs: None,
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.naive.date()
    }

    pub fn time(&self) -> NaiveTime {
        self.naive.time()
    }

    /// `HH:MM` as shown in time inputs.
    pub fn hhmm(&self) -> String {
        self.naive.format("%H:%M").to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeConverter {
    reference: Tz,
    viewer: Tz,
}

impl Default for TimeConverter {
    fn default() -> Self {
        Self::new(chrono_tz::America::New_York, chrono_tz::UTC)
    }
}

impl TimeConverter {
    pub fn new(reference: Tz, viewer: Tz) -> Self {
        Self { reference, viewer }
    }

    /// Builds a converter from IANA names, e.g. `America/New_York`.
    pub fn from_names(reference: &str, viewer: &str) -> Result<Self, String> {
        let reference: Tz = reference
            .parse()
            .map_err(|_| format!("Invalid timezone: {}", reference))?;
        let viewer: Tz = viewer
            .parse()
            .map_err(|_| format!("Invalid timezone: {}", viewer))?;
        Ok(Self::new(reference, viewer))
    }

    fn fields_in<Z: TimeZone>(instant: DateTime<Utc>, zone: &Z) -> NaiveDateTime {
        instant.with_timezone(zone).naive_local()
    }

    /// How far the reference zone's clock is ahead of the viewer's at `instant`.
    pub fn reference_minus_viewer(&self, instant: DateTime<Utc>) -> Duration {
        Self::fields_in(instant, &self.reference) - Self::fields_in(instant, &self.viewer)
    }

    pub fn to_wall_clock(&self, instant: DateTime<Utc>) -> WallClock {
        let naive = Self::fields_in(instant, &self.reference);
        let offset = naive - Self::fields_in(instant, &Utc);
        WallClock {
            naive,
            offset_secs: Some(offset.num_seconds()),
        }
    }

    /// Resolves reference wall-clock fields to an absolute instant.
    ///
    /// Starts from the fields read on the viewer's clock and shifts by the
    /// observed reference/viewer difference until the reference clock shows
    /// the requested fields. A repeated hour resolves to its first occurrence;
    /// a skipped hour resolves past the gap.
    pub fn to_instant(&self, wall: &WallClock) -> DateTime<Utc> {
        if let Some(secs) = wall.offset_secs {
            return (wall.naive - Duration::seconds(secs)).and_utc();
        }

        let mut instant = self
            .viewer
            .from_local_datetime(&wall.naive)
            .earliest()
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|| wall.naive.and_utc());
        let mut latest = instant;

        for pass in 0..MAX_PASSES {
            let drift = if pass == 0 {
                -self.reference_minus_viewer(instant)
            } else {
                wall.naive - Self::fields_in(instant, &self.reference)
            };
            if drift.is_zero() && Self::fields_in(instant, &self.reference) == wall.naive {
                return instant;
            }
            instant += drift;
            if Self::fields_in(instant, &self.reference) == wall.naive {
                return instant;
            }
            latest = latest.max(instant);
        }

        log::debug!(
            "No exact instant for {} in {}; using {}",
            wall.naive,
            self.reference,
            latest
        );
        latest
    }

    /// Combines a calendar day with an `HH:MM` string in the reference zone.
    pub fn compose(&self, date: NaiveDate, hhmm: &str) -> Result<WallClock, String> {
        let time = NaiveTime::parse_from_str(hhmm.trim(), "%H:%M")
            .map_err(|e| format!("Invalid time '{}': {}", hhmm, e))?;
        Ok(WallClock::new(NaiveDateTime::new(date, time)))
    }

    /// ISO-8601 with a zero UTC offset and whole seconds, e.g. `2024-03-10T14:00:00+00:00`.
    pub fn to_iso_utc(&self, wall: &WallClock) -> String {
        to_iso_utc(self.to_instant(wall))
    }

    /// `compose` followed by `to_iso_utc`.
    pub fn schedule_string(&self, date: NaiveDate, hhmm: &str) -> Result<String, String> {
        let wall = self.compose(date, hhmm)?;
        Ok(self.to_iso_utc(&wall))
    }
}

pub fn to_iso_utc(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Secs, false)
}

/// Parses a stored backend timestamp. Accepts RFC 3339 (including the
/// `-00:00` suffix the API emits) and offset-less values read as UTC.
pub fn parse_instant(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S"))
        .ok()
        .map(|naive| naive.and_utc())
}
