// Reference-zone conversions around daylight-saving transitions.
use chrono::{Duration, LocalResult, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::{America, Asia, Europe, UTC};
use cmsprobe::time::{TimeConverter, WallClock, to_iso_utc};

fn naive(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(h, min, 0)
        .unwrap()
}

#[test]
fn test_round_trip_through_spring_forward() {
    for viewer in [UTC, Europe::Paris, Asia::Tokyo, America::Los_Angeles] {
        let conv = TimeConverter::new(America::New_York, viewer);
        // Midnight EST on the day clocks jump from 02:00 to 03:00
        let start = Utc.with_ymd_and_hms(2024, 3, 10, 5, 0, 0).unwrap();
        for step in 0..24 {
            let instant = start + Duration::minutes(15 * step);
            let wall = conv.to_wall_clock(instant);
            assert_eq!(conv.to_instant(&wall), instant, "viewer {}", viewer);
        }
    }
}

#[test]
fn test_round_trip_through_fall_back() {
    let conv = TimeConverter::new(America::New_York, Europe::Paris);
    // 00:00 EDT on the day 01:00-02:00 repeats
    let start = Utc.with_ymd_and_hms(2024, 11, 3, 4, 0, 0).unwrap();
    for step in 0..16 {
        let instant = start + Duration::minutes(15 * step);
        let wall = conv.to_wall_clock(instant);
        assert_eq!(conv.to_instant(&wall), instant);
    }

    // Both passes through 01:30 show the same fields but stay distinct instants
    let first = Utc.with_ymd_and_hms(2024, 11, 3, 5, 30, 0).unwrap();
    let second = Utc.with_ymd_and_hms(2024, 11, 3, 6, 30, 0).unwrap();
    let (a, b) = (conv.to_wall_clock(first), conv.to_wall_clock(second));
    assert_eq!(a.naive, b.naive);
    assert_eq!(conv.to_instant(&a), first);
    assert_eq!(conv.to_instant(&b), second);
}

#[test]
fn test_typed_fields_resolve_back_across_both_transitions() {
    // Only the wall-clock fields are kept, so the offset has to be found again
    let days = [
        Utc.with_ymd_and_hms(2024, 3, 10, 0, 0, 0).unwrap(),
        Utc.with_ymd_and_hms(2024, 11, 3, 0, 0, 0).unwrap(),
    ];
    for viewer in [UTC, Europe::Paris, Asia::Tokyo, America::Los_Angeles] {
        let conv = TimeConverter::new(America::New_York, viewer);
        for start in days {
            for step in 0..(36 * 4) {
                let instant = start + Duration::minutes(15 * step);
                let naive = conv.to_wall_clock(instant).naive;
                if !matches!(
                    America::New_York.from_local_datetime(&naive),
                    LocalResult::Single(_)
                ) {
                    continue;
                }
                assert_eq!(
                    conv.to_instant(&WallClock::new(naive)),
                    instant,
                    "viewer {} fields {}",
                    viewer,
                    naive
                );
            }
        }
    }
}

#[test]
fn test_typed_fields_ignore_viewer_zone() {
    for viewer in [UTC, Europe::Paris, Asia::Tokyo, America::Los_Angeles] {
        let conv = TimeConverter::new(America::New_York, viewer);
        let wall = WallClock::new(naive(2024, 3, 10, 9, 0));
        assert_eq!(conv.to_iso_utc(&wall), "2024-03-10T13:00:00+00:00");
        let wall = WallClock::new(naive(2024, 1, 15, 23, 45));
        assert_eq!(conv.to_iso_utc(&wall), "2024-01-16T04:45:00+00:00");
    }
}

#[test]
fn test_repeated_hour_resolves_to_first_occurrence() {
    let conv = TimeConverter::new(America::New_York, UTC);
    let wall = WallClock::new(naive(2024, 11, 3, 1, 30));
    assert_eq!(conv.to_iso_utc(&wall), "2024-11-03T05:30:00+00:00");
}

#[test]
fn test_schedule_string_after_jump() {
    let conv = TimeConverter::default();
    let day = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
    assert_eq!(
        conv.schedule_string(day, "03:30").unwrap(),
        "2024-03-10T07:30:00+00:00"
    );
    assert_eq!(
        conv.schedule_string(day, "01:59").unwrap(),
        "2024-03-10T06:59:00+00:00"
    );
}

#[test]
fn test_iso_output_drops_fractional_seconds() {
    let instant = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 5).unwrap() + Duration::milliseconds(750);
    assert_eq!(to_iso_utc(instant), "2024-06-01T12:00:05+00:00");
}
