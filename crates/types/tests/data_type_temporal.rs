//! Datetime and interval behavior through the public surface.

use silica_value::IntervalValue;
use silica_types::{
    Error, IntervalField, LocalSession, OperatorKind, SqlType, Value, scan_value,
};

fn timestamp(scale: u32) -> SqlType {
    SqlType::Timestamp {
        scale,
        with_zone: false,
    }
}

fn day_to_second() -> SqlType {
    SqlType::IntervalDayTime {
        start: IntervalField::Day,
        end: IntervalField::Second,
        leading: 4,
        fraction: 6,
    }
}

fn year_to_month() -> SqlType {
    SqlType::IntervalYearMonth {
        start: IntervalField::Year,
        end: IntervalField::Month,
        leading: 4,
    }
}

#[test]
fn test_end_of_month_clamp() {
    let session = LocalSession::new();
    let jan31 = scan_value(&session, "2023-01-31", &SqlType::Date).unwrap();
    let result_ty = SqlType::Date.get_combined_type(&year_to_month(), OperatorKind::Add).unwrap();
    assert_eq!(result_ty, SqlType::Date);

    let feb = result_ty
        .add(&session, &jan31, &Value::Interval(IntervalValue::Months(1)))
        .unwrap();
    assert_eq!(
        result_ty.convert_to_string(&session, &feb).unwrap(),
        "2023-02-28"
    );

    // A leap February keeps the 29th.
    let jan31_leap = scan_value(&session, "2024-01-31", &SqlType::Date).unwrap();
    let feb_leap = result_ty
        .add(
            &session,
            &jan31_leap,
            &Value::Interval(IntervalValue::Months(1)),
        )
        .unwrap();
    assert_eq!(
        result_ty.convert_to_string(&session, &feb_leap).unwrap(),
        "2024-02-29"
    );
}

#[test]
fn test_timestamp_subtraction_yields_interval() {
    let session = LocalSession::new();
    let later = scan_value(&session, "2023-05-02 01:00:00", &timestamp(0)).unwrap();
    let earlier = scan_value(&session, "2023-05-01 00:00:00", &timestamp(0)).unwrap();
    let diff = day_to_second().subtract(&session, &later, &earlier).unwrap();
    assert_eq!(
        diff,
        Value::Interval(IntervalValue::Seconds {
            seconds: 86_400 + 3_600,
            nanos: 0
        })
    );

    let months = year_to_month()
        .subtract(
            &session,
            &scan_value(&session, "2024-03-15 00:00:00", &timestamp(0)).unwrap(),
            &scan_value(&session, "2023-01-20 00:00:00", &timestamp(0)).unwrap(),
        )
        .unwrap();
    assert_eq!(months, Value::Interval(IntervalValue::Months(14)));
}

#[test]
fn test_interval_literal_range_enforced() {
    let session = LocalSession::new();
    let narrow = SqlType::IntervalYearMonth {
        start: IntervalField::Year,
        end: IntervalField::Month,
        leading: 2,
    };
    assert!(scan_value(&session, "INTERVAL '99-11' YEAR TO MONTH", &narrow).is_ok());
    let err = scan_value(&session, "INTERVAL '100-0' YEAR TO MONTH", &narrow).unwrap_err();
    assert!(matches!(err, Error::IntervalOutOfRange { .. }));
}

#[test]
fn test_interval_scaling() {
    let session = LocalSession::new();
    let ty = day_to_second();
    let ninety_minutes = Value::Interval(IntervalValue::Seconds {
        seconds: 90 * 60,
        nanos: 0,
    });
    let tripled = ty
        .multiply(&session, &ninety_minutes, &Value::Integer(3))
        .unwrap();
    assert_eq!(
        tripled,
        Value::Interval(IntervalValue::Seconds {
            seconds: 270 * 60,
            nanos: 0
        })
    );

    assert_eq!(
        ty.divide(&session, &ninety_minutes, &Value::Integer(0)),
        Err(Error::DivisionByZero)
    );
}

#[test]
fn test_zoned_timestamp_normalizes_to_instant() {
    let session = LocalSession::new().with_zone_offset(-8 * 3600);
    let zoned = SqlType::Timestamp {
        scale: 0,
        with_zone: true,
    };
    // Same instant written from two zones.
    let a = scan_value(&session, "2023-06-01 12:00:00+02:00", &zoned).unwrap();
    let b = scan_value(&session, "2023-06-01 10:00:00+00:00", &zoned).unwrap();
    assert_eq!(zoned.compare(&session, &a, &b).unwrap(), std::cmp::Ordering::Equal);

    // Stripping the zone renders in the session zone.
    let local = timestamp(0).convert_to_type(&session, &a, &zoned).unwrap();
    assert_eq!(
        timestamp(0).convert_to_string(&session, &local).unwrap(),
        "2023-06-01 02:00:00"
    );
}

#[test]
fn test_time_wraps_and_keeps_scale() {
    let session = LocalSession::new();
    let time_ty = SqlType::Time {
        scale: 2,
        with_zone: false,
    };
    let late = scan_value(&session, "23:59:59.995", &time_ty).unwrap();
    // Scale 2 truncates the half-written millisecond.
    assert_eq!(
        time_ty.convert_to_string(&session, &late).unwrap(),
        "23:59:59.99"
    );

    let wrapped = time_ty
        .add(
            &session,
            &late,
            &Value::Interval(IntervalValue::Seconds {
                seconds: 2,
                nanos: 0,
            }),
        )
        .unwrap();
    assert_eq!(
        time_ty.convert_to_string(&session, &wrapped).unwrap(),
        "00:00:01.99"
    );
}
