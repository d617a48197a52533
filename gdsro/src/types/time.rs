//! Date and time encodings.
//!
//! A date is a day number counted from 1858-11-17, computed with the
//! proleptic Gregorian century arithmetic. A time is the number of
//! 1/10000 seconds since midnight.
use time::{Date, Month, PrimitiveDateTime, Time};

use crate::row::DecodeError;

/// Day number zero, 1858-11-17.
pub const EPOCH: Date = match Date::from_julian_day(2_400_001) {
    Ok(ok) => ok,
    Err(_) => panic!("day number epoch out of range"),
};

/// Offset between the day number base and the encoded epoch.
const EPOCH_OFFSET: i32 = 1_721_119 - 2_400_001;

/// Time units per second.
const TICKS_PER_SECOND: u32 = 10_000;

const TICKS_PER_DAY: i32 = 86_400 * TICKS_PER_SECOND as i32;

/// Encode date as day number.
pub fn encode_date(date: Date) -> i32 {
    let mut year = date.year();
    let mut month = u8::from(date.month()) as i32;
    let day = date.day() as i32;

    if month > 2 {
        month -= 3;
    } else {
        month += 9;
        year -= 1;
    }

    let c = year / 100;
    let ya = year - 100 * c;

    (146_097 * c) / 4 + (1461 * ya) / 4 + (153 * month + 2) / 5 + day + EPOCH_OFFSET
}

/// Decode day number.
///
/// Computed in `i64`, a day number outside the supported calendar is an
/// [`InvalidDate`][DecodeError::InvalidDate].
pub fn decode_date(value: i32) -> Result<Date, DecodeError> {
    let invalid = || DecodeError::InvalidDate(value);
    let mut n = i64::from(value) - i64::from(EPOCH_OFFSET);

    let century = (4 * n - 1) / 146_097;
    n = 4 * n - 1 - 146_097 * century;
    let mut day = n / 4;

    n = (4 * day + 3) / 1461;
    day = 4 * day + 3 - 1461 * n;
    day = (day + 4) / 4;

    let mut month = (5 * day - 3) / 153;
    day = 5 * day - 3 - 153 * month;
    day = (day + 5) / 5;

    let mut year = 100 * century + n;

    if month < 10 {
        month += 3;
    } else {
        month -= 9;
        year += 1;
    }

    let month = u8::try_from(month)
        .ok()
        .and_then(|m| Month::try_from(m).ok())
        .ok_or_else(invalid)?;
    let day = u8::try_from(day).map_err(|_| invalid())?;
    let year = i32::try_from(year).map_err(|_| invalid())?;
    Date::from_calendar_date(year, month, day).map_err(|_| invalid())
}

/// Encode time as 1/10000 seconds since midnight.
pub fn encode_time(time: Time) -> i32 {
    let (h, m, s, nanos) = time.as_hms_nano();
    let seconds = h as i32 * 3600 + m as i32 * 60 + s as i32;
    seconds * TICKS_PER_SECOND as i32 + (nanos / 100_000) as i32
}

/// Decode 1/10000 seconds since midnight.
pub fn decode_time(value: i32) -> Result<Time, DecodeError> {
    if !(0..TICKS_PER_DAY).contains(&value) {
        return Err(DecodeError::InvalidTime(value));
    }
    let ticks = value as u32;
    let seconds = ticks / TICKS_PER_SECOND;
    let nanos = (ticks % TICKS_PER_SECOND) * 100_000;
    Time::from_hms_nano((seconds / 3600) as u8, (seconds / 60 % 60) as u8, (seconds % 60) as u8, nanos)
        .map_err(|_| DecodeError::InvalidTime(value))
}

pub fn encode_timestamp(value: PrimitiveDateTime) -> (i32, i32) {
    (encode_date(value.date()), encode_time(value.time()))
}

pub fn decode_timestamp(date: i32, time: i32) -> Result<PrimitiveDateTime, DecodeError> {
    Ok(PrimitiveDateTime::new(decode_date(date)?, decode_time(time)?))
}

#[cfg(test)]
mod test {
    use time::macros::{date, time};

    use super::*;

    #[test]
    fn known_days() {
        assert_eq!(encode_date(date!(1858 - 11 - 17)), 0);
        assert_eq!(encode_date(date!(2000 - 01 - 01)), 51544);
        assert_eq!(decode_date(51544).unwrap(), date!(2000 - 01 - 01));
        assert_eq!(decode_date(0).unwrap(), date!(1858 - 11 - 17));
        assert_eq!(EPOCH, date!(1858 - 11 - 17));
    }

    #[test]
    fn dates_round_trip() {
        for d in [
            date!(0001 - 01 - 01),
            date!(1900 - 02 - 28),
            date!(1900 - 03 - 01),
            date!(2000 - 02 - 29),
            date!(2024 - 12 - 31),
            date!(9999 - 12 - 31),
        ] {
            assert_eq!(decode_date(encode_date(d)).unwrap(), d, "{d}");
        }
    }

    #[test]
    fn time_in_ticks() {
        assert_eq!(encode_time(Time::MIDNIGHT), 0);
        assert_eq!(encode_time(time!(01:00:00.5)), 36_005_000);
        assert_eq!(decode_time(36_005_000).unwrap(), time!(01:00:00.5));
        assert_eq!(decode_time(TICKS_PER_DAY - 1).unwrap(), time!(23:59:59.9999));
        assert!(decode_time(TICKS_PER_DAY).is_err());
        assert!(decode_time(-1).is_err());
    }

    #[test]
    fn out_of_range_days_fail() {
        for value in [600_000_000, i32::MAX, i32::MIN, -700_000_000] {
            assert!(matches!(decode_date(value), Err(DecodeError::InvalidDate(v)) if v == value));
        }
        assert!(decode_timestamp(i32::MAX, 0).is_err());
    }
}
