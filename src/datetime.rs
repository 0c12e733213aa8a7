//! Date/time codec for the PCF85263/PCF85363 RTC.
//!
//! This module converts between [`WallClockTime`] and the eight consecutive
//! date/time registers starting at [`RegAddr::Hundredths`](crate::RegAddr::Hundredths).
//!
//! # Register Model
//!
//! | byte | register   | encoding                                  |
//! |------|------------|-------------------------------------------|
//! | 0    | 100ths     | ignored on read, always written as zero   |
//! | 1    | seconds    | BCD, bit 7 is the oscillator stop flag    |
//! | 2    | minutes    | BCD, bit 7 is the event monitor flag      |
//! | 3    | hours      | BCD (24 hour)                             |
//! | 4    | days       | BCD (1-31)                                |
//! | 5    | weekdays   | binary, low three bits                    |
//! | 6    | months     | BCD, 1-based                              |
//! | 7    | years      | BCD (0-99), no century                    |
//!
//! Months are 1-based on both sides of the codec. The year is carried as an
//! offset from 2000; [`WallClockTime::to_datetime`] and
//! [`WallClockTime::from_datetime`] apply the century when bridging to chrono.
//!
//! # Error Handling
//!
//! Conversion errors are reported via [`DateTimeError`].

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};

use crate::registers::{Bcd, Minutes, Seconds, Weekdays, DATETIME_LEN};

/// Errors that can occur during date/time conversion or validation.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DateTimeError {
    /// A register held a BCD digit above 9
    CorruptRegisterData,
    /// The provided date/time is invalid (out of range or not a calendar date)
    InvalidDateTime,
    /// The year is outside 2000-2099, the range the year register covers
    YearOutOfRange,
}

/// Wall-clock time as stored by the device.
///
/// `year` is an offset from 2000. `weekday` is a free-running counter kept by
/// the device (0-6); it is not derived from the date.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct WallClockTime {
    /// Year offset from 2000 (0-99)
    pub year: u8,
    /// Month (1-12)
    pub month: u8,
    /// Day of month (1-31)
    pub day: u8,
    /// Day of week (0-6)
    pub weekday: u8,
    /// Hours (0-23)
    pub hour: u8,
    /// Minutes (0-59)
    pub minute: u8,
    /// Seconds (0-59)
    pub second: u8,
}

/// Decodes a packed BCD byte.
///
/// # Errors
///
/// Returns [`DateTimeError::CorruptRegisterData`] if either nibble is above 9.
pub fn bcd_decode(value: u8) -> Result<u8, DateTimeError> {
    let bcd = Bcd(value);
    decode_digits(bcd.tens(), bcd.ones())
}

/// Encodes a decimal value (0-99) as packed BCD.
///
/// # Errors
///
/// Returns [`DateTimeError::InvalidDateTime`] if the value is above 99.
pub fn bcd_encode(value: u8) -> Result<u8, DateTimeError> {
    make_bcd(value, 99).map(u8::from)
}

/// Helper function to convert a number to BCD format with validation
pub(crate) fn make_bcd(value: u8, max_value: u8) -> Result<Bcd, DateTimeError> {
    if value > max_value {
        return Err(DateTimeError::InvalidDateTime);
    }
    let mut bcd = Bcd::default();
    bcd.set_tens(value / 10);
    bcd.set_ones(value % 10);
    Ok(bcd)
}

fn decode_digits(tens: u8, ones: u8) -> Result<u8, DateTimeError> {
    if tens > 9 || ones > 9 {
        error!("corrupt BCD digits tens={} ones={}", tens, ones);
        return Err(DateTimeError::CorruptRegisterData);
    }
    Ok(10 * tens + ones)
}

fn narrow(value: u32) -> Result<u8, DateTimeError> {
    u8::try_from(value).map_err(|_| DateTimeError::InvalidDateTime)
}

impl WallClockTime {
    /// Checks every field range and that the day exists in the given month.
    ///
    /// # Errors
    ///
    /// Returns [`DateTimeError::InvalidDateTime`] for any field out of range.
    pub fn validate(&self) -> Result<(), DateTimeError> {
        if self.year > 99
            || self.weekday > 6
            || self.hour > 23
            || self.minute > 59
            || self.second > 59
        {
            return Err(DateTimeError::InvalidDateTime);
        }
        NaiveDate::from_ymd_opt(
            2000 + i32::from(self.year),
            u32::from(self.month),
            u32::from(self.day),
        )
        .map(|_| ())
        .ok_or(DateTimeError::InvalidDateTime)
    }

    /// Decodes the eight date/time registers.
    ///
    /// The 100ths byte is discarded and the indicator bits in the seconds and
    /// minutes registers are masked off. The weekday is the low three bits
    /// taken as-is, so a device holding weekday 7 decodes to 7. Such a value
    /// fails [`validate`](Self::validate) and can not be encoded back.
    ///
    /// # Errors
    ///
    /// Returns [`DateTimeError::CorruptRegisterData`] if any BCD digit is above 9.
    pub fn decode(registers: &[u8; DATETIME_LEN]) -> Result<Self, DateTimeError> {
        RawDateTime::from(*registers).into_wall_clock()
    }

    /// Encodes into the eight date/time registers, 100ths first.
    ///
    /// # Errors
    ///
    /// Returns [`DateTimeError::InvalidDateTime`] if [`validate`](Self::validate) fails.
    pub fn encode(&self) -> Result<[u8; DATETIME_LEN], DateTimeError> {
        let raw = RawDateTime::from_wall_clock(self)?;
        Ok((&raw).into())
    }

    /// Builds a `WallClockTime` from a chrono `NaiveDateTime`.
    ///
    /// The weekday is derived from the date, counting from Sunday = 0.
    ///
    /// # Errors
    ///
    /// Returns [`DateTimeError::YearOutOfRange`] for years outside 2000-2099.
    pub fn from_datetime(datetime: &NaiveDateTime) -> Result<Self, DateTimeError> {
        let year = datetime.year();
        if !(2000..=2099).contains(&year) {
            error!("Year {} is out of range! must be 2000-2099", year);
            return Err(DateTimeError::YearOutOfRange);
        }
        Ok(Self {
            year: u8::try_from(year - 2000).map_err(|_| DateTimeError::YearOutOfRange)?,
            month: narrow(datetime.month())?,
            day: narrow(datetime.day())?,
            weekday: narrow(datetime.weekday().num_days_from_sunday())?,
            hour: narrow(datetime.hour())?,
            minute: narrow(datetime.minute())?,
            second: narrow(datetime.second())?,
        })
    }

    /// Converts to a chrono `NaiveDateTime` in the 2000-2099 century.
    ///
    /// The weekday is not checked against the date.
    ///
    /// # Errors
    ///
    /// Returns [`DateTimeError::InvalidDateTime`] if the fields do not form a
    /// real date and time.
    pub fn to_datetime(&self) -> Result<NaiveDateTime, DateTimeError> {
        NaiveDate::from_ymd_opt(
            2000 + i32::from(self.year),
            u32::from(self.month),
            u32::from(self.day),
        )
        .and_then(|d| {
            d.and_hms_opt(
                u32::from(self.hour),
                u32::from(self.minute),
                u32::from(self.second),
            )
        })
        .ok_or(DateTimeError::InvalidDateTime)
    }
}

/// Register-level image of the date/time block.
#[derive(Debug, Copy, Clone, PartialEq)]
pub(crate) struct RawDateTime {
    hundredths: u8,
    seconds: Seconds,
    minutes: Minutes,
    hours: Bcd,
    days: Bcd,
    weekdays: Weekdays,
    months: Bcd,
    years: Bcd,
}

impl RawDateTime {
    pub(crate) fn from_wall_clock(time: &WallClockTime) -> Result<Self, DateTimeError> {
        time.validate()?;

        let seconds = {
            let bcd = make_bcd(time.second, 59)?;
            let mut value = Seconds::default();
            value.set_ten_seconds(bcd.tens());
            value.set_seconds(bcd.ones());
            value
        };
        let minutes = {
            let bcd = make_bcd(time.minute, 59)?;
            let mut value = Minutes::default();
            value.set_ten_minutes(bcd.tens());
            value.set_minutes(bcd.ones());
            value
        };
        let weekdays = {
            let mut value = Weekdays::default();
            value.set_weekday(time.weekday);
            value
        };

        let raw = RawDateTime {
            hundredths: 0,
            seconds,
            minutes,
            hours: make_bcd(time.hour, 23)?,
            days: make_bcd(time.day, 31)?,
            weekdays,
            months: make_bcd(time.month, 12)?,
            years: make_bcd(time.year, 99)?,
        };

        debug!("encoded {:?}", time);

        Ok(raw)
    }

    pub(crate) fn into_wall_clock(self) -> Result<WallClockTime, DateTimeError> {
        let second = decode_digits(self.seconds.ten_seconds(), self.seconds.seconds())?;
        let minute = decode_digits(self.minutes.ten_minutes(), self.minutes.minutes())?;
        let hour = decode_digits(self.hours.tens(), self.hours.ones())?;
        debug!(
            "hundredths={} h={} m={} s={}",
            self.hundredths, hour, minute, second
        );

        Ok(WallClockTime {
            year: decode_digits(self.years.tens(), self.years.ones())?,
            month: decode_digits(self.months.tens(), self.months.ones())?,
            day: decode_digits(self.days.tens(), self.days.ones())?,
            weekday: self.weekdays.weekday(),
            hour,
            minute,
            second,
        })
    }
}

impl From<[u8; DATETIME_LEN]> for RawDateTime {
    fn from(data: [u8; DATETIME_LEN]) -> Self {
        RawDateTime {
            hundredths: data[0],
            seconds: Seconds(data[1]),
            minutes: Minutes(data[2]),
            hours: Bcd(data[3]),
            days: Bcd(data[4]),
            weekdays: Weekdays(data[5]),
            months: Bcd(data[6]),
            years: Bcd(data[7]),
        }
    }
}

impl From<&RawDateTime> for [u8; DATETIME_LEN] {
    fn from(dt: &RawDateTime) -> [u8; DATETIME_LEN] {
        [
            dt.hundredths,
            dt.seconds.0,
            dt.minutes.0,
            dt.hours.0,
            dt.days.0,
            dt.weekdays.0,
            dt.months.0,
            dt.years.0,
        ]
    }
}
