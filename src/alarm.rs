//! Alarm configuration utilities for the PCF85263/PCF85363 RTC.
//!
//! Alarm 1 compares five match registers (second, minute, hour, day of month
//! and month) against the running clock. Each comparison has its own enable
//! bit in [`RegAddr::AlarmEnables`], and the alarm drives INTA only while the
//! alarm 1 interrupt enable in [`RegAddr::InterruptAEnable`] is set.
//!
//! The two enable groups live in different registers, so toggling them one
//! at a time can let the device match against a half-written pattern. Every
//! change therefore goes through the sequence returned by
//! [`enable_sequence`]: both groups are forced off first, and only then is
//! the target state applied.
//!
//! Alarm 2 (minute, hour, weekday) is part of the register map but is not
//! driven here; its enable bits are always preserved.

use crate::{
    datetime::{bcd_decode, make_bcd, DateTimeError},
    registers::{RegAddr, ALARM1_FIELD_ENABLES, ALARM1_LEN, FLAGS_A1F, INT_A1IE},
};

/// Error type for alarm configuration operations.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AlarmError {
    /// Invalid match field value
    InvalidField(&'static str),
}

fn encode_field(value: u8, max: u8, message: &'static str) -> Result<u8, AlarmError> {
    make_bcd(value, max)
        .map(u8::from)
        .map_err(|_| AlarmError::InvalidField(message))
}

/// Alarm 1 match fields.
///
/// Months are 1-based, as in [`WallClockTime`](crate::WallClockTime). A freshly
/// reset device reads back day and month as zero; such values decode but are
/// refused when writing.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Alarm1 {
    /// Seconds (0-59)
    pub second: u8,
    /// Minutes (0-59)
    pub minute: u8,
    /// Hours (0-23)
    pub hour: u8,
    /// Day of month (1-31)
    pub day: u8,
    /// Month (1-12)
    pub month: u8,
}

impl Alarm1 {
    /// Validates the match fields.
    ///
    /// # Errors
    ///
    /// Returns [`AlarmError::InvalidField`] naming the first field out of range.
    pub fn validate(&self) -> Result<(), AlarmError> {
        if self.second > 59 {
            return Err(AlarmError::InvalidField("seconds must be 0-59"));
        }
        if self.minute > 59 {
            return Err(AlarmError::InvalidField("minutes must be 0-59"));
        }
        if self.hour > 23 {
            return Err(AlarmError::InvalidField("hours must be 0-23"));
        }
        if self.day == 0 || self.day > 31 {
            return Err(AlarmError::InvalidField("day must be 1-31"));
        }
        if self.month == 0 || self.month > 12 {
            return Err(AlarmError::InvalidField("month must be 1-12"));
        }
        Ok(())
    }

    /// Encodes the match registers, seconds first.
    ///
    /// # Errors
    ///
    /// Returns an error if [`validate`](Self::validate) fails.
    pub fn encode(&self) -> Result<[u8; ALARM1_LEN], AlarmError> {
        self.validate()?;
        Ok([
            encode_field(self.second, 59, "seconds must be 0-59")?,
            encode_field(self.minute, 59, "minutes must be 0-59")?,
            encode_field(self.hour, 23, "hours must be 0-23")?,
            encode_field(self.day, 31, "day must be 1-31")?,
            encode_field(self.month, 12, "month must be 1-12")?,
        ])
    }

    /// Decodes the match registers, seconds first.
    ///
    /// # Errors
    ///
    /// Returns [`DateTimeError::CorruptRegisterData`] if any BCD digit is above 9.
    pub fn decode(registers: &[u8; ALARM1_LEN]) -> Result<Self, DateTimeError> {
        Ok(Self {
            second: bcd_decode(registers[0])?,
            minute: bcd_decode(registers[1])?,
            hour: bcd_decode(registers[2])?,
            day: bcd_decode(registers[3])?,
            month: bcd_decode(registers[4])?,
        })
    }
}

/// Outcome of [`Pcf85x63::poll_interrupt`](crate::Pcf85x63::poll_interrupt).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Event {
    /// Alarm 1 matched; its flag has been acknowledged
    AlarmFired,
    /// Alarm 1 flag was clear; nothing was written
    NoEvent,
}

/// A masked read-modify-write of a single register.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) struct MaskedUpdate {
    pub(crate) reg: RegAddr,
    pub(crate) mask: u8,
    pub(crate) value: u8,
}

const FIELDS_OFF: MaskedUpdate = MaskedUpdate {
    reg: RegAddr::AlarmEnables,
    mask: ALARM1_FIELD_ENABLES,
    value: 0,
};
const FIELDS_ON: MaskedUpdate = MaskedUpdate {
    reg: RegAddr::AlarmEnables,
    mask: ALARM1_FIELD_ENABLES,
    value: ALARM1_FIELD_ENABLES,
};
const INTERRUPT_OFF: MaskedUpdate = MaskedUpdate {
    reg: RegAddr::InterruptAEnable,
    mask: INT_A1IE,
    value: 0,
};
const INTERRUPT_ON: MaskedUpdate = MaskedUpdate {
    reg: RegAddr::InterruptAEnable,
    mask: INT_A1IE,
    value: INT_A1IE,
};
const FLAG_CLEAR: MaskedUpdate = MaskedUpdate {
    reg: RegAddr::Flags,
    mask: FLAGS_A1F,
    value: 0,
};

const DISABLE_SEQUENCE: [MaskedUpdate; 3] = [FIELDS_OFF, INTERRUPT_OFF, FLAG_CLEAR];
const ENABLE_SEQUENCE: [MaskedUpdate; 4] = [FIELDS_OFF, INTERRUPT_OFF, FIELDS_ON, INTERRUPT_ON];

/// Register updates that move alarm 1 to the requested state.
///
/// Both enable groups are cleared first whatever the target. Disabling also
/// drops a stale alarm 1 flag; enabling leaves the flag for the interrupt
/// handler to observe.
pub(crate) fn enable_sequence(enabled: bool) -> &'static [MaskedUpdate] {
    if enabled {
        &ENABLE_SEQUENCE
    } else {
        &DISABLE_SEQUENCE
    }
}
