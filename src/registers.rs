//! Register definitions and bitfield structures for the PCF85263/PCF85363 RTC.
//!
//! This module contains the register addresses, bitfield definitions, named
//! mask constants and the device-variant descriptor shared by both chips. The
//! two parts have an identical register map and differ only in the size of
//! their battery-backed RAM.

use bitfield::bitfield;

/// Register addresses for the PCF85263/PCF85363 RTC.
#[allow(unused)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RegAddr {
    /// 100th seconds register (0-99)
    Hundredths = 0x00,
    /// Seconds register (0-59), bit 7 is the oscillator stop flag
    Seconds = 0x01,
    /// Minutes register (0-59), bit 7 is the event monitor flag
    Minutes = 0x02,
    /// Hours register (0-23)
    Hours = 0x03,
    /// Day of month register (1-31)
    Days = 0x04,
    /// Weekday register (0-6)
    Weekdays = 0x05,
    /// Month register (1-12)
    Months = 0x06,
    /// Year register (0-99)
    Years = 0x07,
    /// Alarm 1 seconds register
    Alarm1Seconds = 0x08,
    /// Alarm 1 minutes register
    Alarm1Minutes = 0x09,
    /// Alarm 1 hours register
    Alarm1Hours = 0x0A,
    /// Alarm 1 day of month register
    Alarm1Days = 0x0B,
    /// Alarm 1 month register
    Alarm1Months = 0x0C,
    /// Alarm 2 minutes register
    Alarm2Minutes = 0x0D,
    /// Alarm 2 hours register
    Alarm2Hours = 0x0E,
    /// Alarm 2 weekday register
    Alarm2Weekdays = 0x0F,
    /// Alarm field enable register
    AlarmEnables = 0x10,
    /// Timestamp 1 registers (6 bytes)
    Timestamp1 = 0x11,
    /// Timestamp 2 registers (6 bytes)
    Timestamp2 = 0x17,
    /// Timestamp 3 registers (6 bytes)
    Timestamp3 = 0x1D,
    /// Timestamp mode control
    TimestampMode = 0x23,
    /// Frequency offset register
    Offset = 0x24,
    /// Oscillator control register
    Oscillator = 0x25,
    /// Battery switch control register
    Battery = 0x26,
    /// Pin IO control register
    PinIo = 0x27,
    /// Function control register
    Function = 0x28,
    /// INTA interrupt enable register
    InterruptAEnable = 0x29,
    /// INTB interrupt enable register
    InterruptBEnable = 0x2A,
    /// Flags register
    Flags = 0x2B,
    /// Single RAM byte register
    RamByte = 0x2C,
    /// Watchdog register
    Watchdog = 0x2D,
    /// Stop enable register
    StopEnable = 0x2E,
    /// Software reset control register
    Resets = 0x2F,
    /// First byte of the battery-backed RAM
    Ram = 0x40,
}

/// Default 7-bit I2C address of both parts.
pub const DEFAULT_ADDRESS: u8 = 0x51;

/// Number of bytes in the date/time block, starting at [`RegAddr::Hundredths`].
pub const DATETIME_LEN: usize = 8;

/// Number of alarm 1 match registers, starting at [`RegAddr::Alarm1Seconds`].
pub const ALARM1_LEN: usize = 5;

/// Largest RAM window the register map can address.
pub const RAM_SIZE_MAX: u8 = 0x40;

/// Oscillator stop flag in the seconds register.
pub const SECONDS_OS: u8 = 1 << 7;
/// Event monitor flag in the minutes register.
pub const MINUTES_EMON: u8 = 1 << 7;
/// Weekday bits in the weekday register.
pub const WEEKDAYS_MASK: u8 = 0b0000_0111;

/// Alarm 1 per-field enables: seconds, minutes, hours, day and month.
pub const ALARM1_FIELD_ENABLES: u8 = 0b0001_1111;
/// Alarm 2 per-field enables: minutes, hours and weekday.
pub const ALARM2_FIELD_ENABLES: u8 = 0b1110_0000;

/// Alarm 1 interrupt enable in the INTA enable register.
pub const INT_A1IE: u8 = 1 << 4;
/// Interrupt level/pulse select in the INTA enable register.
pub const INT_ILP: u8 = 1 << 7;

/// Alarm 1 flag in the flags register.
pub const FLAGS_A1F: u8 = 1 << 5;

/// INTA pin mode bits in the pin IO register.
pub const PIN_IO_INTAPM: u8 = 0b0000_0011;

/// Stop bit in the stop enable register.
pub const STOP_EN_STOP: u8 = 1 << 0;

/// Value written to the resets register to clear the prescaler.
pub const RESET_CPR: u8 = 0xA4;

/// Applies a masked update to a register value.
///
/// Bits outside `mask` keep their value from `old`, bits inside it take their
/// value from `value`.
#[must_use]
pub const fn update_bits(old: u8, mask: u8, value: u8) -> u8 {
    (old & !mask) | (value & mask)
}

/// Static description of a chip variant.
///
/// Both parts share the time registers; they differ in the RAM bank behind
/// [`RegAddr::Ram`] and in alarm support. Boards that do not wire the INTA pin
/// can mark the alarm as unavailable with [`DeviceVariant::without_alarm`].
/// Any other part is described with [`DeviceVariant::new`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DeviceVariant {
    name: &'static str,
    nvram_capacity: u8,
    alarm: bool,
}

impl DeviceVariant {
    /// NXP PCF85263: time keeping only. There is no RAM bank at
    /// [`RegAddr::Ram`] and the alarm is not driven.
    pub const PCF85263: Self = Self::new("pcf85263", 0x00).without_alarm();
    /// NXP PCF85363: 64 bytes of RAM.
    pub const PCF85363: Self = Self::new("pcf85363", 0x40);

    /// Creates a descriptor. The capacity is clamped to [`RAM_SIZE_MAX`].
    #[must_use]
    pub const fn new(name: &'static str, nvram_capacity: u8) -> Self {
        let nvram_capacity = if nvram_capacity > RAM_SIZE_MAX {
            RAM_SIZE_MAX
        } else {
            nvram_capacity
        };
        Self {
            name,
            nvram_capacity,
            alarm: true,
        }
    }

    /// Returns the same variant with the alarm feature disabled.
    #[must_use]
    pub const fn without_alarm(self) -> Self {
        Self {
            alarm: false,
            ..self
        }
    }

    /// Part name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Size of the battery-backed RAM in bytes.
    #[must_use]
    pub const fn nvram_capacity(&self) -> usize {
        self.nvram_capacity as usize
    }

    /// Whether alarm and interrupt operations are available.
    #[must_use]
    pub const fn has_alarm(&self) -> bool {
        self.alarm
    }
}

/// Function of the INTA pin.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IntAPinMode {
    /// CLK output
    Clock = 0b00,
    /// Battery mode indication
    BatteryMode = 0b01,
    /// Interrupt output
    Interrupt = 0b10,
    /// High impedance
    HighZ = 0b11,
}
impl From<u8> for IntAPinMode {
    /// Creates an `IntAPinMode` from a raw register value. Only the low two
    /// bits are considered.
    fn from(v: u8) -> Self {
        match v & PIN_IO_INTAPM {
            0b00 => IntAPinMode::Clock,
            0b01 => IntAPinMode::BatteryMode,
            0b10 => IntAPinMode::Interrupt,
            _ => IntAPinMode::HighZ,
        }
    }
}
impl From<IntAPinMode> for u8 {
    fn from(v: IntAPinMode) -> Self {
        v as u8
    }
}

// This macro generates the From<u8> and Into<u8> implementations for the
// register type
macro_rules! from_register_u8 {
    ($typ:ty) => {
        impl From<u8> for $typ {
            fn from(v: u8) -> Self {
                paste::paste!([< $typ >](v))
            }
        }
        impl From<$typ> for u8 {
            fn from(v: $typ) -> Self {
                v.0
            }
        }
    };
}

bitfield! {
    /// Plain two-digit BCD register (hours, days, months, years and the
    /// alarm match registers).
    #[derive(Clone, Copy, Default, PartialEq)]
    pub struct Bcd(u8);
    impl Debug;
    /// Tens digit
    pub tens, set_tens: 7, 4;
    /// Ones digit
    pub ones, set_ones: 3, 0;
}
from_register_u8!(Bcd);

bitfield! {
    /// Seconds register (0-59) with the oscillator stop flag.
    #[derive(Clone, Copy, Default, PartialEq)]
    pub struct Seconds(u8);
    impl Debug;
    /// Oscillator stopped; clock integrity is not guaranteed
    pub oscillator_stopped, set_oscillator_stopped: 7;
    /// Tens place of seconds (0-5)
    pub ten_seconds, set_ten_seconds: 6, 4;
    /// Ones place of seconds (0-9)
    pub seconds, set_seconds: 3, 0;
}
from_register_u8!(Seconds);

bitfield! {
    /// Minutes register (0-59) with the event monitor flag.
    #[derive(Clone, Copy, Default, PartialEq)]
    pub struct Minutes(u8);
    impl Debug;
    /// Event monitor
    pub event_monitor, set_event_monitor: 7;
    /// Tens place of minutes (0-5)
    pub ten_minutes, set_ten_minutes: 6, 4;
    /// Ones place of minutes (0-9)
    pub minutes, set_minutes: 3, 0;
}
from_register_u8!(Minutes);

bitfield! {
    /// Weekday register (0-6), binary.
    #[derive(Clone, Copy, Default, PartialEq)]
    pub struct Weekdays(u8);
    impl Debug;
    /// Day of week (0-6)
    pub weekday, set_weekday: 2, 0;
}
from_register_u8!(Weekdays);

bitfield! {
    /// Alarm field enable register.
    #[derive(Clone, Copy, Default, PartialEq)]
    pub struct AlarmEnables(u8);
    impl Debug;
    /// Alarm 2 weekday enable
    pub day_a2e, set_day_a2e: 7;
    /// Alarm 2 hours enable
    pub hour_a2e, set_hour_a2e: 6;
    /// Alarm 2 minutes enable
    pub minute_a2e, set_minute_a2e: 5;
    /// Alarm 1 month enable
    pub month_a1e, set_month_a1e: 4;
    /// Alarm 1 day enable
    pub day_a1e, set_day_a1e: 3;
    /// Alarm 1 hours enable
    pub hour_a1e, set_hour_a1e: 2;
    /// Alarm 1 minutes enable
    pub minute_a1e, set_minute_a1e: 1;
    /// Alarm 1 seconds enable
    pub second_a1e, set_second_a1e: 0;
}
from_register_u8!(AlarmEnables);

bitfield! {
    /// INTA (and INTB) interrupt enable register.
    #[derive(Clone, Copy, Default, PartialEq)]
    pub struct InterruptEnables(u8);
    impl Debug;
    /// Interrupt is a level (1) or a pulse (0)
    pub level, set_level: 7;
    /// Periodic interrupt enable
    pub periodic, set_periodic: 6;
    /// Offset correction interrupt enable
    pub offset_correction, set_offset_correction: 5;
    /// Alarm 1 interrupt enable
    pub alarm1, set_alarm1: 4;
    /// Alarm 2 interrupt enable
    pub alarm2, set_alarm2: 3;
    /// Timestamp register interrupt enable
    pub timestamp, set_timestamp: 2;
    /// Battery switch interrupt enable
    pub battery_switch, set_battery_switch: 1;
    /// Watchdog interrupt enable
    pub watchdog, set_watchdog: 0;
}
from_register_u8!(InterruptEnables);

bitfield! {
    /// Flags register. Every bit latches and is cleared by writing 0 to it.
    #[derive(Clone, Copy, Default, PartialEq)]
    pub struct Flags(u8);
    impl Debug;
    /// Periodic interrupt flag
    pub periodic, set_periodic: 7;
    /// Alarm 2 flag
    pub alarm2, set_alarm2: 6;
    /// Alarm 1 flag
    pub alarm1, set_alarm1: 5;
    /// Watchdog flag
    pub watchdog, set_watchdog: 4;
    /// Battery switch flag
    pub battery_switch, set_battery_switch: 3;
    /// Timestamp register 3 event flag
    pub timestamp3, set_timestamp3: 2;
    /// Timestamp register 2 event flag
    pub timestamp2, set_timestamp2: 1;
    /// Timestamp register 1 event flag
    pub timestamp1, set_timestamp1: 0;
}
from_register_u8!(Flags);

bitfield! {
    /// Pin IO register.
    #[derive(Clone, Copy, Default, PartialEq)]
    pub struct PinIo(u8);
    impl Debug;
    /// CLK pin disabled
    pub clock_disabled, set_clock_disabled: 7;
    /// TS pin pull-down enable
    pub ts_pull_down, set_ts_pull_down: 6;
    /// TS pin level sense
    pub ts_level, set_ts_level: 5;
    /// TS pin input mode
    pub ts_input_mode, set_ts_input_mode: 4;
    /// TS pin mode
    pub ts_pin_mode, set_ts_pin_mode: 3, 2;
    /// INTA pin mode
    pub from into IntAPinMode, inta_pin_mode, set_inta_pin_mode: 1, 0;
}
from_register_u8!(PinIo);

bitfield! {
    /// Stop enable register.
    #[derive(Clone, Copy, Default, PartialEq)]
    pub struct StopEnable(u8);
    impl Debug;
    /// Time counting stopped
    pub stop, set_stop: 0;
}
from_register_u8!(StopEnable);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_bits() {
        assert_eq!(update_bits(0xFF, ALARM1_FIELD_ENABLES, 0), 0xE0);
        assert_eq!(update_bits(0x00, INT_A1IE, 0xFF), 0x10);
        assert_eq!(update_bits(0b1010_0101, 0b0000_1111, 0b0000_0011), 0b1010_0011);
        // bits outside the mask are ignored from value
        assert_eq!(update_bits(0x00, FLAGS_A1F, 0xFF & !FLAGS_A1F), 0x00);
    }

    #[test]
    fn test_mask_constants_match_bitfields() {
        let mut enables = AlarmEnables::default();
        enables.set_second_a1e(true);
        enables.set_minute_a1e(true);
        enables.set_hour_a1e(true);
        enables.set_day_a1e(true);
        enables.set_month_a1e(true);
        assert_eq!(u8::from(enables), ALARM1_FIELD_ENABLES);

        let mut enables = AlarmEnables::default();
        enables.set_minute_a2e(true);
        enables.set_hour_a2e(true);
        enables.set_day_a2e(true);
        assert_eq!(u8::from(enables), ALARM2_FIELD_ENABLES);

        let mut int = InterruptEnables::default();
        int.set_alarm1(true);
        assert_eq!(u8::from(int), INT_A1IE);
        let mut int = InterruptEnables::default();
        int.set_level(true);
        assert_eq!(u8::from(int), INT_ILP);

        let mut flags = Flags::default();
        flags.set_alarm1(true);
        assert_eq!(u8::from(flags), FLAGS_A1F);

        let mut stop = StopEnable::default();
        stop.set_stop(true);
        assert_eq!(u8::from(stop), STOP_EN_STOP);

        let mut seconds = Seconds::default();
        seconds.set_oscillator_stopped(true);
        assert_eq!(u8::from(seconds), SECONDS_OS);
        let mut minutes = Minutes::default();
        minutes.set_event_monitor(true);
        assert_eq!(u8::from(minutes), MINUTES_EMON);
        let mut weekdays = Weekdays::default();
        weekdays.set_weekday(0x07);
        assert_eq!(u8::from(weekdays), WEEKDAYS_MASK);

        let mut pin_io = PinIo::default();
        pin_io.set_inta_pin_mode(IntAPinMode::HighZ);
        assert_eq!(u8::from(pin_io), PIN_IO_INTAPM);
    }

    #[test]
    fn test_seconds_register_conversions() {
        let seconds = Seconds::from(0xD9);
        assert!(seconds.oscillator_stopped());
        assert_eq!(seconds.ten_seconds(), 5);
        assert_eq!(seconds.seconds(), 9);
        assert_eq!(u8::from(seconds), 0xD9);

        let seconds = Seconds::from(0x07);
        assert!(!seconds.oscillator_stopped());
        assert_eq!(seconds.ten_seconds(), 0);
        assert_eq!(seconds.seconds(), 7);
    }

    #[test]
    fn test_minutes_register_conversions() {
        let minutes = Minutes::from(0xB4);
        assert!(minutes.event_monitor());
        assert_eq!(minutes.ten_minutes(), 3);
        assert_eq!(minutes.minutes(), 4);

        let mut minutes = Minutes::default();
        minutes.set_ten_minutes(5);
        minutes.set_minutes(9);
        assert_eq!(u8::from(minutes), 0x59);
    }

    #[test]
    fn test_bcd_register_conversions() {
        let bcd = Bcd::from(0x99);
        assert_eq!(bcd.tens(), 9);
        assert_eq!(bcd.ones(), 9);

        let bcd = Bcd::from(0xAF);
        assert_eq!(bcd.tens(), 0xA);
        assert_eq!(bcd.ones(), 0xF);

        let mut bcd = Bcd::default();
        bcd.set_tens(1);
        bcd.set_ones(2);
        assert_eq!(u8::from(bcd), 0x12);
    }

    #[test]
    fn test_weekdays_register_conversions() {
        assert_eq!(Weekdays::from(0x06).weekday(), 6);
        // upper bits are not part of the weekday
        assert_eq!(Weekdays::from(0xF9).weekday(), 1);
    }

    #[test]
    fn test_flags_register_conversions() {
        let flags = Flags::from(0x20);
        assert!(flags.alarm1());
        assert!(!flags.alarm2());
        assert!(!flags.periodic());
        assert!(!flags.watchdog());
        assert!(!flags.battery_switch());

        let flags = Flags::from(0xDF);
        assert!(!flags.alarm1());
        assert!(flags.alarm2());
        assert!(flags.periodic());
        assert!(flags.watchdog());
        assert!(flags.battery_switch());
        assert!(flags.timestamp1());
        assert!(flags.timestamp2());
        assert!(flags.timestamp3());
    }

    #[test]
    fn test_pin_io_register_conversions() {
        let pin_io = PinIo::from(0x82);
        assert!(pin_io.clock_disabled());
        assert_eq!(pin_io.inta_pin_mode(), IntAPinMode::Interrupt);

        let mut pin_io = PinIo::from(0xF0);
        pin_io.set_inta_pin_mode(IntAPinMode::HighZ);
        assert_eq!(u8::from(pin_io), 0xF3);
        pin_io.set_inta_pin_mode(IntAPinMode::Clock);
        assert_eq!(u8::from(pin_io), 0xF0);
    }

    #[test]
    fn test_inta_pin_mode_conversions() {
        assert_eq!(IntAPinMode::from(0), IntAPinMode::Clock);
        assert_eq!(IntAPinMode::from(1), IntAPinMode::BatteryMode);
        assert_eq!(IntAPinMode::from(2), IntAPinMode::Interrupt);
        assert_eq!(IntAPinMode::from(3), IntAPinMode::HighZ);
        assert_eq!(IntAPinMode::from(0xFE), IntAPinMode::Interrupt);
        assert_eq!(u8::from(IntAPinMode::BatteryMode), 1);
    }

    #[test]
    fn test_device_variants() {
        assert_eq!(DeviceVariant::PCF85263.nvram_capacity(), 0);
        assert!(!DeviceVariant::PCF85263.has_alarm());
        assert_eq!(DeviceVariant::PCF85363.nvram_capacity(), 64);
        assert!(DeviceVariant::PCF85363.has_alarm());
        assert!(!DeviceVariant::PCF85363.without_alarm().has_alarm());
        assert_eq!(DeviceVariant::PCF85263.name(), "pcf85263");

        // capacity can not exceed the RAM window
        let big = DeviceVariant::new("custom", 0xFF);
        assert_eq!(big.nvram_capacity(), usize::from(RAM_SIZE_MAX));
    }
}
