//! Platform-agnostic driver for the NXP PCF85263 and PCF85363 real-time clocks.
//!
//! The driver talks to the device through the `embedded-hal` I2C traits and
//! keeps no copy of device state: every call reads or writes the registers
//! directly.
//!
//! # Features
//!
//! - Date/time read and write with a stop/prescaler-reset sequence, so the
//!   counters never see a half-written time
//! - Alarm 1 configuration with a disable-first enable sequence, so no
//!   interrupt fires on a partially written match pattern
//! - Alarm interrupt polling and acknowledgement
//! - Access to the 64-byte battery-backed RAM of the PCF85363
//! - Optional async API (`async` feature), `log` and `defmt` logging
//!
//! # Example
//!
//! ```rust,ignore
//! use pcf85x63::{Alarm1, DeviceVariant, Event, Pcf85x63, WallClockTime, DEFAULT_ADDRESS};
//!
//! let mut rtc = Pcf85x63::new(i2c, DEFAULT_ADDRESS, DeviceVariant::PCF85363);
//! rtc.set_time(&WallClockTime {
//!     year: 23, month: 12, day: 18, weekday: 1, hour: 9, minute: 5, second: 0,
//! })?;
//! rtc.set_alarm(&Alarm1 { second: 0, minute: 30, hour: 7, day: 1, month: 1 }, true)?;
//!
//! // from the host's interrupt dispatch
//! if rtc.poll_interrupt()? == Event::AlarmFired {
//!     // ...
//! }
//! ```
//!
//! # Concurrency
//!
//! Every operation takes `&mut self`, which makes a driver instance its own
//! mutual-exclusion domain: an alarm reconfiguration can never interleave with
//! [`Pcf85x63::poll_interrupt`]. Hosts that poll from interrupt context share
//! the driver through their own mutex.

#![no_std]

cfg_if::cfg_if! {
    if #[cfg(feature = "defmt")] {
        macro_rules! debug {
            ($($arg:tt)*) => { defmt::debug!($($arg)*) };
        }
        macro_rules! error {
            ($($arg:tt)*) => { defmt::error!($($arg)*) };
        }
    } else if #[cfg(feature = "log")] {
        macro_rules! debug {
            ($($arg:tt)*) => { log::debug!($($arg)*) };
        }
        macro_rules! error {
            ($($arg:tt)*) => { log::error!($($arg)*) };
        }
    } else {
        macro_rules! debug {
            ($($arg:tt)*) => {};
        }
        macro_rules! error {
            ($($arg:tt)*) => {};
        }
    }
}

mod alarm;
#[cfg(feature = "async")]
pub mod asynch;
mod datetime;
mod nvram;
mod registers;

use chrono::NaiveDateTime;
use embedded_hal::i2c::I2c;
use paste::paste;

pub use alarm::{Alarm1, AlarmError, Event};
pub use datetime::{bcd_decode, bcd_encode, DateTimeError, WallClockTime};
pub use registers::*;

/// Runtime configuration applied by [`Pcf85x63::configure`].
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    /// Function of the INTA pin
    pub inta_pin_mode: IntAPinMode,
    /// INTA asserts a level until the flag is cleared instead of a pulse
    pub level_interrupt: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            inta_pin_mode: IntAPinMode::Interrupt,
            level_interrupt: false,
        }
    }
}

/// Driver errors, generic over the I2C bus error.
#[derive(Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Pcf85x63Error<I2CE> {
    /// The bus transaction failed
    I2c(I2CE),
    /// A register held a BCD digit above 9
    CorruptRegisterData,
    /// NVRAM offset and length exceed the variant's capacity
    OutOfBounds,
    /// Setting the time failed after the clock was stopped; the clock is
    /// still halted. Call [`Pcf85x63::resume`] or retry the write.
    StoppedClock(I2CE),
    /// Invalid date/time supplied by the caller
    DateTime(DateTimeError),
    /// Invalid alarm supplied by the caller
    Alarm(AlarmError),
    /// The device variant was created without alarm support
    AlarmUnsupported,
    /// Alarm 1 fired but clearing its flag failed. The event is still
    /// pending on the device and the flag remains set.
    AckFailed(I2CE),
}

impl<I2CE> From<I2CE> for Pcf85x63Error<I2CE> {
    fn from(e: I2CE) -> Self {
        Pcf85x63Error::I2c(e)
    }
}

impl<I2CE> Pcf85x63Error<I2CE> {
    pub(crate) fn codec(e: DateTimeError) -> Self {
        match e {
            DateTimeError::CorruptRegisterData => Pcf85x63Error::CorruptRegisterData,
            other => Pcf85x63Error::DateTime(other),
        }
    }
}

/// PCF85263/PCF85363 Real-Time Clock driver.
pub struct Pcf85x63<I2C: I2c> {
    i2c: I2C,
    address: u8,
    variant: DeviceVariant,
}

impl<I2C: I2c> Pcf85x63<I2C> {
    /// Creates a new driver instance.
    ///
    /// # Arguments
    /// * `i2c` - The I2C bus implementation
    /// * `address` - The I2C address of the device (typically [`DEFAULT_ADDRESS`])
    /// * `variant` - Which part is fitted
    pub fn new(i2c: I2C, address: u8, variant: DeviceVariant) -> Self {
        Self {
            i2c,
            address,
            variant,
        }
    }

    /// Destroys the driver and returns the I2C bus.
    pub fn release(self) -> I2C {
        self.i2c
    }

    /// The device variant this driver was created for.
    pub fn variant(&self) -> DeviceVariant {
        self.variant
    }

    fn read_registers(
        &mut self,
        reg: RegAddr,
        buf: &mut [u8],
    ) -> Result<(), Pcf85x63Error<I2C::Error>> {
        self.i2c.write_read(self.address, &[reg as u8], buf)?;
        Ok(())
    }

    fn read_register(&mut self, reg: RegAddr) -> Result<u8, Pcf85x63Error<I2C::Error>> {
        let mut data = [0];
        self.read_registers(reg, &mut data)?;
        Ok(data[0])
    }

    fn write_register(
        &mut self,
        reg: RegAddr,
        value: u8,
    ) -> Result<(), Pcf85x63Error<I2C::Error>> {
        self.i2c.write(self.address, &[reg as u8, value])?;
        Ok(())
    }

    // Read-modify-write. The write is always issued so that the sequence of
    // writes does not depend on what the register held.
    fn update_register(
        &mut self,
        reg: RegAddr,
        mask: u8,
        value: u8,
    ) -> Result<(), Pcf85x63Error<I2C::Error>> {
        let old = self.read_register(reg)?;
        let new = update_bits(old, mask, value);
        debug!("{:?}: {:#x} -> {:#x}", reg, old, new);
        self.write_register(reg, new)
    }

    fn require_alarm(&self) -> Result<(), Pcf85x63Error<I2C::Error>> {
        if self.variant.has_alarm() {
            Ok(())
        } else {
            Err(Pcf85x63Error::AlarmUnsupported)
        }
    }

    /// Configures the INTA pin according to the provided configuration.
    ///
    /// # Arguments
    /// * `config` - The configuration to apply
    ///
    /// # Returns
    /// * `Ok(())` on success
    /// * `Err(Pcf85x63Error)` on error
    pub fn configure(&mut self, config: &Config) -> Result<(), Pcf85x63Error<I2C::Error>> {
        debug!("configure: {:?}", config);
        let mut pin_io = self.pin_io()?;
        pin_io.set_inta_pin_mode(config.inta_pin_mode);
        self.set_pin_io(pin_io)?;

        let mut int_a = self.interrupt_a_enable()?;
        int_a.set_level(config.level_interrupt);
        self.set_interrupt_a_enable(int_a)?;
        Ok(())
    }

    /// Reads the current time.
    ///
    /// # Returns
    /// * `Ok(WallClockTime)` - The current time
    /// * `Err(Pcf85x63Error::CorruptRegisterData)` if a register is not valid BCD
    /// * `Err(Pcf85x63Error::I2c)` on bus error
    pub fn read_time(&mut self) -> Result<WallClockTime, Pcf85x63Error<I2C::Error>> {
        let mut data = [0; DATETIME_LEN];
        self.read_registers(RegAddr::Hundredths, &mut data)?;
        WallClockTime::decode(&data).map_err(Pcf85x63Error::codec)
    }

    /// Sets the time.
    ///
    /// Counting is stopped and the prescaler cleared in one transaction, the
    /// eight date/time registers are written in a second one, and counting is
    /// resumed in a third.
    ///
    /// # Returns
    /// * `Ok(())` on success
    /// * `Err(Pcf85x63Error::DateTime)` if `time` is invalid; nothing is written
    /// * `Err(Pcf85x63Error::I2c)` if stopping the clock failed; the clock is
    ///   unaffected
    /// * `Err(Pcf85x63Error::StoppedClock)` if a later step failed; the clock
    ///   is left stopped
    pub fn set_time(&mut self, time: &WallClockTime) -> Result<(), Pcf85x63Error<I2C::Error>> {
        let regs = time.encode().map_err(Pcf85x63Error::codec)?;
        let mut frame = [0u8; 1 + DATETIME_LEN];
        frame[0] = RegAddr::Hundredths as u8;
        frame[1..].copy_from_slice(&regs);

        debug!("set_time: stopping clock");
        self.i2c.write(
            self.address,
            &[RegAddr::StopEnable as u8, STOP_EN_STOP, RESET_CPR],
        )?;

        if let Err(e) = self.i2c.write(self.address, &frame) {
            error!("set_time: time write failed, clock left stopped");
            return Err(Pcf85x63Error::StoppedClock(e));
        }

        if let Err(e) = self.i2c.write(self.address, &[RegAddr::StopEnable as u8, 0]) {
            error!("set_time: resume failed, clock left stopped");
            return Err(Pcf85x63Error::StoppedClock(e));
        }
        debug!("set_time: {:?}", time);
        Ok(())
    }

    /// Clears the stop bit, resuming time counting.
    ///
    /// This is the recovery step after [`Pcf85x63Error::StoppedClock`].
    pub fn resume(&mut self) -> Result<(), Pcf85x63Error<I2C::Error>> {
        self.set_stop_enable(StopEnable::default())
    }

    /// Returns `true` if the oscillator has stopped since the time was last
    /// set, meaning the time can not be trusted.
    pub fn oscillator_stopped(&mut self) -> Result<bool, Pcf85x63Error<I2C::Error>> {
        let seconds = Seconds(self.read_register(RegAddr::Seconds)?);
        Ok(seconds.oscillator_stopped())
    }

    /// Gets the current date and time as a chrono `NaiveDateTime`.
    pub fn datetime(&mut self) -> Result<NaiveDateTime, Pcf85x63Error<I2C::Error>> {
        self.read_time()?.to_datetime().map_err(Pcf85x63Error::codec)
    }

    /// Sets the current date and time from a chrono `NaiveDateTime`.
    ///
    /// The weekday register is set from the date (Sunday = 0).
    pub fn set_datetime(
        &mut self,
        datetime: &NaiveDateTime,
    ) -> Result<(), Pcf85x63Error<I2C::Error>> {
        let time = WallClockTime::from_datetime(datetime).map_err(Pcf85x63Error::codec)?;
        self.set_time(&time)
    }

    /// Reads the alarm 1 match fields and whether its interrupt is enabled.
    ///
    /// # Returns
    /// * `Ok((Alarm1, bool))` - The match fields and the interrupt enable
    /// * `Err(Pcf85x63Error)` on error
    pub fn read_alarm(&mut self) -> Result<(Alarm1, bool), Pcf85x63Error<I2C::Error>> {
        self.require_alarm()?;
        let mut data = [0; ALARM1_LEN];
        self.read_registers(RegAddr::Alarm1Seconds, &mut data)?;
        let alarm = Alarm1::decode(&data).map_err(Pcf85x63Error::codec)?;
        let enabled = self.interrupt_a_enable()?.alarm1();
        Ok((alarm, enabled))
    }

    /// Enables or disables alarm 1.
    ///
    /// The five field enables and the interrupt enable are always cleared
    /// first. Disabling then clears a pending alarm 1 flag; enabling sets the
    /// field enables and then the interrupt enable, and leaves the flag alone.
    pub fn set_alarm_interrupt_enabled(
        &mut self,
        enabled: bool,
    ) -> Result<(), Pcf85x63Error<I2C::Error>> {
        self.require_alarm()?;
        debug!("alarm interrupt enabled={}", enabled);
        for step in alarm::enable_sequence(enabled) {
            self.update_register(step.reg, step.mask, step.value)?;
        }
        Ok(())
    }

    /// Writes the alarm 1 match fields and sets the final enable state.
    ///
    /// The alarm is disabled before the match registers are written.
    ///
    /// # Returns
    /// * `Ok(())` on success
    /// * `Err(Pcf85x63Error::Alarm)` if `alarm` is invalid; nothing is written
    /// * `Err(Pcf85x63Error::I2c)` if any step failed. If disabling failed the
    ///   match registers are untouched; if writing them failed the alarm is
    ///   left disabled where possible.
    pub fn set_alarm(
        &mut self,
        alarm: &Alarm1,
        enabled: bool,
    ) -> Result<(), Pcf85x63Error<I2C::Error>> {
        self.require_alarm()?;
        let regs = alarm.encode().map_err(Pcf85x63Error::Alarm)?;
        let mut frame = [0u8; 1 + ALARM1_LEN];
        frame[0] = RegAddr::Alarm1Seconds as u8;
        frame[1..].copy_from_slice(&regs);

        self.set_alarm_interrupt_enabled(false)?;

        if let Err(e) = self.i2c.write(self.address, &frame) {
            error!("set_alarm: match write failed, disabling alarm");
            // best effort, the write error is the one reported
            let _ = self.set_alarm_interrupt_enabled(false);
            return Err(Pcf85x63Error::I2c(e));
        }

        self.set_alarm_interrupt_enabled(enabled)
    }

    /// Checks for and acknowledges an alarm 1 event.
    ///
    /// Reads the flags register once. If the alarm 1 flag is set it is
    /// cleared, leaving every other flag as read, and
    /// [`Event::AlarmFired`] is returned. Otherwise nothing is written.
    ///
    /// # Returns
    /// * `Ok(Event)` on success
    /// * `Err(Pcf85x63Error::I2c)` if reading the flags failed; no event is
    ///   reported
    /// * `Err(Pcf85x63Error::AckFailed)` if the alarm fired but the flag could
    ///   not be cleared
    pub fn poll_interrupt(&mut self) -> Result<Event, Pcf85x63Error<I2C::Error>> {
        self.require_alarm()?;
        let mut flags = self.flags()?;
        if !flags.alarm1() {
            return Ok(Event::NoEvent);
        }
        debug!("alarm 1 fired, flags={:#x}", flags.0);
        flags.set_alarm1(false);
        if let Err(e) = self.i2c.write(self.address, &[RegAddr::Flags as u8, flags.0]) {
            error!("alarm 1 fired, acknowledge failed");
            return Err(Pcf85x63Error::AckFailed(e));
        }
        Ok(Event::AlarmFired)
    }

    /// Reads `buf.len()` bytes of RAM starting at `offset`.
    ///
    /// # Returns
    /// * `Ok(())` on success
    /// * `Err(Pcf85x63Error::OutOfBounds)` if the range does not fit; no bus
    ///   traffic takes place
    /// * `Err(Pcf85x63Error::I2c)` on bus error
    pub fn read_nvram(
        &mut self,
        offset: usize,
        buf: &mut [u8],
    ) -> Result<(), Pcf85x63Error<I2C::Error>> {
        let start = nvram::start_register(&self.variant, offset, buf.len())
            .ok_or(Pcf85x63Error::OutOfBounds)?;
        if buf.is_empty() {
            return Ok(());
        }
        self.i2c.write_read(self.address, &[start], buf)?;
        Ok(())
    }

    /// Writes `data` to RAM starting at `offset`.
    ///
    /// # Returns
    /// * `Ok(())` on success
    /// * `Err(Pcf85x63Error::OutOfBounds)` if the range does not fit; no bus
    ///   traffic takes place
    /// * `Err(Pcf85x63Error::I2c)` on bus error; the RAM may be partially written
    pub fn write_nvram(
        &mut self,
        offset: usize,
        data: &[u8],
    ) -> Result<(), Pcf85x63Error<I2C::Error>> {
        let start = nvram::start_register(&self.variant, offset, data.len())
            .ok_or(Pcf85x63Error::OutOfBounds)?;
        if data.is_empty() {
            return Ok(());
        }
        let (frame, len) = nvram::write_frame(start, data);
        self.i2c.write(self.address, &frame[..len])?;
        Ok(())
    }
}

// Register access implementations
macro_rules! impl_register_access {
    ($(($name:ident, $regaddr:expr, $typ:ty)),+) => {
        impl<I2C: I2c> Pcf85x63<I2C> {
            $(
                paste! {
                    #[doc = concat!("Gets the value of the ", stringify!($name), " register.")]
                    #[doc = "\n\n# Returns"]
                    #[doc = concat!("* `Ok(", stringify!($typ), ")` - The register value on success")]
                    #[doc = "* `Err(Pcf85x63Error)` on error"]
                    pub fn $name(&mut self) -> Result<$typ, Pcf85x63Error<I2C::Error>> {
                        Ok(<$typ>::from(self.read_register($regaddr)?))
                    }

                    #[doc = concat!("Sets the value of the ", stringify!($name), " register.")]
                    #[doc = "\n\n# Arguments"]
                    #[doc = concat!("* `value` - The value to write to the ", stringify!($name), " register")]
                    #[doc = "\n\n# Returns"]
                    #[doc = "* `Ok(())` on success"]
                    #[doc = "* `Err(Pcf85x63Error)` on error"]
                    pub fn [<set_ $name>](&mut self, value: $typ) -> Result<(), Pcf85x63Error<I2C::Error>> {
                        self.write_register($regaddr, value.into())
                    }
                }
            )+
        }
    }
}

impl_register_access!(
    (alarm_enables, RegAddr::AlarmEnables, AlarmEnables),
    (pin_io, RegAddr::PinIo, PinIo),
    (interrupt_a_enable, RegAddr::InterruptAEnable, InterruptEnables),
    (flags, RegAddr::Flags, Flags),
    (stop_enable, RegAddr::StopEnable, StopEnable)
);
