//! Async implementation of the PCF85263/PCF85363 driver.
//!
//! This module provides an async interface to the RTC using
//! `embedded-hal-async` traits. It is only available when the `async` feature
//! is enabled. Register sequencing, validation and error reporting are the
//! same as for the blocking [`crate::Pcf85x63`].
//!
//! # Example
//!
//! ```rust,ignore
//! use pcf85x63::asynch::Pcf85x63;
//! use pcf85x63::{DeviceVariant, Event, DEFAULT_ADDRESS};
//!
//! let mut rtc = Pcf85x63::new(i2c, DEFAULT_ADDRESS, DeviceVariant::PCF85363);
//! let time = rtc.read_time().await?;
//!
//! if rtc.poll_interrupt().await? == Event::AlarmFired {
//!     // ...
//! }
//! ```

use chrono::NaiveDateTime;
use embedded_hal_async::i2c::I2c;
use paste::paste;

use crate::{
    alarm, nvram, update_bits, Alarm1, AlarmEnables, Config, DeviceVariant, Event, Flags,
    InterruptEnables, Pcf85x63Error, PinIo, RegAddr, Seconds, StopEnable, WallClockTime,
    ALARM1_LEN, DATETIME_LEN, RESET_CPR, STOP_EN_STOP,
};

/// PCF85263/PCF85363 Real-Time Clock async driver.
///
/// Operations take `&mut self`, so a single instance never interleaves two
/// register sequences.
pub struct Pcf85x63<I2C: I2c> {
    i2c: I2C,
    address: u8,
    variant: DeviceVariant,
}

impl<I2C: I2c> Pcf85x63<I2C> {
    /// Creates a new async driver instance.
    ///
    /// # Arguments
    /// * `i2c` - The async I2C bus implementation
    /// * `address` - The I2C address of the device (typically 0x51)
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

    async fn read_register(&mut self, reg: RegAddr) -> Result<u8, Pcf85x63Error<I2C::Error>> {
        let mut data = [0];
        self.i2c
            .write_read(self.address, &[reg as u8], &mut data)
            .await?;
        Ok(data[0])
    }

    async fn write_register(
        &mut self,
        reg: RegAddr,
        value: u8,
    ) -> Result<(), Pcf85x63Error<I2C::Error>> {
        self.i2c.write(self.address, &[reg as u8, value]).await?;
        Ok(())
    }

    async fn update_register(
        &mut self,
        reg: RegAddr,
        mask: u8,
        value: u8,
    ) -> Result<(), Pcf85x63Error<I2C::Error>> {
        let old = self.read_register(reg).await?;
        let new = update_bits(old, mask, value);
        debug!("{:?}: {:#x} -> {:#x}", reg, old, new);
        self.write_register(reg, new).await
    }

    fn require_alarm(&self) -> Result<(), Pcf85x63Error<I2C::Error>> {
        if self.variant.has_alarm() {
            Ok(())
        } else {
            Err(Pcf85x63Error::AlarmUnsupported)
        }
    }

    /// Configures the INTA pin according to the provided configuration.
    pub async fn configure(&mut self, config: &Config) -> Result<(), Pcf85x63Error<I2C::Error>> {
        debug!("configure: {:?}", config);
        let mut pin_io = self.pin_io().await?;
        pin_io.set_inta_pin_mode(config.inta_pin_mode);
        self.set_pin_io(pin_io).await?;

        let mut int_a = self.interrupt_a_enable().await?;
        int_a.set_level(config.level_interrupt);
        self.set_interrupt_a_enable(int_a).await?;
        Ok(())
    }

    /// Reads the current time asynchronously.
    pub async fn read_time(&mut self) -> Result<WallClockTime, Pcf85x63Error<I2C::Error>> {
        let mut data = [0; DATETIME_LEN];
        self.i2c
            .write_read(self.address, &[RegAddr::Hundredths as u8], &mut data)
            .await?;
        WallClockTime::decode(&data).map_err(Pcf85x63Error::codec)
    }

    /// Sets the time asynchronously.
    ///
    /// See [`crate::Pcf85x63::set_time`] for the write sequence and failure
    /// reporting.
    pub async fn set_time(
        &mut self,
        time: &WallClockTime,
    ) -> Result<(), Pcf85x63Error<I2C::Error>> {
        let regs = time.encode().map_err(Pcf85x63Error::codec)?;
        let mut frame = [0u8; 1 + DATETIME_LEN];
        frame[0] = RegAddr::Hundredths as u8;
        frame[1..].copy_from_slice(&regs);

        debug!("set_time: stopping clock");
        self.i2c
            .write(
                self.address,
                &[RegAddr::StopEnable as u8, STOP_EN_STOP, RESET_CPR],
            )
            .await?;

        if let Err(e) = self.i2c.write(self.address, &frame).await {
            error!("set_time: time write failed, clock left stopped");
            return Err(Pcf85x63Error::StoppedClock(e));
        }

        if let Err(e) = self
            .i2c
            .write(self.address, &[RegAddr::StopEnable as u8, 0])
            .await
        {
            error!("set_time: resume failed, clock left stopped");
            return Err(Pcf85x63Error::StoppedClock(e));
        }
        debug!("set_time: {:?}", time);
        Ok(())
    }

    /// Clears the stop bit, resuming time counting.
    pub async fn resume(&mut self) -> Result<(), Pcf85x63Error<I2C::Error>> {
        self.set_stop_enable(StopEnable::default()).await
    }

    /// Returns `true` if the oscillator has stopped since the time was last set.
    pub async fn oscillator_stopped(&mut self) -> Result<bool, Pcf85x63Error<I2C::Error>> {
        let seconds = Seconds(self.read_register(RegAddr::Seconds).await?);
        Ok(seconds.oscillator_stopped())
    }

    /// Gets the current date and time as a chrono `NaiveDateTime`.
    pub async fn datetime(&mut self) -> Result<NaiveDateTime, Pcf85x63Error<I2C::Error>> {
        self.read_time().await?.to_datetime().map_err(Pcf85x63Error::codec)
    }

    /// Sets the current date and time from a chrono `NaiveDateTime`.
    pub async fn set_datetime(
        &mut self,
        datetime: &NaiveDateTime,
    ) -> Result<(), Pcf85x63Error<I2C::Error>> {
        let time = WallClockTime::from_datetime(datetime).map_err(Pcf85x63Error::codec)?;
        self.set_time(&time).await
    }

    /// Reads the alarm 1 match fields and whether its interrupt is enabled.
    pub async fn read_alarm(&mut self) -> Result<(Alarm1, bool), Pcf85x63Error<I2C::Error>> {
        self.require_alarm()?;
        let mut data = [0; ALARM1_LEN];
        self.i2c
            .write_read(self.address, &[RegAddr::Alarm1Seconds as u8], &mut data)
            .await?;
        let alarm = Alarm1::decode(&data).map_err(Pcf85x63Error::codec)?;
        let enabled = self.interrupt_a_enable().await?.alarm1();
        Ok((alarm, enabled))
    }

    /// Enables or disables alarm 1, always passing through the disabled state.
    pub async fn set_alarm_interrupt_enabled(
        &mut self,
        enabled: bool,
    ) -> Result<(), Pcf85x63Error<I2C::Error>> {
        self.require_alarm()?;
        debug!("alarm interrupt enabled={}", enabled);
        for step in alarm::enable_sequence(enabled) {
            self.update_register(step.reg, step.mask, step.value).await?;
        }
        Ok(())
    }

    /// Writes the alarm 1 match fields and sets the final enable state.
    pub async fn set_alarm(
        &mut self,
        alarm: &Alarm1,
        enabled: bool,
    ) -> Result<(), Pcf85x63Error<I2C::Error>> {
        self.require_alarm()?;
        let regs = alarm.encode().map_err(Pcf85x63Error::Alarm)?;
        let mut frame = [0u8; 1 + ALARM1_LEN];
        frame[0] = RegAddr::Alarm1Seconds as u8;
        frame[1..].copy_from_slice(&regs);

        self.set_alarm_interrupt_enabled(false).await?;

        if let Err(e) = self.i2c.write(self.address, &frame).await {
            error!("set_alarm: match write failed, disabling alarm");
            let _ = self.set_alarm_interrupt_enabled(false).await;
            return Err(Pcf85x63Error::I2c(e));
        }

        self.set_alarm_interrupt_enabled(enabled).await
    }

    /// Checks for and acknowledges an alarm 1 event.
    ///
    /// A fired alarm whose flag could not be cleared is reported as
    /// [`Pcf85x63Error::AckFailed`].
    pub async fn poll_interrupt(&mut self) -> Result<Event, Pcf85x63Error<I2C::Error>> {
        self.require_alarm()?;
        let mut flags = self.flags().await?;
        if !flags.alarm1() {
            return Ok(Event::NoEvent);
        }
        debug!("alarm 1 fired, flags={:#x}", flags.0);
        flags.set_alarm1(false);
        if let Err(e) = self
            .i2c
            .write(self.address, &[RegAddr::Flags as u8, flags.0])
            .await
        {
            error!("alarm 1 fired, acknowledge failed");
            return Err(Pcf85x63Error::AckFailed(e));
        }
        Ok(Event::AlarmFired)
    }

    /// Reads `buf.len()` bytes of RAM starting at `offset`.
    pub async fn read_nvram(
        &mut self,
        offset: usize,
        buf: &mut [u8],
    ) -> Result<(), Pcf85x63Error<I2C::Error>> {
        let start = nvram::start_register(&self.variant, offset, buf.len())
            .ok_or(Pcf85x63Error::OutOfBounds)?;
        if buf.is_empty() {
            return Ok(());
        }
        self.i2c.write_read(self.address, &[start], buf).await?;
        Ok(())
    }

    /// Writes `data` to RAM starting at `offset`.
    pub async fn write_nvram(
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
        self.i2c.write(self.address, &frame[..len]).await?;
        Ok(())
    }
}

// Register access implementations
macro_rules! impl_register_access {
    ($(($name:ident, $regaddr:expr, $typ:ty)),+) => {
        impl<I2C: I2c> Pcf85x63<I2C> {
            $(
                paste! {
                    #[doc = concat!("Gets the value of the ", stringify!($name), " register asynchronously.")]
                    #[doc = "\n\n# Returns"]
                    #[doc = concat!("* `Ok(", stringify!($typ), ")` - The register value on success")]
                    #[doc = "* `Err(Pcf85x63Error)` on error"]
                    pub async fn $name(&mut self) -> Result<$typ, Pcf85x63Error<I2C::Error>> {
                        Ok(<$typ>::from(self.read_register($regaddr).await?))
                    }

                    #[doc = concat!("Sets the value of the ", stringify!($name), " register asynchronously.")]
                    #[doc = "\n\n# Arguments"]
                    #[doc = concat!("* `value` - The value to write to the ", stringify!($name), " register")]
                    #[doc = "\n\n# Returns"]
                    #[doc = "* `Ok(())` on success"]
                    #[doc = "* `Err(Pcf85x63Error)` on error"]
                    pub async fn [<set_ $name>](&mut self, value: $typ) -> Result<(), Pcf85x63Error<I2C::Error>> {
                        self.write_register($regaddr, value.into()).await
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
