//! Sensirion SHTC3 temperature / humidity sensor over I2C.
//!
//! Each read wakes the part, runs one normal-power measurement
//! (temperature first, no clock stretching), validates both CRC-8 words
//! and puts the part back to sleep.
//!
//! ## Dual-target design
//!
//! Generic over `embedded-hal` 1.0 `I2c` + `DelayNs`: on ESP-IDF the
//! esp-idf-hal I2C driver is plugged in; on host the integration tests
//! use a scripted bus.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;
use log::warn;

use super::{ClimateReading, ClimateSensor};
use crate::error::SensorError;

/// Fixed 7-bit I2C address.
pub const SHTC3_ADDR: u8 = 0x70;

const CMD_WAKEUP: [u8; 2] = [0x35, 0x17];
const CMD_SLEEP: [u8; 2] = [0xB0, 0x98];
const CMD_MEASURE_T_FIRST: [u8; 2] = [0x78, 0x66];
const CMD_READ_ID: [u8; 2] = [0xEF, 0xC8];

/// Wake-up time after CMD_WAKEUP (µs, datasheet max).
const WAKEUP_US: u32 = 240;
/// Normal-mode measurement time (µs, datasheet max).
const MEASURE_US: u32 = 12_100;

const ID_MASK: u16 = 0x083F;
const ID_MATCH: u16 = 0x0807;

/// CRC-8, polynomial 0x31, init 0xFF (Sensirion).
pub fn crc8(data: &[u8]) -> u8 {
    let mut crc: u8 = 0xFF;
    for &byte in data {
        crc ^= byte;
        for _ in 0..8 {
            crc = if crc & 0x80 != 0 {
                (crc << 1) ^ 0x31
            } else {
                crc << 1
            };
        }
    }
    crc
}

/// Convert a raw temperature word to °C.
pub fn raw_to_celsius(raw: u16) -> f32 {
    -45.0 + 175.0 * (raw as f32 / 65_536.0)
}

/// Convert a raw humidity word to %RH.
pub fn raw_to_humidity(raw: u16) -> f32 {
    100.0 * (raw as f32 / 65_536.0)
}

/// Split a `[msb, lsb, crc]` triple into a checked word.
fn checked_word(chunk: &[u8]) -> Result<u16, SensorError> {
    if crc8(&chunk[..2]) != chunk[2] {
        return Err(SensorError::CrcMismatch);
    }
    Ok(u16::from_be_bytes([chunk[0], chunk[1]]))
}

pub struct Shtc3<I2C, D> {
    i2c: I2C,
    delay: D,
    name: &'static str,
    last: Option<ClimateReading>,
}

impl<I2C: I2c, D: DelayNs> Shtc3<I2C, D> {
    pub fn new(i2c: I2C, delay: D, name: &'static str) -> Self {
        Self {
            i2c,
            delay,
            name,
            last: None,
        }
    }

    /// Verify the part answers with an SHTC3 product code.
    pub fn probe(&mut self) -> Result<u16, SensorError> {
        self.wake()?;
        let mut buf = [0u8; 3];
        self.i2c
            .write_read(SHTC3_ADDR, &CMD_READ_ID, &mut buf)
            .map_err(|_| SensorError::BusError)?;
        let id = checked_word(&buf)?;
        self.sleep();
        if id & ID_MASK == ID_MATCH {
            Ok(id)
        } else {
            warn!("{}: unexpected SHTC3 id 0x{:04X}", self.name, id);
            Err(SensorError::NotDetected)
        }
    }

    fn wake(&mut self) -> Result<(), SensorError> {
        self.i2c
            .write(SHTC3_ADDR, &CMD_WAKEUP)
            .map_err(|_| SensorError::BusError)?;
        self.delay.delay_us(WAKEUP_US);
        Ok(())
    }

    fn sleep(&mut self) {
        // A part that misses the sleep command just draws more current.
        if self.i2c.write(SHTC3_ADDR, &CMD_SLEEP).is_err() {
            warn!("{}: sleep command failed", self.name);
        }
    }

    fn measure(&mut self) -> Result<ClimateReading, SensorError> {
        self.wake()?;
        self.i2c
            .write(SHTC3_ADDR, &CMD_MEASURE_T_FIRST)
            .map_err(|_| SensorError::BusError)?;
        self.delay.delay_us(MEASURE_US);

        let mut buf = [0u8; 6];
        self.i2c
            .read(SHTC3_ADDR, &mut buf)
            .map_err(|_| SensorError::BusError)?;
        self.sleep();

        let t_raw = checked_word(&buf[0..3])?;
        let rh_raw = checked_word(&buf[3..6])?;
        Ok(ClimateReading {
            temperature_c: raw_to_celsius(t_raw),
            humidity_pct: raw_to_humidity(rh_raw),
        })
    }

    /// Release the bus and delay provider.
    pub fn release(self) -> (I2C, D) {
        (self.i2c, self.delay)
    }
}

impl<I2C: I2c, D: DelayNs> ClimateSensor for Shtc3<I2C, D> {
    fn read(&mut self) -> Result<ClimateReading, SensorError> {
        let reading = self.measure()?;
        self.last = Some(reading);
        Ok(reading)
    }

    fn last_reading(&self) -> Option<ClimateReading> {
        self.last
    }
}
