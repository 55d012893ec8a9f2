use std::io::{Cursor, Read, Write};
use std::net::TcpStream;
use std::time::Duration;
use byteorder::{BigEndian, ReadBytesExt};

use super::constants::*;
use super::error::Th2eError;
use super::sensor::SpinelLink;

/// A single channel record from the read-all response
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelReading {
    pub channel: u8,
    pub status: u8,
    pub value: f64
}

/// The three quantities measured by the probe
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Readings {
    pub temperature: f64,
    pub humidity: f64,
    pub dew_point: f64
}

fn channel_name(channel: u8) -> &'static str {
    match channel {
        CHANNEL_TEMPERATURE => "Temperature",
        CHANNEL_HUMIDITY => "Humidity",
        CHANNEL_DEW_POINT => "Dew Point",
        _ => "Unknown"
    }
}

/// Split the read-all payload into channel records. A trailing partial record is ignored.
pub fn parse_readings(data: &[u8]) -> Result<Vec<ChannelReading>, Th2eError> {
    let mut readings: Vec<ChannelReading> = Vec::with_capacity(data.len() / READING_SIZE);
    for record in data.chunks_exact(READING_SIZE) {
        let mut cursor = Cursor::new(record);
        let channel = cursor.read_u8()?;
        let status = cursor.read_u8()?;
        let raw = cursor.read_i16::<BigEndian>()?;
        readings.push(ChannelReading { channel, status, value: raw as f64 / READING_SCALE });
    }
    Ok(readings)
}

/// Source of environmental readings used to annotate acquisitions
pub trait Environment {
    fn read_environment(&mut self) -> Result<Readings, Th2eError>;
}

/// # Th2e
/// Papouch TH2E temperature/humidity probe. All reads go through the read-all instruction;
/// the single-quantity reads pick their channel out of that response.
#[derive(Debug)]
pub struct Th2e<T: Read + Write> {
    link: SpinelLink<T>
}

impl Th2e<TcpStream> {
    pub fn connect(ip: &str, port: u16, timeout: Duration) -> Result<Self, Th2eError> {
        Ok(Th2e { link: SpinelLink::connect(ip, port, timeout)? })
    }
}

impl<T: Read + Write> Th2e<T> {

    pub fn new(link: SpinelLink<T>) -> Self {
        Th2e { link }
    }

    pub fn read_channels(&mut self) -> Result<Vec<ChannelReading>, Th2eError> {
        let data = self.link.query(INST_READ_ALL, &[0x00])?;
        parse_readings(&data)
    }

    fn read_channel(&mut self, channel: u8) -> Result<f64, Th2eError> {
        match self.read_channels()?.into_iter().find(|r| r.channel == channel) {
            Some(reading) => Ok(reading.value),
            None => Err(Th2eError::MissingChannel(channel_name(channel)))
        }
    }

    pub fn read_temp(&mut self) -> Result<f64, Th2eError> {
        self.read_channel(CHANNEL_TEMPERATURE)
    }

    pub fn read_hum(&mut self) -> Result<f64, Th2eError> {
        self.read_channel(CHANNEL_HUMIDITY)
    }

    pub fn read_dew(&mut self) -> Result<f64, Th2eError> {
        self.read_channel(CHANNEL_DEW_POINT)
    }

    /// Temperature, humidity and dew point from a single query
    pub fn read_all(&mut self) -> Result<Readings, Th2eError> {
        let channels = self.read_channels()?;
        let find = |channel: u8| -> Result<f64, Th2eError> {
            channels.iter()
                .find(|r| r.channel == channel)
                .map(|r| r.value)
                .ok_or(Th2eError::MissingChannel(channel_name(channel)))
        };
        Ok(Readings {
            temperature: find(CHANNEL_TEMPERATURE)?,
            humidity: find(CHANNEL_HUMIDITY)?,
            dew_point: find(CHANNEL_DEW_POINT)?
        })
    }

    pub fn reset(&mut self) -> Result<(), Th2eError> {
        self.link.instruct(INST_RESET, &[])?;
        Ok(())
    }
}

impl<T: Read + Write> Environment for Th2e<T> {
    fn read_environment(&mut self) -> Result<Readings, Th2eError> {
        self.read_all()
    }
}

/// What a one-off probe query should do. Nothing selected means a full reading.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ReadSelection {
    pub temperature: bool,
    pub humidity: bool,
    pub dew_point: bool,
    pub reset: bool
}

/// Query the probe once and print the selected quantities. A reset is sent before any read.
pub fn report<T: Read + Write, W: Write>(sensor: &mut Th2e<T>, selection: &ReadSelection, output: &mut W) -> Result<(), Th2eError> {
    if selection.reset {
        sensor.reset()?;
        writeln!(output, "TH2E reset")?;
    }
    let any_read = selection.temperature || selection.humidity || selection.dew_point;
    if !any_read {
        if !selection.reset {
            let readings = sensor.read_all()?;
            writeln!(output, "Temperature: {} C", readings.temperature)?;
            writeln!(output, "Humidity: {} %", readings.humidity)?;
            writeln!(output, "Dew Point: {} C", readings.dew_point)?;
        }
        return Ok(());
    }
    if selection.temperature {
        writeln!(output, "Temperature: {} C", sensor.read_temp()?)?;
    }
    if selection.humidity {
        writeln!(output, "Humidity: {} %", sensor.read_hum()?)?;
    }
    if selection.dew_point {
        writeln!(output, "Dew Point: {} C", sensor.read_dew()?)?;
    }
    Ok(())
}
