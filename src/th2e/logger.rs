use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use super::constants::READINGS_FILE_NAME;
use super::device::{Readings, Th2e};
use super::error::Th2eError;
use crate::pacing::{is_stopped, wait_until_elapsed, StopFlag, POLL_INTERVAL};

const HEADER: &str = "Time\tTemperature\tHumidity\tDew Point";

/// Seconds since the epoch with millisecond resolution
fn unix_time() -> f64 {
    chrono::Utc::now().timestamp_millis() as f64 / 1000.0
}

pub fn format_line(time: f64, readings: &Readings) -> String {
    format!("{:.3}\t{}\t{}\t{}", time, readings.temperature, readings.humidity, readings.dew_point)
}

/// # ReadingsFile
/// Tab separated log of TH2E readings. The header is only written when the file is created,
/// so successive sessions append to the same log.
#[derive(Debug)]
pub struct ReadingsFile {
    file: File,
    path: PathBuf
}

impl ReadingsFile {

    pub fn open(directory: &Path) -> Result<Self, std::io::Error> {
        std::fs::create_dir_all(directory)?;
        let path = directory.join(READINGS_FILE_NAME);
        let is_new = !path.exists();
        let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
        if is_new {
            writeln!(file, "{}", HEADER)?;
        }
        Ok(ReadingsFile { file, path })
    }

    pub fn append(&mut self, time: f64, readings: &Readings) -> Result<(), std::io::Error> {
        writeln!(self.file, "{}", format_line(time, readings))?;
        self.file.flush()
    }

    pub fn get_path(&self) -> &Path {
        &self.path
    }
}

/// Poll the probe every `delay` until the stop flag is raised. Returns the number of readings logged.
pub fn run_read_loop<T: Read + Write>(sensor: &mut Th2e<T>, directory: &Path, delay: Duration, quit: &StopFlag) -> Result<u64, Th2eError> {
    let mut log_file = ReadingsFile::open(directory)?;
    log::info!("Writing TH2E readings to {}", log_file.get_path().display());
    println!("\n\tThe following sensors are being monitored, press ctrl-c to stop...");
    println!("{}", HEADER);

    let mut count: u64 = 0;
    loop {
        if is_stopped(quit) {
            break;
        }
        let last_read = Instant::now();
        let time = unix_time();
        match sensor.read_all() {
            Ok(readings) => {
                print!("\r{}", format_line(time, &readings));
                std::io::stdout().flush()?;
                log_file.append(time, &readings)?;
                count += 1;
            }
            Err(Th2eError::MissingChannel(name)) => log::warn!("{} missing from TH2E response, skipping reading", name),
            Err(e) => return Err(e)
        }
        if !wait_until_elapsed(last_read, delay, POLL_INTERVAL, quit) {
            break;
        }
    }
    println!();
    log::info!("TH2E monitoring stopped after {} readings.", count);
    Ok(count)
}
