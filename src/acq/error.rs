use std::fmt::Display;
use std::path::PathBuf;
use std::error::Error;

use crate::th2e::error::Th2eError;

/*
    Metadata errors
 */
#[derive(Debug)]
pub enum MetadataError {
    BadFilePath(PathBuf),
    IOError(std::io::Error),
    Malformed(usize, String)
}

impl From<std::io::Error> for MetadataError {
    fn from(value: std::io::Error) -> Self {
        MetadataError::IOError(value)
    }
}

impl Display for MetadataError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BadFilePath(path) => write!(f, "Metadata file {} does not exist!", path.display()),
            Self::IOError(e) => write!(f, "Metadata received an io error: {}", e),
            Self::Malformed(line, text) => write!(f, "Metadata line {} is malformed, expected 'key = value': {}", line, text)
        }
    }
}

impl Error for MetadataError {

}

/*
    Acquisition group errors
 */
#[derive(Debug)]
pub enum GroupError {
    Empty,
    MissingBpm(String),
    ParsingError(std::num::ParseIntError)
}

impl From<std::num::ParseIntError> for GroupError {
    fn from(value: std::num::ParseIntError) -> Self {
        GroupError::ParsingError(value)
    }
}

impl Display for GroupError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "No acquisition group found! Expected [BOARD, BPM, BPM]"),
            Self::MissingBpm(group) => write!(f, "Acquisition group [{}] has no BPM number!", group),
            Self::ParsingError(e) => write!(f, "Acquisition group received a parsing error: {}", e)
        }
    }
}

impl Error for GroupError {

}

/*
    Run errors. The first three are recoverable: the caller skips and moves on.
 */
#[derive(Debug)]
pub enum RunError {
    OverPower(f64),
    BoardTimeout,
    RffeTimeout,
    IOError(std::io::Error),
    ClientError(String),
    MetadataError(MetadataError)
}

impl RunError {
    pub fn is_skippable(&self) -> bool {
        matches!(self, Self::OverPower(_) | Self::BoardTimeout | Self::RffeTimeout)
    }
}

impl From<std::io::Error> for RunError {
    fn from(value: std::io::Error) -> Self {
        RunError::IOError(value)
    }
}

impl From<MetadataError> for RunError {
    fn from(value: MetadataError) -> Self {
        RunError::MetadataError(value)
    }
}

impl Display for RunError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OverPower(level) => write!(f, "The power level {} dBm will damage the RFFE!", level),
            Self::BoardTimeout => write!(f, "The board doesn't respond!"),
            Self::RffeTimeout => write!(f, "The RFFE board doesn't respond!"),
            Self::IOError(e) => write!(f, "Acquisition received an io error: {}", e),
            Self::ClientError(msg) => write!(f, "Acquisition client failed: {}", msg),
            Self::MetadataError(e) => write!(f, "Acquisition received a metadata error: {}", e)
        }
    }
}

impl Error for RunError {

}

/*
    Sweep errors
 */
#[derive(Debug)]
pub enum SweepError {
    BadRange(i32, i32, i32)
}

impl Display for SweepError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BadRange(start, stop, step) => write!(f, "Sweep from {} to {} with step {} never reaches its end!", start, stop, step)
        }
    }
}

impl Error for SweepError {

}

/*
    Config errors
 */
#[derive(Debug)]
pub enum ConfigError {
    BadFilePath(PathBuf),
    IOError(std::io::Error),
    ParsingError(serde_yaml::Error)
}

impl From<std::io::Error> for ConfigError {
    fn from(value: std::io::Error) -> Self {
        ConfigError::IOError(value)
    }
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(value: serde_yaml::Error) -> Self {
        ConfigError::ParsingError(value)
    }
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BadFilePath(path) => write!(f, "File {} given to Config does not exist!", path.display()),
            Self::IOError(e) => write!(f, "Config received an io error: {}", e),
            Self::ParsingError(e) => write!(f, "Config received a parsing error: {}", e)
        }
    }
}

impl Error for ConfigError {

}

/*
    Session errors: anything that stops a single run, a sweep or a burst
 */
#[derive(Debug)]
pub enum SessionError {
    RunError(RunError),
    MetadataError(MetadataError),
    SensorError(Th2eError),
    SweepError(SweepError),
    IOError(std::io::Error)
}

impl From<RunError> for SessionError {
    fn from(value: RunError) -> Self {
        Self::RunError(value)
    }
}

impl From<MetadataError> for SessionError {
    fn from(value: MetadataError) -> Self {
        Self::MetadataError(value)
    }
}

impl From<Th2eError> for SessionError {
    fn from(value: Th2eError) -> Self {
        Self::SensorError(value)
    }
}

impl From<SweepError> for SessionError {
    fn from(value: SweepError) -> Self {
        Self::SweepError(value)
    }
}

impl From<std::io::Error> for SessionError {
    fn from(value: std::io::Error) -> Self {
        Self::IOError(value)
    }
}

impl Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RunError(e) => write!(f, "Session failed during acquisition with error: {}", e),
            Self::MetadataError(e) => write!(f, "Session failed due to metadata error: {}", e),
            Self::SensorError(e) => write!(f, "Session failed reading the TH2E sensor: {}", e),
            Self::SweepError(e) => write!(f, "Session failed due to sweep error: {}", e),
            Self::IOError(e) => write!(f, "Session received an io error: {}", e)
        }
    }
}

impl Error for SessionError {

}
