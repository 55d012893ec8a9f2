use std::fmt::Display;
use std::error::Error;

use super::constants::*;

/*
    Spinel frame errors
 */
#[derive(Debug)]
pub enum SpinelError {
    IOError(std::io::Error),
    FrameTooShort(usize),
    IncorrectPrefix(u8),
    IncorrectFormat(u8),
    IncorrectLength(u16, usize),
    IncorrectChecksum(u8, u8),
    IncorrectTerminator(u8),
    PayloadTooLarge(usize),
    SignatureMismatch(u8, u8),
    Rejected(u8)
}

impl From<std::io::Error> for SpinelError {
    fn from(value: std::io::Error) -> Self {
        SpinelError::IOError(value)
    }
}

impl Display for SpinelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::IOError(e) => write!(f, "Spinel link received an io error: {}", e),
            Self::FrameTooShort(len) => write!(f, "Spinel frame of {} bytes is too short! Minimum: {}", len, MIN_FRAME_SIZE),
            Self::IncorrectPrefix(p) => write!(f, "Incorrect prefix found for Spinel frame! Found: {:#04x} Expected: {:#04x}", p, FRAME_PREFIX),
            Self::IncorrectFormat(fmt) => write!(f, "Incorrect format found for Spinel frame! Found: {:#04x} Expected: {:#04x}", fmt, FRAME_FORMAT_97),
            Self::IncorrectLength(num, len) => write!(f, "Incorrect length found for Spinel frame! Header says {}, {} bytes follow", num, len),
            Self::IncorrectChecksum(found, expected) => write!(f, "Incorrect checksum found for Spinel frame! Found: {:#04x} Expected: {:#04x}", found, expected),
            Self::IncorrectTerminator(t) => write!(f, "Incorrect terminator found for Spinel frame! Found: {:#04x} Expected: {:#04x}", t, FRAME_TERMINATOR),
            Self::PayloadTooLarge(len) => write!(f, "Spinel payload of {} bytes does not fit in a frame!", len),
            Self::SignatureMismatch(found, expected) => write!(f, "Spinel response signature {:#04x} does not match request {:#04x}!", found, expected),
            Self::Rejected(ack) => write!(f, "Sensor rejected the instruction: {}", ack_description(*ack))
        }
    }
}

impl Error for SpinelError {

}

/*
    TH2E errors
 */
#[derive(Debug)]
pub enum Th2eError {
    LinkError(SpinelError),
    MissingChannel(&'static str)
}

impl From<SpinelError> for Th2eError {
    fn from(value: SpinelError) -> Self {
        Th2eError::LinkError(value)
    }
}

impl From<std::io::Error> for Th2eError {
    fn from(value: std::io::Error) -> Self {
        Th2eError::LinkError(SpinelError::IOError(value))
    }
}

impl Display for Th2eError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LinkError(e) => write!(f, "TH2E link error: {}", e),
            Self::MissingChannel(name) => write!(f, "{} sensor couldn't be read, try again", name)
        }
    }
}

impl Error for Th2eError {

}
