use std::io::{Cursor, Read, Write};
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};

use super::constants::*;
use super::error::SpinelError;

/// 0xFF minus the 8-bit sum of every byte preceding the checksum
pub fn checksum(bytes: &[u8]) -> u8 {
    let sum = bytes.iter().fold(0u8, |acc, b| acc.wrapping_add(*b));
    0xFF - sum
}

/// # SpinelFrame
/// A single Spinel format 97 frame, the framing used by Papouch sensors such as the TH2E.
///
/// On the wire: PRE, FRM, NUM (u16, big-endian, bytes following NUM up to and including CR),
/// ADR, SIG, INST (requests) or ACK (responses), DATA, SUMA, CR.
/// The signature is chosen by the sender of a request and echoed back in the response, which is
/// how responses are paired with requests.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpinelFrame {
    pub address: u8,
    pub signature: u8,
    pub code: u8,
    pub data: Vec<u8>
}

impl SpinelFrame {

    pub fn new(address: u8, signature: u8, code: u8, data: &[u8]) -> Self {
        SpinelFrame { address, signature, code, data: data.to_vec() }
    }

    /// Serialize the frame, computing NUM and the checksum
    pub fn to_bytes(&self) -> Result<Vec<u8>, SpinelError> {
        let num = self.data.len() + 5;
        if num > u16::MAX as usize {
            return Err(SpinelError::PayloadTooLarge(self.data.len()));
        }

        let mut buffer: Vec<u8> = Vec::with_capacity(FRAME_HEADER_SIZE + num);
        buffer.write_u8(FRAME_PREFIX)?;
        buffer.write_u8(FRAME_FORMAT_97)?;
        buffer.write_u16::<BigEndian>(num as u16)?;
        buffer.write_u8(self.address)?;
        buffer.write_u8(self.signature)?;
        buffer.write_u8(self.code)?;
        buffer.write_all(&self.data)?;
        let suma = checksum(&buffer);
        buffer.write_u8(suma)?;
        buffer.write_u8(FRAME_TERMINATOR)?;

        Ok(buffer)
    }

    /// Read exactly one frame from a byte stream. The header is read first to learn how much follows.
    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self, SpinelError> {
        let mut header: Vec<u8> = vec![0; FRAME_HEADER_SIZE];
        reader.read_exact(&mut header)?;
        if header[0] != FRAME_PREFIX {
            return Err(SpinelError::IncorrectPrefix(header[0]));
        }
        if header[1] != FRAME_FORMAT_97 {
            return Err(SpinelError::IncorrectFormat(header[1]));
        }
        let num = Cursor::new(&header[2..]).read_u16::<BigEndian>()?;
        if (num as usize) < MIN_FRAME_SIZE - FRAME_HEADER_SIZE {
            return Err(SpinelError::IncorrectLength(num, num as usize));
        }

        let mut body: Vec<u8> = vec![0; num as usize];
        reader.read_exact(&mut body)?;
        header.extend_from_slice(&body);

        SpinelFrame::try_from(header)
    }
}

impl TryFrom<Vec<u8>> for SpinelFrame {
    type Error = SpinelError;

    fn try_from(buffer: Vec<u8>) -> Result<Self, Self::Error> {
        if buffer.len() < MIN_FRAME_SIZE {
            return Err(SpinelError::FrameTooShort(buffer.len()));
        }

        let mut cursor = Cursor::new(buffer.as_slice());
        let prefix = cursor.read_u8()?;
        if prefix != FRAME_PREFIX {
            return Err(SpinelError::IncorrectPrefix(prefix));
        }
        let format = cursor.read_u8()?;
        if format != FRAME_FORMAT_97 {
            return Err(SpinelError::IncorrectFormat(format));
        }
        let num = cursor.read_u16::<BigEndian>()?;
        if num as usize != buffer.len() - FRAME_HEADER_SIZE {
            return Err(SpinelError::IncorrectLength(num, buffer.len() - FRAME_HEADER_SIZE));
        }

        let terminator = buffer[buffer.len() - 1];
        if terminator != FRAME_TERMINATOR {
            return Err(SpinelError::IncorrectTerminator(terminator));
        }
        let suma = buffer[buffer.len() - 2];
        let expected = checksum(&buffer[..buffer.len() - 2]);
        if suma != expected {
            return Err(SpinelError::IncorrectChecksum(suma, expected));
        }

        let mut frame = SpinelFrame::default();
        frame.address = cursor.read_u8()?;
        frame.signature = cursor.read_u8()?;
        frame.code = cursor.read_u8()?;
        frame.data = buffer[(FRAME_HEADER_SIZE + 3)..(buffer.len() - 2)].to_vec();

        Ok(frame)
    }
}
