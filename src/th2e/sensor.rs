use std::io::{Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use super::constants::*;
use super::error::SpinelError;
use super::spinel::SpinelFrame;

/// # SpinelLink
/// Request/response link to a Spinel 97 device over any byte stream (a TCP socket in the lab).
/// Every request carries a fresh signature so that a stale response left in the stream is detected
/// instead of being taken as the answer.
#[derive(Debug)]
pub struct SpinelLink<T: Read + Write> {
    transport: T,
    address: u8,
    signature: u8
}

impl SpinelLink<TcpStream> {

    /// Connect to a sensor's TCP server (the TH2E listens on port 10001 by default)
    pub fn connect(ip: &str, port: u16, timeout: Duration) -> Result<Self, SpinelError> {
        let socket_addr = match (ip, port).to_socket_addrs()?.next() {
            Some(addr) => addr,
            None => return Err(SpinelError::IOError(std::io::Error::new(std::io::ErrorKind::NotFound, format!("Could not resolve {}", ip))))
        };
        let stream = match TcpStream::connect_timeout(&socket_addr, timeout) {
            Ok(s) => s,
            Err(e) => {
                log::error!("Could not connect to the TH2E sensor at {}, please verify the connection and try again", socket_addr);
                return Err(SpinelError::IOError(e));
            }
        };
        stream.set_read_timeout(Some(timeout))?;
        stream.set_write_timeout(Some(timeout))?;
        log::debug!("Connected to Spinel device at {}", socket_addr);
        Ok(SpinelLink::new(stream, UNIVERSAL_ADDRESS))
    }
}

impl<T: Read + Write> SpinelLink<T> {

    pub fn new(transport: T, address: u8) -> Self {
        SpinelLink { transport, address, signature: 0 }
    }

    /// Send an instruction and return the data of the acknowledged response
    pub fn query(&mut self, instruction: u8, data: &[u8]) -> Result<Vec<u8>, SpinelError> {
        self.signature = self.signature.wrapping_add(1);
        let request = SpinelFrame::new(self.address, self.signature, instruction, data);
        self.transport.write_all(&request.to_bytes()?)?;
        self.transport.flush()?;

        let response = SpinelFrame::read_from(&mut self.transport)?;
        if response.signature != self.signature {
            return Err(SpinelError::SignatureMismatch(response.signature, self.signature));
        }
        if response.code != ACK_OK {
            return Err(SpinelError::Rejected(response.code));
        }
        Ok(response.data)
    }

    /// Send an instruction whose response carries no data of interest
    pub fn instruct(&mut self, instruction: u8, data: &[u8]) -> Result<(), SpinelError> {
        self.query(instruction, data)?;
        Ok(())
    }

    pub fn into_inner(self) -> T {
        self.transport
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::Cursor;

    /// In-memory transport: reads come from a canned buffer, writes are recorded
    #[derive(Debug, Default)]
    pub struct MockTransport {
        pub incoming: Cursor<Vec<u8>>,
        pub outgoing: Vec<u8>
    }

    impl MockTransport {
        pub fn with_responses(frames: &[SpinelFrame]) -> Self {
            let mut bytes = Vec::new();
            for frame in frames {
                bytes.extend(frame.to_bytes().unwrap());
            }
            MockTransport { incoming: Cursor::new(bytes), outgoing: Vec::new() }
        }
    }

    impl Read for MockTransport {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            self.incoming.read(buf)
        }
    }

    impl Write for MockTransport {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.outgoing.write(buf)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn query_returns_response_data() {
        let response = SpinelFrame::new(UNIVERSAL_ADDRESS, 1, ACK_OK, &[0xDE, 0xAD]);
        let mut link = SpinelLink::new(MockTransport::with_responses(&[response]), UNIVERSAL_ADDRESS);
        assert_eq!(link.query(INST_READ_ALL, &[0x00]).unwrap(), vec![0xDE, 0xAD]);

        let sent = link.into_inner().outgoing;
        let request = SpinelFrame::try_from(sent).unwrap();
        assert_eq!(request.code, INST_READ_ALL);
        assert_eq!(request.signature, 1);
    }

    #[test]
    fn signatures_advance_per_request() {
        let responses = [
            SpinelFrame::new(UNIVERSAL_ADDRESS, 1, ACK_OK, &[]),
            SpinelFrame::new(UNIVERSAL_ADDRESS, 1, ACK_OK, &[]),
        ];
        let mut link = SpinelLink::new(MockTransport::with_responses(&responses), UNIVERSAL_ADDRESS);
        link.instruct(INST_RESET, &[]).unwrap();
        // The second canned response repeats the first signature
        assert!(matches!(link.instruct(INST_RESET, &[]), Err(SpinelError::SignatureMismatch(1, 2))));
    }

    #[test]
    fn negative_acknowledge_is_an_error() {
        let response = SpinelFrame::new(UNIVERSAL_ADDRESS, 1, ACK_INVALID_CODE, &[]);
        let mut link = SpinelLink::new(MockTransport::with_responses(&[response]), UNIVERSAL_ADDRESS);
        assert!(matches!(link.query(0x99, &[]), Err(SpinelError::Rejected(ACK_INVALID_CODE))));
    }

    #[test]
    fn truncated_response_is_an_io_error() {
        let mut link = SpinelLink::new(MockTransport::default(), UNIVERSAL_ADDRESS);
        assert!(matches!(link.query(INST_READ_ALL, &[0x00]), Err(SpinelError::IOError(_))));
    }
}
