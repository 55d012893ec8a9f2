// Spinel format 97 framing
pub const FRAME_PREFIX: u8 = 0x2A;
pub const FRAME_FORMAT_97: u8 = 0x61;
pub const FRAME_TERMINATOR: u8 = 0x0D;
pub const FRAME_HEADER_SIZE: usize = 4; // PRE, FRM, NUM (2 bytes)
pub const MIN_FRAME_SIZE: usize = 9; // header + ADR, SIG, INST, SUMA, CR
pub const UNIVERSAL_ADDRESS: u8 = 0xFE;

// Acknowledge codes
pub const ACK_OK: u8 = 0x00;
pub const ACK_UNSPECIFIED: u8 = 0x01;
pub const ACK_INVALID_CODE: u8 = 0x02;
pub const ACK_INVALID_DATA: u8 = 0x03;
pub const ACK_WRITE_DENIED: u8 = 0x04;
pub const ACK_DEVICE_FAILURE: u8 = 0x05;
pub const ACK_NO_DATA: u8 = 0x06;

// TH2E instructions
pub const INST_READ_ALL: u8 = 0x51;
pub const INST_RESET: u8 = 0xE3;

// TH2E channels
pub const CHANNEL_TEMPERATURE: u8 = 0x01;
pub const CHANNEL_HUMIDITY: u8 = 0x02;
pub const CHANNEL_DEW_POINT: u8 = 0x03;
pub const READING_SIZE: usize = 4; // channel, status, value (2 bytes)
pub const READING_SCALE: f64 = 10.0;

// Network
pub const DEFAULT_SENSOR_IP: &str = "10.2.117.254";
pub const DEFAULT_SENSOR_PORT: u16 = 10001;
pub const DEFAULT_SENSOR_TIMEOUT_MS: u64 = 2000;
pub const READINGS_FILE_NAME: &str = "th2e_readings.txt";

pub fn ack_description(ack: u8) -> &'static str {
    match ack {
        ACK_OK => "OK",
        ACK_UNSPECIFIED => "unspecified error",
        ACK_INVALID_CODE => "invalid instruction code",
        ACK_INVALID_DATA => "invalid data",
        ACK_WRITE_DENIED => "write denied",
        ACK_DEVICE_FAILURE => "device failure",
        ACK_NO_DATA => "no data available",
        _ => "unknown acknowledge code"
    }
}
