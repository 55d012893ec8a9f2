// Lab defaults
pub const DEFAULT_ENDPOINT: &str = "tcp://10.2.117.47:8888";
pub const DEFAULT_AFC: &str = "AFC1";
pub const DEFAULT_FMC: &str = "V3P1";
pub const DEFAULT_CLIENT_PROGRAM: &str = "halcs_client";

// Board layout
pub const NUMBER_OF_BOARDS: u32 = 12; // per crate
pub const BPMS_PER_BOARD: [u32; 2] = [0, 1];

// FPGA acquisition channels
pub const CHAN_ADC: u32 = 0;
pub const CHAN_ADC_SWAP: u32 = 1;
pub const CHAN_TBT_AMP: u32 = 6;
pub const CHAN_FOFB_AMP: u32 = 11;
pub const COLUMNS_PER_ROW: usize = 4; // one column per antenna

// Acquisition request defaults
pub const DEFAULT_SAMPLES_PRE: u32 = 10_000;
pub const DEFAULT_SAMPLES_POST: u32 = 0;
pub const DEFAULT_NUM_SHOTS: u32 = 1;
pub const DEFAULT_CLIENT_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_ACQ_TIMEOUT_MS: u64 = 25_000;
pub const ACQ_TIMEOUT_MARGIN_MS: u64 = 1_000; // client poll timeout must expire before the kill deadline
pub const DEFAULT_MAX_INPUT_POWER: f64 = 0.0; // dBm, safe RFFE input

// Metadata keys
pub const KEY_SWITCHING: &str = "rffe_switching";
pub const KEY_POWER_LEVEL: &str = "rffe_power_level";
pub const KEY_ATTENUATION: &str = "rffe_attenuation";
pub const KEY_ADC_CLOCK: &str = "adc_clock_freq";
pub const KEY_ADC_DELAY: &str = "adc_delay";
pub const KEY_RACK_TEMPERATURE: &str = "rack_temperature";
pub const KEY_RACK_HUMIDITY: &str = "rack_humidity";
pub const KEY_RACK_DEW_POINT: &str = "rack_dew_point";
