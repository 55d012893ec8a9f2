pub mod constants;
pub mod device;
pub mod error;
pub mod logger;
pub mod sensor;
pub mod spinel;
