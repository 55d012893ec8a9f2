pub mod bursts;
pub mod config;
pub mod constants;
pub mod curve;
pub mod error;
pub mod experiment;
pub mod group;
pub mod metadata;
pub mod paths;
pub mod single;
pub mod sweep;
