use std::path::PathBuf;

use crate::acq::bursts::RunType;
use crate::acq::experiment::Datapath;

#[derive(clap::Parser, Debug)]
#[command(name = "bpm_acq", about = "BPM test bench acquisition and rack environment logging")]
pub struct Cli {
    /// YAML bench configuration; the lab defaults are used when omitted
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    #[arg(short, long, global = true)]
    pub verbose: bool,
    #[command(subcommand)]
    pub action: Action,
}

#[derive(clap::Subcommand, Debug)]
pub enum Action {
    /// Acquire every selected board/BPM once
    Single(SingleArgs),
    /// Acquire every selected board/BPM once per RF input power level
    PowSweep(PowSweepArgs),
    /// Repeat an experiment every few minutes until Ctrl-C
    Bursts(BurstsArgs),
    /// Log the rack temperature and humidity until Ctrl-C
    Th2eLog(Th2eLogArgs),
    /// Read the TH2E probe once
    Th2eRead(Th2eReadArgs),
    /// Write the default configuration as YAML
    WriteConfig(WriteConfigArgs),
}

/// Arguments shared by every acquisition command
#[derive(clap::Args, Debug, Clone)]
pub struct AcqArgs {
    /// Experiment settings file (key = value)
    pub metadata: PathBuf,
    /// Folder where the acquired data is saved
    pub output: PathBuf,
    #[arg(short = 'p', long = "datapath", value_enum, required = true)]
    pub datapaths: Vec<Datapath>,
    /// Broker endpoint
    #[arg(short, long)]
    pub endpoint: Option<String>,
    /// Enable the RFFE configuration
    #[arg(short = 'r', long = "rffeconfig")]
    pub rffe_config: bool,
    /// Enable the FMC configuration
    #[arg(short = 'c', long = "fmcconfig")]
    pub fmc_config: bool,
    /// Run for every board and BPM
    #[arg(short = 'a', long = "allboards")]
    pub all_boards: bool,
    /// Board and BPMs in the format [BOARD,BPM,BPM]
    #[arg(short, long = "group")]
    pub groups: Vec<String>,
}

#[derive(clap::Args, Debug)]
pub struct SingleArgs {
    #[command(flatten)]
    pub acq: AcqArgs,
    /// AFC board name
    #[arg(short = 'f', long)]
    pub afc: Option<String>,
    /// FMC board name
    #[arg(short = 'm', long)]
    pub fmc: Option<String>,
    /// Run without asking for confirmation
    #[arg(short, long)]
    pub silent: bool,
    /// Annotate the data with the rack temperature
    #[arg(short, long)]
    pub temperature: bool,
    /// Acquire with the switching off and then on
    #[arg(short = 'w', long = "swsweep")]
    pub switching_sweep: bool,
    /// Acquire with the switching on
    #[arg(short = 'z', long = "sw")]
    pub switching_on: bool,
}

#[derive(clap::Args, Debug)]
pub struct PowSweepArgs {
    #[command(flatten)]
    pub acq: AcqArgs,
    #[arg(short = 'f', long)]
    pub afc: Option<String>,
    #[arg(short = 'm', long)]
    pub fmc: Option<String>,
    #[arg(short, long)]
    pub silent: bool,
    /// Initial power level in dBm
    #[arg(short = 'i', long, default_value_t = -60, allow_negative_numbers = true)]
    pub start: i32,
    /// Final power level in dBm
    #[arg(short = 'n', long, default_value_t = 0, allow_negative_numbers = true)]
    pub stop: i32,
    #[arg(short = 'x', long, default_value_t = 10, allow_negative_numbers = true)]
    pub step: i32,
}

#[derive(clap::Args, Debug)]
pub struct BurstsArgs {
    #[command(flatten)]
    pub acq: AcqArgs,
    /// Minutes between the start of two bursts
    #[arg(short, long, default_value_t = 1.0)]
    pub minutes: f64,
    #[arg(short = 't', long = "runtype", value_enum, default_value_t = RunType::Single)]
    pub run_type: RunType,
    #[arg(short = 'i', long, default_value_t = -60, allow_negative_numbers = true)]
    pub start: i32,
    #[arg(short = 'n', long, default_value_t = 0, allow_negative_numbers = true)]
    pub stop: i32,
    #[arg(short = 's', long, default_value_t = 10, allow_negative_numbers = true)]
    pub step: i32,
    /// Stop after this many bursts
    #[arg(long)]
    pub count: Option<u32>,
}

#[derive(clap::Args, Debug)]
pub struct Th2eLogArgs {
    /// Folder of the readings file
    pub output: PathBuf,
    /// Seconds between readings
    pub delay: f64,
    #[arg(short, long)]
    pub ip: Option<String>,
    #[arg(short, long)]
    pub port: Option<u16>,
}

#[derive(clap::Args, Debug)]
pub struct Th2eReadArgs {
    #[arg(short, long)]
    pub ip: Option<String>,
    #[arg(short, long)]
    pub port: Option<u16>,
    #[arg(long)]
    pub temp: bool,
    #[arg(long)]
    pub hum: bool,
    #[arg(long)]
    pub dew: bool,
    /// Reset the probe before reading
    #[arg(long)]
    pub reset: bool,
}

#[derive(clap::Args, Debug)]
pub struct WriteConfigArgs {
    pub path: PathBuf,
}
