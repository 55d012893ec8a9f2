mod acq;
mod cli;
mod pacing;
mod th2e;

use std::error::Error;
use std::io::Write;
use std::time::Duration;
use clap::Parser;
use log::{error, info};

use crate::acq::bursts::{run_bursts, BurstOptions};
use crate::acq::config::Config;
use crate::acq::experiment::ClientExperiment;
use crate::acq::group::AcqGroup;
use crate::acq::single::{run_single, SingleOptions};
use crate::acq::sweep::{run_power_sweep, run_switching_sweep};
use crate::cli::{AcqArgs, Action, Cli};
use crate::pacing::{install_ctrlc, stop_flag, POLL_INTERVAL};
use crate::th2e::device::{report, Environment, ReadSelection, Th2e};
use crate::th2e::logger::run_read_loop;

/// Build the run options from the shared acquisition arguments. The endpoint and board names
/// given on the command line take precedence over the configuration.
fn single_options(acq: &AcqArgs, config: &mut Config, afc: Option<&String>, fmc: Option<&String>) -> Result<SingleOptions, Box<dyn Error>> {
    if let Some(endpoint) = &acq.endpoint {
        config.endpoint = endpoint.clone();
    }
    if let Some(afc) = afc {
        config.afc = afc.clone();
    }
    if let Some(fmc) = fmc {
        config.fmc = fmc.clone();
    }
    Ok(SingleOptions {
        metadata: acq.metadata.clone(),
        output: acq.output.clone(),
        datapaths: acq.datapaths.clone(),
        afc: config.afc.clone(),
        fmc: config.fmc.clone(),
        silent: false,
        rffe_config: acq.rffe_config,
        fmc_config: acq.fmc_config,
        groups: AcqGroup::select(acq.all_boards, &acq.groups)?,
        switching: SingleOptions::switching_states(false, false)
    })
}

fn sensor_timeout(config: &Config) -> Duration {
    Duration::from_millis(config.sensor_timeout_ms)
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let mut config = Config::load_or_default(cli.config.as_deref())?;
    let stdin = std::io::stdin();
    let mut input = stdin.lock();
    let mut output = std::io::stdout();

    match cli.action {
        Action::Single(args) => {
            let mut options = single_options(&args.acq, &mut config, args.afc.as_ref(), args.fmc.as_ref())?;
            options.silent = args.silent;
            let mut sensor = if args.temperature {
                Some(Th2e::connect(&config.sensor_ip, config.sensor_port, sensor_timeout(&config))?)
            } else {
                None
            };
            let probe = sensor.as_mut().map(|s| s as &mut dyn Environment);
            let mut exp = ClientExperiment::new(config);
            let summary = if args.switching_sweep {
                run_switching_sweep(&mut exp, &options, probe, &mut input, &mut output)?
            } else {
                options.switching = SingleOptions::switching_states(false, args.switching_on);
                run_single(&mut exp, &options, probe, &mut input, &mut output)?
            };
            info!("{} acquisitions written, {} skipped.", summary.acquired, summary.skipped);
        }
        Action::PowSweep(args) => {
            let mut options = single_options(&args.acq, &mut config, args.afc.as_ref(), args.fmc.as_ref())?;
            options.silent = args.silent;
            let mut exp = ClientExperiment::new(config);
            let summary = run_power_sweep(&mut exp, &options, args.start, args.stop, args.step, &mut input, &mut output)?;
            info!("{} acquisitions written, {} skipped.", summary.acquired, summary.skipped);
        }
        Action::Bursts(args) => {
            let run = single_options(&args.acq, &mut config, None, None)?;
            let options = BurstOptions {
                run,
                run_type: args.run_type,
                minutes: args.minutes,
                start: args.start,
                stop: args.stop,
                step: args.step,
                count: args.count
            };
            let quit = stop_flag();
            install_ctrlc(&quit)?;
            let mut exp = ClientExperiment::new(config);
            run_bursts(&mut exp, &options, None, &quit, POLL_INTERVAL)?;
        }
        Action::Th2eLog(args) => {
            let ip = args.ip.unwrap_or_else(|| config.sensor_ip.clone());
            let port = args.port.unwrap_or(config.sensor_port);
            let mut sensor = Th2e::connect(&ip, port, sensor_timeout(&config))?;
            let quit = stop_flag();
            install_ctrlc(&quit)?;
            let count = run_read_loop(&mut sensor, &args.output, Duration::from_secs_f64(args.delay.max(0.0)), &quit)?;
            info!("Logged {} readings.", count);
        }
        Action::Th2eRead(args) => {
            let ip = args.ip.unwrap_or_else(|| config.sensor_ip.clone());
            let port = args.port.unwrap_or(config.sensor_port);
            let mut sensor = Th2e::connect(&ip, port, sensor_timeout(&config))?;
            let selection = ReadSelection { temperature: args.temp, humidity: args.hum, dew_point: args.dew, reset: args.reset };
            report(&mut sensor, &selection, &mut output)?;
        }
        Action::WriteConfig(args) => {
            Config::default().write_config_file(&args.path)?;
            info!("Default configuration written to {}", args.path.display());
        }
    }

    output.flush()?;
    Ok(())
}

fn main() {
    let cli = Cli::parse();

    //Setup logging
    let level = if cli.verbose { simplelog::LevelFilter::Debug } else { simplelog::LevelFilter::Info };
    if let Err(e) = simplelog::TermLogger::init(level,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto) {
        eprintln!("Could not initialize the logger: {}", e);
    }

    info!("Starting up bpm_acq...");

    match run(cli) {
        Ok(()) => info!("Done."),
        Err(e) => {
            error!("{} Shutting down.", e);
            std::process::exit(1);
        }
    }
}
