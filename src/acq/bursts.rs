use std::time::{Duration, Instant};

use super::error::SessionError;
use super::experiment::Experiment;
use super::single::{run_single, RunSummary, SingleOptions};
use super::sweep::{run_power_sweep, run_switching_sweep};
use crate::pacing::{is_stopped, wait_until_elapsed, StopFlag};
use crate::th2e::device::Environment;

/// Kind of experiment repeated by each burst
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum RunType {
    Single,
    Sweep,
    #[value(alias = "pow_sweep")]
    PowSweep
}

#[derive(Debug, Clone)]
pub struct BurstOptions {
    pub run: SingleOptions,
    pub run_type: RunType,
    pub minutes: f64,
    pub start: i32,
    pub stop: i32,
    pub step: i32,
    pub count: Option<u32>
}

fn reborrow<'a>(probe: &'a mut Option<&mut dyn Environment>) -> Option<&'a mut dyn Environment> {
    probe.as_mut().map(|sensor| &mut **sensor as &mut dyn Environment)
}

/// Repeat the chosen experiment every `minutes` until Ctrl-C (or `count` bursts).
/// Bursts run unattended, so the settings are never confirmed. Returns the total over all bursts.
pub fn run_bursts<E: Experiment>(
    exp: &mut E,
    options: &BurstOptions,
    mut probe: Option<&mut dyn Environment>,
    quit: &StopFlag,
    poll: Duration
) -> Result<RunSummary, SessionError> {
    let mut run_options = options.run.clone();
    run_options.silent = true;
    let interval = Duration::from_secs_f64((options.minutes * 60.0).max(0.0));
    let mut total = RunSummary::default();
    let mut bursts: u32 = 0;

    while !is_stopped(quit) {
        let started = Instant::now();
        println!("\n\n\n======================================================");
        println!("New experiment burst. Initiated at {}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S"));
        println!("======================================================");

        let mut input = std::io::empty();
        let mut output = std::io::sink();
        let summary = match options.run_type {
            RunType::Single => run_single(exp, &run_options, reborrow(&mut probe), &mut input, &mut output)?,
            RunType::Sweep => run_switching_sweep(exp, &run_options, reborrow(&mut probe), &mut input, &mut output)?,
            RunType::PowSweep => run_power_sweep(exp, &run_options, options.start, options.stop, options.step, &mut input, &mut output)?
        };
        total.merge(&summary);
        bursts += 1;

        if options.count.map_or(false, |count| bursts >= count) {
            break;
        }

        println!("Waiting for next experiment burst... (press ctrl-c to stop)");
        if !wait_until_elapsed(started, interval, poll, quit) {
            break;
        }
    }

    println!("\nThe bursts experiment has ended.\n");
    log::info!("{} bursts: {} acquisitions, {} skipped.", bursts, total.acquired, total.skipped);
    Ok(total)
}
