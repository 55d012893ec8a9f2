use std::io::{BufRead, Write};

use super::constants::KEY_POWER_LEVEL;
use super::error::{SessionError, SweepError};
use super::experiment::Experiment;
use super::paths::{today, OutputLayout};
use super::single::{acquire_plan, run_single, AcqPlan, RunSummary, SingleOptions};
use crate::th2e::device::Environment;

/// Power levels from start to stop inclusive. The step must move start towards stop.
pub fn power_levels(start: i32, stop: i32, step: i32) -> Result<Vec<i32>, SweepError> {
    if step == 0 || (stop as i64 - start as i64).signum() * (step as i64).signum() < 0 {
        return Err(SweepError::BadRange(start, stop, step));
    }
    let mut levels: Vec<i32> = Vec::new();
    let mut next = Some(start);
    while let Some(level) = next {
        if (step > 0 && level > stop) || (step < 0 && level < stop) {
            break;
        }
        levels.push(level);
        next = level.checked_add(step);
    }
    Ok(levels)
}

/// Ask the operator to set the source power. Returns false if the sweep should stop.
fn confirm_level<R: BufRead, W: Write>(level: i32, input: &mut R, output: &mut W) -> Result<bool, std::io::Error> {
    writeln!(output, "Set the RF source to {} dBm and press ENTER. Type 'q' and press ENTER to stop the sweep.", level)?;
    output.flush()?;
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(false);
    }
    Ok(line.trim() != "q")
}

/// Acquire every group once per input power level. Each level gets its own `pow_<level>dBm`
/// directory and is recorded in the metadata; levels above the RFFE limit are skipped by the experiment.
pub fn run_power_sweep<E: Experiment, R: BufRead, W: Write>(
    exp: &mut E,
    options: &SingleOptions,
    start: i32,
    stop: i32,
    step: i32,
    input: &mut R,
    output: &mut W
) -> Result<RunSummary, SessionError> {
    let levels = power_levels(start, stop, step)?;
    exp.load_from_metadata(&options.metadata)?;
    let layout = OutputLayout::new(&options.output, &today(), &options.afc, &options.fmc);
    let mut summary = RunSummary::default();

    for level in levels {
        if !options.silent && !confirm_level(level, input, output)? {
            log::info!("Power sweep stopped by the operator at {} dBm.", level);
            break;
        }
        log::info!("Power sweep step: {} dBm", level);
        exp.metadata_mut().set(KEY_POWER_LEVEL, &format!("{} dBm", level));
        let step_dir = format!("pow_{}dBm", level);
        let plan = AcqPlan {
            layout: &layout,
            groups: &options.groups,
            datapaths: &options.datapaths,
            switching: &options.switching,
            sweep_step: Some(step_dir.as_str()),
            fmc_config: options.fmc_config,
            rffe_config: options.rffe_config
        };
        summary.merge(&acquire_plan(exp, &plan)?);
    }

    log::info!("Power sweep finished: {} acquisitions, {} skipped.", summary.acquired, summary.skipped);
    Ok(summary)
}

/// Acquire every group with the switching off and then on
pub fn run_switching_sweep<E: Experiment, R: BufRead, W: Write>(
    exp: &mut E,
    options: &SingleOptions,
    probe: Option<&mut dyn Environment>,
    input: &mut R,
    output: &mut W
) -> Result<RunSummary, SessionError> {
    let mut sweep_options = options.clone();
    sweep_options.switching = SingleOptions::switching_states(true, false);
    run_single(exp, &sweep_options, probe, input, output)
}
