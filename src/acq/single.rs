use std::io::{BufRead, Write};
use std::path::PathBuf;

use super::constants::*;
use super::error::{RunError, SessionError};
use super::experiment::{Datapath, Experiment, RunRequest, Switching};
use super::group::AcqGroup;
use super::paths::{today, OutputLayout};
use crate::th2e::device::Environment;

/// Counts of what happened during a run
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunSummary {
    pub acquired: u32,
    pub skipped: u32
}

impl RunSummary {
    pub fn merge(&mut self, other: &RunSummary) {
        self.acquired += other.acquired;
        self.skipped += other.skipped;
    }
}

/// What to acquire: every datapath, for every switching state, of every BPM in every group
#[derive(Debug, Clone)]
pub struct AcqPlan<'a> {
    pub layout: &'a OutputLayout,
    pub groups: &'a [AcqGroup],
    pub datapaths: &'a [Datapath],
    pub switching: &'a [Switching],
    pub sweep_step: Option<&'a str>,
    pub fmc_config: bool,
    pub rffe_config: bool
}

/// Run the plan. Boards, BPMs and power levels that cannot be acquired are skipped and counted;
/// any other failure ends the run.
pub fn acquire_plan<E: Experiment>(exp: &mut E, plan: &AcqPlan) -> Result<RunSummary, SessionError> {
    let mut summary = RunSummary::default();

    for group in plan.groups {
        for bpm in group.bpms.iter() {
            // Numbering carries across the switching states of one BPM
            let mut counter: u32 = 1;
            for switching in plan.switching {
                log::info!("Using Board {} and BPM {} with Switching {} ...", group.board, bpm, switching);
                exp.metadata_mut().set(KEY_SWITCHING, switching.as_str());
                let files = plan.layout.unique_data_files(plan.datapaths, plan.sweep_step, *switching, &mut counter);

                for (index, (datapath, file)) in plan.datapaths.iter().zip(files.into_iter()).enumerate() {
                    log::info!("Running {} datapath...", datapath);
                    let request = RunRequest {
                        output_path: file,
                        datapath: *datapath,
                        board: group.board,
                        bpm: *bpm,
                        fmc_config: plan.fmc_config,
                        rffe_config: plan.rffe_config
                    };
                    match exp.run(&request) {
                        Ok(()) => {
                            log::info!("Done. Results in: {}", request.output_path.display());
                            summary.acquired += 1;
                        }
                        Err(e) if !e.is_skippable() => return Err(SessionError::from(e)),
                        Err(RunError::OverPower(level)) => {
                            log::warn!("The power level {} dBm will damage the RFFE so it'll be skipped!", level);
                            summary.skipped += 1;
                        }
                        Err(RunError::BoardTimeout) => {
                            log::warn!("Board {} doesn't respond and will be skipped!", group.board);
                            summary.skipped += (plan.datapaths.len() - index) as u32;
                            break;
                        }
                        Err(_) => {
                            log::warn!("RFFE board doesn't respond!");
                            summary.skipped += 1;
                        }
                    }
                }
            }
        }
    }

    Ok(summary)
}

/// Options of a single run
#[derive(Debug, Clone)]
pub struct SingleOptions {
    pub metadata: PathBuf,
    pub output: PathBuf,
    pub datapaths: Vec<Datapath>,
    pub afc: String,
    pub fmc: String,
    pub silent: bool,
    pub rffe_config: bool,
    pub fmc_config: bool,
    pub groups: Vec<AcqGroup>,
    pub switching: Vec<Switching>
}

impl SingleOptions {
    /// The switching states to acquire: both for a switching sweep, otherwise the selected one
    pub fn switching_states(sweep: bool, switching_on: bool) -> Vec<Switching> {
        if sweep {
            vec![Switching::Off, Switching::On]
        } else if switching_on {
            vec![Switching::On]
        } else {
            vec![Switching::Off]
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Choice {
    Run,
    Reload,
    Quit
}

/// Show the experiment settings and ask the operator what to do
pub fn prompt<E: Experiment, R: BufRead, W: Write>(exp: &E, options: &SingleOptions, input: &mut R, output: &mut W) -> Result<Choice, std::io::Error> {
    writeln!(output, "\n====================")?;
    writeln!(output, "EXPERIMENT SETTINGS:")?;
    writeln!(output, "====================")?;
    write!(output, "{}", exp.metadata().sorted_lines().concat())?;
    let metadata_path = std::fs::canonicalize(&options.metadata).unwrap_or_else(|_| options.metadata.clone());
    writeln!(output, "Press ENTER to run the experiment.")?;
    writeln!(output, "Type 'l' and press ENTER to load new experiment settings from '{}'.", metadata_path.display())?;
    writeln!(output, "Type 'q' and press ENTER to quit.")?;
    output.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(Choice::Quit);
    }
    Ok(match line.trim() {
        "" => Choice::Run,
        "q" => Choice::Quit,
        _ => Choice::Reload
    })
}

/// Load the settings, annotate them with the rack environment if a probe is given, confirm with the
/// operator unless silent, then acquire every group.
pub fn run_single<E: Experiment, R: BufRead, W: Write>(
    exp: &mut E,
    options: &SingleOptions,
    mut probe: Option<&mut dyn Environment>,
    input: &mut R,
    output: &mut W
) -> Result<RunSummary, SessionError> {
    let joined = options.switching.iter().map(|s| s.as_str()).collect::<Vec<&str>>().join(", ");

    loop {
        exp.load_from_metadata(&options.metadata)?;
        exp.metadata_mut().set(KEY_SWITCHING, &joined);

        if let Some(sensor) = probe.as_mut() {
            let readings = sensor.read_environment()?;
            let metadata = exp.metadata_mut();
            metadata.set(KEY_RACK_TEMPERATURE, &format!("{} C", readings.temperature));
            metadata.set(KEY_RACK_HUMIDITY, &format!("{} %", readings.humidity));
            metadata.set(KEY_RACK_DEW_POINT, &format!("{} C", readings.dew_point));
        }

        let choice = if options.silent {
            Choice::Run
        } else {
            prompt(exp, options, input, output)?
        };

        match choice {
            Choice::Run => {
                let layout = OutputLayout::new(&options.output, &today(), &options.afc, &options.fmc);
                let plan = AcqPlan {
                    layout: &layout,
                    groups: &options.groups,
                    datapaths: &options.datapaths,
                    switching: &options.switching,
                    sweep_step: None,
                    fmc_config: options.fmc_config,
                    rffe_config: options.rffe_config
                };
                let summary = acquire_plan(exp, &plan)?;
                log::info!("Run finished: {} acquisitions, {} skipped.", summary.acquired, summary.skipped);
                return Ok(summary);
            }
            Choice::Reload => {
                log::info!("Reloading experiment settings from {}", options.metadata.display());
                continue;
            }
            Choice::Quit => return Ok(RunSummary::default())
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::acq::error::MetadataError;
    use crate::acq::metadata::ExperimentMetadata;
    use crate::th2e::device::Readings;
    use crate::th2e::error::Th2eError;
    use std::collections::VecDeque;
    use std::io::Cursor;
    use std::path::Path;

    /// Records every request; answers with queued results, then Ok
    #[derive(Debug, Default)]
    pub struct FakeExperiment {
        pub metadata: ExperimentMetadata,
        pub loads: u32,
        pub requests: Vec<(RunRequest, ExperimentMetadata)>,
        pub results: VecDeque<Result<(), RunError>>
    }

    impl Experiment for FakeExperiment {
        fn load_from_metadata(&mut self, path: &Path) -> Result<(), MetadataError> {
            self.metadata = ExperimentMetadata::load(path)?;
            self.loads += 1;
            Ok(())
        }

        fn metadata(&self) -> &ExperimentMetadata {
            &self.metadata
        }

        fn metadata_mut(&mut self) -> &mut ExperimentMetadata {
            &mut self.metadata
        }

        fn run(&mut self, request: &RunRequest) -> Result<(), RunError> {
            self.requests.push((request.clone(), self.metadata.clone()));
            let result = self.results.pop_front().unwrap_or(Ok(()));
            if result.is_ok() {
                std::fs::create_dir_all(request.output_path.parent().unwrap())?;
                std::fs::write(&request.output_path, "")?;
            }
            result
        }
    }

    struct FixedProbe;

    impl Environment for FixedProbe {
        fn read_environment(&mut self) -> Result<Readings, Th2eError> {
            Ok(Readings { temperature: 24.5, humidity: 40.0, dew_point: 9.8 })
        }
    }

    pub fn options(dir: &Path) -> SingleOptions {
        let metadata = dir.join("metadata.txt");
        std::fs::write(&metadata, "rffe_attenuation = 10\n").unwrap();
        SingleOptions {
            metadata,
            output: dir.join("out"),
            datapaths: vec![Datapath::Adc, Datapath::Tbt],
            afc: "AFC1".to_string(),
            fmc: "V3P1".to_string(),
            silent: true,
            rffe_config: false,
            fmc_config: false,
            groups: vec![AcqGroup { board: 4, bpms: vec![0, 1] }],
            switching: SingleOptions::switching_states(false, false)
        }
    }

    fn run(exp: &mut FakeExperiment, options: &SingleOptions, input: &str) -> (RunSummary, String) {
        let mut output: Vec<u8> = Vec::new();
        let summary = run_single(exp, options, None, &mut Cursor::new(input.as_bytes().to_vec()), &mut output).unwrap();
        (summary, String::from_utf8(output).unwrap())
    }

    #[test]
    fn silent_run_acquires_every_bpm_and_datapath() {
        let dir = tempfile::tempdir().unwrap();
        let opts = options(dir.path());
        let mut exp = FakeExperiment::default();
        let (summary, out) = run(&mut exp, &opts, "");

        assert_eq!(summary, RunSummary { acquired: 4, skipped: 0 });
        assert!(out.is_empty());
        let layout = OutputLayout::new(&opts.output, &today(), "AFC1", "V3P1");
        let (first, meta) = &exp.requests[0];
        assert_eq!(first.output_path, layout.data_file(Datapath::Adc, None, Switching::Off, 1));
        assert_eq!((first.board, first.bpm), (4, 0));
        assert_eq!(meta.get(KEY_SWITCHING), Some("off"));
        assert_eq!(meta.get("rffe_attenuation"), Some("10"));
        assert_eq!(exp.requests[3].0.datapath, Datapath::Tbt);
        assert_eq!(exp.requests[3].0.bpm, 1);
    }

    #[test]
    fn second_run_does_not_overwrite_first() {
        let dir = tempfile::tempdir().unwrap();
        let opts = options(dir.path());
        let mut exp = FakeExperiment::default();
        run(&mut exp, &opts, "");
        run(&mut exp, &opts, "");

        let layout = OutputLayout::new(&opts.output, &today(), "AFC1", "V3P1");
        assert_eq!(exp.requests[4].0.output_path, layout.data_file(Datapath::Adc, None, Switching::Off, 2));
    }

    #[test]
    fn switching_sweep_numbers_continue_across_states() {
        let dir = tempfile::tempdir().unwrap();
        let mut opts = options(dir.path());
        opts.groups = vec![AcqGroup { board: 0, bpms: vec![1] }];
        opts.datapaths = vec![Datapath::Adc];
        opts.switching = SingleOptions::switching_states(true, false);
        let mut exp = FakeExperiment::default();
        run(&mut exp, &opts, "");

        let layout = OutputLayout::new(&opts.output, &today(), "AFC1", "V3P1");
        assert_eq!(exp.requests.len(), 2);
        assert_eq!(exp.requests[0].0.output_path, layout.data_file(Datapath::Adc, None, Switching::Off, 1));
        assert_eq!(exp.requests[1].0.output_path, layout.data_file(Datapath::Adc, None, Switching::On, 2));
        assert_eq!(exp.requests[1].1.get(KEY_SWITCHING), Some("on"));
    }

    #[test]
    fn skip_conditions() {
        let dir = tempfile::tempdir().unwrap();
        let mut opts = options(dir.path());
        opts.datapaths = vec![Datapath::Adc, Datapath::Tbt, Datapath::Fofb];
        let mut exp = FakeExperiment::default();
        // bpm 0: adc over power, tbt board timeout (fofb skipped too)
        // bpm 1: adc rffe timeout, tbt and fofb fine
        exp.results = VecDeque::from(vec![
            Err(RunError::OverPower(5.0)),
            Err(RunError::BoardTimeout),
            Err(RunError::RffeTimeout),
        ]);
        let (summary, _) = run(&mut exp, &opts, "");
        assert_eq!(summary, RunSummary { acquired: 2, skipped: 4 });
        assert_eq!(exp.requests.len(), 5);
        assert_eq!(exp.requests[2].0.bpm, 1);
    }

    #[test]
    fn fatal_error_stops_the_run() {
        let dir = tempfile::tempdir().unwrap();
        let opts = options(dir.path());
        let mut exp = FakeExperiment::default();
        exp.results = VecDeque::from(vec![Err(RunError::ClientError("broker down".to_string()))]);
        let mut output: Vec<u8> = Vec::new();
        let result = run_single(&mut exp, &opts, None, &mut Cursor::new(Vec::<u8>::new()), &mut output);
        assert!(matches!(result, Err(SessionError::RunError(RunError::ClientError(_)))));
        assert_eq!(exp.requests.len(), 1);
    }

    #[test]
    fn prompt_reload_then_quit() {
        let dir = tempfile::tempdir().unwrap();
        let mut opts = options(dir.path());
        opts.silent = false;
        let mut exp = FakeExperiment::default();
        let (summary, out) = run(&mut exp, &opts, "l\nq\n");

        assert_eq!(summary, RunSummary::default());
        assert_eq!(exp.loads, 2);
        assert!(exp.requests.is_empty());
        assert!(out.contains("EXPERIMENT SETTINGS:"));
        assert!(out.contains("rffe_attenuation = 10\n"));
        assert!(out.contains("rffe_switching = off\n"));
    }

    #[test]
    fn prompt_enter_runs_and_eof_quits() {
        let dir = tempfile::tempdir().unwrap();
        let mut opts = options(dir.path());
        opts.silent = false;
        let mut exp = FakeExperiment::default();
        let (summary, _) = run(&mut exp, &opts, "\n");
        assert_eq!(summary.acquired, 4);

        let mut exp = FakeExperiment::default();
        let (summary, _) = run(&mut exp, &opts, "");
        assert_eq!(summary, RunSummary::default());
    }

    #[test]
    fn probe_readings_annotate_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let opts = options(dir.path());
        let mut exp = FakeExperiment::default();
        let mut probe = FixedProbe;
        let mut output: Vec<u8> = Vec::new();
        run_single(&mut exp, &opts, Some(&mut probe), &mut Cursor::new(Vec::<u8>::new()), &mut output).unwrap();

        let meta = &exp.requests[0].1;
        assert_eq!(meta.get(KEY_RACK_TEMPERATURE), Some("24.5 C"));
        assert_eq!(meta.get(KEY_RACK_HUMIDITY), Some("40 %"));
        assert_eq!(meta.get(KEY_RACK_DEW_POINT), Some("9.8 C"));
    }

    #[test]
    fn missing_metadata_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut opts = options(dir.path());
        opts.metadata = dir.path().join("missing.txt");
        let mut exp = FakeExperiment::default();
        let mut output: Vec<u8> = Vec::new();
        let result = run_single(&mut exp, &opts, None, &mut Cursor::new(Vec::<u8>::new()), &mut output);
        assert!(matches!(result, Err(SessionError::MetadataError(MetadataError::BadFilePath(_)))));
    }
}
