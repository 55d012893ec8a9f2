use std::fmt::Display;
use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use super::config::Config;
use super::constants::*;
use super::curve::Curve;
use super::error::{MetadataError, RunError};
use super::metadata::ExperimentMetadata;

/// Acquisition datapath of the BPM gateware
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Datapath {
    Adc,
    Tbt,
    Fofb
}

impl Datapath {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Adc => "adc",
            Self::Tbt => "tbt",
            Self::Fofb => "fofb"
        }
    }

    /// FPGA acquisition channel read for this datapath
    pub fn channel(&self) -> u32 {
        match self {
            Self::Adc => CHAN_ADC,
            Self::Tbt => CHAN_TBT_AMP,
            Self::Fofb => CHAN_FOFB_AMP
        }
    }
}

impl Display for Datapath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// RFFE switching state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Switching {
    Off,
    On
}

impl Switching {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::On => "on"
        }
    }

    pub fn from_metadata(value: Option<&str>) -> Self {
        match value.map(|v| v.trim()) {
            Some("on") => Self::On,
            _ => Self::Off
        }
    }
}

impl Display for Switching {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Everything one acquisition needs to know besides the metadata
#[derive(Debug, Clone, PartialEq)]
pub struct RunRequest {
    pub output_path: PathBuf,
    pub datapath: Datapath,
    pub board: u32,
    pub bpm: u32,
    pub fmc_config: bool,
    pub rffe_config: bool
}

/// # Experiment
/// A configurable acquisition. The metadata holds the experiment settings; `run` performs one
/// acquisition with those settings and writes its data to the requested path.
///
/// `RunError::OverPower`, `RunError::BoardTimeout` and `RunError::RffeTimeout` mean this one
/// acquisition could not be done. Callers skip it and carry on with the next one.
pub trait Experiment {
    fn load_from_metadata(&mut self, path: &Path) -> Result<(), MetadataError>;
    fn metadata(&self) -> &ExperimentMetadata;
    fn metadata_mut(&mut self) -> &mut ExperimentMetadata;
    fn run(&mut self, request: &RunRequest) -> Result<(), RunError>;
}

/// Result of one client invocation
#[derive(Debug)]
enum ClientOutcome {
    Finished(Output),
    TimedOut
}

fn drain<R: Read + Send + 'static>(mut pipe: R) -> JoinHandle<Vec<u8>> {
    std::thread::spawn(move || {
        let mut buffer: Vec<u8> = Vec::new();
        if let Err(e) = pipe.read_to_end(&mut buffer) {
            log::warn!("Could not read acquisition client output: {}", e);
        }
        buffer
    })
}

/// Parse a power level such as `-20`, `-20 dBm` or `-20dBm`
fn parse_power_level(value: &str) -> Option<f64> {
    value.trim().trim_end_matches("dBm").trim().parse::<f64>().ok()
}

/// # ClientExperiment
/// Drives the HALCS acquisition client program, one invocation per configuration step:
/// RFFE settings, FMC settings and finally the full acquisition. The client prints the acquired
/// curve in binary on stdout; it is decoded here and stored as text.
#[derive(Debug)]
pub struct ClientExperiment {
    config: Config,
    metadata: ExperimentMetadata
}

impl ClientExperiment {

    pub fn new(config: Config) -> Self {
        ClientExperiment { config, metadata: ExperimentMetadata::default() }
    }

    fn client_command(&self, board: u32, bpm: u32) -> Command {
        let mut command = Command::new(&self.config.client_program);
        command.arg("-e").arg(&self.config.endpoint)
            .arg("-d").arg(board.to_string())
            .arg("-m").arg(bpm.to_string());
        command
    }

    /// Run the client, killing it if it outlives the configured timeout
    fn execute(&self, mut command: Command) -> Result<ClientOutcome, RunError> {
        log::debug!("Running {:?}", command);
        let mut child = command.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        let stdout = child.stdout.take().map(drain);
        let stderr = child.stderr.take().map(drain);
        let timeout = Duration::from_millis(self.config.client_timeout_ms);
        let started = Instant::now();

        let status = loop {
            if let Some(status) = child.try_wait()? {
                break Some(status);
            }
            if started.elapsed() > timeout {
                child.kill()?;
                child.wait()?;
                break None;
            }
            std::thread::sleep(Duration::from_millis(10));
        };

        let join = |handle: Option<JoinHandle<Vec<u8>>>| -> Vec<u8> {
            match handle.map(|h| h.join()) {
                Some(Ok(bytes)) => bytes,
                _ => Vec::new()
            }
        };
        let stdout = join(stdout);
        let stderr = join(stderr);

        match status {
            Some(status) => Ok(ClientOutcome::Finished(Output { status, stdout, stderr })),
            None => Ok(ClientOutcome::TimedOut)
        }
    }

    /// Refuse input power levels the RFFE cannot take
    fn check_power_level(&self) -> Result<(), RunError> {
        match self.metadata.get(KEY_POWER_LEVEL) {
            Some(value) => match parse_power_level(value) {
                Some(level) if level > self.config.max_input_power => Err(RunError::OverPower(level)),
                Some(_) => Ok(()),
                None => Err(RunError::ClientError(format!("Invalid {} in metadata: {}", KEY_POWER_LEVEL, value)))
            },
            None => Ok(())
        }
    }

    fn switching_arg(&self) -> &'static str {
        match Switching::from_metadata(self.metadata.get(KEY_SWITCHING)) {
            Switching::On => "1",
            Switching::Off => "0"
        }
    }

    /// Apply the switching state and, when given, the attenuation to the RFFE
    fn configure_rffe(&self, request: &RunRequest) -> Result<(), RunError> {
        let mut command = self.client_command(request.board, request.bpm);
        command.arg("--setsw").arg(self.switching_arg());
        match self.metadata.get(KEY_ATTENUATION) {
            Some(att) => {
                command.arg("--rffesetatt").arg(att);
            }
            None => log::info!("No {} in metadata, RFFE attenuation left unchanged.", KEY_ATTENUATION)
        }
        match self.execute(command)? {
            ClientOutcome::Finished(output) if output.status.success() => Ok(()),
            _ => Err(RunError::RffeTimeout)
        }
    }

    fn configure_fmc(&self, request: &RunRequest) -> Result<(), RunError> {
        let mut command = self.client_command(request.board, request.bpm);
        let mut has_settings = false;
        if let Some(freq) = self.metadata.get(KEY_ADC_CLOCK) {
            command.arg("--setsi571freq").arg(freq);
            has_settings = true;
        }
        if let Some(delay) = self.metadata.get(KEY_ADC_DELAY) {
            command.arg("--setadcdly").arg(delay);
            has_settings = true;
        }
        if !has_settings {
            log::info!("No FMC settings in metadata, FMC left unchanged.");
            return Ok(());
        }
        match self.execute(command)? {
            ClientOutcome::Finished(output) if output.status.success() => Ok(()),
            _ => Err(RunError::BoardTimeout)
        }
    }

    /// Full acquisition. The client gives up on a silent board before it would be killed, so both
    /// a failed and a killed acquisition mean the board did not answer.
    fn acquire(&self, request: &RunRequest) -> Result<Vec<u8>, RunError> {
        let mut command = self.client_command(request.board, request.bpm);
        command.arg("--setsw").arg(self.switching_arg())
            .arg("--setchan").arg(request.datapath.channel().to_string())
            .arg("--setsamplespre").arg(self.config.samples_pre.to_string())
            .arg("--setsamplespost").arg(self.config.samples_post.to_string())
            .arg("--setnumshots").arg(self.config.num_shots.to_string())
            .arg("--fullacq")
            .arg("--timeout").arg(self.config.acq_timeout_ms().to_string())
            .arg("--filefmt").arg("1");

        match self.execute(command)? {
            ClientOutcome::TimedOut => {
                log::warn!("Acquisition client killed after {} ms", self.config.client_timeout_ms);
                Err(RunError::BoardTimeout)
            }
            ClientOutcome::Finished(output) if output.status.success() => Ok(output.stdout),
            ClientOutcome::Finished(output) => {
                log::warn!("Acquisition client failed: {}", String::from_utf8_lossy(&output.stderr).trim());
                Err(RunError::BoardTimeout)
            }
        }
    }
}

impl Experiment for ClientExperiment {

    fn load_from_metadata(&mut self, path: &Path) -> Result<(), MetadataError> {
        self.metadata = ExperimentMetadata::load(path)?;
        log::debug!("Loaded {} settings from {}", self.metadata.len(), path.display());
        Ok(())
    }

    fn metadata(&self) -> &ExperimentMetadata {
        &self.metadata
    }

    fn metadata_mut(&mut self) -> &mut ExperimentMetadata {
        &mut self.metadata
    }

    fn run(&mut self, request: &RunRequest) -> Result<(), RunError> {
        self.check_power_level()?;
        if request.rffe_config {
            self.configure_rffe(request)?;
        }
        if request.fmc_config {
            self.configure_fmc(request)?;
        }

        let raw = self.acquire(request)?;
        let curve = Curve::decode(request.datapath.channel(), &raw)?;
        log::debug!("Acquired {} ({} samples) from board {} bpm {}", human_bytes::human_bytes(raw.len() as f64), curve.num_samples(), request.board, request.bpm);

        if let Some(parent) = request.output_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut writer = BufWriter::new(File::create(&request.output_path)?);
        curve.write(&mut writer)?;
        writer.flush()?;
        self.metadata.write(&request.output_path.with_extension("metadata"))?;

        Ok(())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::acq::group::AcqGroup;
    use crate::acq::paths::OutputLayout;
    use crate::acq::single::{acquire_plan, AcqPlan, RunSummary};
    use std::os::unix::fs::PermissionsExt;

    fn fake_client(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("fake_client.sh");
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    fn experiment(dir: &Path, body: &str, timeout_ms: u64) -> ClientExperiment {
        let mut config = Config::default();
        config.client_program = fake_client(dir, body);
        config.client_timeout_ms = timeout_ms;
        ClientExperiment::new(config)
    }

    fn request(dir: &Path) -> RunRequest {
        RunRequest {
            output_path: dir.join("out").join("data_1_adc.txt"),
            datapath: Datapath::Adc,
            board: 2,
            bpm: 1,
            fmc_config: false,
            rffe_config: false
        }
    }

    #[test]
    fn writes_curve_and_metadata() {
        let dir = tempfile::tempdir().unwrap();
        // One ADC row: 1, 2, 3, -1
        let mut exp = experiment(dir.path(), r"printf '\001\000\002\000\003\000\377\377'", 5000);
        exp.metadata_mut().set("operator", "jdoe");
        let req = request(dir.path());
        exp.run(&req).unwrap();

        let text = std::fs::read_to_string(&req.output_path).unwrap();
        assert_eq!(text, "       1\t        2\t        3\t       -1\n");
        let meta = std::fs::read_to_string(req.output_path.with_extension("metadata")).unwrap();
        assert_eq!(meta, "operator = jdoe\n");
    }

    #[test]
    fn over_power_is_refused_before_running() {
        let dir = tempfile::tempdir().unwrap();
        let mut exp = experiment(dir.path(), "exit 1", 5000);
        exp.metadata_mut().set(KEY_POWER_LEVEL, "10 dBm");
        match exp.run(&request(dir.path())) {
            Err(RunError::OverPower(level)) => assert_eq!(level, 10.0),
            other => panic!("unexpected result {:?}", other)
        }

        exp.metadata_mut().set(KEY_POWER_LEVEL, "loud");
        assert!(matches!(exp.run(&request(dir.path())), Err(RunError::ClientError(_))));
    }

    #[test]
    fn hung_client_is_a_board_timeout() {
        let dir = tempfile::tempdir().unwrap();
        let mut exp = experiment(dir.path(), "exec sleep 5", 100);
        let err = exp.run(&request(dir.path())).unwrap_err();
        assert!(matches!(err, RunError::BoardTimeout));
        assert!(err.is_skippable());
    }

    // Logs every invocation's arguments next to the script, prints one ADC row on acquisitions
    fn logging_client(prelude: &str) -> String {
        format!(
            "echo \"$@\" >> \"$(dirname \"$0\")/calls.log\"\n{}\ncase \"$*\" in *--fullacq*) printf '\\001\\000\\002\\000\\003\\000\\004\\000';; esac",
            prelude
        )
    }

    fn calls(dir: &Path) -> Vec<String> {
        std::fs::read_to_string(dir.join("calls.log")).unwrap().lines().map(|l| l.to_string()).collect()
    }

    #[test]
    fn failing_rffe_step_is_an_rffe_timeout() {
        let dir = tempfile::tempdir().unwrap();
        let mut exp = experiment(dir.path(), "echo 'no rffe' >&2\nexit 3", 5000);
        exp.metadata_mut().set(KEY_ATTENUATION, "10");
        let mut req = request(dir.path());
        req.rffe_config = true;
        assert!(matches!(exp.run(&req), Err(RunError::RffeTimeout)));
    }

    #[test]
    fn rffe_step_sets_switching_and_attenuation() {
        let dir = tempfile::tempdir().unwrap();
        let mut exp = experiment(dir.path(), &logging_client(""), 5000);
        exp.metadata_mut().set(KEY_SWITCHING, "on");
        let mut req = request(dir.path());
        req.rffe_config = true;
        exp.run(&req).unwrap();

        exp.metadata_mut().set(KEY_ATTENUATION, "12.5");
        exp.run(&req).unwrap();

        let calls = calls(dir.path());
        assert_eq!(calls.len(), 4);
        assert!(calls[0].ends_with("-d 2 -m 1 --setsw 1"));
        assert!(calls[1].contains("--setsw 1 --setchan 0"));
        assert!(calls[2].ends_with("--setsw 1 --rffesetatt 12.5"));
    }

    #[test]
    fn fmc_step_passes_clock_and_delay() {
        let dir = tempfile::tempdir().unwrap();
        let mut exp = experiment(dir.path(), &logging_client(""), 5000);
        let mut req = request(dir.path());
        req.fmc_config = true;

        // Nothing to configure: only the acquisition runs
        exp.run(&req).unwrap();
        exp.metadata_mut().set(KEY_ADC_CLOCK, "113040445");
        exp.metadata_mut().set(KEY_ADC_DELAY, "200");
        exp.run(&req).unwrap();

        let calls = calls(dir.path());
        assert_eq!(calls.len(), 3);
        assert!(calls[0].contains("--fullacq"));
        assert!(calls[1].ends_with("-m 1 --setsi571freq 113040445 --setadcdly 200"));
        // The client gives up before the 5 s kill deadline
        assert!(calls[2].contains("--timeout 4000 "));
    }

    #[test]
    fn failing_fmc_step_is_a_board_timeout() {
        let dir = tempfile::tempdir().unwrap();
        let body = logging_client("case \"$*\" in *--setadcdly*) exit 1;; esac");
        let mut exp = experiment(dir.path(), &body, 5000);
        exp.metadata_mut().set(KEY_ADC_DELAY, "200");
        let mut req = request(dir.path());
        req.fmc_config = true;
        assert!(matches!(exp.run(&req), Err(RunError::BoardTimeout)));
        assert_eq!(calls(dir.path()).len(), 1);
        assert!(!req.output_path.exists());
    }

    #[test]
    fn failed_acquisition_skips_to_next_bpm() {
        let dir = tempfile::tempdir().unwrap();
        let body = logging_client("case \"$*\" in *\"-m 0 \"*) echo 'acquisition timeout' >&2; exit 1;; esac");
        let mut exp = experiment(dir.path(), &body, 5000);
        let layout = OutputLayout::new(&dir.path().join("data"), "18-10-2026", "AFC1", "V3P1");
        let plan = AcqPlan {
            layout: &layout,
            groups: &[AcqGroup { board: 2, bpms: vec![0, 1] }],
            datapaths: &[Datapath::Adc],
            switching: &[Switching::Off],
            sweep_step: None,
            fmc_config: false,
            rffe_config: false
        };

        let summary = acquire_plan(&mut exp, &plan).unwrap();
        assert_eq!(summary, RunSummary { acquired: 1, skipped: 1 });
        assert!(layout.data_file(Datapath::Adc, None, Switching::Off, 1).exists());
        assert_eq!(calls(dir.path()).len(), 2);
    }

    #[test]
    fn datapaths_map_to_channels() {
        assert_eq!(Datapath::Adc.channel(), CHAN_ADC);
        assert_eq!(Datapath::Tbt.channel(), CHAN_TBT_AMP);
        assert_eq!(Datapath::Fofb.channel(), CHAN_FOFB_AMP);
        assert_eq!(Switching::from_metadata(Some(" on")), Switching::On);
        assert_eq!(Switching::from_metadata(Some("off, on")), Switching::Off);
        assert_eq!(parse_power_level("-20dBm"), Some(-20.0));
    }
}
