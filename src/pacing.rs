use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

pub const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Shared stop flag, raised by Ctrl-C
pub type StopFlag = Arc<AtomicBool>;

pub fn stop_flag() -> StopFlag {
    Arc::new(AtomicBool::new(false))
}

pub fn is_stopped(flag: &StopFlag) -> bool {
    flag.load(Ordering::SeqCst)
}

/// Install the Ctrl-C handler that raises the flag. Only one handler may exist per process.
pub fn install_ctrlc(flag: &StopFlag) -> Result<(), ctrlc::Error> {
    let q = flag.clone();
    ctrlc::set_handler(move || {
        q.store(true, Ordering::SeqCst);
    })
}

/// Sleep in `poll` steps until `interval` has passed since `since`.
/// Returns false if the stop flag was raised while waiting.
pub fn wait_until_elapsed(since: Instant, interval: Duration, poll: Duration, flag: &StopFlag) -> bool {
    while since.elapsed() < interval {
        if is_stopped(flag) {
            return false;
        }
        let remaining = interval.saturating_sub(since.elapsed());
        std::thread::sleep(remaining.min(poll));
    }
    !is_stopped(flag)
}
