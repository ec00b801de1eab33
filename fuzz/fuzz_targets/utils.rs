use std::str;
use std::sync::mpsc;
use std::sync::Mutex;
use std::time::Duration;

pub const MAX_INPUT_SIZE: usize = 256 * 1024;

const TIMEOUT: Duration = Duration::from_secs(1);

/// Caps `data` at `MAX_INPUT_SIZE` to keep pathological inputs cheap.
#[inline]
#[allow(dead_code)]
pub fn capped(data: &[u8]) -> &[u8] {
    &data[..data.len().min(MAX_INPUT_SIZE)]
}

/// Returns a UTF-8 view of `data` truncated to `MAX_INPUT_SIZE`.
///
/// If the cut lands inside a multibyte codepoint, up to 3 more bytes are
/// trimmed before giving up.
#[inline]
#[allow(dead_code)]
pub fn truncate_utf8(data: &[u8]) -> Option<&str> {
    let cap = data.len().min(MAX_INPUT_SIZE);
    for trim in 0..=3 {
        if cap < trim {
            break;
        }
        if let Ok(text) = str::from_utf8(&data[..cap - trim]) {
            return Some(text);
        }
    }
    None
}

/// Runs a check on a dedicated thread so hangs surface as a panic instead of
/// stalling libFuzzer.
#[allow(dead_code)]
pub struct Watchdog {
    name: &'static str,
    inputs: mpsc::SyncSender<Vec<u8>>,
    done: Mutex<mpsc::Receiver<()>>,
}

#[allow(dead_code)]
impl Watchdog {
    pub fn spawn(name: &'static str, check: fn(&[u8])) -> Self {
        let (inputs, input_rx) = mpsc::sync_channel::<Vec<u8>>(0);
        let (done_tx, done) = mpsc::sync_channel::<()>(0);
        std::thread::spawn(move || {
            for input in input_rx {
                check(&input);
                let _ = done_tx.send(());
            }
        });
        Self {
            name,
            inputs,
            done: Mutex::new(done),
        }
    }

    pub fn run(&self, data: &[u8]) {
        if self.inputs.send(capped(data).to_vec()).is_err() {
            panic!("{} worker thread exited", self.name);
        }
        let done = match self.done.lock() {
            Ok(done) => done,
            Err(_) => panic!("{} worker receiver poisoned", self.name),
        };
        match done.recv_timeout(TIMEOUT) {
            Ok(()) => {}
            Err(mpsc::RecvTimeoutError::Timeout) => panic!("{} timed out", self.name),
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                panic!("{} worker thread panicked", self.name)
            }
        }
    }
}
