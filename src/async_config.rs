use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use tracing::warn;

use crate::config::HostConfig;

const SAVE_DEBOUNCE: Duration = Duration::from_millis(250);

/// Background config saver to keep file I/O off the UI thread.
///
/// Bursts of save requests are coalesced into a single write. Dropping the
/// saver writes whatever is still pending.
pub struct AsyncConfigSaver {
    tx: mpsc::Sender<Msg>,
    handle: Option<thread::JoinHandle<()>>,
}

enum Msg {
    Save(HostConfig),
    Flush(mpsc::Sender<()>),
    Shutdown,
}

impl AsyncConfigSaver {
    pub fn new(path: PathBuf) -> Self {
        let (tx, rx) = mpsc::channel::<Msg>();
        let handle = thread::Builder::new()
            .name("ssh-sidebar-config-saver".to_string())
            .spawn(move || saver_thread(path, rx))
            .ok();
        Self { tx, handle }
    }

    /// Request a save. This is best-effort and returns immediately.
    pub fn request_save(&self, cfg: HostConfig) {
        let _ = self.tx.send(Msg::Save(cfg));
    }

    /// Flush any pending save and wait for completion (bounded by a timeout).
    pub fn flush(&self, timeout: Duration) {
        let (ack_tx, ack_rx) = mpsc::channel::<()>();
        if self.tx.send(Msg::Flush(ack_tx)).is_ok() {
            let _ = ack_rx.recv_timeout(timeout);
        }
    }
}

impl Drop for AsyncConfigSaver {
    fn drop(&mut self) {
        let _ = self.tx.send(Msg::Shutdown);
        if let Some(h) = self.handle.take() {
            let _ = h.join();
        }
    }
}

fn write(path: &Path, pending: &mut Option<HostConfig>) {
    if let Some(cfg) = pending.take() {
        if let Err(err) = crate::config::save(path, &cfg) {
            warn!(error = %format!("{err:#}"), "config save failed");
        }
    }
}

fn saver_thread(path: PathBuf, rx: mpsc::Receiver<Msg>) {
    let mut pending: Option<HostConfig> = None;
    loop {
        // With a write pending, wait out the debounce window; otherwise block.
        let msg = if pending.is_some() {
            match rx.recv_timeout(SAVE_DEBOUNCE) {
                Ok(msg) => Some(msg),
                Err(mpsc::RecvTimeoutError::Timeout) => None,
                Err(mpsc::RecvTimeoutError::Disconnected) => Some(Msg::Shutdown),
            }
        } else {
            Some(rx.recv().unwrap_or(Msg::Shutdown))
        };

        match msg {
            Some(Msg::Save(cfg)) => pending = Some(cfg),
            Some(Msg::Flush(ack)) => {
                write(&path, &mut pending);
                let _ = ack.send(());
            }
            Some(Msg::Shutdown) => {
                write(&path, &mut pending);
                return;
            }
            None => write(&path, &mut pending),
        }
    }
}
