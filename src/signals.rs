use signal_hook::consts::{SIGHUP, SIGINT, SIGQUIT, SIGTERM, SIGWINCH};
use signal_hook::SigId;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Signal notifications, polled by the navigation loop once per iteration.
///
/// The handlers only set flags; all terminal I/O happens in the loop.
#[derive(Default)]
pub struct Signals {
    resized: Arc<AtomicBool>,
    terminated: Arc<AtomicBool>,
    ids: Vec<SigId>,
}

impl Signals {
    pub fn install() -> io::Result<Self> {
        let mut signals = Self::default();
        let id = signal_hook::flag::register(SIGWINCH, Arc::clone(&signals.resized))?;
        signals.ids.push(id);
        for signal in [SIGTERM, SIGHUP, SIGINT, SIGQUIT] {
            let id = signal_hook::flag::register(signal, Arc::clone(&signals.terminated))?;
            signals.ids.push(id);
        }
        Ok(signals)
    }

    /// True once per batch of resize notifications.
    pub fn take_resize(&self) -> bool {
        self.resized.swap(false, Ordering::SeqCst)
    }

    pub fn terminated(&self) -> bool {
        self.terminated.load(Ordering::SeqCst)
    }

    #[cfg(test)]
    pub fn notify_resize(&self) {
        self.resized.store(true, Ordering::SeqCst);
    }

    #[cfg(test)]
    pub fn notify_terminate(&self) {
        self.terminated.store(true, Ordering::SeqCst);
    }
}

impl Drop for Signals {
    fn drop(&mut self) {
        for id in self.ids.drain(..) {
            signal_hook::low_level::unregister(id);
        }
    }
}
