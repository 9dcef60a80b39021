//! Cooperative pause/stop signalling shared between a run and its owner.

use std::fmt;
use std::sync::Arc;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Why a step was abandoned before it could be recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interrupt {
    Paused,
    Stopped,
}

impl fmt::Display for Interrupt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Interrupt::Paused => f.write_str("paused"),
            Interrupt::Stopped => f.write_str("stopped"),
        }
    }
}

/// Pause/resume/stop handle. Clones share the same signals.
///
/// Stop is one-way and also releases anyone waiting on a pause.
#[derive(Debug, Clone)]
pub struct PauseStopController {
    stop: CancellationToken,
    paused: Arc<watch::Sender<bool>>,
}

impl Default for PauseStopController {
    fn default() -> Self {
        Self::new()
    }
}

impl PauseStopController {
    pub fn new() -> Self {
        let (paused, _) = watch::channel(false);
        Self {
            stop: CancellationToken::new(),
            paused: Arc::new(paused),
        }
    }

    pub fn pause(&self) {
        if !self.paused.send_replace(true) {
            info!("agent paused");
        }
    }

    pub fn resume(&self) {
        if self.paused.send_replace(false) {
            info!("agent resumed");
        }
    }

    pub fn stop(&self) {
        self.stop.cancel();
        self.paused.send_replace(false);
        info!("agent stop requested");
    }

    pub fn is_paused(&self) -> bool {
        *self.paused.borrow()
    }

    pub fn is_stopped(&self) -> bool {
        self.stop.is_cancelled()
    }

    /// Fails with the pending interruption, stop taking precedence.
    pub fn check(&self) -> Result<(), Interrupt> {
        if self.is_stopped() {
            Err(Interrupt::Stopped)
        } else if self.is_paused() {
            Err(Interrupt::Paused)
        } else {
            Ok(())
        }
    }

    /// Resolves once the run is resumed or stopped.
    pub async fn wait_while_paused(&self) {
        let mut rx = self.paused.subscribe();
        loop {
            if self.is_stopped() || !*rx.borrow_and_update() {
                return;
            }
            tokio::select! {
                changed = rx.changed() => {
                    if changed.is_err() {
                        return;
                    }
                }
                _ = self.stop.cancelled() => return,
            }
        }
    }

    /// Resolves once stop has been requested.
    pub async fn stopped(&self) {
        self.stop.cancelled().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn check_reports_stop_before_pause() {
        let control = PauseStopController::new();
        assert_eq!(control.check(), Ok(()));
        control.pause();
        assert_eq!(control.check(), Err(Interrupt::Paused));
        control.stop();
        assert_eq!(control.check(), Err(Interrupt::Stopped));
        assert!(!control.is_paused());
    }

    #[tokio::test]
    async fn resume_releases_waiter() {
        let control = PauseStopController::new();
        control.pause();

        let waiter = {
            let control = control.clone();
            tokio::spawn(async move { control.wait_while_paused().await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!waiter.is_finished());

        control.resume();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter released")
            .unwrap();
    }

    #[tokio::test]
    async fn stop_releases_waiter() {
        let control = PauseStopController::new();
        control.pause();
        let handle = control.clone();
        let waiter = tokio::spawn(async move { handle.wait_while_paused().await });

        control.stop();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter released")
            .unwrap();
    }
}
