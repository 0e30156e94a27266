//! Interrupt routing for interactive runs
//!
//! While a step runs interactively, Ctrl-C cancels that step's scope. During
//! a debug session the gate is suppressed so the keystroke reaches the
//! attached shell instead.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Shared switch deciding whether an interrupt cancels the run
#[derive(Debug, Clone, Default)]
pub struct InterruptGate {
    suppressed: Arc<AtomicBool>,
}

impl InterruptGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop interrupts from cancelling until the guard is dropped
    pub fn suppress(&self) -> SuppressGuard {
        let previous = self.suppressed.swap(true, Ordering::SeqCst);
        SuppressGuard {
            gate: self.clone(),
            previous,
        }
    }

    pub fn is_suppressed(&self) -> bool {
        self.suppressed.load(Ordering::SeqCst)
    }
}

/// Restores interrupt delivery when dropped
#[must_use = "interrupts are restored as soon as the guard is dropped"]
#[derive(Debug)]
pub struct SuppressGuard {
    gate: InterruptGate,
    previous: bool,
}

impl Drop for SuppressGuard {
    fn drop(&mut self) {
        self.gate.suppressed.store(self.previous, Ordering::SeqCst);
    }
}

/// Where interrupts come from
#[derive(Debug, Clone, Default)]
pub enum InterruptSource {
    /// The process's SIGINT
    #[default]
    CtrlC,
    /// Interrupts raised with [`InterruptSource::trigger`]
    Manual(Arc<Notify>),
}

impl InterruptSource {
    pub fn manual() -> Self {
        InterruptSource::Manual(Arc::new(Notify::new()))
    }

    /// Raise an interrupt on a manual source. No-op for `CtrlC`.
    pub fn trigger(&self) {
        if let InterruptSource::Manual(notify) = self {
            notify.notify_one();
        }
    }

    async fn recv(&self) -> std::io::Result<()> {
        match self {
            InterruptSource::CtrlC => tokio::signal::ctrl_c().await,
            InterruptSource::Manual(notify) => {
                notify.notified().await;
                Ok(())
            }
        }
    }
}

/// Interrupt listener bound to one step invocation
#[derive(Debug)]
pub struct InterruptScope {
    token: CancellationToken,
    listener: JoinHandle<()>,
}

impl InterruptScope {
    /// Install a listener cancelling a child of `parent` on interrupt.
    ///
    /// Must be called from within a tokio runtime.
    pub fn install(
        parent: &CancellationToken,
        gate: &InterruptGate,
        source: &InterruptSource,
    ) -> Self {
        let token = parent.child_token();

        let scoped = token.clone();
        let gate = gate.clone();
        let source = source.clone();
        let listener = tokio::spawn(async move {
            loop {
                if let Err(e) = source.recv().await {
                    warn!("failed to listen for interrupts: {}", e);
                    return;
                }
                if gate.is_suppressed() {
                    debug!("interrupt delivered to debug session");
                    continue;
                }
                warn!("interrupt received, cancelling step");
                scoped.cancel();
                return;
            }
        });

        Self { token, listener }
    }

    /// Token cancelled by the parent or by an interrupt
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}

impl Drop for InterruptScope {
    fn drop(&mut self) {
        self.listener.abort();
    }
}
