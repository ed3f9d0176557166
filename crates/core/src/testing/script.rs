//! Scripted behavior shared by the mock collaborators.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use tokio::sync::{watch, RwLock};

use crate::collaborator::CollaboratorError;

/// Controls how a mock responds: a number of transient failures, an
/// optional permanent failure, and a gate that holds calls until released.
#[derive(Debug, Clone)]
pub struct Script {
    calls: Arc<AtomicU32>,
    transient_failures: Arc<AtomicU32>,
    permanent: Arc<RwLock<Option<String>>>,
    panics: Arc<AtomicBool>,
    gate: Arc<watch::Sender<bool>>,
}

impl Default for Script {
    fn default() -> Self {
        Self::new()
    }
}

impl Script {
    pub fn new() -> Self {
        let (gate, _) = watch::channel(false);
        Self {
            calls: Arc::new(AtomicU32::new(0)),
            transient_failures: Arc::new(AtomicU32::new(0)),
            permanent: Arc::new(RwLock::new(None)),
            panics: Arc::new(AtomicBool::new(false)),
            gate: Arc::new(gate),
        }
    }

    /// Fail the next `n` calls with a transient error.
    pub fn fail_transiently(&self, n: u32) {
        self.transient_failures.store(n, Ordering::SeqCst);
    }

    /// Fail every call with a permanent error.
    pub async fn fail_permanently(&self, message: impl Into<String>) {
        *self.permanent.write().await = Some(message.into());
    }

    /// Panic inside every call, simulating a bug in the collaborator.
    pub fn panic_on_call(&self) {
        self.panics.store(true, Ordering::SeqCst);
    }

    /// Hold every call until [`release`](Self::release).
    pub fn block(&self) {
        self.gate.send_replace(true);
    }

    pub fn release(&self) {
        self.gate.send_replace(false);
    }

    /// Number of calls started so far, including blocked ones.
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    /// Runs the script for one call.
    pub(crate) async fn enter(&self) -> Result<(), CollaboratorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let mut gate = self.gate.subscribe();
        let _ = gate.wait_for(|blocked| !*blocked).await;

        if self.panics.load(Ordering::SeqCst) {
            panic!("scripted collaborator panic");
        }

        if let Some(ref message) = *self.permanent.read().await {
            return Err(CollaboratorError::permanent(message.clone()));
        }

        let consumed = self
            .transient_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if consumed {
            return Err(CollaboratorError::transient("scripted transient failure"));
        }
        Ok(())
    }
}
