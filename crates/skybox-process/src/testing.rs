//! Shared fakes for driver unit tests.

use async_trait::async_trait;
use skybox_host::{DaemonSpec, ServiceSupervisor};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// Supervisor fake recording launches and stops, with a switchable
/// liveness answer.
pub(crate) struct FakeSupervisor {
    running: AtomicBool,
    launched: Mutex<Vec<DaemonSpec>>,
    stopped: Mutex<Vec<String>>,
}

impl Default for FakeSupervisor {
    fn default() -> Self {
        Self {
            running: AtomicBool::new(true),
            launched: Mutex::new(Vec::new()),
            stopped: Mutex::new(Vec::new()),
        }
    }
}

impl FakeSupervisor {
    pub(crate) fn set_running(&self, running: bool) {
        self.running.store(running, Ordering::SeqCst);
    }

    pub(crate) fn launched(&self) -> Vec<DaemonSpec> {
        self.launched.lock().unwrap().clone()
    }

    pub(crate) fn stopped(&self) -> Vec<String> {
        self.stopped.lock().unwrap().clone()
    }
}

#[async_trait]
impl ServiceSupervisor for FakeSupervisor {
    async fn launch(&self, spec: DaemonSpec) -> skybox_host::Result<u32> {
        self.launched.lock().unwrap().push(spec);
        self.running.store(true, Ordering::SeqCst);
        Ok(4242)
    }

    fn is_running(&self, _label: &str) -> skybox_host::Result<bool> {
        Ok(self.running.load(Ordering::SeqCst))
    }

    async fn stop(&self, label: &str) -> skybox_host::Result<()> {
        self.stopped.lock().unwrap().push(label.to_string());
        self.running.store(false, Ordering::SeqCst);
        Ok(())
    }
}
