//! Exit watching for supervised services.
//!
//! Each driver registers one detached task that polls the supervisor for its
//! service. When the service disappears without `stop` having been called on
//! the driver, the service label is sent once on the crash channel and the
//! task ends. The task is never joined; the channel is the only way its
//! observation leaves the task.

use skybox_host::DynSupervisor;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Interval between liveness probes.
pub const WATCH_INTERVAL: Duration = Duration::from_secs(5);

/// Sender half of the crash channel. Carries the label of a service that
/// exited unexpectedly.
pub type CrashSender = mpsc::UnboundedSender<String>;

/// Receiver half of the crash channel.
pub type CrashReceiver = mpsc::UnboundedReceiver<String>;

/// Spawns the detached polling task for one service.
///
/// `stopping` belongs to the owning driver; once set, the task ends without
/// reporting. Supervisor probe errors are logged and polling continues.
pub(crate) fn spawn_exit_watch(
    supervisor: DynSupervisor,
    label: &'static str,
    stopping: Arc<AtomicBool>,
    interval: Duration,
    crash_tx: CrashSender,
) {
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(interval).await;
            if stopping.load(Ordering::SeqCst) {
                debug!(label, "exit watch ended by stop");
                return;
            }
            match supervisor.is_running(label) {
                Ok(true) => {}
                Ok(false) => {
                    if !stopping.load(Ordering::SeqCst) {
                        warn!(label, "service exited unexpectedly");
                        let _ = crash_tx.send(label.to_string());
                    }
                    return;
                }
                Err(err) => {
                    warn!(label, error = %err, "liveness probe failed");
                }
            }
        }
    });
}
