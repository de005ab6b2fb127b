//! Session telemetry.
//!
//! Events are appended as JSON lines to `<telemetry_dir>/events.log`; the
//! opt-in flag and session properties persist in `<telemetry_dir>/state.json`.
//! Both operations are fire-and-forget: failures are logged and never affect
//! control flow.

use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// Emitted when a start invocation begins.
pub const START_BEGIN: &str = "start_begin";
/// Emitted when a start invocation completes, successfully or by
/// short-circuit.
pub const START_END: &str = "start_end";
/// Emitted when a stop invocation begins.
pub const STOP: &str = "stop";

/// Shared handle to a telemetry sink.
pub type DynTelemetry = Arc<dyn Telemetry>;

/// Fire-and-forget telemetry sink.
pub trait Telemetry: Send + Sync {
    /// Records a session event with optional tags.
    fn event(&self, name: &str, tags: &[(&str, Value)]);

    /// Sets a property attached to every subsequent event.
    fn set_prop(&self, key: &str, value: &str);
}

/// Persisted telemetry state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
struct State {
    enabled: bool,
    props: BTreeMap<String, String>,
}

impl Default for State {
    fn default() -> Self {
        Self {
            enabled: true,
            props: BTreeMap::new(),
        }
    }
}

/// File-backed telemetry sink.
pub struct FileTelemetry {
    dir: PathBuf,
    state: Mutex<State>,
}

impl FileTelemetry {
    /// Opens the telemetry store under `dir`, creating it if absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or an existing
    /// state file cannot be parsed.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;

        let state_path = dir.join("state.json");
        let state = if state_path.exists() {
            let content = std::fs::read_to_string(&state_path)?;
            serde_json::from_str(&content)
                .map_err(|e| CoreError::Telemetry(format!("corrupt state file: {e}")))?
        } else {
            State::default()
        };

        Ok(Self {
            dir,
            state: Mutex::new(state),
        })
    }

    /// Whether event recording is currently enabled.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.lock_state().enabled
    }

    /// Enables or disables event recording, persisting the choice.
    ///
    /// # Errors
    ///
    /// Returns an error if the state file cannot be written.
    pub fn set_enabled(&self, enabled: bool) -> Result<()> {
        let snapshot = {
            let mut state = self.lock_state();
            state.enabled = enabled;
            state.clone()
        };
        self.save(&snapshot)
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, State> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn save(&self, state: &State) -> Result<()> {
        let content = serde_json::to_string_pretty(state)
            .map_err(|e| CoreError::Telemetry(e.to_string()))?;
        std::fs::write(self.dir.join("state.json"), content)?;
        Ok(())
    }

    fn append_event(&self, name: &str, tags: &[(&str, Value)]) -> Result<()> {
        let (enabled, props) = {
            let state = self.lock_state();
            (state.enabled, state.props.clone())
        };
        if !enabled {
            return Ok(());
        }

        let mut record = serde_json::Map::new();
        record.insert(
            "time".to_string(),
            Value::String(chrono::Utc::now().to_rfc3339()),
        );
        record.insert("event".to_string(), Value::String(name.to_string()));
        if !props.is_empty() {
            record.insert(
                "props".to_string(),
                serde_json::to_value(&props).map_err(|e| CoreError::Telemetry(e.to_string()))?,
            );
        }
        if !tags.is_empty() {
            let tags: serde_json::Map<String, Value> = tags
                .iter()
                .map(|(k, v)| ((*k).to_string(), v.clone()))
                .collect();
            record.insert("tags".to_string(), Value::Object(tags));
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.dir.join("events.log"))?;
        writeln!(file, "{}", Value::Object(record))?;
        Ok(())
    }
}

impl Telemetry for FileTelemetry {
    fn event(&self, name: &str, tags: &[(&str, Value)]) {
        if let Err(e) = self.append_event(name, tags) {
            tracing::debug!(event = name, "failed to record telemetry event: {e}");
        }
    }

    fn set_prop(&self, key: &str, value: &str) {
        let snapshot = {
            let mut state = self.lock_state();
            state.props.insert(key.to_string(), value.to_string());
            state.clone()
        };
        if let Err(e) = self.save(&snapshot) {
            tracing::debug!(key, "failed to persist telemetry property: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn read_events(dir: &std::path::Path) -> Vec<Value> {
        let content = std::fs::read_to_string(dir.join("events.log")).unwrap_or_default();
        content
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[test]
    fn test_event_appends_json_line() {
        let tmp = TempDir::new().unwrap();
        let telemetry = FileTelemetry::open(tmp.path()).unwrap();

        telemetry.event(START_BEGIN, &[]);
        telemetry.event(START_END, &[("alreadyrunning", json!(true))]);

        let events = read_events(tmp.path());
        assert_eq!(events.len(), 2);
        assert_eq!(events[0]["event"], "start_begin");
        assert_eq!(events[1]["event"], "start_end");
        assert_eq!(events[1]["tags"]["alreadyrunning"], json!(true));
    }

    #[test]
    fn test_props_attach_to_events_and_persist() {
        let tmp = TempDir::new().unwrap();
        {
            let telemetry = FileTelemetry::open(tmp.path()).unwrap();
            telemetry.set_prop("type", "sky");
            telemetry.event(START_BEGIN, &[]);
        }

        let events = read_events(tmp.path());
        assert_eq!(events[0]["props"]["type"], "sky");

        // A fresh handle sees the persisted property.
        let telemetry = FileTelemetry::open(tmp.path()).unwrap();
        telemetry.event(STOP, &[]);
        let events = read_events(tmp.path());
        assert_eq!(events[1]["props"]["type"], "sky");
    }

    #[test]
    fn test_disabled_drops_events() {
        let tmp = TempDir::new().unwrap();
        let telemetry = FileTelemetry::open(tmp.path()).unwrap();
        assert!(telemetry.is_enabled());

        telemetry.set_enabled(false).unwrap();
        telemetry.event(START_BEGIN, &[]);
        assert!(read_events(tmp.path()).is_empty());

        telemetry.set_enabled(true).unwrap();
        telemetry.event(START_BEGIN, &[]);
        assert_eq!(read_events(tmp.path()).len(), 1);
    }

    #[test]
    fn test_enabled_survives_reopen() {
        let tmp = TempDir::new().unwrap();
        {
            let telemetry = FileTelemetry::open(tmp.path()).unwrap();
            telemetry.set_enabled(false).unwrap();
        }
        let telemetry = FileTelemetry::open(tmp.path()).unwrap();
        assert!(!telemetry.is_enabled());
    }
}
