//! Structured JSON-line logging.
//!
//! Events append to `$LOG_DIR/events.jsonl` (default `out/`); warnings and
//! errors are mirrored to stderr. `LOG_LEVEL` filters at emit time.

use std::fs::{create_dir_all, File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, OnceLock};

use serde_json::{json, Map, Value};

use crate::state;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Debug = 0,
    Info = 1,
    Warn = 2,
    Error = 3,
}

impl Level {
    pub fn from_env() -> Self {
        match std::env::var("LOG_LEVEL").as_deref() {
            Ok("debug") => Level::Debug,
            Ok("info") => Level::Info,
            Ok("warn") => Level::Warn,
            Ok("error") => Level::Error,
            _ => Level::Info,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Domain {
    Fetch,
    Build,
    Snapshot,
    View,
    System,
}

impl Domain {
    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Fetch => "fetch",
            Domain::Build => "build",
            Domain::Snapshot => "snapshot",
            Domain::View => "view",
            Domain::System => "system",
        }
    }
}

static LOG_SEQ: AtomicU64 = AtomicU64::new(0);
static SINK: OnceLock<Option<Mutex<File>>> = OnceLock::new();

fn next_seq() -> u64 {
    LOG_SEQ.fetch_add(1, Ordering::SeqCst)
}

fn sink() -> &'static Option<Mutex<File>> {
    SINK.get_or_init(|| {
        let dir = PathBuf::from(std::env::var("LOG_DIR").unwrap_or_else(|_| "out".to_string()));
        if let Err(err) = create_dir_all(&dir) {
            eprintln!("[log] failed to create log dir: {}", err);
            return None;
        }
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(dir.join("events.jsonl"))
            .map_err(|err| eprintln!("[log] failed to open events log: {}", err))
            .ok()
            .map(Mutex::new)
    })
}

/// Emit a structured log entry. A `msg` field is lifted to the top level,
/// everything else lands under `data`.
pub fn log(level: Level, domain: Domain, event: &str, mut fields: Map<String, Value>) {
    if level < Level::from_env() {
        return;
    }

    let msg = fields.remove("msg").unwrap_or(Value::String(String::new()));
    let mut entry = Map::new();
    entry.insert("ts".to_string(), json!(state::now_rfc3339()));
    entry.insert("seq".to_string(), json!(next_seq()));
    entry.insert("lvl".to_string(), json!(level.as_str().to_uppercase()));
    entry.insert("domain".to_string(), json!(domain.as_str()));
    entry.insert("event".to_string(), json!(event));
    entry.insert("msg".to_string(), msg);
    entry.insert("data".to_string(), Value::Object(fields));

    let line = Value::Object(entry).to_string();
    if let Some(file) = sink() {
        if let Ok(mut f) = file.lock() {
            let _ = writeln!(f, "{}", line);
        }
    }
    if level >= Level::Warn {
        eprintln!("{}", line);
    }
}

pub fn obj(pairs: &[(&str, Value)]) -> Map<String, Value> {
    let mut map = Map::new();
    for (k, v) in pairs {
        map.insert((*k).to_string(), v.clone());
    }
    map
}

pub fn v_str(s: &str) -> Value {
    Value::String(s.to_string())
}

pub fn v_num(n: f64) -> Value {
    json!(n)
}
