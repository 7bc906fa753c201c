//! Fragment store — the merged, namespaced configuration snapshot.
//!
//! A load scans one or more directories for fragment files, parses each one
//! and deep-merges it under its namespace key (see [`namespace_key`]). Reads
//! walk dotted paths through the merged snapshot and fall back to a default
//! on any miss.
//!
//! The store is written only by [`ConfigStore::load`]; the new snapshot is
//! built off to the side and swapped in once complete, so readers never see
//! a half-loaded store.

mod fragment;
mod merge;

use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::{debug, error, info, warn};
use walkdir::WalkDir;

use crate::error::AppError;

pub use fragment::{FragmentFormat, namespace_key};
pub use merge::deep_merge;

/// Outcome of one [`ConfigStore::load`] call.
#[derive(Debug, Default)]
pub struct LoadReport {
    /// Fragment files merged into the store, in merge order.
    pub loaded: Vec<PathBuf>,
    /// Fragments that were skipped, one [`AppError::Fragment`] each.
    pub failed: Vec<AppError>,
}

impl LoadReport {
    /// `true` if every discovered fragment loaded.
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Namespaced configuration built from fragment files.
#[derive(Debug)]
pub struct ConfigStore {
    format: FragmentFormat,
    namespaces: RwLock<Map<String, Value>>,
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::new(FragmentFormat::default())
    }
}

impl ConfigStore {
    /// An empty store that will read fragments of `format`.
    pub fn new(format: FragmentFormat) -> Self {
        Self {
            format,
            namespaces: RwLock::new(Map::new()),
        }
    }

    /// A pre-populated store. Top-level keys of `value` become namespaces;
    /// a non-mapping value yields an empty store.
    pub fn from_value(value: Value) -> Self {
        let namespaces = match value {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self {
            format: FragmentFormat::default(),
            namespaces: RwLock::new(namespaces),
        }
    }

    pub fn format(&self) -> FragmentFormat {
        self.format
    }

    /// Load fragments from a single directory. See [`ConfigStore::load_layers`].
    pub fn load(&self, dir: &Path) -> LoadReport {
        self.load_layers(&[dir])
    }

    /// Load fragments from each directory in order and replace the current
    /// snapshot with the merged result.
    ///
    /// Within a directory, fragments are merged in lexicographic path order;
    /// later directories merge on top of earlier ones. A fragment that cannot
    /// be read or parsed is logged, recorded in the report and skipped. A
    /// missing directory contributes nothing.
    pub fn load_layers<P: AsRef<Path>>(&self, dirs: &[P]) -> LoadReport {
        let mut report = LoadReport::default();
        let mut namespaces = Map::new();

        for dir in dirs {
            self.load_dir(dir.as_ref(), &mut namespaces, &mut report);
        }

        info!(
            namespaces = namespaces.len(),
            loaded = report.loaded.len(),
            failed = report.failed.len(),
            "config store loaded"
        );

        *self
            .namespaces
            .write()
            .unwrap_or_else(PoisonError::into_inner) = namespaces;
        report
    }

    fn load_dir(&self, dir: &Path, namespaces: &mut Map<String, Value>, report: &mut LoadReport) {
        if !dir.is_dir() {
            warn!(dir = %dir.display(), "config directory not found — skipping");
            return;
        }

        let mut fragments = Vec::new();
        for entry in WalkDir::new(dir).follow_links(true) {
            match entry {
                Ok(entry) if entry.file_type().is_file() && self.format.matches(entry.path()) => {
                    fragments.push(entry.into_path());
                }
                Ok(_) => {}
                Err(e) => {
                    let path = e.path().map_or_else(|| dir.to_path_buf(), Path::to_path_buf);
                    error!(path = %path.display(), error = %e, "cannot scan config directory entry");
                    report.failed.push(AppError::Fragment {
                        path,
                        message: e.to_string(),
                    });
                }
            }
        }
        // Directory enumeration order is filesystem-dependent.
        fragments.sort();

        for path in fragments {
            let Some(key) = path.strip_prefix(dir).ok().and_then(namespace_key) else {
                continue;
            };
            match self.read_fragment(&path) {
                Ok(value) => {
                    debug!(path = %path.display(), namespace = %key, "merging config fragment");
                    let base = namespaces
                        .remove(&key)
                        .unwrap_or_else(|| Value::Object(Map::new()));
                    namespaces.insert(key, deep_merge(base, value));
                    report.loaded.push(path);
                }
                Err(e) => {
                    error!(namespace = %key, error = %e, "failed to load config fragment");
                    report.failed.push(e);
                }
            }
        }
    }

    fn read_fragment(&self, path: &Path) -> Result<Value, AppError> {
        let text = std::fs::read_to_string(path).map_err(|e| AppError::Fragment {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        self.format.parse(&text).map_err(|message| AppError::Fragment {
            path: path.to_path_buf(),
            message,
        })
    }

    /// Resolve a dotted path. An empty path returns the whole store as a
    /// mapping; any miss returns `None`.
    ///
    /// Segments address mapping keys, or sequence indices when the current
    /// value is a sequence. Namespace keys may contain dots themselves
    /// (`db.local`), so the first step tries the longest matching top-level
    /// key first and falls back to shorter ones.
    pub fn get(&self, path: &str) -> Option<Value> {
        let namespaces = self.namespaces.read().unwrap_or_else(PoisonError::into_inner);
        if path.is_empty() {
            return Some(Value::Object(namespaces.clone()));
        }

        let segments: Vec<&str> = path.split('.').collect();
        (1..=segments.len()).rev().find_map(|split| {
            let key = segments[..split].join(".");
            namespaces
                .get(&key)
                .and_then(|ns| walk(ns, &segments[split..]))
                .cloned()
        })
    }

    /// [`ConfigStore::get`] with a fallback for misses.
    pub fn get_or(&self, path: &str, default: impl Into<Value>) -> Value {
        self.get(path).unwrap_or_else(|| default.into())
    }

    /// Resolve `path` and deserialize it into `T`. Misses and shape
    /// mismatches both return `None`.
    pub fn get_as<T: DeserializeOwned>(&self, path: &str) -> Option<T> {
        let value = self.get(path)?;
        match serde_json::from_value(value) {
            Ok(typed) => Some(typed),
            Err(e) => {
                debug!(%path, error = %e, "config value has unexpected shape");
                None
            }
        }
    }

    /// Top-level namespace keys, sorted.
    pub fn namespaces(&self) -> Vec<String> {
        let namespaces = self.namespaces.read().unwrap_or_else(PoisonError::into_inner);
        // serde_json's default map is ordered by key.
        namespaces.keys().cloned().collect()
    }
}

fn walk<'a>(mut current: &'a Value, segments: &[&str]) -> Option<&'a Value> {
    for segment in segments {
        current = match current {
            Value::Object(map) => map.get(*segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    if current.is_null() { None } else { Some(current) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;
    use std::fs;
    use std::io;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    /// Collects formatted log output for assertions.
    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Captured {
        fn text(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn write(dir: &Path, rel: &str, content: &str) {
        let path = dir.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    #[test]
    fn empty_store_returns_default() {
        let store = ConfigStore::default();
        assert_eq!(store.get_or("a.b.c", 42), json!(42));
        assert!(store.get("a.b.c").is_none());
    }

    #[test]
    fn empty_path_returns_whole_store() {
        let store = ConfigStore::from_value(json!({"auth": {"token": "x"}}));
        assert_eq!(store.get(""), Some(json!({"auth": {"token": "x"}})));
    }

    #[test]
    fn walks_maps_and_sequences() {
        let store = ConfigStore::from_value(json!({
            "api": {"routes": [{"path": "/a"}, {"path": "/b"}], "port": 8080}
        }));
        assert_eq!(store.get("api.port"), Some(json!(8080)));
        assert_eq!(store.get("api.routes.1.path"), Some(json!("/b")));
        assert!(store.get("api.routes.7.path").is_none());
        assert!(store.get("api.routes.x").is_none());
        assert!(store.get("api.port.deeper").is_none());
    }

    #[test]
    fn falsy_values_are_not_misses() {
        let store = ConfigStore::from_value(json!({"f": {"zero": 0, "off": false, "empty": "", "nil": null}}));
        assert_eq!(store.get_or("f.zero", 5), json!(0));
        assert_eq!(store.get_or("f.off", true), json!(false));
        assert_eq!(store.get_or("f.empty", "d"), json!(""));
        assert_eq!(store.get_or("f.nil", "d"), json!("d"));
    }

    #[test]
    fn dotted_namespace_prefers_longest_key() {
        let store = ConfigStore::from_value(json!({
            "db": {"local": {"host": "from-db"}, "port": 1},
            "db.local": {"host": "from-db-local"}
        }));
        assert_eq!(store.get("db.local.host"), Some(json!("from-db-local")));
        assert_eq!(store.get("db.port"), Some(json!(1)));
    }

    #[test]
    fn dotted_namespace_falls_back_to_shorter_key() {
        let store = ConfigStore::from_value(json!({
            "db": {"local": {"user": "root"}},
            "db.local": {"host": "h"}
        }));
        assert_eq!(store.get("db.local.user"), Some(json!("root")));
    }

    #[test]
    fn typed_reads() {
        #[derive(Deserialize, Debug, PartialEq)]
        struct Pool {
            min: u32,
            max: u32,
        }
        let store = ConfigStore::from_value(json!({"db": {"pool": {"min": 1, "max": 4}, "name": "x"}}));
        assert_eq!(store.get_as::<Pool>("db.pool"), Some(Pool { min: 1, max: 4 }));
        assert_eq!(store.get_as::<u32>("db.pool.max"), Some(4));
        assert_eq!(store.get_as::<u32>("db.name"), None);
        assert_eq!(store.get_as::<u32>("db.missing"), None);
    }

    #[test]
    fn load_derives_namespaces() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "db.json", r#"{"host": "h"}"#);
        write(dir.path(), "db.local.json", r#"{"host": "local"}"#);
        write(dir.path(), "services/cache.json", r#"{"ttl": 30}"#);
        write(dir.path(), "notes.txt", "ignored");

        let store = ConfigStore::default();
        let report = store.load(dir.path());

        assert!(report.is_clean());
        assert_eq!(report.loaded.len(), 3);
        assert_eq!(store.namespaces(), vec!["db", "db.local", "services/cache"]);
        assert_eq!(store.get("db.host"), Some(json!("h")));
        assert_eq!(store.get("db.local.host"), Some(json!("local")));
        assert_eq!(store.get("services/cache.ttl"), Some(json!(30)));
    }

    #[test]
    fn malformed_fragment_is_skipped() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "good.json", r#"{"ok": true}"#);
        write(dir.path(), "bad.json", r#"{"ok": "#);

        let store = ConfigStore::default();
        let report = store.load(dir.path());

        assert_eq!(report.loaded.len(), 1);
        assert_eq!(report.failed.len(), 1);
        assert!(matches!(&report.failed[0], AppError::Fragment { path, .. } if path.ends_with("bad.json")));
        assert_eq!(store.get("good.ok"), Some(json!(true)));
        assert!(store.get("bad").is_none());
    }

    #[test]
    fn malformed_fragment_logs_error() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "good.json", r#"{"ok": true}"#);
        write(dir.path(), "broken.json", "{ nope");

        let captured = Captured::default();
        let sink = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || sink.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::WARN)
            .finish();

        let store = ConfigStore::default();
        let report = tracing::subscriber::with_default(subscriber, || store.load(dir.path()));

        assert_eq!(report.failed.len(), 1);
        let logs = captured.text();
        let line = logs
            .lines()
            .find(|l| l.contains("failed to load config fragment"))
            .expect("error line for the malformed fragment");
        assert!(line.contains("ERROR"));
        assert!(line.contains("broken"));
        assert!(!logs.contains("namespace=good"));
    }

    #[test]
    fn missing_directory_yields_empty_store() {
        let store = ConfigStore::from_value(json!({"stale": {"a": 1}}));
        let report = store.load(Path::new("/nonexistent/modhost/config"));
        assert!(report.is_clean());
        assert!(report.loaded.is_empty());
        assert!(store.namespaces().is_empty());
    }

    #[test]
    fn layers_deep_merge_same_namespace() {
        let base = TempDir::new().unwrap();
        let overlay = TempDir::new().unwrap();
        write(base.path(), "db.json", r#"{"host": "h", "pool": {"min": 1}, "tags": ["a"]}"#);
        write(overlay.path(), "db.json", r#"{"host": "h2", "pool": {"max": 9}, "tags": ["b"]}"#);

        let store = ConfigStore::default();
        let report = store.load_layers(&[base.path(), overlay.path()]);

        assert_eq!(report.loaded.len(), 2);
        assert_eq!(
            store.get("db"),
            Some(json!({"host": "h2", "pool": {"min": 1, "max": 9}, "tags": ["a", "b"]}))
        );
    }

    #[test]
    fn layer_order_irrelevant_for_disjoint_keys() {
        let a = TempDir::new().unwrap();
        let b = TempDir::new().unwrap();
        write(a.path(), "app.json", r#"{"x": 1}"#);
        write(b.path(), "app.json", r#"{"y": 2}"#);

        let ab = ConfigStore::default();
        ab.load_layers(&[a.path(), b.path()]);
        let ba = ConfigStore::default();
        ba.load_layers(&[b.path(), a.path()]);

        assert_eq!(ab.get("app"), ba.get("app"));
    }

    #[test]
    fn toml_store_ignores_json() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "api.toml", "port = 8080\n");
        write(dir.path(), "auth.json", r#"{"token": "x"}"#);

        let store = ConfigStore::new(FragmentFormat::Toml);
        store.load(dir.path());

        assert_eq!(store.get("api.port"), Some(json!(8080)));
        assert!(store.get("auth.token").is_none());
    }

    #[test]
    fn reload_replaces_snapshot() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a.json", r#"{"v": 1}"#);
        let store = ConfigStore::default();
        store.load(dir.path());
        fs::remove_file(dir.path().join("a.json")).unwrap();
        write(dir.path(), "b.json", r#"{"v": 2}"#);
        store.load(dir.path());
        assert!(store.get("a.v").is_none());
        assert_eq!(store.get("b.v"), Some(json!(2)));
    }
}
