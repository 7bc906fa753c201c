//! Settings file → application: layered fragment directories and formats.

use std::fs;
use std::path::Path;

use serde_json::json;
use tempfile::TempDir;

use modhost::config;
use modhost::modules::SystemModule;
use modhost::{Application, FragmentFormat};

fn write(dir: &Path, rel: &str, content: &str) {
    let path = dir.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

#[tokio::test]
async fn overlays_from_settings_file() {
    let root = TempDir::new().unwrap();
    let base = root.path().join("conf.d");
    let local = root.path().join("local.d");
    write(&base, "system.json", r#"{"announce": true, "tags": ["base"]}"#);
    write(&base, "db.json", r#"{"host": "db.internal", "pool": {"min": 1, "max": 4}}"#);
    write(&local, "db.json", r#"{"pool": {"max": 16}}"#);
    write(&local, "system.json", r#"{"announce": false}"#);

    let settings_file = root.path().join("modhost.toml");
    fs::write(
        &settings_file,
        format!(
            "[host]\nname = \"it\"\nconfig_dir = {:?}\noverlay_dirs = [{:?}]\n",
            base.display().to_string(),
            local.display().to_string()
        ),
    )
    .unwrap();

    let settings = config::load_from(&settings_file, None, None).unwrap();
    assert_eq!(settings.name, "it");

    let mut app = Application::new(settings);
    app.register("system", SystemModule::new()).unwrap();
    app.start().await.unwrap();

    assert_eq!(
        app.get_config("db"),
        Some(json!({"host": "db.internal", "pool": {"min": 1, "max": 16}}))
    );
    let system = app.downcast::<SystemModule>("system").unwrap();
    assert!(!system.config().announce);
    assert_eq!(system.config().tags, vec!["base"]);
    assert_eq!(app.load_report().unwrap().loaded.len(), 4);

    app.stop().await.unwrap();
}

#[tokio::test]
async fn toml_fragments() {
    let root = TempDir::new().unwrap();
    write(root.path(), "api.toml", "port = 9000\n[tls]\nenabled = true\n");
    write(root.path(), "ignored.json", r#"{"x": 1}"#);

    let settings_file = root.path().join("modhost.toml");
    fs::write(
        &settings_file,
        format!("[host]\nfragment_format = \"toml\"\nconfig_dir = {:?}\n", root.path().display().to_string()),
    )
    .unwrap();

    let settings = config::load_from(&settings_file, None, None).unwrap();
    assert_eq!(settings.fragment_format, FragmentFormat::Toml);

    let mut app = Application::new(settings);
    app.start().await.unwrap();

    // modhost.toml itself sits in the scanned directory and becomes a namespace.
    assert_eq!(app.get_config("api.port"), Some(json!(9000)));
    assert_eq!(app.get_config("api.tls.enabled"), Some(json!(true)));
    assert!(app.get_config("ignored").is_none());
    assert_eq!(app.config().format(), FragmentFormat::Toml);
}

#[tokio::test]
async fn missing_config_dir_starts_empty() {
    let root = TempDir::new().unwrap();
    let settings = config::Settings::with_config_dir(root.path().join("absent"));
    let mut app = Application::new(settings);
    app.register("system", SystemModule::new()).unwrap();

    app.start().await.unwrap();
    assert_eq!(app.get_config(""), Some(json!({})));
    assert_eq!(app.get_config_or("anything.at.all", "fallback"), json!("fallback"));
}
