// Config loading tests - AppConfig::load validation and defaults
//
// Every test writes its own toolpipe.toml into a temp directory.

use serial_test::serial;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;
use toolpipe_core::config::{AppConfig, ConfigError, ExecutorKind};

fn write_config(dir: &Path, content: &str) -> PathBuf {
    let path = dir.join("toolpipe.toml");
    fs::write(&path, content).expect("Failed to write toolpipe.toml");
    path
}

const PROVIDER: &str = r#"
[[providers]]
id = "openai"
type = "openai"
endpoint = "https://api.example.com"
api_key = "OPENAI_API_KEY"
models = ["gpt-4o-mini"]
"#;

const AGENT: &str = r#"
[agent]
default_provider = "openai"
model = "gpt-4o-mini"
"#;

fn minimal() -> String {
    format!("{PROVIDER}{AGENT}")
}

#[test]
fn returns_error_when_file_not_found() {
    let result = AppConfig::load(Some(Path::new("/nonexistent/path/toolpipe.toml")));
    assert!(matches!(result, Err(ConfigError::NotFound { .. })));
}

#[test]
fn returns_error_on_invalid_toml() {
    let dir = tempdir().expect("tempdir");
    let path = write_config(dir.path(), "[agent\nmodel = ");
    assert!(matches!(
        AppConfig::load(Some(&path)),
        Err(ConfigError::Parse { .. })
    ));
}

#[test]
fn minimal_config_gets_defaults() {
    let dir = tempdir().expect("tempdir");
    let path = write_config(dir.path(), &minimal());

    let config = AppConfig::load(Some(&path)).expect("minimal config loads");
    assert_eq!(config.server.bind.to_string(), "127.0.0.1:8080");
    assert!(config.server.cors_origins.is_empty());
    assert_eq!(config.agent.max_steps, 5);
    assert_eq!(config.executor.kind, ExecutorKind::Local);
    assert_eq!(config.executor.timeout_ms, 30_000);
    assert_eq!(config.rate_limit.max_executions, 30);
    assert_eq!(config.rate_limit.window_secs, 3600);
    assert!(config.catalog.is_none());
    assert_eq!(
        config.provider("openai").map(|p| p.api_path.as_str()),
        Some("/v1/chat/completions")
    );
}

#[test]
fn returns_error_when_model_missing() {
    let dir = tempdir().expect("tempdir");
    let content = format!("{PROVIDER}\n[agent]\ndefault_provider = \"openai\"\n");
    let path = write_config(dir.path(), &content);
    assert!(matches!(
        AppConfig::load(Some(&path)),
        Err(ConfigError::MissingModel)
    ));
}

#[test]
fn returns_error_when_default_provider_unknown() {
    let dir = tempdir().expect("tempdir");
    let content = format!("{PROVIDER}\n[agent]\ndefault_provider = \"other\"\nmodel = \"m\"\n");
    let path = write_config(dir.path(), &content);
    let result = AppConfig::load(Some(&path));
    assert!(
        matches!(result, Err(ConfigError::ProviderNotFound { ref provider }) if provider == "other")
    );
}

#[test]
fn returns_error_when_no_providers() {
    let dir = tempdir().expect("tempdir");
    let path = write_config(dir.path(), AGENT);
    assert!(matches!(
        AppConfig::load(Some(&path)),
        Err(ConfigError::NoProvidersConfigured)
    ));
}

#[test]
fn rejects_unsupported_provider_type() {
    let dir = tempdir().expect("tempdir");
    let content = format!(
        "[[providers]]\nid = \"openai\"\ntype = \"gemini\"\nendpoint = \"https://x\"\n{AGENT}"
    );
    let path = write_config(dir.path(), &content);
    assert!(matches!(
        AppConfig::load(Some(&path)),
        Err(ConfigError::UnsupportedProviderType { .. })
    ));
}

#[test]
fn remote_executor_requires_endpoint() {
    let dir = tempdir().expect("tempdir");
    let content = format!("{}\n[executor]\nkind = \"remote\"\n", minimal());
    let path = write_config(dir.path(), &content);
    assert!(matches!(
        AppConfig::load(Some(&path)),
        Err(ConfigError::MissingExecutorEndpoint)
    ));
}

#[test]
fn rejects_zero_limits() {
    let dir = tempdir().expect("tempdir");

    let steps = format!("{PROVIDER}\n[agent]\ndefault_provider = \"openai\"\nmodel = \"m\"\nmax_steps = 0\n");
    let path = write_config(dir.path(), &steps);
    assert!(matches!(
        AppConfig::load(Some(&path)),
        Err(ConfigError::InvalidMaxSteps)
    ));

    let window = format!("{}\n[rate_limit]\nwindow_secs = 0\n", minimal());
    let path = write_config(dir.path(), &window);
    assert!(matches!(
        AppConfig::load(Some(&path)),
        Err(ConfigError::InvalidRateLimit)
    ));

    let pricing = format!("{}\n[pricing]\ninput_per_token = -1.0\n", minimal());
    let path = write_config(dir.path(), &pricing);
    assert!(matches!(
        AppConfig::load(Some(&path)),
        Err(ConfigError::InvalidPricing)
    ));
}

#[test]
fn rejects_invalid_bind_address() {
    let dir = tempdir().expect("tempdir");
    let content = format!("{}\n[server]\nbind = \"not-an-address\"\n", minimal());
    let path = write_config(dir.path(), &content);
    assert!(matches!(
        AppConfig::load(Some(&path)),
        Err(ConfigError::InvalidBind { .. })
    ));
}

#[test]
fn relative_catalog_path_resolves_next_to_config() {
    let dir = tempdir().expect("tempdir");
    let content = format!("catalog = \"catalog.toml\"\n{}", minimal());
    let path = write_config(dir.path(), &content);

    let config = AppConfig::load(Some(&path)).expect("config loads");
    assert_eq!(config.catalog, Some(dir.path().join("catalog.toml")));
}

#[test]
fn configured_model_is_added_to_default_provider() {
    let dir = tempdir().expect("tempdir");
    let content = format!("{PROVIDER}\n[agent]\ndefault_provider = \"openai\"\nmodel = \"gpt-4o\"\n");
    let path = write_config(dir.path(), &content);

    let config = AppConfig::load(Some(&path)).expect("config loads");
    let provider = config.provider("openai").expect("provider");
    assert!(provider.models.iter().any(|m| m.name == "gpt-4o"));
    assert!(provider.models.iter().any(|m| m.name == "gpt-4o-mini"));
}

#[test]
#[serial]
fn endpoint_expands_environment_variables() {
    // SAFETY: serialized with every other test touching the environment.
    unsafe { std::env::set_var("TOOLPIPE_TEST_ENDPOINT", "http://10.0.0.5:11434") };

    let dir = tempdir().expect("tempdir");
    let content = r#"
[[providers]]
id = "local"
type = "ollama"
endpoint = "${TOOLPIPE_TEST_ENDPOINT}"

[agent]
default_provider = "local"
model = "llama3.1"
"#;
    let path = write_config(dir.path(), content);
    let config = AppConfig::load(Some(&path)).expect("config loads");

    unsafe { std::env::remove_var("TOOLPIPE_TEST_ENDPOINT") };

    let provider = config.provider("local").expect("provider");
    assert_eq!(provider.endpoint, "http://10.0.0.5:11434");
    assert!(provider.is_ollama());
}

#[test]
fn shipped_sample_config_is_valid() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../config/toolpipe.toml");
    let config = AppConfig::load(Some(&path)).expect("sample config loads");
    assert_eq!(config.agent.default_provider, "openai");
    assert!(config.provider("ollama").is_some_and(|p| p.is_ollama()));
    assert!(
        config
            .catalog
            .as_deref()
            .is_some_and(|p| p.ends_with("catalog.toml"))
    );
}
