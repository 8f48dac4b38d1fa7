/// Default config file path - can be overridden via `--config`
pub const CONFIG_PATH: &str = "config/toolpipe.toml";
pub const ENV_PATH: &str = "config/.env";

pub const DEFAULT_BIND: &str = "127.0.0.1:8080";
pub const DEFAULT_API_PATH: &str = "/v1/chat/completions";
pub const DEFAULT_MAX_STEPS: usize = 5;
pub const DEFAULT_EXECUTOR_TIMEOUT_MS: u64 = 30_000;

pub const DEFAULT_INPUT_PER_TOKEN: f64 = 0.000_01;
pub const DEFAULT_OUTPUT_PER_TOKEN: f64 = 0.000_03;

pub const DEFAULT_MAX_EXECUTIONS: u32 = 30;
pub const DEFAULT_WINDOW_SECS: u64 = 3600;
