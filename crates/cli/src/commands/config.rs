use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use homeworth_core::config::{AppConfig, LoadOptions, CONFIG_FILE_CANDIDATES};
use toml::Value;

struct Field {
    key_path: &'static str,
    env_key: &'static str,
    value: String,
}

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    render(&config, detect_config_path().as_deref())
}

pub fn render(config: &AppConfig, config_file_path: Option<&Path>) -> String {
    let config_file_doc = load_config_file_doc(config_file_path);

    let fields = [
        Field {
            key_path: "database.url",
            env_key: "HOMEWORTH_DATABASE_URL",
            value: config.database.url.clone(),
        },
        Field {
            key_path: "database.max_connections",
            env_key: "HOMEWORTH_DATABASE_MAX_CONNECTIONS",
            value: config.database.max_connections.to_string(),
        },
        Field {
            key_path: "database.timeout_secs",
            env_key: "HOMEWORTH_DATABASE_TIMEOUT_SECS",
            value: config.database.timeout_secs.to_string(),
        },
        Field {
            key_path: "sessions.backend",
            env_key: "HOMEWORTH_SESSIONS_BACKEND",
            value: config.sessions.backend.as_str().to_string(),
        },
        Field {
            key_path: "sessions.idle_ttl_secs",
            env_key: "HOMEWORTH_SESSIONS_IDLE_TTL_SECS",
            value: config.sessions.idle_ttl_secs.to_string(),
        },
        Field {
            key_path: "model.path",
            env_key: "HOMEWORTH_MODEL_PATH",
            value: config
                .model
                .path
                .as_ref()
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "<baseline>".to_string()),
        },
        Field {
            key_path: "dialogue.purchase_url",
            env_key: "HOMEWORTH_DIALOGUE_PURCHASE_URL",
            value: config.dialogue.purchase_url.clone(),
        },
        Field {
            key_path: "server.bind_address",
            env_key: "HOMEWORTH_SERVER_BIND_ADDRESS",
            value: config.server.bind_address.clone(),
        },
        Field {
            key_path: "server.port",
            env_key: "HOMEWORTH_SERVER_PORT",
            value: config.server.port.to_string(),
        },
        Field {
            key_path: "server.graceful_shutdown_secs",
            env_key: "HOMEWORTH_SERVER_GRACEFUL_SHUTDOWN_SECS",
            value: config.server.graceful_shutdown_secs.to_string(),
        },
        Field {
            key_path: "logging.level",
            env_key: "HOMEWORTH_LOGGING_LEVEL",
            value: config.logging.level.clone(),
        },
        Field {
            key_path: "logging.format",
            env_key: "HOMEWORTH_LOGGING_FORMAT",
            value: format!("{:?}", config.logging.format).to_ascii_lowercase(),
        },
    ];

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    lines.extend(fields.iter().map(|field| {
        render_line(
            field.key_path,
            &field.value,
            field_source(
                field.key_path,
                Some(field.env_key),
                config_file_doc.as_ref(),
                config_file_path,
            ),
        )
    }));

    lines.join("\n")
}

fn detect_config_path() -> Option<PathBuf> {
    CONFIG_FILE_CANDIDATES.into_iter().map(PathBuf::from).find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_key: Option<&str>,
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_key {
        if env::var_os(env_key).is_some() {
            return format!("env ({env_key})");
        }
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}
