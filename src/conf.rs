///  struct GetDefault;
///  struct GetOption;
///
///  fn settings() -> &'static RwLock<Config>
///  fn current() -> &'static RwLock<Setting>
///
///  struct Setting
use config::{Config, Value};
use serde::{Deserialize, Serialize};
use std::sync::{OnceLock, RwLock};

//get or default
pub struct GetDefault;
pub struct GetOption;

/// get raw settings
/// prefer current() for the typed Setting, or GetOption::xxx | GetDefault::xxx
///
/// # Returns
/// * `&'static RwLock<Config>` - config instance
pub fn settings() -> &'static RwLock<Config> {
    static CONFIG: OnceLock<RwLock<Config>> = OnceLock::new();
    CONFIG.get_or_init(|| RwLock::new(init_config()))
}

/// get the typed Setting
/// missing or invalid sections fall back to their defaults
///
/// # Returns
/// * `&'static RwLock<Setting>` - setting instance
pub fn current() -> &'static RwLock<Setting> {
    static SETTING: OnceLock<RwLock<Setting>> = OnceLock::new();
    SETTING.get_or_init(|| {
        let loaded = match settings().read() {
            Ok(guard) => guard.clone().try_deserialize::<Setting>(),
            Err(e) => Err(config::ConfigError::Message(e.to_string())),
        };

        RwLock::new(loaded.unwrap_or_else(|e| {
            tracing::warn!("setting loading error, using defaults: {}", e);
            Setting::default()
        }))
    })
}

/// init config
/// config/config.yml < config/{run_mode}.yml < config/local.yml < RDAT__* environment
fn init_config() -> Config {
    //development production testing
    let run_mode = std::env::var("RDAT_RUN_MODE").unwrap_or("development".to_string());
    tracing::info!("RDAT_RUN_MODE={}", run_mode);

    let config_path = std::env::var("RDAT_CONFIG_PATH").unwrap_or("config".to_string());
    tracing::info!("Config file path: {}", config_path);

    let conf = config::File::with_name(&format!("{config_path}/config.yml")).required(false);
    let mode = config::File::with_name(&format!("{config_path}/{run_mode}.yml")).required(false);
    let local = config::File::with_name(&format!("{config_path}/local.yml")).required(false);

    #[allow(unused_mut)]
    let mut builder = Config::builder().add_source(conf).add_source(mode).add_source(local);
    #[cfg(test)]
    {
        use crate::tools::tests::tools::project_dir;

        let tests_load = format!("{}/tests/using-test-config.yml", project_dir().to_string_lossy());
        tracing::info!("test mode, loading: {}", tests_load);
        builder = builder.add_source(config::File::with_name(tests_load.as_str()).required(false));
    }

    let builder = builder.add_source(config::Environment::with_prefix("RDAT").separator("__"));

    builder.build().unwrap_or_else(|e| {
        tracing::warn!("config build error, using empty config: {}", e);
        Config::default()
    })
}

/// make getter for settings, if not found, return default value
macro_rules! make_setting_getter_default {
    ($name:ident, $type:ty, $getter:ident) => {
        pub fn $name(k: &str, default: $type) -> $type {
            match settings().read() {
                Ok(guard) => guard.$getter(k).unwrap_or(default),
                Err(_) => default,
            }
        }
    };
}

/// make getter for settings, return Option value
macro_rules! make_setting_getter_option {
    ($name:ident, $type:ty, $getter:ident) => {
        pub fn $name(k: &str) -> Option<$type> {
            match settings().read() {
                Ok(guard) => guard.$getter(k).ok(),
                Err(_) => None,
            }
        }
    };
}

/// make getter for settings
macro_rules! make_setting_getter {
    ($name:ident, $type:ty, $getter:ident) => {
        impl GetDefault {
            make_setting_getter_default!($name, $type, $getter);
        }

        impl GetOption {
            make_setting_getter_option!($name, $type, $getter);
        }
    };
}

make_setting_getter!(string, String, get_string);
make_setting_getter!(boolean, bool, get_bool);
make_setting_getter!(int, i64, get_int);
make_setting_getter!(table, std::collections::HashMap<String, Value>, get_table);

impl GetOption {
    pub fn get<'de, T: Deserialize<'de>>(key: &str) -> Option<T> {
        match settings().read() {
            Ok(guard) => guard.get(key).ok(),
            Err(_) => None,
        }
    }
}

impl GetDefault {
    pub fn get<'de, T: Deserialize<'de>>(key: &str, default: T) -> T {
        match settings().read() {
            Ok(guard) => guard.get(key).unwrap_or(default),
            Err(_) => default,
        }
    }
}

/// HashMap<String, T>
pub type Dict<T> = std::collections::HashMap<String, T>;

/// HashMap<String, String>
pub type DictString = Dict<String>;

/// Setting
/// # Fields
/// * `name` - application name
/// * `short` - 4 letters application code, first part of every error code
/// * `debug` - debug mode
/// * `log` - log config
/// * `remote` - remote store config
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct Setting {
    pub name: String,
    pub short: String,
    pub debug: bool,
    pub log: Log,
    pub remote: Remote,
}

/// Log config
/// # Fields
/// * `level` - EnvFilter directives
/// * `console` - log to stdout
/// * `dirs` - daily rolling log directory, empty disables file logging
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct Log {
    pub level: String,
    pub console: bool,
    pub dirs: String,
}

/// Remote store config
/// # Fields
/// * `base` - base url, relative hrefs are joined to it
/// * `timeout` - request timeout in seconds
/// * `user_agent` - overrides the default user agent
/// * `headers` - extra headers sent with every request (Authorization etc.)
/// * `no_tls_verify` - accept invalid certificates
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct Remote {
    pub base: String,
    pub timeout: u64,
    pub user_agent: Option<String>,
    pub headers: DictString,
    pub no_tls_verify: bool,
}

impl Default for Log {
    fn default() -> Self {
        Log { level: "info".to_string(), console: true, dirs: String::new() }
    }
}

impl Default for Remote {
    fn default() -> Self {
        Remote { base: "https://api.stormpath.com/v1".to_string(), timeout: 10, user_agent: None, headers: Default::default(), no_tls_verify: false }
    }
}

impl Default for Setting {
    fn default() -> Self {
        Self { name: "Ringsdata".to_string(), short: "RDAT".to_string(), debug: false, log: Default::default(), remote: Default::default() }
    }
}
