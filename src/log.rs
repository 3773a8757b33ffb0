use std::path::Path;
use std::sync::{Mutex, OnceLock};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Layer;

use crate::conf;
use crate::erx::{amp, Erx, ResultEX};

/// keeps the non blocking writers flushing for the life of the process
fn worker_guards() -> &'static Mutex<Vec<WorkerGuard>> {
    static GUARDS: OnceLock<Mutex<Vec<WorkerGuard>>> = OnceLock::new();
    GUARDS.get_or_init(|| Mutex::new(Vec::new()))
}

/// Install the global subscriber from the `log` section of the loaded settings.
pub fn logging_initialize() -> ResultEX {
    let log_conf = conf::current().read().map_err(crate::erx::smp)?.log.clone();
    logging_initialize_with(&log_conf)
}

/// Install the global subscriber: EnvFilter from `level`, stdout when `console`,
/// a daily rolling `{name}_ringsdata.log` under `dirs` when set.
/// A second call is an error, the first subscriber stays.
pub fn logging_initialize_with(log_conf: &conf::Log) -> ResultEX {
    let mut guards: Vec<WorkerGuard> = vec![];

    let console = if log_conf.console {
        let (writer, guard) = tracing_appender::non_blocking(std::io::stdout());
        guards.push(guard);
        Some(tracing_subscriber::fmt::layer().with_writer(writer).with_ansi(true).boxed())
    } else {
        None
    };

    let logs_dir = log_conf.dirs.trim();
    let persist = if logs_dir.is_empty() {
        None
    } else {
        if !Path::new(logs_dir).is_dir() {
            return Err(Erx::new(&format!("log dir is not a directory: {}", logs_dir)));
        }

        let app_name = conf::GetDefault::string("name", conf::Setting::default().name);
        let prefix = format!("{}_ringsdata.log", app_name.to_lowercase());
        let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::daily(logs_dir, prefix));
        guards.push(guard);
        Some(tracing_subscriber::fmt::layer().with_writer(writer).with_ansi(false).boxed())
    };

    let filter = tracing_subscriber::EnvFilter::try_new(&log_conf.level).map_err(amp("invalid log level"))?;
    tracing_subscriber::registry().with(console).with(persist).with(filter).try_init().map_err(amp("logging already initialized"))?;

    worker_guards().lock().map_err(crate::erx::smp)?.extend(guards);
    Ok(())
}
