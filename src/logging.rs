//! Log output of the renderer: model stats, frame timings, per-draw counters.
//! The pipeline itself only talks to `log`, the binary decides where it goes.

use std::sync::OnceLock;

/// Used when neither `--log` nor `RUST_LOG` says anything.
pub const DEFAULT_FILTER: &str = "info";

/// Where the installed filter came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterSource {
    Flag,
    Environment,
    Default,
}

static INSTALLED: OnceLock<FilterSource> = OnceLock::new();

/// Flag beats environment beats `DEFAULT_FILTER`. Blank values count as absent.
pub fn pick_filter(flag: Option<&str>, environment: Option<&str>) -> (String, FilterSource) {
    fn present(value: Option<&str>) -> Option<&str> {
        return value.map(str::trim).filter(|value| !value.is_empty());
    }
    if let Some(filter) = present(flag) {
        return (filter.to_string(), FilterSource::Flag);
    }
    if let Some(filter) = present(environment) {
        return (filter.to_string(), FilterSource::Environment);
    }
    return (DEFAULT_FILTER.to_string(), FilterSource::Default);
}

/// Installs env_logger with millisecond timestamps. Only the first call does anything,
/// every call returns the source picked by that first one.
pub fn init_logging(flag: Option<&str>) -> FilterSource {
    return *INSTALLED.get_or_init(|| {
        let environment = std::env::var("RUST_LOG").ok();
        let (filter, source) = pick_filter(flag, environment.as_deref());

        let installed = env_logger::Builder::new()
            .parse_filters(&filter)
            .format_timestamp_millis()
            .try_init();
        // A host application may own the logger already, then its setup stays.
        if installed.is_ok() {
            log::debug!("log filter {:?} from {:?}", filter, source);
        }
        return source;
    });
}
