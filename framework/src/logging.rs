use env_logger::Builder;
use log::{Level, LevelFilter};

/// Install the process logger. If the `RUST_LOG` environment variable is present it is used as
/// is, otherwise this crate logs at the level matching `verbosity`. Only the first call has any
/// effect; later calls, including those racing from other test threads, are no-ops.
pub fn init_logger(verbosity: u8) {
    let result = match std::env::var(env_logger::DEFAULT_FILTER_ENV).ok() {
        Some(_) => {
            // RUST_LOG exists; env_logger will use it.
            Builder::from_default_env().is_test(true).try_init()
        }
        None => Builder::new()
            .filter_level(LevelFilter::Warn)
            .filter(Some(env!("CARGO_CRATE_NAME")), level_filter(verbosity))
            .is_test(true)
            .try_init(),
    };
    if result.is_err() {
        log::trace!("a logger was already installed");
    }
}

/// The `log` level used for a message of verbosity `v`.
pub fn level_for(v: u8) -> Level {
    match v {
        0..=1 => Level::Info,
        2..=4 => Level::Debug,
        _ => Level::Trace,
    }
}

/// The most detailed `log` level a logger configured at `verbosity` lets through.
pub fn level_filter(verbosity: u8) -> LevelFilter {
    level_for(verbosity).to_level_filter()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn verbosity_levels() {
        assert_eq!(level_for(0), Level::Info);
        assert_eq!(level_for(2), Level::Debug);
        assert_eq!(level_for(9), Level::Trace);
        assert_eq!(level_filter(9), LevelFilter::Trace);
    }

    #[test]
    fn init_twice_is_harmless() {
        init_logger(2);
        init_logger(9);
    }
}
