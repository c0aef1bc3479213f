use log::SetLoggerError;

/// Attempt to init a env_logger for the decoder.
/// Does nothing if the "builtin_env_logger" feature is disabled.
///
/// Log output is filtered by `RUST_LOG`. Per-value decoding is logged at the `trace` level and
/// per-map work at `debug`, so `RUST_LOG=oopmap=debug` shows one line per frame scanned.
pub fn try_init() -> Result<(), SetLoggerError> {
    cfg_if::cfg_if! {
        if #[cfg(feature = "builtin_env_logger")] {
            env_logger::try_init_from_env(
                // By default, only report problems.
                env_logger::Env::default().filter_or(env_logger::DEFAULT_FILTER_ENV, "warn"),
            )
        } else {
            Ok(())
        }
    }
}
