use std::{path::Path, sync::OnceLock};
use tracing_subscriber::{EnvFilter, fmt};

static GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
static INIT: OnceLock<()> = OnceLock::new();

/// Initialize file logging once for the whole process. Stdout belongs to
/// the UCI protocol, so events only ever go to the given file.
/// - `path`: e.g. "logs/engine.log"
/// - `filter`: e.g. "vigil::search=debug,info"
pub fn init_logging<P: AsRef<Path>>(path: P, filter: &str) {
    INIT.get_or_init(|| {
        let path = path.as_ref();

        if let Some(dir) = path.parent() {
            let _ = std::fs::create_dir_all(dir);
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .expect("open log file");

        let (non_blocking, guard) = tracing_appender::non_blocking(file);
        // Keep the guard alive for the program lifetime.
        let _ = GUARD.set(guard);

        // RUST_LOG wins over the argument so runs can be re-filtered
        // without code changes.
        let env_filter = if std::env::var_os("RUST_LOG").is_some() {
            EnvFilter::from_default_env()
        } else {
            EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info"))
        };

        let subscriber = fmt()
            .with_env_filter(env_filter)
            .with_ansi(false)
            .with_target(true)
            .with_writer(non_blocking)
            .finish();

        // Idempotent even if a test already installed a subscriber.
        let _ = tracing::subscriber::set_global_default(subscriber);
    });
}
