use std::io;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// 控制記錄等級的環境變數。 / Environment variable holding the log filter.
pub const LOG_ENV: &str = "TABULA_LOG";

const DEFAULT_FILTER: &str = "warn";

/// 安裝輸出至 stderr 的記錄器。 / Installs a stderr subscriber filtered by `TABULA_LOG`.
///
/// Returns `false` when a global subscriber was already set.
pub fn init() -> bool {
    let env_filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let subscriber = tracing_subscriber::registry().with(env_filter).with(
        tracing_subscriber::fmt::layer()
            .with_writer(io::stderr)
            .with_ansi(false)
            .with_target(true),
    );
    if subscriber.try_init().is_err() {
        return false;
    }

    std::panic::set_hook(Box::new(|panic_info| {
        tracing::error!(panic = %panic_info, "panic");
    }));
    true
}
