use tracing::Subscriber;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

// RUST_LOG 優先;沒設定時用這裡的預設等級
fn build_filter(verbose: bool) -> EnvFilter {
    let default_directives = if verbose {
        "small_press=debug,info"
    } else {
        "small_press=info,warn"
    };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives))
}

fn cli_subscriber(verbose: bool) -> impl Subscriber + Send + Sync {
    tracing_subscriber::registry()
        .with(build_filter(verbose))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
}

// with_current_span 只存在於 .json() 之後的 JSON layer 上
fn json_subscriber() -> impl Subscriber + Send + Sync {
    tracing_subscriber::registry()
        .with(build_filter(false))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .json()
                .with_current_span(false),
        )
}

/// Human-readable compact output for terminal runs.
pub fn init_cli_logger(verbose: bool) {
    cli_subscriber(verbose).init();
}

/// One JSON object per line, for CI log collectors.
pub fn init_json_logger() {
    json_subscriber().init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_subscriber_accepts_events() {
        tracing::subscriber::with_default(cli_subscriber(true), || {
            tracing::info!("compact logger smoke");
        });
    }

    #[test]
    fn test_json_subscriber_accepts_events() {
        tracing::subscriber::with_default(json_subscriber(), || {
            tracing::info!("json logger smoke");
        });
    }
}
