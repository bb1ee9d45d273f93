use std::sync::Once;

use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "TALLY_LOG";
const DEFAULT_DIRECTIVE: &str = "warn";

static TRACING_INIT: Once = Once::new();

/// Installs the stderr subscriber once; `TALLY_LOG` takes `EnvFilter` syntax.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        let filter = build_filter(std::env::var(LOG_ENV).ok().as_deref());
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .init();
    });
}

fn build_filter(raw: Option<&str>) -> EnvFilter {
    match raw.map(str::trim).filter(|value| !value.is_empty()) {
        Some(value) => EnvFilter::try_new(value).unwrap_or_else(|err| {
            eprintln!("warning: ignoring invalid {LOG_ENV} '{value}': {err}");
            EnvFilter::new(DEFAULT_DIRECTIVE)
        }),
        None => EnvFilter::new(DEFAULT_DIRECTIVE),
    }
}

#[cfg(test)]
mod tests {
    use super::build_filter;

    #[test]
    fn filter_defaults_to_warn() {
        assert_eq!(build_filter(None).to_string(), "warn");
        assert_eq!(build_filter(Some("  ")).to_string(), "warn");
    }

    #[test]
    fn filter_accepts_directives() {
        assert_eq!(build_filter(Some("tally=debug")).to_string(), "tally=debug");
    }

    #[test]
    fn init_is_idempotent() {
        super::init_tracing();
        super::init_tracing();
    }
}
