//! Diagnostic logging on top of `tracing`.
//!
//! User-facing progress lines are printed directly with `colored` tags; this
//! subscriber carries the `tracing` events (install steps, resolved paths,
//! executed commands).

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter directive for the given verbosity flags.
///
/// `verbose` wins over `quiet`. Without either, `RUST_LOG` is honoured and
/// warnings are shown by default.
pub fn filter_directive(verbose: bool, quiet: bool) -> Option<&'static str> {
    if verbose {
        Some("easyweb_cli=debug")
    } else if quiet {
        Some("easyweb_cli=error")
    } else {
        None
    }
}

/// Install the global subscriber. Call once, before any logging.
pub fn init_logger(verbose: bool, quiet: bool, no_color: bool) {
    let filter = match filter_directive(verbose, quiet) {
        Some(directive) => EnvFilter::new(directive),
        None => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("easyweb_cli=warn")),
    };

    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_level(true)
        .with_ansi(!no_color)
        .with_writer(std::io::stderr)
        .compact();

    // A second init (tests, embedding) keeps the first subscriber.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbose_overrides_quiet() {
        assert_eq!(filter_directive(true, true), Some("easyweb_cli=debug"));
        assert_eq!(filter_directive(false, true), Some("easyweb_cli=error"));
        assert_eq!(filter_directive(false, false), None);
    }

    #[test]
    fn repeated_init_does_not_panic() {
        init_logger(false, true, true);
        init_logger(true, false, true);
    }
}
