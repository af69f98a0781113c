use tracing_subscriber::EnvFilter;

/// Filter used when `--verbose` is off and `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "warn";

/// Directive string for the subscriber: `--verbose` wins, then `RUST_LOG`, then warnings only.
pub fn filter_directives(verbose: bool, rust_log: Option<&str>) -> String {
    if verbose {
        return "debug".to_string();
    }
    match rust_log.map(str::trim) {
        Some(value) if !value.is_empty() => value.to_string(),
        _ => DEFAULT_FILTER.to_string(),
    }
}

/// Install the stderr subscriber. Stdout stays reserved for results.
pub fn init(verbose: bool) {
    let rust_log = std::env::var("RUST_LOG").ok();
    let directives = filter_directives(verbose, rust_log.as_deref());
    let filter = EnvFilter::try_new(&directives).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    // A second init (tests, embedding) keeps the first subscriber
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
