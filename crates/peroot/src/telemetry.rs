use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize console logging.
///
/// `RUST_LOG` wins when set. Otherwise `verbose` selects debug output for the Peroot crates.
pub fn init_tracing(verbose: bool) {
    let default_directive = if verbose {
        "info,peroot=debug,peroot_gateway=debug,peroot_rate_limit=debug"
    } else {
        "warn,peroot=info,peroot_gateway=info,peroot_rate_limit=info"
    };

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}
