//! Tracing subscriber setup
//!
//! Rendered output goes to stdout, so every profile keeps its log lines
//! on stderr where they can't corrupt a piped document.

use std::sync::Once;

use tracing_subscriber::{util::SubscriberInitExt, EnvFilter};

/// How much the subscriber says, and in what shape
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    /// Human-readable stderr lines at `arbor=debug`
    Development,
    /// JSON stderr lines at `arbor=info`
    Production,
    /// Bare registry so test harness output stays readable
    Test,
}

static SUBSCRIBER_GUARD: Once = Once::new();

fn filter_or(default_directive: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive))
}

/// Install the global subscriber for the chosen profile
///
/// Only the first call installs anything, so the CLI and library
/// consumers can both ask for setup without fighting over the global
/// default. `RUST_LOG` overrides the per-profile filter when set.
///
/// ```
/// arbor_core::logging::init(arbor_core::logging::Profile::Test);
/// ```
pub fn init(profile: Profile) {
    SUBSCRIBER_GUARD.call_once(|| match profile {
        Profile::Development => {
            tracing_subscriber::fmt()
                .with_writer(std::io::stderr)
                .with_env_filter(filter_or("arbor=debug"))
                .init();
        }
        Profile::Production => {
            tracing_subscriber::fmt()
                .json()
                .with_writer(std::io::stderr)
                .with_env_filter(filter_or("arbor=info"))
                .init();
        }
        Profile::Test => {
            tracing_subscriber::registry().init();
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeated_init_is_harmless() {
        init(Profile::Test);
        init(Profile::Test);
        init(Profile::Development);
    }
}
