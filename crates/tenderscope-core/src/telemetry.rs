//! Log output for the `tenderscope` binary.
//!
//! Scoring results, run reports and benchmark reports are printed as JSON on
//! stdout, so every log line goes to stderr. Piping `tenderscope run` into
//! `jq` therefore only ever sees the report.
//!
//! Without `RUST_LOG`, only the engine's own crates log at the requested
//! level. Dependencies stay at `warn`.

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

const ENGINE_TARGETS: [&str; 2] = ["tenderscope_core", "tenderscope"];

fn default_directives(level: Level) -> String {
    let mut directives = String::from("warn");
    for target in ENGINE_TARGETS {
        directives.push_str(&format!(",{target}={level}"));
    }
    directives
}

/// Install the stderr subscriber. Only the first call in a process wins.
///
/// `json` switches log lines to newline-delimited JSON, matching the
/// `--json` flag. `level` applies when `RUST_LOG` is unset.
pub fn init_tracing(json: bool, level: Level) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(level)));

    let json_logs = json.then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .json()
    });
    let text_logs = (!json).then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
    });

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(json_logs)
        .with(text_logs)
        .try_init();
}
