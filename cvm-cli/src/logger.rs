//! Logger setup for the CLI.
use env_logger::{Builder, Env};
use std::io::Write;

/// Install a stderr logger at `warn`, overridable through `RUST_LOG`.
pub fn configure() {
    Builder::from_env(Env::default().default_filter_or("warn"))
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .target(env_logger::Target::Stderr)
        .init();
}
