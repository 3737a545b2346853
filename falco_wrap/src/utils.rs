use chrono::Local;
use env_logger::{Builder, Env};
use itertools::Itertools;
use std::io::Write;

fn io_error_to_string(err: &std::io::Error) -> String {
    let s = err.to_string();
    s.strip_suffix(&format!(" (os error {})", err.raw_os_error().unwrap_or(0)))
        .unwrap_or(&s)
        .to_string()
}

/// Print an error chain.
pub fn print_error_chain(err: &anyhow::Error) {
    let error_chain = err.chain().join("\n\tCaused by: ");
    if let Some(io_err) = err.downcast_ref::<std::io::Error>() {
        let io_err_str = io_error_to_string(io_err);
        match err.chain().len() {
            1 => println!("ERROR: {io_err_str}"),
            2 => println!("ERROR: {io_err_str}: {err}"),
            _ => println!("ERROR: {error_chain}"),
        };
    } else {
        println!("ERROR: {error_chain}");
    };
}

/// Log to stderr as `2024-01-31T12:00:00 [INFO] - message`. The level defaults
/// to info and can be changed with `RUST_LOG`.
pub fn init_logging() {
    let _ = Builder::from_env(Env::default().default_filter_or("info"))
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{}] - {}",
                Local::now().format("%Y-%m-%dT%H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .try_init();
}
