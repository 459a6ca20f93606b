//! Entry point for the command-line interface.
#![forbid(unsafe_code)]

#[expect(
    clippy::print_stderr,
    reason = "The binary reports fatal errors on stderr before exiting"
)]
fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    if let Err(err) = rosnumbase_cli::run() {
        eprintln!("rosnumbase: {err}");
        std::process::exit(1);
    }
}
