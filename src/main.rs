//! docloom CLI binary
//!
//! Minimal entrypoint; all logic is in the library. main.rs only invokes
//! cli::run() and maps its result to a process exit code.

fn main() {
    // cli::run() handles all output including errors.
    if let Err(code) = docloom::cli::run() {
        std::process::exit(code.as_i32());
    }
}
