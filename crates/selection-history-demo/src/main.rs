#![forbid(unsafe_code)]

fn main() {
    if let Err(error) = selection_history_demo::run_from_env() {
        eprintln!("{error}");
        std::process::exit(error.exit_code());
    }
}
