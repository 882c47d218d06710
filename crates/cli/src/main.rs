use std::process::ExitCode;

fn main() -> ExitCode {
    valvey_cli::run()
}
