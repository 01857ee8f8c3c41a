use std::process::ExitCode;

fn main() -> ExitCode {
    creditgate_cli::run()
}
