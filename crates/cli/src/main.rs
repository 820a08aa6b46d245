use std::process::ExitCode;

fn main() -> ExitCode {
    homeworth_cli::run()
}
