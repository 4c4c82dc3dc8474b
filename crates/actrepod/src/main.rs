use std::process::ExitCode;

fn main() -> ExitCode {
    match actrepod::run_daemon() {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("actrepod: {error}");
            ExitCode::FAILURE
        }
    }
}
