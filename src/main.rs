use cvefold::application::Application;

use log::error;
use std::process::ExitCode;

fn main() -> ExitCode {
    let mut application = Application::new();
    if let Err(e) = application.read_argv() {
        eprintln!("{}", e);
        return ExitCode::FAILURE;
    }

    match application.run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
