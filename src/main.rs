use std::process::ExitCode;

fn main() -> ExitCode {
    env_logger::init();
    match mupp::cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{:?}", miette::Report::new(err));
            ExitCode::FAILURE
        }
    }
}
