use std::env;
use std::process::ExitCode;

mod app;

use app::bootstrap::{self, Command};

fn main() -> ExitCode {
    let args = env::args().skip(1).collect::<Vec<_>>();
    let options = match bootstrap::parse_args(&args) {
        Ok(Command::Run(options)) => options,
        Ok(Command::Help) => {
            println!("{}", bootstrap::usage_text());
            return ExitCode::SUCCESS;
        }
        Err(message) => {
            eprintln!("{message}");
            return ExitCode::from(2);
        }
    };

    let app = bootstrap::build_app(options);
    app::loop_runner::run(app)
}
