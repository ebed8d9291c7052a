use clap::Parser;
use std::process;
use tidydesk::cli::{self, Cli};
use tidydesk::output::Reporter;

fn main() {
    let cli = Cli::parse();
    let mut reporter = Reporter::stdout();

    if let Err(e) = cli::run(&cli, &mut reporter) {
        reporter.error(&e);
        process::exit(1);
    }
}
