mod commands;
mod handlers;
mod output;

use clap::Parser;
use commands::Cli;
use output::print_error;

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        _ => log::LevelFilter::Debug,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    if let Err(err) = handlers::handle_command(cli) {
        print_error(&err.to_string());
        std::process::exit(1);
    }
}
