use clap::Parser;
use log::LevelFilter;

mod args;
mod runner;

fn main() {
    let parsed = args::Args::parse();
    if parsed.verbose {
        env_logger::Builder::from_default_env()
            .filter_level(LevelFilter::Debug)
            .init();
    } else {
        env_logger::init();
    }

    if let Err(err) = runner::run(&parsed) {
        eprintln!("elimvote: {}", err);
        std::process::exit(1);
    }
}
