use clap::Parser;
use log::warn;
use snafu::ErrorCompat;

mod app;
mod args;

use crate::args::Args;

fn main() {
    let args = Args::parse();

    if args.verbose {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Debug)
            .init();
    } else {
        env_logger::init();
    }

    let res = match (&args.config, &args.input) {
        (Some(config_path), _) => {
            app::run_quota(config_path.clone(), args.reference, args.out)
        }
        (None, Some(input_path)) => app::run_quota_csv(
            input_path.clone(),
            args.limit.unwrap_or(0),
            args.reference,
            args.out,
        ),
        (None, None) => {
            eprintln!("Nothing to do: pass --config or --input. See --help for details.");
            std::process::exit(2);
        }
    };

    if let Err(e) = res {
        warn!("Error occured {:?}", e);
        eprintln!("An error occured {}", e);
        if let Some(bt) = ErrorCompat::backtrace(&e) {
            eprintln!("trace: {}", bt);
        }
        std::process::exit(1);
    }
}
