use clap::{Arg, ArgAction, Command};
use log::error;

use fdepsd::app_logic;

fn main() {
    let matches = Command::new("fdepsd")
        .version("0.1.0")
        .about("Fatigue damage equivalent PSDs from base acceleration signals")
        .arg(
            Arg::new("run")
                .short('r')
                .long("run")
                .value_name("CONFIG")
                .help("Run the analysis described by a YAML or TOML configuration file")
                .required(true),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::SetTrue)
                .help("Log progress at info level"),
        )
        .after_help(
            "The configuration names the signal file, the analysis frequencies and \
             options, and the output directory. RUST_LOG overrides the log level.",
        )
        .get_matches();

    let level = if matches.get_flag("verbose") { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    if let Some(r) = matches.get_one::<String>("run") {
        if let Err(e) = app_logic::run(r) {
            error!("{:#}", e);
            std::process::exit(1);
        }
    }
}
