use clap::{Arg, ArgAction, Command};
use doka::runner::{self, RunOptions};

fn main() {
    let matches = Command::new("doka")
        .about("Extended Dockerfile syntax")
        .version(env!("CARGO_PKG_VERSION"))
        .arg(
            Arg::new("var")
                .short('v')
                .long("var")
                .help("Variables to be used in the Dokafile, as NAME=VALUE or NAME to read the environment")
                .value_name("NAME[=VALUE]")
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("file")
                .short('f')
                .long("file")
                .help("Dokafile path")
                .value_name("FILE")
                .default_value("Dokafile"),
        )
        .arg(
            Arg::new("full-errors")
                .short('e')
                .long("full-errors")
                .help("Enable full error messages")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    let options = RunOptions {
        file: matches
            .get_one::<String>("file")
            .cloned()
            .unwrap_or_else(|| "Dokafile".to_string()),
        vars: matches
            .get_many::<String>("var")
            .map(|values| values.cloned().collect())
            .unwrap_or_default(),
        full_errors: matches.get_flag("full-errors"),
    };

    std::process::exit(runner::run(&options));
}
