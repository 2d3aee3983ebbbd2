use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "bridgespec")]
#[command(about = "Compile native interface specs into C bridge code", long_about = None)]
struct Args {
    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[clap(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand, Debug)]
enum Command {
    /// Generate C artifacts for every spec file under a directory
    Generate {
        /// Project root holding bridgespec.toml
        #[arg(value_name = "ROOT", default_value = ".")]
        root: PathBuf,
    },

    /// Report diagnostics for one spec file as JSON
    Check {
        /// Spec file to check
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Print the resolved IR of one spec file as JSON
    Ir {
        /// Spec file to compile
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .format_timestamp(None)
        .init();
}

fn run(command: Command) -> bridgespec_cli::CliResult<bool> {
    match command {
        Command::Generate { root } => {
            let report = bridgespec_cli::run_generate(&root)?;
            for generated in &report.generated {
                println!(
                    "{} -> {} ({})",
                    generated.spec.display(),
                    generated.artifacts.source.display(),
                    generated.backend
                );
            }
            for failure in &report.failures {
                eprintln!("error: {failure}");
            }
            Ok(report.is_success())
        }
        Command::Check { file } => {
            let (ok, json) = bridgespec_cli::check_file(&file)?;
            println!("{json}");
            Ok(ok)
        }
        Command::Ir { file } => {
            println!("{}", bridgespec_cli::ir_file(&file)?);
            Ok(true)
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);
    match run(args.command) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("error: {e}");
            let mut source = std::error::Error::source(&e);
            while let Some(cause) = source {
                eprintln!("  caused by: {cause}");
                source = cause.source();
            }
            ExitCode::FAILURE
        }
    }
}
