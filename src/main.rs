use kiln::diagnostics::{print_diagnostics, WarningList};
use kiln::driver;
use kiln::settings::Config;
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();

    let config = match build_config(&args[1..]) {
        Ok(config) => config,
        Err(msg) => {
            eprintln!("{msg}");
            print_usage();
            return ExitCode::FAILURE;
        }
    };

    let output = driver::compile(&config);
    let is_ready = output.is_ready_for_backend();
    print_diagnostics(WarningList::new(), output.errors);

    if is_ready {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// Builds a [`Config`] from either a bare entry-file path or `--manifest <path>` pointing at a
/// `kiln.toml` (§2.1.M).
fn build_config(args: &[String]) -> Result<Config, String> {
    match args {
        [flag, manifest] if flag == "--manifest" => {
            Config::from_manifest(std::path::Path::new(manifest)).map_err(|e| format!("failed to load manifest: {e}"))
        }
        [entry] => Ok(Config::new(PathBuf::from(entry))),
        _ => Err("expected exactly one entry-file argument, or `--manifest <path>`".to_string()),
    }
}

fn print_usage() {
    println!("usage: kiln <entry-file>");
    println!("       kiln --manifest <kiln.toml>");
}
