//! Pyx host simulator CLI.

use std::io::Read;
use std::path::{Path, PathBuf};

use pyx::{init_tracing, EnvHome, Simulator, Transcript};
use pyx_bridge::RuntimeConfig;

fn main() {
    init_tracing();

    let args: Vec<String> = std::env::args().collect();
    let mut config = RuntimeConfig::new().home(std::sync::Arc::new(EnvHome));
    let mut script_path = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => {
                print_usage();
                return;
            }
            "--startup" if i + 1 < args.len() => {
                let path = &args[i + 1];
                match std::fs::read_to_string(path) {
                    Ok(source) => config = config.startup_script(source),
                    Err(err) => {
                        eprintln!("error: cannot read start-up script '{path}': {err}");
                        std::process::exit(1);
                    }
                }
                i += 2;
            }
            "--recursion-limit" if i + 1 < args.len() => {
                let Ok(limit) = args[i + 1].parse::<usize>() else {
                    eprintln!("error: --recursion-limit expects a number");
                    std::process::exit(1);
                };
                config = config.recursion_limit(limit);
                i += 2;
            }
            arg if arg.starts_with('-') && arg != "-" => {
                eprintln!("error: unknown option '{arg}'");
                print_usage();
                std::process::exit(1);
            }
            arg => {
                if script_path.is_some() {
                    eprintln!("error: only one patch script may be given");
                    std::process::exit(1);
                }
                script_path = Some(arg.to_string());
                i += 1;
            }
        }
    }

    let (script, base) = match script_path.as_deref() {
        None | Some("-") => {
            let mut script = String::new();
            if let Err(err) = std::io::stdin().read_to_string(&mut script) {
                eprintln!("error: cannot read stdin: {err}");
                std::process::exit(1);
            }
            (script, PathBuf::from("."))
        }
        Some(path) => match std::fs::read_to_string(path) {
            Ok(script) => {
                let base = Path::new(path)
                    .parent()
                    .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
                (script, base)
            }
            Err(err) => {
                eprintln!("error: cannot read '{path}': {err}");
                std::process::exit(1);
            }
        },
    };

    let simulator = Simulator::new(config, base, Transcript::stdout());
    let failures = simulator.run_script(&script);
    simulator.close_patch();
    if failures > 0 {
        std::process::exit(1);
    }
}

fn print_usage() {
    println!("Pyx host simulator");
    println!();
    println!("Usage: pyx [options] [patch-script]");
    println!();
    println!("Reads the patch script from stdin when no file (or '-') is given.");
    println!();
    println!("Options:");
    println!("  --startup <file>          Run <file> when the engine starts");
    println!("  --recursion-limit <n>     Engine recursion limit");
    println!("  -h, --help                Show this help");
    println!();
    println!("Patch script commands:");
    println!("  new [@attr value ...]     Create an object");
    println!("  <name> <selector> ...     Send a message to an object");
    println!("  save <name> <code ...>    Save the object's editor");
    println!("  close <name> <code ...>   Close the object's editor");
    println!("  advance <ms>              Advance the scheduler clock");
    println!("  free <name>               Delete an object");
    println!();
    println!("Environment:");
    println!("  PYX_HOME                  Engine home directory (sys.prefix)");
    println!("  RUST_LOG                  Tracing filter, e.g. pyx_bridge=debug");
}
