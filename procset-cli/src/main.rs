use clap::{Parser, Subcommand};
use procset_core::ProcessSettings;
use procset_runner::{EnvironmentMode, LaunchPlan};
use std::process;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "procset")]
#[command(about = "Validate and inspect process launch settings", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a template settings file
    Init,

    /// Check that a settings file is valid
    Check {
        /// Path to a .toml or .json settings file
        file: String,
    },

    /// Show how a launcher would start the process
    Plan {
        /// Path to a .toml or .json settings file
        file: String,

        /// Print the plan as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init => {
            print!("{}", settings_template());
        }
        Commands::Check { file } => match ProcessSettings::load(&file) {
            Ok(settings) => {
                info!(file = %file, "Settings are valid");
                println!("{}: valid ({})", file, settings.command().join(" "));
            }
            Err(e) => {
                error!(file = %file, error = %e, "Settings are invalid");
                eprintln!("{}: {}", file, e);
                process::exit(1);
            }
        },
        Commands::Plan { file, json } => {
            let settings = ProcessSettings::load(&file)?;
            let plan = LaunchPlan::from_settings(&settings)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&plan)?);
            } else {
                print_plan(&plan);
            }
        }
    }

    Ok(())
}

fn print_plan(plan: &LaunchPlan) {
    println!("Program: {}", plan.program);
    if !plan.args.is_empty() {
        println!("Args: {}", plan.args.join(" "));
    }
    match &plan.directory {
        Some(dir) => println!("Directory: {}", dir.display()),
        None => println!("Directory: (current)"),
    }
    match &plan.environment {
        EnvironmentMode::Inherit => println!("Environment: inherited"),
        EnvironmentMode::Replace(vars) => {
            println!("Environment: replaced ({} variables)", vars.len());
            let mut names: Vec<&String> = vars.keys().collect();
            names.sort();
            for name in names {
                println!("  {}={}", name, vars[name]);
            }
        }
    }
    println!("Redirect stderr to stdout: {}", plan.redirect_error_stream);
    println!("stdin: {:?}", plan.stdin);
    println!("stdout: {:?}", plan.stdout);
    println!("stderr: {:?}", plan.stderr);
}

fn settings_template() -> &'static str {
    r#"# Process launch settings

command = ["echo", "hello"]
# directory = "/path/to/workdir"
redirect_error_stream = false

# Leave out [environment] to inherit the caller's environment.
# When present it replaces the environment entirely.
# [environment]
# PATH = "/usr/bin:/bin"

[stdin_settings]
# locations: any of "buffer", "file", "standard"
locations = []

[stdout_settings]
locations = ["buffer"]
# buffer_size = 65536
# output_file = "stdout.log"
# append_file = false

[stderr_settings]
locations = ["standard"]
"#
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_is_valid() {
        let settings = ProcessSettings::from_toml_str(settings_template()).unwrap();
        assert_eq!(settings.command(), ["echo", "hello"]);
        assert!(!settings.is_redirect_error_stream());
        assert!(settings.stdin_settings().is_neutral());

        let plan = LaunchPlan::from_settings(&settings).unwrap();
        assert_eq!(plan.program, "echo");
        assert_eq!(plan.environment, EnvironmentMode::Inherit);
    }

    #[test]
    fn test_cli_parses_plan() {
        let cli = Cli::try_parse_from(["procset", "plan", "job.toml", "--json"]).unwrap();
        match cli.command {
            Commands::Plan { file, json } => {
                assert_eq!(file, "job.toml");
                assert!(json);
            }
            _ => panic!("expected plan command"),
        }
    }
}
