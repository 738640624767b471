mod cli;

use std::path::Path;

use clap::Parser as ClapParser;
use colored::*;
use kernc::{lower_file, run_file};
use kernc_config::{load_config_file, KerncConfig, KerncToml, CONFIG_FILE};

use cli::{Cli, SubCommand};

/// Explicit `--config` must exist; the default file is optional.
fn load_toml(cli: &Cli) -> Result<KerncToml, ()> {
  let (path, required) = match &cli.config {
    Some(path) => (Path::new(path).to_path_buf(), true),
    None => (Path::new(CONFIG_FILE).to_path_buf(), false),
  };

  if !required && !path.exists() {
    return Ok(KerncToml::default());
  }

  load_config_file(&path).map_err(|e| {
    eprintln!("{} {}", "Error:".red().bold(), e);
  })
}

fn parse_cli_to_config(cli: &Cli) -> Result<KerncConfig, ()> {
  let toml = load_toml(cli)?;

  let mut config = KerncConfig::new_basic(
    cli.debug,
    cli.debug_trace.iter().copied().map(Into::into).collect(),
    cli.quiet,
    cli.verbose,
  );
  config.dump = cli.dump.iter().copied().map(Into::into).collect();
  config.lower = toml.lower;

  if let SubCommand::Lower(lower) = &cli.subcommand {
    if lower.verify {
      config.lower.verify = true;
    }
    if let Some(jobs) = lower.jobs {
      config.lower.workers = jobs;
    }
  }

  Ok(config)
}

fn main() {
  let cli = Cli::parse();

  let Ok(config) = parse_cli_to_config(&cli) else {
    std::process::exit(1);
  };

  match &cli.subcommand {
    SubCommand::Lower(lower) => {
      let output = lower.output.as_deref().map(Path::new);
      if lower_file(&config, Path::new(&lower.input), output, lower.stats).is_err() {
        std::process::exit(1);
      }
    },
    SubCommand::Run(run) => match run_file(&config, Path::new(&run.input), &run.function, &run.args) {
      Ok(Some(value)) => println!("{}", value),
      Ok(None) => {},
      Err(()) => std::process::exit(1),
    },
  }
}
