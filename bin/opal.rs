use clap::Parser;
use opal::simulator::config::load_and_merge_configs;
use opal::simulator::utils::log::init_log;
use opal::simulator::workload::Workload;
use opal::simulator::{Simulator, Verdict};
use std::path::Path;
use std::process;

/// Opal - a cycle-level matmul accelerator simulator
#[derive(Parser, Debug)]
#[command(name = "opal")]
#[command(version = "0.1.0")]
#[command(about = "Opal outer-product matmul accelerator simulator", long_about = None)]
struct Args {
  /// Workload TOML file to execute
  #[arg(value_name = "WORKLOAD")]
  workload: Option<String>,

  /// Custom configuration file (merged over defaults)
  #[arg(short, long, value_name = "FILE")]
  config: Option<String>,

  /// Enable step mode (interactive stepping)
  #[arg(short, long)]
  step: bool,

  /// Quiet mode (suppress log messages)
  #[arg(short, long)]
  quiet: bool,

  /// Output trace file path
  #[arg(long, value_name = "FILE")]
  trace_file: Option<String>,

  /// Step budget for continuous runs
  #[arg(long, value_name = "N")]
  max_steps: Option<u64>,
}

fn main() -> std::io::Result<()> {
  init_log();

  let args = Args::parse();

  let config = load_and_merge_configs(
    args.config.as_deref(),
    args.quiet,
    args.step,
    args.trace_file.as_deref(),
    args.max_steps,
  )?;

  let workload = match args.workload {
    Some(ref path) => Some(Workload::load(Path::new(path))?),
    None => None,
  };

  let mut simulator = Simulator::new(&config)?;

  let verdict = simulator.run(workload.as_ref())?;
  if verdict != Verdict::Passed {
    process::exit(1);
  }

  Ok(())
}
