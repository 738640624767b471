use clap::{ColorChoice, Parser, Subcommand, ValueEnum};
use kernc_config::{DebugTrace, DumpKind};

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
pub enum DumpKindCli {
  /// Dump the input kernel IR
  Kir,
  /// Dump the lowered machine IR
  Mir,
}

impl From<DumpKindCli> for DumpKind {
  fn from(value: DumpKindCli) -> DumpKind {
    match value {
      DumpKindCli::Kir => DumpKind::Kir,
      DumpKindCli::Mir => DumpKind::Mir,
    }
  }
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
pub enum DebugTraceCli {
  Lower,
  Mir,
  Interp,
  Driver,
}

impl From<DebugTraceCli> for DebugTrace {
  fn from(value: DebugTraceCli) -> DebugTrace {
    match value {
      DebugTraceCli::Lower => DebugTrace::Lower,
      DebugTraceCli::Mir => DebugTrace::Mir,
      DebugTraceCli::Interp => DebugTrace::Interp,
      DebugTraceCli::Driver => DebugTrace::Driver,
    }
  }
}

#[derive(Parser, Debug, Clone, PartialEq)]
pub struct LowerCommand {
  /// Kernel IR module in JSON form
  pub input: String,

  /// Write machine IR here instead of stdout
  #[arg(short = 'o', long)]
  pub output: Option<String>,

  /// Verify every lowered function
  #[arg(long)]
  pub verify: bool,

  /// Print a per-function summary table
  #[arg(long)]
  pub stats: bool,

  /// Lower functions on this many worker threads
  #[arg(short, long)]
  pub jobs: Option<usize>,
}

#[derive(Parser, Debug, Clone, PartialEq)]
pub struct RunCommand {
  /// Kernel IR module in JSON form
  pub input: String,

  /// Function to call
  pub function: String,

  /// Arguments, parsed by parameter type
  #[arg(allow_hyphen_values = true)]
  pub args: Vec<String>,
}

#[derive(Subcommand, Clone, PartialEq)]
pub enum SubCommand {
  /// Lower a kernel IR module to machine IR
  Lower(LowerCommand),
  /// Lower a module, then interpret one of its functions
  Run(RunCommand),
}

#[derive(Parser)]
#[command(author, version, about = "Kernel IR to machine IR lowering", long_about = None)]
#[command(propagate_version = true)]
#[command(color = ColorChoice::Always)]
pub struct Cli {
  #[command(subcommand)]
  pub subcommand: SubCommand,

  /// Configuration file (defaults to kernc.toml when present)
  #[arg(long, global = true)]
  pub config: Option<String>,

  /// Dump intermediate representations
  #[arg(long, value_enum, action = clap::ArgAction::Append, global = true)]
  pub dump: Vec<DumpKindCli>,

  /// Enable internal debug mode
  #[arg(long, default_value = "false", global = true)]
  pub debug: bool,

  /// Enable debug tracing for subsystems
  #[arg(long, value_enum, action = clap::ArgAction::Append, global = true)]
  pub debug_trace: Vec<DebugTraceCli>,

  /// Don't print any output
  #[arg(long, short = 'q', default_value = "false", global = true)]
  pub quiet: bool,

  /// Use verbose output
  #[arg(long, short, action = clap::ArgAction::Count, global = true)]
  pub verbose: u8,
}
