use std::path::Path;

use colored::*;
use kernc_config::{DebugTrace, DumpKind, KerncConfig};
use kernc_ir::Module;
use kernc_log::{log_dbg, log_trc, phase_log, phase_ok, phase_warn, trace_dbg};
use kernc_lower::lower_module_traced;
use kernc_mir::{
  display::print_module,
  interp::{Interpreter, RtValue},
  MirFunction, MirModule,
};

use crate::stats::format_stats;

/// Read a kernel IR module from its JSON form.
pub fn load_module(
  config: &KerncConfig,
  path: &Path,
) -> Result<Module, ()> {
  phase_log!(config, "Reading... {}", path.display());

  let text = match std::fs::read_to_string(path) {
    Ok(text) => text,
    Err(e) => {
      eprintln!("{} Failed to read file '{}': {}", "Error:".red().bold(), path.display(), e);
      return Err(());
    },
  };

  let module = match Module::from_json(&text) {
    Ok(module) => module,
    Err(e) => {
      eprintln!(
        "{} Failed to parse kernel IR in '{}': {}",
        "Error:".red().bold(),
        path.display(),
        e
      );
      return Err(());
    },
  };

  trace_dbg!(
    config,
    DebugTrace::Driver,
    "loaded module '{}' with {} functions from {}",
    module.name,
    module.functions.len(),
    path.display()
  );

  if config.wants_dump(DumpKind::Kir) {
    println!("{}", kernc_ir::display::print_module(&module));
  }

  Ok(module)
}

/// Lower an already loaded module, reporting any internal compiler error.
pub fn lower_loaded(
  config: &KerncConfig,
  module: &Module,
) -> Result<MirModule, ()> {
  phase_log!(config, "Lowering... {}", module.name);

  let lowered = match lower_module_traced(module, config) {
    Ok(lowered) => lowered,
    Err(e) => {
      eprintln!("{} {}", "Internal compiler error:".red().bold(), e);
      return Err(());
    },
  };

  if lowered.functions.is_empty() {
    phase_warn!(config, "Module '{}' defines no functions", lowered.name);
  }

  log_dbg!(
    config,
    "{} functions, {} declarations",
    lowered.functions.len(),
    lowered.declarations.len()
  );

  if config.wants_dump(DumpKind::Mir) {
    println!("{}", print_module(&lowered));
  }

  Ok(lowered)
}

/// `kernc lower`: lower `input` and write the machine IR to `output`, or to
/// stdout when no output path is given.
pub fn lower_file(
  config: &KerncConfig,
  input: &Path,
  output: Option<&Path>,
  stats: bool,
) -> Result<MirModule, ()> {
  let module = load_module(config, input)?;
  let lowered = lower_loaded(config, &module)?;
  let text = print_module(&lowered);

  match output {
    Some(path) => {
      if let Err(e) = std::fs::write(path, &text) {
        eprintln!("{} Failed to write '{}': {}", "Error:".red().bold(), path.display(), e);
        return Err(());
      }
      phase_log!(config, "Wrote {}", path.display());
    },
    // Already printed by the dump
    None if config.wants_dump(DumpKind::Mir) => {},
    None => print!("{}", text),
  }

  if stats {
    println!("{}", format_stats(&lowered));
  }

  phase_ok!(config, "Lowered {} functions", lowered.functions.len());
  Ok(lowered)
}

/// `kernc run`: lower `input`, then interpret `function` with `args`.
pub fn run_file(
  config: &KerncConfig,
  input: &Path,
  function: &str,
  args: &[String],
) -> Result<Option<RtValue>, ()> {
  let module = load_module(config, input)?;
  let lowered = lower_loaded(config, &module)?;

  let Some(func) = lowered.function(function) else {
    eprintln!(
      "{} Function '{}' is not defined in '{}'",
      "Error:".red().bold(),
      function,
      input.display()
    );
    return Err(());
  };

  let values = match parse_arguments(func, args) {
    Ok(values) => values,
    Err(message) => {
      eprintln!("{} {}", "Error:".red().bold(), message);
      return Err(());
    },
  };

  phase_log!(config, "Running... {}", function);
  log_trc!(config, "arguments: {:?}", values);

  let mut interpreter = Interpreter::new(&lowered);
  let result = interpreter.call(function, values);

  trace_dbg!(
    config,
    DebugTrace::Interp,
    "{} finished after {} steps",
    function,
    interpreter.steps()
  );

  match result {
    Ok(value) => Ok(value),
    Err(e) => {
      eprintln!("{} {}", "Runtime error:".red().bold(), e);
      Err(())
    },
  }
}

/// Parse command-line arguments against a function's parameter types.
pub fn parse_arguments(
  func: &MirFunction,
  args: &[String],
) -> Result<Vec<RtValue>, String> {
  if args.len() != func.params.len() {
    return Err(format!(
      "'{}' takes {} arguments, {} given",
      func.name,
      func.params.len(),
      args.len()
    ));
  }

  func
    .params
    .iter()
    .zip(args)
    .enumerate()
    .map(|(index, (param, text))| {
      let ty = func.value_type(*param);
      RtValue::parse(ty, text).ok_or_else(|| format!("argument {} ('{}') is not a valid {}", index, text, ty))
    })
    .collect()
}
