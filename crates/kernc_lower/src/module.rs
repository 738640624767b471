use std::sync::Mutex;
use std::thread;

use kernc_config::{DebugTrace, KerncConfig, LowerOptions};
use kernc_ir::{Function, Module};
use kernc_log::{log_dbg, trace_dbg};
use kernc_mir::{verify_function, MirFunction, MirModule};

use crate::{assemble::lower_function, LowerError};

/// Lower a whole module. Any error rejects the module; nothing partial is
/// returned.
pub fn lower_module(
  module: &Module,
  options: &LowerOptions,
) -> Result<MirModule, LowerError> {
  let mut config = KerncConfig::silent();
  config.lower = options.clone();
  lower_module_traced(module, &config)
}

/// [`lower_module`] with the options and logging of a driver configuration.
pub fn lower_module_traced(
  module: &Module,
  config: &KerncConfig,
) -> Result<MirModule, LowerError> {
  let options = &config.lower;
  let name = if options.module_name.is_empty() {
    module.name.clone()
  } else {
    options.module_name.clone()
  };

  let workers = options.workers.max(1).min(module.functions.len().max(1));
  log_dbg!(
    config,
    "lowering module '{}' ({} functions, {} workers)",
    name,
    module.functions.len(),
    workers
  );

  // Only the declaration table is shared; definitions are added at the end.
  let shared = Mutex::new(MirModule::new(name));
  let functions = if workers > 1 {
    lower_parallel(&module.functions, workers, config, &shared)?
  } else {
    module
      .functions
      .iter()
      .map(|func| lower_one(func, config, &shared))
      .collect::<Result<Vec<_>, _>>()?
  };

  let mut lowered = shared.into_inner().unwrap_or_else(|poisoned| poisoned.into_inner());
  lowered.functions = functions;
  trace_dbg!(
    config,
    DebugTrace::Mir,
    "module '{}' declares {:?}",
    lowered.name,
    lowered.declarations.keys().collect::<Vec<_>>()
  );

  if options.verify {
    for func in &lowered.functions {
      if let Err(errors) = verify_function(&lowered, func) {
        return Err(LowerError::VerificationFailed {
          function: func.name.clone(),
          errors,
        });
      }
      trace_dbg!(config, DebugTrace::Mir, "verified {}", func.name);
    }
  }

  Ok(lowered)
}

fn lower_one(
  func: &Function,
  config: &KerncConfig,
  shared: &Mutex<MirModule>,
) -> Result<MirFunction, LowerError> {
  let lowered = lower_function(func)?;

  trace_dbg!(
    config,
    DebugTrace::Lower,
    "lowered {}: {} blocks, {} instructions, {} phis",
    func.name,
    lowered.function.blocks.len(),
    lowered.function.instruction_count(),
    lowered.function.phi_count()
  );

  if !lowered.intrinsics.is_empty() {
    let mut module = shared.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    for intrinsic in &lowered.intrinsics {
      module.declare(*intrinsic);
    }
  }

  Ok(lowered.function)
}

/// Lower on scoped worker threads. Function `i` goes to worker
/// `i % workers`; results are put back in source order, and the first
/// error in source order wins.
fn lower_parallel(
  functions: &[Function],
  workers: usize,
  config: &KerncConfig,
  shared: &Mutex<MirModule>,
) -> Result<Vec<MirFunction>, LowerError> {
  let mut slots: Vec<Option<Result<MirFunction, LowerError>>> = (0..functions.len()).map(|_| None).collect();

  thread::scope(|scope| {
    let handles: Vec<_> = (0..workers)
      .map(|worker| {
        scope.spawn(move || {
          functions
            .iter()
            .enumerate()
            .skip(worker)
            .step_by(workers)
            .map(|(index, func)| (index, lower_one(func, config, shared)))
            .collect::<Vec<_>>()
        })
      })
      .collect();

    for handle in handles {
      match handle.join() {
        Ok(results) => {
          for (index, result) in results {
            slots[index] = Some(result);
          }
        },
        Err(panic) => std::panic::resume_unwind(panic),
      }
    }
  });

  slots
    .into_iter()
    .enumerate()
    .map(|(index, slot)| {
      slot.unwrap_or_else(|| {
        Err(LowerError::invalid_operand(
          "module",
          format!("function #{} was not lowered", index),
        ))
      })
    })
    .collect()
}
