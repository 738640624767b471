use std::collections::BTreeSet;

use kernc_ir::Function;
use kernc_mir::{FunctionBuilder, Intrinsic, MirFunction};

use crate::{context::FunctionContext, instr::lower_instruction, layout::signature, LowerError};

/// A lowered function together with the runtime primitives it calls.
#[derive(Debug, Clone)]
pub struct LoweredFunction {
  pub function: MirFunction,
  pub intrinsics: BTreeSet<Intrinsic>,
}

/// Lower one function.
///
/// Every block is created before any instruction is lowered so that forward
/// branches resolve, and phi edges are wired last, once every value in the
/// function exists.
pub fn lower_function(func: &Function) -> Result<LoweredFunction, LowerError> {
  let arg_types: Vec<_> = func.arguments.iter().map(|arg| arg.ty.clone()).collect();
  let (params, ret) = signature(&arg_types, &func.return_type)?;
  let params: Vec<_> = params
    .into_iter()
    .zip(&func.arguments)
    .map(|(ty, arg)| (ty, Some(arg.name.clone())))
    .collect();

  if func.blocks.is_empty() {
    return Err(LowerError::invalid_operand("function", format!("'{}' has no blocks", func.name)));
  }

  let mut ctx = FunctionContext::new(func, FunctionBuilder::new(func.name.clone(), params, ret));

  // Pass 1: blocks
  for (id, block) in func.blocks.iter() {
    let mir_block = ctx.builder.create_block(&block.name);
    ctx.map_block(id, mir_block);
  }

  // Pass 2: instructions
  for (id, block) in func.blocks.iter() {
    let mir_block = ctx.block(id)?;
    ctx.builder.position_at_end(mir_block);

    for (index, instr_id) in block.instructions.iter().enumerate() {
      lower_instruction(&mut ctx, *instr_id).map_err(|error| {
        let opcode = func
          .instructions
          .try_get(instr_id)
          .map(|instr| instr.kind.opcode())
          .unwrap_or("?");
        error.in_function(&func.name, &block.name, index, opcode)
      })?;
    }
  }

  // Pass 3: phi edges
  for fixup in std::mem::take(&mut ctx.fixups) {
    wire_phi(&mut ctx, &fixup.incoming, fixup.phi).map_err(|error| {
      let (block, index) = locate(func, fixup.instr);
      error.in_function(&func.name, &block, index, "phi")
    })?;
  }

  Ok(LoweredFunction {
    function: ctx.builder.finish(),
    intrinsics: ctx.intrinsics,
  })
}

fn wire_phi(
  ctx: &mut FunctionContext<'_>,
  incoming: &[(kernc_ir::Operand, kernc_ir::BlockId)],
  phi: kernc_mir::ValueId,
) -> Result<(), LowerError> {
  for (value, pred) in incoming {
    let value = ctx.operand(value)?;
    let pred = ctx.block(*pred)?;
    if !ctx.builder.add_incoming(phi, value, pred) {
      return Err(LowerError::invalid_operand("phi", format!("%{} is not a phi", phi.index())));
    }
  }
  Ok(())
}

/// Block name and position of an instruction, for error locations.
fn locate(
  func: &Function,
  instr: kernc_ir::InstrId,
) -> (String, usize) {
  func
    .block_of(instr)
    .map(|block| {
      let block = func.block(block);
      let index = block.instructions.iter().position(|id| *id == instr).unwrap_or(0);
      (block.name.clone(), index)
    })
    .unwrap_or_else(|| ("?".to_string(), 0))
}
