use crate::{BlockId, Instr, Operand};

/// A basic block: a sequence of instructions ending with a terminator.
#[derive(Debug, Clone)]
pub struct MirBlock {
  /// Unique label within the function.
  pub label: String,
  /// Instructions in this block (phis first).
  pub instructions: Vec<Instr>,
  /// How this block exits. `None` until the block is terminated.
  pub terminator: Option<Terminator>,
}

impl MirBlock {
  pub fn new(label: String) -> Self {
    Self {
      label,
      instructions: Vec::new(),
      terminator: None,
    }
  }
}

/// Block terminator: how control exits a basic block.
#[derive(Debug, Clone, PartialEq)]
pub enum Terminator {
  /// Unconditional jump to a target block.
  Br(BlockId),

  /// Conditional branch on an `i1`.
  CondBr {
    cond: Operand,
    then_block: BlockId,
    else_block: BlockId,
  },

  /// Return from function with optional value (`None` is `ret void`).
  Ret(Option<Operand>),

  Unreachable,
}

impl Terminator {
  pub fn successors(&self) -> Vec<BlockId> {
    match self {
      Terminator::Br(target) => vec![*target],
      Terminator::CondBr {
        then_block, else_block, ..
      } => vec![*then_block, *else_block],
      Terminator::Ret(_) | Terminator::Unreachable => Vec::new(),
    }
  }
}
