use kernc_type::{Store, Type};
use serde::{Deserialize, Serialize};

use crate::{BlockId, InstrId, Instruction, Operand};

/// A unit handed over by the front end: functions in declaration order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Module {
  pub name: String,
  pub functions: Vec<Function>,
}

impl Module {
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      functions: Vec::new(),
    }
  }

  pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
    serde_json::from_str(text)
  }

  pub fn to_json(&self) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(self)
  }

  pub fn function(
    &self,
    name: &str,
  ) -> Option<&Function> {
    self.functions.iter().find(|func| func.name == name)
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Argument {
  pub name: String,
  pub ty: Type,
}

/// Straight-line instruction sequence; the last instruction is the terminator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasicBlock {
  pub name: String,
  pub instructions: Vec<InstrId>,
}

impl BasicBlock {
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      instructions: Vec::new(),
    }
  }
}

/// A type-checked SSA function. The first block is the entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Function {
  pub name: String,
  pub arguments: Vec<Argument>,
  pub return_type: Type,
  pub blocks: Store<BasicBlock>,
  pub instructions: Store<Instruction>,
}

impl Function {
  pub fn instr(
    &self,
    id: InstrId,
  ) -> &Instruction {
    self.instructions.get(&id)
  }

  pub fn block(
    &self,
    id: BlockId,
  ) -> &BasicBlock {
    self.blocks.get(&id)
  }

  /// Type of an operand, or `None` when it names an argument or instruction
  /// this function does not have.
  pub fn operand_type<'a>(
    &'a self,
    operand: &'a Operand,
  ) -> Option<&'a Type> {
    match operand {
      Operand::Instr(id) => self.instructions.try_get(id).map(|instr| &instr.ty),
      Operand::Argument(idx) => self.arguments.get(*idx as usize).map(|arg| &arg.ty),
      Operand::Const(constant) => Some(&constant.ty),
    }
  }

  /// The block an instruction belongs to.
  pub fn block_of(
    &self,
    id: InstrId,
  ) -> Option<BlockId> {
    self
      .blocks
      .iter()
      .find(|(_, block)| block.instructions.contains(&id))
      .map(|(block_id, _)| block_id)
  }

  /// Predecessors of `block` according to the terminators of every block.
  pub fn predecessors(
    &self,
    block: BlockId,
  ) -> Vec<BlockId> {
    self
      .blocks
      .iter()
      .filter(|(_, candidate)| {
        candidate
          .instructions
          .last()
          .and_then(|last| self.instructions.try_get(last))
          .map(|last| last.kind.successors().contains(&block))
          .unwrap_or(false)
      })
      .map(|(id, _)| id)
      .collect()
  }
}
