use kernc_type::Type;
use serde::{Deserialize, Serialize};

use crate::{BlockId, Operand};

/// A single kernel IR instruction. Its result is the SSA value named by its id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instruction {
  /// Diagnostic name; carries over to the lowered value.
  #[serde(default)]
  pub name: Option<String>,
  /// Result type. `None` for instructions executed only for effect.
  pub ty: Type,
  pub kind: InstrKind,
}

impl Instruction {
  pub fn new(
    ty: Type,
    kind: InstrKind,
  ) -> Self {
    Self { name: None, ty, kind }
  }

  pub fn named(
    mut self,
    name: impl Into<String>,
  ) -> Self {
    self.name = Some(name.into());
    self
  }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArithOp {
  #[serde(rename = "+")]
  Add,
  #[serde(rename = "-")]
  Sub,
  #[serde(rename = "*")]
  Mul,
  #[serde(rename = "/")]
  Div,
  #[serde(rename = "//")]
  FloorDiv,
  #[serde(rename = "%")]
  Mod,
  #[serde(rename = "**")]
  Pow,
  #[serde(rename = "<<")]
  LShift,
  #[serde(rename = ">>")]
  RShift,
  #[serde(rename = "&")]
  BitAnd,
  #[serde(rename = "|")]
  BitOr,
  #[serde(rename = "^")]
  BitXor,
}

impl ArithOp {
  pub fn symbol(&self) -> &'static str {
    match self {
      ArithOp::Add => "+",
      ArithOp::Sub => "-",
      ArithOp::Mul => "*",
      ArithOp::Div => "/",
      ArithOp::FloorDiv => "//",
      ArithOp::Mod => "%",
      ArithOp::Pow => "**",
      ArithOp::LShift => "<<",
      ArithOp::RShift => ">>",
      ArithOp::BitAnd => "&",
      ArithOp::BitOr => "|",
      ArithOp::BitXor => "^",
    }
  }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompareOp {
  #[serde(rename = "==")]
  Eq,
  #[serde(rename = "!=")]
  NotEq,
  #[serde(rename = ">")]
  Gt,
  #[serde(rename = ">=")]
  GtE,
  #[serde(rename = "<")]
  Lt,
  #[serde(rename = "<=")]
  LtE,
}

impl CompareOp {
  pub const ALL: [CompareOp; 6] = [
    CompareOp::Eq,
    CompareOp::NotEq,
    CompareOp::Gt,
    CompareOp::GtE,
    CompareOp::Lt,
    CompareOp::LtE,
  ];

  pub fn symbol(&self) -> &'static str {
    match self {
      CompareOp::Eq => "==",
      CompareOp::NotEq => "!=",
      CompareOp::Gt => ">",
      CompareOp::GtE => ">=",
      CompareOp::Lt => "<",
      CompareOp::LtE => "<=",
    }
  }
}

/// Operation kinds. The final group is representable so that front ends can
/// hand it over, but the lowering pass has no machine form for it yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum InstrKind {
  /// Merge of values flowing in from predecessor blocks.
  Phi { incoming: Vec<(Operand, BlockId)> },

  /// Allocation of the instruction's type. Lists take a single length operand;
  /// immutable aggregates take one operand per field.
  Alloc { operands: Vec<Operand> },

  GetLocal { env: Operand, var: String },
  SetLocal { env: Operand, var: String, value: Operand },

  GetAttr { object: Operand, attr: String },
  SetAttr { object: Operand, attr: String, value: Operand },

  GetElem { list: Operand, index: Operand },
  SetElem { list: Operand, index: Operand, value: Operand },

  /// Numeric conversion of `value` to the instruction's type.
  Coerce { value: Operand },

  Arith { operator: ArithOp, lhs: Operand, rhs: Operand },
  Compare { operator: CompareOp, lhs: Operand, rhs: Operand },

  /// Named primitive (`nop`, `unwrap`, `round`, `globalenv`, `len`).
  Builtin { builtin: String, operands: Vec<Operand> },

  Select { cond: Operand, if_true: Operand, if_false: Operand },

  Branch { target: BlockId },
  BranchIf { cond: Operand, if_true: BlockId, if_false: BlockId },
  Return { value: Option<Operand> },
  Unreachable,
  Raise { value: Option<Operand> },

  Closure { target: String, env: Operand },
  Call { callee: Operand, args: Vec<Operand> },
  IndirectBranch { address: Operand, destinations: Vec<BlockId> },
  Invoke { callee: Operand, args: Vec<Operand>, normal: BlockId, unwind: BlockId },
  LandingPad,
}

impl InstrKind {
  /// Lowercase opcode used in dumps and diagnostics.
  pub fn opcode(&self) -> &'static str {
    match self {
      InstrKind::Phi { .. } => "phi",
      InstrKind::Alloc { .. } => "alloc",
      InstrKind::GetLocal { .. } => "getlocal",
      InstrKind::SetLocal { .. } => "setlocal",
      InstrKind::GetAttr { .. } => "getattr",
      InstrKind::SetAttr { .. } => "setattr",
      InstrKind::GetElem { .. } => "getelem",
      InstrKind::SetElem { .. } => "setelem",
      InstrKind::Coerce { .. } => "coerce",
      InstrKind::Arith { .. } => "arith",
      InstrKind::Compare { .. } => "compare",
      InstrKind::Builtin { .. } => "builtin",
      InstrKind::Select { .. } => "select",
      InstrKind::Branch { .. } => "branch",
      InstrKind::BranchIf { .. } => "branch_if",
      InstrKind::Return { .. } => "return",
      InstrKind::Unreachable => "unreachable",
      InstrKind::Raise { .. } => "raise",
      InstrKind::Closure { .. } => "closure",
      InstrKind::Call { .. } => "call",
      InstrKind::IndirectBranch { .. } => "indirect_branch",
      InstrKind::Invoke { .. } => "invoke",
      InstrKind::LandingPad => "landing_pad",
    }
  }

  pub fn is_terminator(&self) -> bool {
    matches!(
      self,
      InstrKind::Branch { .. }
        | InstrKind::BranchIf { .. }
        | InstrKind::Return { .. }
        | InstrKind::Unreachable
        | InstrKind::Raise { .. }
        | InstrKind::IndirectBranch { .. }
        | InstrKind::Invoke { .. }
    )
  }

  /// Blocks control may continue to after this instruction.
  pub fn successors(&self) -> Vec<BlockId> {
    match self {
      InstrKind::Branch { target } => vec![*target],
      InstrKind::BranchIf { if_true, if_false, .. } => vec![*if_true, *if_false],
      InstrKind::IndirectBranch { destinations, .. } => destinations.clone(),
      InstrKind::Invoke { normal, unwind, .. } => vec![*normal, *unwind],
      _ => Vec::new(),
    }
  }

  /// Value operands in source order; block references are not included.
  pub fn operands(&self) -> Vec<&Operand> {
    match self {
      InstrKind::Phi { incoming } => incoming.iter().map(|(value, _)| value).collect(),
      InstrKind::Alloc { operands } | InstrKind::Builtin { operands, .. } => operands.iter().collect(),
      InstrKind::GetLocal { env, .. } => vec![env],
      InstrKind::SetLocal { env, value, .. } => vec![env, value],
      InstrKind::GetAttr { object, .. } => vec![object],
      InstrKind::SetAttr { object, value, .. } => vec![object, value],
      InstrKind::GetElem { list, index } => vec![list, index],
      InstrKind::SetElem { list, index, value } => vec![list, index, value],
      InstrKind::Coerce { value } => vec![value],
      InstrKind::Arith { lhs, rhs, .. } | InstrKind::Compare { lhs, rhs, .. } => vec![lhs, rhs],
      InstrKind::Select {
        cond,
        if_true,
        if_false,
      } => vec![cond, if_true, if_false],
      InstrKind::BranchIf { cond, .. } => vec![cond],
      InstrKind::Return { value } | InstrKind::Raise { value } => value.iter().collect(),
      InstrKind::Closure { env, .. } => vec![env],
      InstrKind::Call { callee, args } | InstrKind::Invoke { callee, args, .. } => {
        std::iter::once(callee).chain(args.iter()).collect()
      },
      InstrKind::IndirectBranch { address, .. } => vec![address],
      InstrKind::Branch { .. } | InstrKind::Unreachable | InstrKind::LandingPad => Vec::new(),
    }
  }
}
