use kernc_type::{Literal, Type};
use serde::{Deserialize, Serialize};

use crate::InstrId;

/// A use of a value: another instruction's result, a function argument, or
/// an embedded constant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "of", rename_all = "snake_case")]
pub enum Operand {
  Instr(InstrId),
  Argument(u32),
  Const(Constant),
}

/// An immutable literal tagged with its type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Constant {
  pub ty: Type,
  pub value: Literal,
}

impl Constant {
  pub fn new(
    ty: Type,
    value: Literal,
  ) -> Self {
    Self { ty, value }
  }

  pub fn none() -> Self {
    Self::new(Type::None, Literal::None)
  }

  pub fn bool(value: bool) -> Self {
    Self::new(Type::Bool, Literal::Bool(value))
  }

  pub fn int(
    width: u32,
    value: i64,
  ) -> Self {
    Self::new(Type::Int(width), Literal::Int(value))
  }

  pub fn float(value: f64) -> Self {
    Self::new(Type::Float, Literal::float(value))
  }
}

impl Operand {
  pub fn none() -> Self {
    Operand::Const(Constant::none())
  }

  pub fn bool(value: bool) -> Self {
    Operand::Const(Constant::bool(value))
  }

  pub fn int(
    width: u32,
    value: i64,
  ) -> Self {
    Operand::Const(Constant::int(width, value))
  }

  pub fn i32(value: i64) -> Self {
    Self::int(32, value)
  }

  pub fn float(value: f64) -> Self {
    Operand::Const(Constant::float(value))
  }
}

impl From<InstrId> for Operand {
  fn from(id: InstrId) -> Self {
    Operand::Instr(id)
  }
}

impl From<Constant> for Operand {
  fn from(constant: Constant) -> Self {
    Operand::Const(constant)
  }
}
