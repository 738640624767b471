use ordered_float::OrderedFloat;

use crate::{MirType, ValueId};

/// Metadata for an SSA value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueData {
  pub ty: MirType,
  /// Printed as `%name`; unnamed values print as `%<index>`.
  pub name: Option<String>,
}

/// An operand: a value that can be used in an instruction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Operand {
  Value(ValueId),
  Const(MirConst),
}

/// Compile-time constant values.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MirConst {
  /// `value` holds the constant sign-extended from `bits`.
  Int { bits: u32, value: i64 },
  Double(OrderedFloat<f64>),
  Struct(Vec<MirConst>),
  Undef(MirType),
}

impl MirConst {
  pub fn int(
    bits: u32,
    value: i64,
  ) -> Self {
    MirConst::Int {
      bits,
      value: sign_extend(value, bits),
    }
  }

  pub fn bool(value: bool) -> Self {
    MirConst::Int {
      bits: 1,
      value: value as i64,
    }
  }

  pub fn i32(value: i64) -> Self {
    Self::int(32, value)
  }

  pub fn double(value: f64) -> Self {
    MirConst::Double(OrderedFloat(value))
  }

  pub fn unit() -> Self {
    MirConst::Struct(Vec::new())
  }

  pub fn ty(&self) -> MirType {
    match self {
      MirConst::Int { bits, .. } => MirType::Int(*bits),
      MirConst::Double(_) => MirType::Double,
      MirConst::Struct(fields) => MirType::Struct(fields.iter().map(|field| field.ty()).collect()),
      MirConst::Undef(ty) => ty.clone(),
    }
  }
}

/// Normalize `value` to the canonical form for an integer of `bits` width:
/// `i1` keeps 0/1, wider integers are sign-extended from their top bit.
pub fn sign_extend(
  value: i64,
  bits: u32,
) -> i64 {
  match bits {
    0 => 0,
    1 => value & 1,
    _ if bits >= 64 => value,
    _ => {
      let shift = 64 - bits;
      (value << shift) >> shift
    },
  }
}

impl From<ValueId> for Operand {
  fn from(id: ValueId) -> Self {
    Operand::Value(id)
  }
}

impl From<MirConst> for Operand {
  fn from(constant: MirConst) -> Self {
    Operand::Const(constant)
  }
}
