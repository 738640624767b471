use std::fmt;

use crate::MirType;

/// Malformed request to the [`FunctionBuilder`](crate::FunctionBuilder):
/// an operand of the wrong shape for the instruction being built.
#[derive(Debug, Clone, PartialEq)]
pub enum BuildError {
  NotAPointer { context: &'static str, ty: MirType },
  NotAStruct { context: &'static str, ty: MirType },
  FieldOutOfRange { context: &'static str, ty: MirType, index: u32 },
  NotAnInteger { context: &'static str, ty: MirType },
  BlockAlreadyTerminated { block: String },
  NoInsertionPoint,
}

impl fmt::Display for BuildError {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    match self {
      BuildError::NotAPointer { context, ty } => {
        write!(f, "MIR0001 {} expects a pointer operand, got {}", context, ty)
      },
      BuildError::NotAStruct { context, ty } => {
        write!(f, "MIR0002 {} expects a struct operand, got {}", context, ty)
      },
      BuildError::FieldOutOfRange { context, ty, index } => {
        write!(f, "MIR0003 {} field index {} out of range for {}", context, index, ty)
      },
      BuildError::NotAnInteger { context, ty } => {
        write!(f, "MIR0004 {} expects an integer operand, got {}", context, ty)
      },
      BuildError::BlockAlreadyTerminated { block } => {
        write!(f, "MIR0005 block '{}' is already terminated", block)
      },
      BuildError::NoInsertionPoint => write!(f, "MIR0006 no block to insert into"),
    }
  }
}

impl std::error::Error for BuildError {}
