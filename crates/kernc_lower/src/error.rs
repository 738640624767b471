use std::fmt;

use kernc_mir::{BuildError, VerifyError};
use kernc_type::Type;

/// Internal compiler error raised while lowering. Any of these rejects the
/// whole module.
#[derive(Debug, Clone, PartialEq)]
pub enum LowerError {
  UnsupportedType {
    ty: Type,
    reason: &'static str,
  },
  UnsupportedConstant {
    ty: Type,
    value: String,
  },
  /// A variable is not declared in the frame or any enclosing frame.
  UnresolvedVariable {
    name: String,
    frame: Type,
  },
  /// The enclosing-frame link was requested on a root frame.
  MissingOuterFrame {
    frame: Type,
  },
  UnsupportedInstruction {
    opcode: &'static str,
  },
  UnsupportedAlloc {
    ty: Type,
  },
  UnknownAttribute {
    ty: Type,
    attr: String,
  },
  UnsupportedCoercion {
    from: Type,
    to: Type,
  },
  UnknownBuiltin {
    name: String,
  },
  BuiltinArity {
    name: &'static str,
    expected: usize,
    actual: usize,
  },
  /// An operand names an instruction that has not produced a value.
  UndefinedValue {
    instr: u32,
  },
  InvalidOperand {
    context: &'static str,
    detail: String,
  },
  VerificationFailed {
    function: String,
    errors: Vec<VerifyError>,
  },
  /// The machine IR builder refused a request.
  Build(BuildError),
  /// Location of an error raised while lowering one instruction.
  InFunction {
    function: String,
    block: String,
    instruction_index: usize,
    opcode: &'static str,
    source: Box<LowerError>,
  },
}

impl LowerError {
  pub fn invalid_operand(
    context: &'static str,
    detail: impl Into<String>,
  ) -> Self {
    Self::InvalidOperand {
      context,
      detail: detail.into(),
    }
  }

  pub fn in_function(
    self,
    function: &str,
    block: &str,
    instruction_index: usize,
    opcode: &'static str,
  ) -> Self {
    Self::InFunction {
      function: function.to_string(),
      block: block.to_string(),
      instruction_index,
      opcode,
      source: Box::new(self),
    }
  }

  /// The error with any location wrappers removed.
  pub fn root(&self) -> &LowerError {
    match self {
      LowerError::InFunction { source, .. } => source.root(),
      other => other,
    }
  }

  pub fn code(&self) -> &'static str {
    match self {
      LowerError::UnsupportedType { .. } => "LOW0001",
      LowerError::UnsupportedConstant { .. } => "LOW0002",
      LowerError::UnresolvedVariable { .. } => "LOW0003",
      LowerError::MissingOuterFrame { .. } => "LOW0004",
      LowerError::UnsupportedInstruction { .. } => "LOW0005",
      LowerError::UnsupportedAlloc { .. } => "LOW0006",
      LowerError::UnknownAttribute { .. } => "LOW0007",
      LowerError::UnsupportedCoercion { .. } => "LOW0008",
      LowerError::UnknownBuiltin { .. } => "LOW0009",
      LowerError::BuiltinArity { .. } => "LOW0010",
      LowerError::UndefinedValue { .. } => "LOW0011",
      LowerError::InvalidOperand { .. } => "LOW0012",
      LowerError::VerificationFailed { .. } => "LOW0013",
      LowerError::Build(_) => "LOW0014",
      LowerError::InFunction { source, .. } => source.code(),
    }
  }
}

impl fmt::Display for LowerError {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    if !matches!(self, LowerError::InFunction { .. }) {
      write!(f, "{} ", self.code())?;
    }

    match self {
      LowerError::UnsupportedType { ty, reason } => write!(f, "Unsupported type {}: {}", ty, reason),
      LowerError::UnsupportedConstant { ty, value } => {
        write!(f, "Cannot materialize constant {} of type {}", value, ty)
      },
      LowerError::UnresolvedVariable { name, frame } => {
        write!(f, "Variable '{}' is not bound in {} or any enclosing frame", name, frame)
      },
      LowerError::MissingOuterFrame { frame } => write!(f, "Frame {} has no enclosing frame", frame),
      LowerError::UnsupportedInstruction { opcode } => {
        write!(f, "Instruction '{}' has no machine lowering", opcode)
      },
      LowerError::UnsupportedAlloc { ty } => write!(f, "Cannot allocate a value of mutable type {}", ty),
      LowerError::UnknownAttribute { ty, attr } => write!(f, "Type {} has no attribute '{}'", ty, attr),
      LowerError::UnsupportedCoercion { from, to } => write!(f, "Cannot coerce {} to {}", from, to),
      LowerError::UnknownBuiltin { name } => write!(f, "Unknown builtin '{}'", name),
      LowerError::BuiltinArity { name, expected, actual } => {
        write!(f, "Builtin '{}' takes {} operands, got {}", name, expected, actual)
      },
      LowerError::UndefinedValue { instr } => {
        write!(f, "Instruction %{} is used before it produced a value", instr)
      },
      LowerError::InvalidOperand { context, detail } => write!(f, "Invalid operand in {}: {}", context, detail),
      LowerError::VerificationFailed { function, errors } => {
        write!(f, "Lowered function '{}' failed verification", function)?;
        for error in errors {
          write!(f, "\n  {}", error)?;
        }
        Ok(())
      },
      LowerError::Build(error) => write!(f, "{}", error),
      LowerError::InFunction {
        function,
        block,
        instruction_index,
        opcode,
        source,
      } => write!(
        f,
        "{} (function={}, block={}, instr={} '{}')",
        source, function, block, instruction_index, opcode
      ),
    }
  }
}

impl std::error::Error for LowerError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      LowerError::Build(error) => Some(error),
      LowerError::InFunction { source, .. } => Some(source.as_ref()),
      _ => None,
    }
  }
}

impl From<BuildError> for LowerError {
  fn from(error: BuildError) -> Self {
    LowerError::Build(error)
  }
}
