use crate::{BlockId, MirType, Operand, ValueId};

/// Two-operand arithmetic and bitwise operations.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum BinOp {
  Add,
  Sub,
  Mul,
  SDiv,
  SRem,
  Shl,
  AShr,
  And,
  Or,
  Xor,
  FAdd,
  FSub,
  FMul,
  FDiv,
  FRem,
}

impl BinOp {
  pub fn mnemonic(&self) -> &'static str {
    match self {
      BinOp::Add => "add",
      BinOp::Sub => "sub",
      BinOp::Mul => "mul",
      BinOp::SDiv => "sdiv",
      BinOp::SRem => "srem",
      BinOp::Shl => "shl",
      BinOp::AShr => "ashr",
      BinOp::And => "and",
      BinOp::Or => "or",
      BinOp::Xor => "xor",
      BinOp::FAdd => "fadd",
      BinOp::FSub => "fsub",
      BinOp::FMul => "fmul",
      BinOp::FDiv => "fdiv",
      BinOp::FRem => "frem",
    }
  }

  pub fn is_float(&self) -> bool {
    matches!(self, BinOp::FAdd | BinOp::FSub | BinOp::FMul | BinOp::FDiv | BinOp::FRem)
  }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum CastOp {
  /// Float to signed integer, rounding toward zero.
  FpToSi,
  /// Signed integer to float.
  SiToFp,
  SExt,
  Trunc,
}

impl CastOp {
  pub fn mnemonic(&self) -> &'static str {
    match self {
      CastOp::FpToSi => "fptosi",
      CastOp::SiToFp => "sitofp",
      CastOp::SExt => "sext",
      CastOp::Trunc => "trunc",
    }
  }
}

/// Signed integer comparisons.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum IntPredicate {
  Eq,
  Ne,
  Sgt,
  Sge,
  Slt,
  Sle,
}

impl IntPredicate {
  pub fn mnemonic(&self) -> &'static str {
    match self {
      IntPredicate::Eq => "eq",
      IntPredicate::Ne => "ne",
      IntPredicate::Sgt => "sgt",
      IntPredicate::Sge => "sge",
      IntPredicate::Slt => "slt",
      IntPredicate::Sle => "sle",
    }
  }
}

/// Ordered float comparisons: false whenever either operand is NaN.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum FloatPredicate {
  Oeq,
  One,
  Ogt,
  Oge,
  Olt,
  Ole,
}

impl FloatPredicate {
  pub fn mnemonic(&self) -> &'static str {
    match self {
      FloatPredicate::Oeq => "oeq",
      FloatPredicate::One => "one",
      FloatPredicate::Ogt => "ogt",
      FloatPredicate::Oge => "oge",
      FloatPredicate::Olt => "olt",
      FloatPredicate::Ole => "ole",
    }
  }
}

/// A machine IR instruction. Every variant with a `dest` defines that value.
#[derive(Debug, Clone, PartialEq)]
pub enum Instr {
  /// `dest = phi [value, block]...`; incoming edges are filled in after all
  /// blocks of the function are built.
  Phi {
    dest: ValueId,
    incoming: Vec<(Operand, BlockId)>,
  },

  /// Reserve `count` (default one) slots of `ty` in the current activation.
  Alloca {
    dest: ValueId,
    ty: MirType,
    count: Option<Operand>,
  },

  Load { dest: ValueId, ptr: Operand },

  Store { ptr: Operand, value: Operand },

  /// Address of field `index` of the struct `base` points to (`gep 0, index`).
  FieldPtr { dest: ValueId, base: Operand, index: u32 },

  /// Address `index` elements past `base` (`gep inbounds index`).
  ElemPtr {
    dest: ValueId,
    base: Operand,
    index: Operand,
  },

  ExtractValue {
    dest: ValueId,
    aggregate: Operand,
    index: u32,
  },

  InsertValue {
    dest: ValueId,
    aggregate: Operand,
    value: Operand,
    index: u32,
  },

  Binary {
    dest: ValueId,
    op: BinOp,
    lhs: Operand,
    rhs: Operand,
  },

  Cast {
    dest: ValueId,
    op: CastOp,
    value: Operand,
    ty: MirType,
  },

  ICmp {
    dest: ValueId,
    pred: IntPredicate,
    lhs: Operand,
    rhs: Operand,
  },

  FCmp {
    dest: ValueId,
    pred: FloatPredicate,
    lhs: Operand,
    rhs: Operand,
  },

  /// Direct call of a module function or intrinsic by symbol name.
  Call {
    dest: Option<ValueId>,
    callee: String,
    args: Vec<Operand>,
  },

  Select {
    dest: ValueId,
    cond: Operand,
    if_true: Operand,
    if_false: Operand,
  },
}

impl Instr {
  /// Value defined by this instruction, if any.
  pub fn dest(&self) -> Option<ValueId> {
    match self {
      Instr::Phi { dest, .. }
      | Instr::Alloca { dest, .. }
      | Instr::Load { dest, .. }
      | Instr::FieldPtr { dest, .. }
      | Instr::ElemPtr { dest, .. }
      | Instr::ExtractValue { dest, .. }
      | Instr::InsertValue { dest, .. }
      | Instr::Binary { dest, .. }
      | Instr::Cast { dest, .. }
      | Instr::ICmp { dest, .. }
      | Instr::FCmp { dest, .. }
      | Instr::Select { dest, .. } => Some(*dest),
      Instr::Call { dest, .. } => *dest,
      Instr::Store { .. } => None,
    }
  }

  /// Operands read by this instruction.
  pub fn operands(&self) -> Vec<&Operand> {
    match self {
      Instr::Phi { incoming, .. } => incoming.iter().map(|(value, _)| value).collect(),
      Instr::Alloca { count, .. } => count.iter().collect(),
      Instr::Load { ptr, .. } => vec![ptr],
      Instr::Store { ptr, value } => vec![ptr, value],
      Instr::FieldPtr { base, .. } => vec![base],
      Instr::ElemPtr { base, index, .. } => vec![base, index],
      Instr::ExtractValue { aggregate, .. } => vec![aggregate],
      Instr::InsertValue { aggregate, value, .. } => vec![aggregate, value],
      Instr::Binary { lhs, rhs, .. } | Instr::ICmp { lhs, rhs, .. } | Instr::FCmp { lhs, rhs, .. } => {
        vec![lhs, rhs]
      },
      Instr::Cast { value, .. } => vec![value],
      Instr::Call { args, .. } => args.iter().collect(),
      Instr::Select {
        cond,
        if_true,
        if_false,
        ..
      } => vec![cond, if_true, if_false],
    }
  }

  pub fn is_phi(&self) -> bool {
    matches!(self, Instr::Phi { .. })
  }
}
