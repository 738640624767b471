//! Reference interpreter for machine IR.
//!
//! Executes lowered functions directly so their behavior can be checked
//! without a native backend. Integers are held as `i64` sign-extended from
//! their width (`i1` as 0/1); memory is a set of regions created by
//! `alloca`, addressed by element index plus a field path.

use std::fmt;

use crate::value::sign_extend;
use crate::{
  BinOp, BlockId, CastOp, FloatPredicate, Instr, IntPredicate, Intrinsic, MirConst, MirFunction, MirModule,
  MirType, Operand, Terminator, ValueId,
};

pub const DEFAULT_STEP_LIMIT: u64 = 1_000_000;

/// Runtime value.
#[derive(Debug, Clone, PartialEq)]
pub enum RtValue {
  Int { bits: u32, value: i64 },
  Double(f64),
  Struct(Vec<RtValue>),
  Ptr(Pointer),
  Undef,
}

/// Address inside the interpreter's memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pointer {
  pub region: usize,
  pub index: i64,
  /// Struct field indices walked from the element at `index`.
  pub path: Vec<u32>,
}

impl RtValue {
  pub fn int(
    bits: u32,
    value: i64,
  ) -> Self {
    RtValue::Int {
      bits,
      value: sign_extend(value, bits),
    }
  }

  pub fn i32(value: i64) -> Self {
    Self::int(32, value)
  }

  pub fn bool(value: bool) -> Self {
    RtValue::Int {
      bits: 1,
      value: value as i64,
    }
  }

  pub fn as_int(&self) -> Option<i64> {
    match self {
      RtValue::Int { value, .. } => Some(*value),
      _ => None,
    }
  }

  pub fn as_bool(&self) -> Option<bool> {
    match self {
      RtValue::Int { bits: 1, value } => Some(*value != 0),
      _ => None,
    }
  }

  pub fn as_double(&self) -> Option<f64> {
    match self {
      RtValue::Double(value) => Some(*value),
      _ => None,
    }
  }

  pub fn fields(&self) -> Option<&[RtValue]> {
    match self {
      RtValue::Struct(fields) => Some(fields),
      _ => None,
    }
  }

  /// Parse a command-line argument as a value of type `ty`.
  pub fn parse(
    ty: &MirType,
    text: &str,
  ) -> Option<RtValue> {
    match ty {
      MirType::Int(1) => match text {
        "true" | "1" => Some(RtValue::bool(true)),
        "false" | "0" => Some(RtValue::bool(false)),
        _ => None,
      },
      MirType::Int(bits) if *bits <= MAX_RUNTIME_BITS => {
        text.parse::<i64>().ok().map(|value| RtValue::int(*bits, value))
      },
      MirType::Double => text.parse::<f64>().ok().map(RtValue::Double),
      MirType::Struct(fields) if fields.is_empty() => Some(RtValue::Struct(Vec::new())),
      _ => None,
    }
  }

  fn undef_of(ty: &MirType) -> RtValue {
    match ty {
      MirType::Struct(fields) => RtValue::Struct(fields.iter().map(RtValue::undef_of).collect()),
      _ => RtValue::Undef,
    }
  }

  fn from_const(constant: &MirConst) -> RtValue {
    match constant {
      MirConst::Int { bits, value } => RtValue::int(*bits, *value),
      MirConst::Double(value) => RtValue::Double(value.0),
      MirConst::Struct(fields) => RtValue::Struct(fields.iter().map(RtValue::from_const).collect()),
      MirConst::Undef(ty) => RtValue::undef_of(ty),
    }
  }
}

impl fmt::Display for RtValue {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    match self {
      RtValue::Int { bits: 1, value } => write!(f, "{}", *value != 0),
      RtValue::Int { value, .. } => write!(f, "{}", value),
      RtValue::Double(value) => write!(f, "{:?}", value),
      RtValue::Struct(fields) => {
        let fields: Vec<_> = fields.iter().map(|field| field.to_string()).collect();
        write!(f, "{{{}}}", fields.join(", "))
      },
      RtValue::Ptr(ptr) => write!(f, "<ptr r{}+{}>", ptr.region, ptr.index),
      RtValue::Undef => write!(f, "undef"),
    }
  }
}

/// Execution failure.
#[derive(Debug, Clone, PartialEq)]
pub enum InterpError {
  UnknownFunction(String),
  ArityMismatch { function: String, expected: usize, actual: usize },
  /// `llvm.trap` was called.
  Trap,
  /// Control reached an `unreachable` terminator.
  Unreachable { function: String, block: String },
  DivisionByZero,
  /// A value was read before any instruction defined it.
  UndefinedValue { function: String, value: ValueId },
  /// An `undef` took part in a computation.
  UseOfUndef { context: &'static str },
  MissingIncoming { function: String, block: String },
  OutOfBounds,
  TypeMismatch { context: &'static str, value: String },
  MissingTerminator { function: String, block: String },
  StepLimit(u64),
  /// Integers wider than 64 bits have no runtime representation.
  UnsupportedWidth(u32),
}

impl fmt::Display for InterpError {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    match self {
      InterpError::UnknownFunction(name) => write!(f, "RUN0001 unknown function '@{}'", name),
      InterpError::ArityMismatch {
        function,
        expected,
        actual,
      } => write!(f, "RUN0002 '@{}' takes {} arguments, {} given", function, expected, actual),
      InterpError::Trap => write!(f, "RUN0003 trap"),
      InterpError::Unreachable { function, block } => {
        write!(f, "RUN0004 reached 'unreachable' in {}:{}", function, block)
      },
      InterpError::DivisionByZero => write!(f, "RUN0005 integer division by zero"),
      InterpError::UndefinedValue { function, value } => {
        write!(f, "RUN0006 value #{} of '@{}' read before definition", value.index(), function)
      },
      InterpError::UseOfUndef { context } => write!(f, "RUN0007 undef used by {}", context),
      InterpError::MissingIncoming { function, block } => {
        write!(f, "RUN0008 phi in {}:{} has no edge from the previous block", function, block)
      },
      InterpError::OutOfBounds => write!(f, "RUN0009 memory access out of bounds"),
      InterpError::TypeMismatch { context, value } => {
        write!(f, "RUN0010 {} cannot operate on {}", context, value)
      },
      InterpError::MissingTerminator { function, block } => {
        write!(f, "RUN0011 block {}:{} has no terminator", function, block)
      },
      InterpError::StepLimit(limit) => write!(f, "RUN0012 step limit of {} exceeded", limit),
      InterpError::UnsupportedWidth(bits) => write!(f, "RUN0013 i{} is wider than 64 bits", bits),
    }
  }
}

impl std::error::Error for InterpError {}

type InterpResult<T> = Result<T, InterpError>;

/// Runtime integers are held in an `i64`.
const MAX_RUNTIME_BITS: u32 = 64;

/// Interpreter over one module. Memory persists across calls.
pub struct Interpreter<'a> {
  module: &'a MirModule,
  memory: Vec<Vec<RtValue>>,
  steps: u64,
  step_limit: u64,
}

struct Frame<'f> {
  func: &'f MirFunction,
  values: Vec<Option<RtValue>>,
}

impl<'f> Frame<'f> {
  fn read(
    &self,
    operand: &Operand,
  ) -> InterpResult<RtValue> {
    match operand {
      Operand::Const(constant) => Ok(RtValue::from_const(constant)),
      Operand::Value(id) => self
        .values
        .get(id.index() as usize)
        .and_then(|slot| slot.clone())
        .ok_or_else(|| InterpError::UndefinedValue {
          function: self.func.name.clone(),
          value: *id,
        }),
    }
  }

  fn write(
    &mut self,
    dest: ValueId,
    value: RtValue,
  ) {
    let index = dest.index() as usize;
    if index >= self.values.len() {
      self.values.resize(index + 1, None);
    }
    self.values[index] = Some(value);
  }
}

impl<'a> Interpreter<'a> {
  pub fn new(module: &'a MirModule) -> Self {
    Self {
      module,
      memory: Vec::new(),
      steps: 0,
      step_limit: DEFAULT_STEP_LIMIT,
    }
  }

  pub fn with_step_limit(
    mut self,
    limit: u64,
  ) -> Self {
    self.step_limit = limit;
    self
  }

  /// Instructions executed so far.
  pub fn steps(&self) -> u64 {
    self.steps
  }

  /// Call `name` with `args`. Void functions return `None`.
  pub fn call(
    &mut self,
    name: &str,
    args: Vec<RtValue>,
  ) -> InterpResult<Option<RtValue>> {
    if let Some(intrinsic) = Intrinsic::from_name(name) {
      return call_intrinsic(intrinsic, &args);
    }

    let module = self.module;
    let func = module
      .function(name)
      .ok_or_else(|| InterpError::UnknownFunction(name.to_string()))?;

    if func.params.len() != args.len() {
      return Err(InterpError::ArityMismatch {
        function: name.to_string(),
        expected: func.params.len(),
        actual: args.len(),
      });
    }

    let mut frame = Frame {
      func,
      values: vec![None; func.values.len()],
    };
    for (param, arg) in func.params.iter().zip(args) {
      frame.write(*param, arg);
    }

    self.run(&mut frame)
  }

  fn run(
    &mut self,
    frame: &mut Frame<'a>,
  ) -> InterpResult<Option<RtValue>> {
    let func = frame.func;
    let mut previous: Option<BlockId> = None;
    let mut current = func.entry;

    loop {
      let block = func.blocks.try_get(&current).ok_or_else(|| InterpError::MissingTerminator {
        function: func.name.clone(),
        block: format!("#{}", current.index()),
      })?;

      // Phis read their inputs simultaneously on block entry.
      let mut phi_values = Vec::new();
      for instr in block.instructions.iter().take_while(|instr| instr.is_phi()) {
        let Instr::Phi { dest, incoming } = instr else {
          continue;
        };
        let edge = previous.and_then(|pred| incoming.iter().find(|(_, from)| *from == pred));
        let Some((value, _)) = edge else {
          return Err(InterpError::MissingIncoming {
            function: func.name.clone(),
            block: block.label.clone(),
          });
        };
        phi_values.push((*dest, frame.read(value)?));
      }
      for (dest, value) in phi_values {
        frame.write(dest, value);
      }

      for instr in block.instructions.iter().filter(|instr| !instr.is_phi()) {
        self.tick()?;
        self.exec(frame, instr)?;
      }

      self.tick()?;
      let term = block.terminator.as_ref().ok_or_else(|| InterpError::MissingTerminator {
        function: func.name.clone(),
        block: block.label.clone(),
      })?;

      let next = match term {
        Terminator::Br(target) => *target,
        Terminator::CondBr {
          cond,
          then_block,
          else_block,
        } => match frame.read(cond)?.as_bool() {
          Some(true) => *then_block,
          Some(false) => *else_block,
          None => return Err(InterpError::UseOfUndef { context: "br" }),
        },
        Terminator::Ret(value) => {
          return value.as_ref().map(|value| frame.read(value)).transpose();
        },
        Terminator::Unreachable => {
          return Err(InterpError::Unreachable {
            function: func.name.clone(),
            block: block.label.clone(),
          });
        },
      };

      previous = Some(current);
      current = next;
    }
  }

  fn tick(&mut self) -> InterpResult<()> {
    self.steps += 1;
    if self.steps > self.step_limit {
      return Err(InterpError::StepLimit(self.step_limit));
    }
    Ok(())
  }

  fn exec(
    &mut self,
    frame: &mut Frame<'a>,
    instr: &Instr,
  ) -> InterpResult<()> {
    match instr {
      Instr::Phi { .. } => {},
      Instr::Alloca { dest, ty, count } => {
        let count = match count {
          Some(count) => frame
            .read(count)?
            .as_int()
            .ok_or(InterpError::UseOfUndef { context: "alloca" })?,
          None => 1,
        };
        let len = usize::try_from(count).map_err(|_| InterpError::OutOfBounds)?;
        self.memory.push(vec![RtValue::undef_of(ty); len]);
        let pointer = Pointer {
          region: self.memory.len() - 1,
          index: 0,
          path: Vec::new(),
        };
        frame.write(*dest, RtValue::Ptr(pointer));
      },
      Instr::Load { dest, ptr } => {
        let pointer = as_pointer(frame.read(ptr)?, "load")?;
        let value = self.slot(&pointer)?.clone();
        frame.write(*dest, value);
      },
      Instr::Store { ptr, value } => {
        let pointer = as_pointer(frame.read(ptr)?, "store")?;
        let value = frame.read(value)?;
        *self.slot_mut(&pointer)? = value;
      },
      Instr::FieldPtr { dest, base, index } => {
        let mut pointer = as_pointer(frame.read(base)?, "getelementptr")?;
        pointer.path.push(*index);
        frame.write(*dest, RtValue::Ptr(pointer));
      },
      Instr::ElemPtr { dest, base, index } => {
        let mut pointer = as_pointer(frame.read(base)?, "getelementptr")?;
        if !pointer.path.is_empty() {
          return Err(InterpError::TypeMismatch {
            context: "getelementptr",
            value: "a field pointer".to_string(),
          });
        }
        let offset = frame
          .read(index)?
          .as_int()
          .ok_or(InterpError::UseOfUndef { context: "getelementptr" })?;
        pointer.index += offset;
        frame.write(*dest, RtValue::Ptr(pointer));
      },
      Instr::ExtractValue { dest, aggregate, index } => {
        let value = match frame.read(aggregate)? {
          RtValue::Struct(mut fields) if (*index as usize) < fields.len() => fields.swap_remove(*index as usize),
          other => {
            return Err(InterpError::TypeMismatch {
              context: "extractvalue",
              value: other.to_string(),
            });
          },
        };
        frame.write(*dest, value);
      },
      Instr::InsertValue {
        dest,
        aggregate,
        value,
        index,
      } => {
        let inserted = frame.read(value)?;
        let result = match frame.read(aggregate)? {
          RtValue::Struct(mut fields) if (*index as usize) < fields.len() => {
            fields[*index as usize] = inserted;
            RtValue::Struct(fields)
          },
          other => {
            return Err(InterpError::TypeMismatch {
              context: "insertvalue",
              value: other.to_string(),
            });
          },
        };
        frame.write(*dest, result);
      },
      Instr::Binary { dest, op, lhs, rhs } => {
        let result = binary(*op, frame.read(lhs)?, frame.read(rhs)?)?;
        frame.write(*dest, result);
      },
      Instr::Cast { dest, op, value, ty } => {
        let result = cast(*op, frame.read(value)?, ty)?;
        frame.write(*dest, result);
      },
      Instr::ICmp { dest, pred, lhs, rhs } => {
        let (lhs, rhs) = (frame.read(lhs)?, frame.read(rhs)?);
        let (RtValue::Int { bits, value: a }, RtValue::Int { value: b, .. }) = (&lhs, &rhs) else {
          return Err(InterpError::TypeMismatch {
            context: "icmp",
            value: lhs.to_string(),
          });
        };
        let (a, b) = (signed(*bits, *a), signed(*bits, *b));
        let result = match pred {
          IntPredicate::Eq => a == b,
          IntPredicate::Ne => a != b,
          IntPredicate::Sgt => a > b,
          IntPredicate::Sge => a >= b,
          IntPredicate::Slt => a < b,
          IntPredicate::Sle => a <= b,
        };
        frame.write(*dest, RtValue::bool(result));
      },
      Instr::FCmp { dest, pred, lhs, rhs } => {
        let (lhs, rhs) = (frame.read(lhs)?, frame.read(rhs)?);
        let (Some(a), Some(b)) = (lhs.as_double(), rhs.as_double()) else {
          return Err(InterpError::TypeMismatch {
            context: "fcmp",
            value: lhs.to_string(),
          });
        };
        let ordered = !a.is_nan() && !b.is_nan();
        let result = ordered
          && match pred {
            FloatPredicate::Oeq => a == b,
            FloatPredicate::One => a != b,
            FloatPredicate::Ogt => a > b,
            FloatPredicate::Oge => a >= b,
            FloatPredicate::Olt => a < b,
            FloatPredicate::Ole => a <= b,
          };
        frame.write(*dest, RtValue::bool(result));
      },
      Instr::Call { dest, callee, args } => {
        let args = args.iter().map(|arg| frame.read(arg)).collect::<InterpResult<Vec<_>>>()?;
        let result = self.call(callee, args)?;
        if let (Some(dest), Some(result)) = (dest, result) {
          frame.write(*dest, result);
        }
      },
      Instr::Select {
        dest,
        cond,
        if_true,
        if_false,
      } => {
        let chosen = match frame.read(cond)?.as_bool() {
          Some(true) => frame.read(if_true)?,
          Some(false) => frame.read(if_false)?,
          None => return Err(InterpError::UseOfUndef { context: "select" }),
        };
        frame.write(*dest, chosen);
      },
    }
    Ok(())
  }

  fn slot(
    &self,
    pointer: &Pointer,
  ) -> InterpResult<&RtValue> {
    let region = self.memory.get(pointer.region).ok_or(InterpError::OutOfBounds)?;
    let index = usize::try_from(pointer.index).map_err(|_| InterpError::OutOfBounds)?;
    let mut slot = region.get(index).ok_or(InterpError::OutOfBounds)?;
    for field in &pointer.path {
      slot = match slot {
        RtValue::Struct(fields) => fields.get(*field as usize).ok_or(InterpError::OutOfBounds)?,
        _ => return Err(InterpError::OutOfBounds),
      };
    }
    Ok(slot)
  }

  fn slot_mut(
    &mut self,
    pointer: &Pointer,
  ) -> InterpResult<&mut RtValue> {
    let region = self.memory.get_mut(pointer.region).ok_or(InterpError::OutOfBounds)?;
    let index = usize::try_from(pointer.index).map_err(|_| InterpError::OutOfBounds)?;
    let mut slot = region.get_mut(index).ok_or(InterpError::OutOfBounds)?;
    for field in &pointer.path {
      slot = match slot {
        RtValue::Struct(fields) => fields.get_mut(*field as usize).ok_or(InterpError::OutOfBounds)?,
        _ => return Err(InterpError::OutOfBounds),
      };
    }
    Ok(slot)
  }
}

fn as_pointer(
  value: RtValue,
  context: &'static str,
) -> InterpResult<Pointer> {
  match value {
    RtValue::Ptr(pointer) => Ok(pointer),
    RtValue::Undef => Err(InterpError::UseOfUndef { context }),
    other => Err(InterpError::TypeMismatch {
      context,
      value: other.to_string(),
    }),
  }
}

/// Signed reading of a canonical integer; `i1` true is -1.
fn signed(
  bits: u32,
  value: i64,
) -> i64 {
  if bits == 1 { -value } else { value }
}

fn binary(
  op: BinOp,
  lhs: RtValue,
  rhs: RtValue,
) -> InterpResult<RtValue> {
  if op.is_float() {
    let (Some(a), Some(b)) = (lhs.as_double(), rhs.as_double()) else {
      return Err(InterpError::TypeMismatch {
        context: op.mnemonic(),
        value: lhs.to_string(),
      });
    };
    let result = match op {
      BinOp::FAdd => a + b,
      BinOp::FSub => a - b,
      BinOp::FMul => a * b,
      BinOp::FDiv => a / b,
      _ => a % b,
    };
    return Ok(RtValue::Double(result));
  }

  let (RtValue::Int { bits, value: a }, RtValue::Int { value: b, .. }) = (&lhs, &rhs) else {
    return match (&lhs, &rhs) {
      (RtValue::Undef, _) | (_, RtValue::Undef) => Err(InterpError::UseOfUndef { context: op.mnemonic() }),
      _ => Err(InterpError::TypeMismatch {
        context: op.mnemonic(),
        value: lhs.to_string(),
      }),
    };
  };
  let (bits, a, b) = (*bits, *a, *b);
  if bits > MAX_RUNTIME_BITS {
    return Err(InterpError::UnsupportedWidth(bits));
  }

  let result = match op {
    BinOp::Add => a.wrapping_add(b),
    BinOp::Sub => a.wrapping_sub(b),
    BinOp::Mul => a.wrapping_mul(b),
    BinOp::SDiv | BinOp::SRem if b == 0 => return Err(InterpError::DivisionByZero),
    BinOp::SDiv => a.wrapping_div(b),
    BinOp::SRem => a.wrapping_rem(b),
    BinOp::Shl => a.wrapping_shl(b as u32),
    BinOp::AShr => a.wrapping_shr(b as u32),
    BinOp::And => a & b,
    BinOp::Or => a | b,
    BinOp::Xor => a ^ b,
    BinOp::FAdd | BinOp::FSub | BinOp::FMul | BinOp::FDiv | BinOp::FRem => {
      return Err(InterpError::TypeMismatch {
        context: op.mnemonic(),
        value: lhs.to_string(),
      });
    },
  };
  Ok(RtValue::int(bits, result))
}

fn cast(
  op: CastOp,
  value: RtValue,
  ty: &MirType,
) -> InterpResult<RtValue> {
  let target_bits = ty.int_bits();
  if let Some(bits) = target_bits.filter(|bits| *bits > MAX_RUNTIME_BITS) {
    return Err(InterpError::UnsupportedWidth(bits));
  }
  match (op, &value, target_bits) {
    (CastOp::FpToSi, RtValue::Double(value), Some(bits)) => Ok(RtValue::int(bits, *value as i64)),
    (CastOp::SiToFp, RtValue::Int { bits, value }, None) => Ok(RtValue::Double(signed(*bits, *value) as f64)),
    (CastOp::SExt, RtValue::Int { bits, value }, Some(to)) => Ok(RtValue::int(to, signed(*bits, *value))),
    (CastOp::Trunc, RtValue::Int { value, .. }, Some(to)) => Ok(RtValue::int(to, *value)),
    (_, RtValue::Undef, _) => Err(InterpError::UseOfUndef { context: op.mnemonic() }),
    _ => Err(InterpError::TypeMismatch {
      context: op.mnemonic(),
      value: value.to_string(),
    }),
  }
}

fn call_intrinsic(
  intrinsic: Intrinsic,
  args: &[RtValue],
) -> InterpResult<Option<RtValue>> {
  let double = |index: usize| {
    args
      .get(index)
      .and_then(RtValue::as_double)
      .ok_or(InterpError::TypeMismatch {
        context: intrinsic.name(),
        value: format!("argument {}", index),
      })
  };

  match intrinsic {
    Intrinsic::Round => Ok(Some(RtValue::Double(double(0)?.round()))),
    Intrinsic::Pow => Ok(Some(RtValue::Double(double(0)?.powf(double(1)?)))),
    Intrinsic::Powi => {
      let exponent = args.get(1).and_then(RtValue::as_int).ok_or(InterpError::TypeMismatch {
        context: intrinsic.name(),
        value: "argument 1".to_string(),
      })?;
      Ok(Some(RtValue::Double(double(0)?.powi(exponent as i32))))
    },
    Intrinsic::DoNothing => Ok(None),
    Intrinsic::Trap => Err(InterpError::Trap),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn integer_arithmetic_wraps_at_width() {
    let sum = binary(BinOp::Add, RtValue::int(8, 127), RtValue::int(8, 1)).unwrap();
    assert_eq!(sum, RtValue::int(8, -128));
  }

  #[test]
  fn integers_wider_than_an_i64_are_refused() {
    let product = binary(BinOp::Mul, RtValue::int(128, 1 << 62), RtValue::int(128, 4));
    assert_eq!(product, Err(InterpError::UnsupportedWidth(128)));

    let widened = cast(CastOp::SExt, RtValue::i32(1), &MirType::Int(96));
    assert_eq!(widened, Err(InterpError::UnsupportedWidth(96)));
    assert_eq!(RtValue::parse(&MirType::Int(65), "1"), None);
  }

  #[test]
  fn bool_sign_extends_to_minus_one() {
    let wide = cast(CastOp::SExt, RtValue::bool(true), &MirType::I32).unwrap();
    assert_eq!(wide.as_int(), Some(-1));
  }

  #[test]
  fn intrinsics_round_half_away_and_trap() {
    let module = MirModule::new("m");
    let mut interp = Interpreter::new(&module);
    let result = interp.call("llvm.round.f64", vec![RtValue::Double(2.5)]).unwrap();
    assert_eq!(result, Some(RtValue::Double(3.0)));
    assert_eq!(interp.call("llvm.trap", Vec::new()), Err(InterpError::Trap));
  }
}
