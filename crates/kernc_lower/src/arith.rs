use kernc_ir::{ArithOp, CompareOp, Operand};
use kernc_mir::{BinOp, CastOp, FloatPredicate, Intrinsic, IntPredicate, MirType};
use kernc_type::Type;

use crate::{context::FunctionContext, layout::value_layout, LowerError};

/// Lower `lhs operator rhs` producing a value of `ty`.
pub fn lower_arith<'a>(
  ctx: &mut FunctionContext<'a>,
  ty: &Type,
  operator: ArithOp,
  lhs: &'a Operand,
  rhs: &'a Operand,
  name: Option<&str>,
) -> Result<kernc_mir::Operand, LowerError> {
  match operator {
    // True division never truncates, whatever the operand types.
    ArithOp::Div => float_binary(ctx, BinOp::FDiv, lhs, rhs, name),
    ArithOp::FloorDiv if ty.is_float() => {
      let quotient = float_binary(ctx, BinOp::FDiv, lhs, rhs, None)?;
      call_double(ctx, Intrinsic::Round, vec![quotient], name)
    },
    ArithOp::Pow if ty.is_float() => {
      let base = ctx.to_double(lhs)?;
      let exponent = ctx.to_double(rhs)?;
      call_double(ctx, Intrinsic::Pow, vec![base, exponent], name)
    },
    ArithOp::Pow => {
      let bits = int_bits(ty, operator)?;
      let base = ctx.to_double(lhs)?;
      let exponent = ctx.to_int(rhs, 32)?;
      let power = call_double(ctx, Intrinsic::Powi, vec![base, exponent], None)?;
      Ok(ctx.builder.cast(CastOp::FpToSi, power, MirType::Int(bits), name)?)
    },
    _ if ty.is_float() => {
      let op = match operator {
        ArithOp::Add => BinOp::FAdd,
        ArithOp::Sub => BinOp::FSub,
        ArithOp::Mul => BinOp::FMul,
        ArithOp::Mod => BinOp::FRem,
        other => {
          return Err(LowerError::invalid_operand(
            "arithmetic",
            format!("'{}' has no float form", other.symbol()),
          ));
        },
      };
      float_binary(ctx, op, lhs, rhs, name)
    },
    _ => {
      let op = match operator {
        ArithOp::Add => BinOp::Add,
        ArithOp::Sub => BinOp::Sub,
        ArithOp::Mul => BinOp::Mul,
        ArithOp::FloorDiv => BinOp::SDiv,
        ArithOp::Mod => BinOp::SRem,
        ArithOp::LShift => BinOp::Shl,
        ArithOp::RShift => BinOp::AShr,
        ArithOp::BitAnd => BinOp::And,
        ArithOp::BitOr => BinOp::Or,
        ArithOp::BitXor => BinOp::Xor,
        ArithOp::Div | ArithOp::Pow => {
          return Err(LowerError::invalid_operand("arithmetic", operator.symbol()));
        },
      };
      let bits = int_bits(ty, operator)?;
      let lhs = ctx.to_int(lhs, bits)?;
      let rhs = ctx.to_int(rhs, bits)?;
      Ok(ctx.builder.binary(op, lhs, rhs, name)?)
    },
  }
}

fn float_binary<'a>(
  ctx: &mut FunctionContext<'a>,
  op: BinOp,
  lhs: &'a Operand,
  rhs: &'a Operand,
  name: Option<&str>,
) -> Result<kernc_mir::Operand, LowerError> {
  let lhs = ctx.to_double(lhs)?;
  let rhs = ctx.to_double(rhs)?;
  Ok(ctx.builder.binary(op, lhs, rhs, name)?)
}

fn call_double(
  ctx: &mut FunctionContext<'_>,
  intrinsic: Intrinsic,
  args: Vec<kernc_mir::Operand>,
  name: Option<&str>,
) -> Result<kernc_mir::Operand, LowerError> {
  ctx
    .call_intrinsic(intrinsic, args, name)?
    .ok_or_else(|| LowerError::invalid_operand("intrinsic", format!("{} returns void", intrinsic.name())))
}

/// Width of an integer-like result; `Bool` counts as `i1`.
fn int_bits(
  ty: &Type,
  operator: ArithOp,
) -> Result<u32, LowerError> {
  match ty {
    Type::Int(_) => value_layout(ty)?
      .int_bits()
      .ok_or_else(|| LowerError::invalid_operand("arithmetic", ty.to_string())),
    Type::Bool if matches!(operator, ArithOp::BitAnd | ArithOp::BitOr | ArithOp::BitXor) => Ok(1),
    other => Err(LowerError::invalid_operand(
      "arithmetic",
      format!("'{}' cannot produce {}", operator.symbol(), other),
    )),
  }
}

/// Lower a comparison. Float operands use ordered predicates, so every
/// comparison involving NaN is false; anything else compares signed.
pub fn lower_compare<'a>(
  ctx: &mut FunctionContext<'a>,
  operator: CompareOp,
  lhs: &'a Operand,
  rhs: &'a Operand,
  name: Option<&str>,
) -> Result<kernc_mir::Operand, LowerError> {
  let lhs_ty = ctx.source_type(lhs)?;
  let rhs_ty = ctx.source_type(rhs)?;

  if lhs_ty.is_float() || rhs_ty.is_float() {
    let pred = match operator {
      CompareOp::Eq => FloatPredicate::Oeq,
      CompareOp::NotEq => FloatPredicate::One,
      CompareOp::Gt => FloatPredicate::Ogt,
      CompareOp::GtE => FloatPredicate::Oge,
      CompareOp::Lt => FloatPredicate::Olt,
      CompareOp::LtE => FloatPredicate::Ole,
    };
    let lhs = ctx.to_double(lhs)?;
    let rhs = ctx.to_double(rhs)?;
    return Ok(ctx.builder.fcmp(pred, lhs, rhs, name)?);
  }

  let pred = match operator {
    CompareOp::Eq => IntPredicate::Eq,
    CompareOp::NotEq => IntPredicate::Ne,
    CompareOp::Gt => IntPredicate::Sgt,
    CompareOp::GtE => IntPredicate::Sge,
    CompareOp::Lt => IntPredicate::Slt,
    CompareOp::LtE => IntPredicate::Sle,
  };
  let bits = int_width(lhs_ty)?.max(int_width(rhs_ty)?);
  let lhs = ctx.to_int(lhs, bits)?;
  let rhs = ctx.to_int(rhs, bits)?;
  Ok(ctx.builder.icmp(pred, lhs, rhs, name)?)
}

fn int_width(ty: &Type) -> Result<u32, LowerError> {
  match ty {
    Type::Int(width) => Ok(*width),
    Type::Bool => Ok(1),
    other => Err(LowerError::invalid_operand("comparison", other.to_string())),
  }
}

/// Numeric conversion of `value` to `to`.
pub fn lower_coerce<'a>(
  ctx: &mut FunctionContext<'a>,
  to: &Type,
  value: &'a Operand,
  name: Option<&str>,
) -> Result<kernc_mir::Operand, LowerError> {
  let from = ctx.source_type(value)?;
  let operand = ctx.operand(value)?;

  match (from, to) {
    (Type::Float, Type::Int(_)) => {
      let target = value_layout(to)?;
      Ok(ctx.builder.cast(CastOp::FpToSi, operand, target, name)?)
    },
    (Type::Int(_), Type::Float) => Ok(ctx.builder.cast(CastOp::SiToFp, operand, MirType::Double, name)?),
    (Type::Int(from), Type::Int(to)) => {
      value_layout(&Type::Int(*to))?;
      ctx.resize_int(operand, *from, *to)
    },
    (Type::Float, Type::Float) => Ok(operand),
    (from, to) => Err(LowerError::UnsupportedCoercion {
      from: from.clone(),
      to: to.clone(),
    }),
  }
}
