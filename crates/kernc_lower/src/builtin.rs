use kernc_ir::Operand;
use kernc_mir::{CastOp, Intrinsic, MirConst};
use kernc_type::Type;

use crate::{context::FunctionContext, env::outermost, layout::value_layout, LowerError};

/// Primitives reachable through the `builtin` instruction.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BuiltinOp {
  Nop,
  /// `unwrap(option, default)`
  Unwrap,
  Round,
  /// Root frame of an environment chain.
  GlobalEnv,
  Len,
}

impl BuiltinOp {
  pub fn from_name(name: &str) -> Option<Self> {
    match name {
      "nop" => Some(BuiltinOp::Nop),
      "unwrap" => Some(BuiltinOp::Unwrap),
      "round" => Some(BuiltinOp::Round),
      "globalenv" => Some(BuiltinOp::GlobalEnv),
      "len" => Some(BuiltinOp::Len),
      _ => None,
    }
  }

  pub fn name(&self) -> &'static str {
    match self {
      BuiltinOp::Nop => "nop",
      BuiltinOp::Unwrap => "unwrap",
      BuiltinOp::Round => "round",
      BuiltinOp::GlobalEnv => "globalenv",
      BuiltinOp::Len => "len",
    }
  }

  pub fn arity(&self) -> usize {
    match self {
      BuiltinOp::Nop => 0,
      BuiltinOp::Unwrap => 2,
      BuiltinOp::Round | BuiltinOp::GlobalEnv | BuiltinOp::Len => 1,
    }
  }
}

pub fn lower_builtin<'a>(
  ctx: &mut FunctionContext<'a>,
  ty: &Type,
  builtin: &str,
  operands: &'a [Operand],
  name: Option<&str>,
) -> Result<kernc_mir::Operand, LowerError> {
  let op = BuiltinOp::from_name(builtin).ok_or_else(|| LowerError::UnknownBuiltin {
    name: builtin.to_string(),
  })?;
  if operands.len() != op.arity() {
    return Err(LowerError::BuiltinArity {
      name: op.name(),
      expected: op.arity(),
      actual: operands.len(),
    });
  }

  match op {
    BuiltinOp::Nop => {
      ctx.call_intrinsic(Intrinsic::DoNothing, Vec::new(), None)?;
      Ok(MirConst::unit().into())
    },
    BuiltinOp::Unwrap => {
      let option = ctx.operand(&operands[0])?;
      let default = ctx.operand(&operands[1])?;
      let present = ctx.builder.extract_value(option.clone(), 0, None)?;
      let payload = ctx.builder.extract_value(option, 1, None)?;
      Ok(ctx.builder.select(present, payload, default, name)?)
    },
    BuiltinOp::Round => {
      let value = ctx.to_double(&operands[0])?;
      if ty.is_int() {
        let rounded = ctx
          .call_intrinsic(Intrinsic::Round, vec![value], None)?
          .ok_or_else(|| LowerError::invalid_operand("round", "intrinsic returned void"))?;
        let target = value_layout(ty)?;
        return Ok(ctx.builder.cast(CastOp::FpToSi, rounded, target, name)?);
      }
      ctx
        .call_intrinsic(Intrinsic::Round, vec![value], name)?
        .ok_or_else(|| LowerError::invalid_operand("round", "intrinsic returned void"))
    },
    BuiltinOp::GlobalEnv => {
      let env = match ctx.source_type(&operands[0])? {
        Type::Environment(env) => env,
        other => return Err(LowerError::invalid_operand("globalenv", other.to_string())),
      };
      let frame = ctx.operand(&operands[0])?;
      outermost(&mut ctx.builder, frame, env)
    },
    BuiltinOp::Len => {
      let list = ctx.operand(&operands[0])?;
      Ok(ctx.builder.extract_value(list, 0, name)?)
    },
  }
}
