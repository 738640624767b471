use kernc_ir::{InstrId, InstrKind, Operand};
use kernc_mir::{Intrinsic, MirConst, MirType};
use kernc_type::Type;

use crate::{
  arith::{lower_arith, lower_coerce, lower_compare},
  builtin::lower_builtin,
  context::{FunctionContext, PhiFixup},
  env::address_of,
  layout::{layout, value_layout},
  LowerError,
};

/// Lower one instruction at the builder's cursor and record its value.
pub fn lower_instruction(
  ctx: &mut FunctionContext<'_>,
  id: InstrId,
) -> Result<(), LowerError> {
  let source = ctx.source;
  let instr = source
    .instructions
    .try_get(&id)
    .ok_or(LowerError::UndefinedValue { instr: id.index() })?;
  let ty = &instr.ty;
  let name = instr.name.as_deref();

  let value = match &instr.kind {
    InstrKind::Phi { incoming } => {
      let phi = ctx.builder.phi(value_layout(ty)?, name)?;
      ctx.fixups.push(PhiFixup {
        phi,
        instr: id,
        incoming: incoming.clone(),
      });
      Some(kernc_mir::Operand::Value(phi))
    },
    InstrKind::Alloc { operands } => Some(lower_alloc(ctx, ty, operands, name)?),

    InstrKind::GetLocal { env, var } => {
      let address = local_address(ctx, env, var)?;
      Some(ctx.builder.load(address, name)?)
    },
    InstrKind::SetLocal { env, var, value } => {
      let value = ctx.operand(value)?;
      let address = local_address(ctx, env, var)?;
      ctx.builder.store(value, address)?;
      Some(MirConst::unit().into())
    },

    InstrKind::GetAttr { object, attr } => {
      let object_ty = ctx.source_type(object)?;
      let index = attribute_index(object_ty, attr)?;
      let object = ctx.operand(object)?;
      if object_ty.is_mutable() {
        let address = ctx.builder.field_ptr(object, index, None)?;
        Some(ctx.builder.load(address, name)?)
      } else {
        Some(ctx.builder.extract_value(object, index, name)?)
      }
    },
    InstrKind::SetAttr { object, attr, value } => {
      let object_ty = ctx.source_type(object)?;
      let index = attribute_index(object_ty, attr)?;
      let object = ctx.operand(object)?;
      let value = ctx.operand(value)?;
      if object_ty.is_mutable() {
        let address = ctx.builder.field_ptr(object, index, None)?;
        ctx.builder.store(value, address)?;
        Some(MirConst::unit().into())
      } else {
        Some(ctx.builder.insert_value(object, value, index, name)?)
      }
    },

    InstrKind::GetElem { list, index } => {
      let address = element_address(ctx, list, index)?;
      Some(ctx.builder.load(address, name)?)
    },
    InstrKind::SetElem { list, index, value } => {
      let value = ctx.operand(value)?;
      let address = element_address(ctx, list, index)?;
      ctx.builder.store(value, address)?;
      Some(MirConst::unit().into())
    },

    InstrKind::Coerce { value } => Some(lower_coerce(ctx, ty, value, name)?),
    InstrKind::Arith { operator, lhs, rhs } => Some(lower_arith(ctx, ty, *operator, lhs, rhs, name)?),
    InstrKind::Compare { operator, lhs, rhs } => Some(lower_compare(ctx, *operator, lhs, rhs, name)?),
    InstrKind::Builtin { builtin, operands } => Some(lower_builtin(ctx, ty, builtin, operands, name)?),

    InstrKind::Select {
      cond,
      if_true,
      if_false,
    } => {
      let cond = ctx.operand(cond)?;
      let if_true = ctx.operand(if_true)?;
      let if_false = ctx.operand(if_false)?;
      Some(ctx.builder.select(cond, if_true, if_false, name)?)
    },

    InstrKind::Branch { target } => {
      let target = ctx.block(*target)?;
      ctx.builder.br(target)?;
      None
    },
    InstrKind::BranchIf {
      cond,
      if_true,
      if_false,
    } => {
      let cond = ctx.operand(cond)?;
      let then_block = ctx.block(*if_true)?;
      let else_block = ctx.block(*if_false)?;
      ctx.builder.cond_br(cond, then_block, else_block)?;
      None
    },
    InstrKind::Return { value } => {
      if source.return_type.is_none() {
        ctx.builder.ret_void()?;
      } else {
        let value = value
          .as_ref()
          .ok_or_else(|| LowerError::invalid_operand("return", "missing value"))?;
        let value = ctx.operand(value)?;
        ctx.builder.ret(value)?;
      }
      None
    },
    InstrKind::Unreachable => {
      ctx.builder.unreachable()?;
      None
    },
    InstrKind::Raise { .. } => {
      ctx.call_intrinsic(Intrinsic::Trap, Vec::new(), None)?;
      ctx.builder.unreachable()?;
      None
    },

    kind @ (InstrKind::Closure { .. }
    | InstrKind::Call { .. }
    | InstrKind::IndirectBranch { .. }
    | InstrKind::Invoke { .. }
    | InstrKind::LandingPad) => {
      return Err(LowerError::UnsupportedInstruction { opcode: kind.opcode() });
    },
  };

  if let Some(value) = value {
    ctx.define(id, value);
  }
  Ok(())
}

fn lower_alloc<'a>(
  ctx: &mut FunctionContext<'a>,
  ty: &Type,
  operands: &'a [Operand],
  name: Option<&str>,
) -> Result<kernc_mir::Operand, LowerError> {
  match ty {
    Type::Environment(_) => {
      let frame = layout(ty, true, false)?;
      Ok(ctx.builder.alloca(frame, None, name)?)
    },
    Type::List(element) => {
      let [length] = operands else {
        return Err(LowerError::invalid_operand(
          "list alloc",
          format!("expected a length, got {} operands", operands.len()),
        ));
      };
      let length = ctx.to_int(length, 32)?;
      let storage = ctx.builder.alloca(value_layout(element)?, Some(length.clone()), None)?;
      let list = ctx.undef(ty)?;
      let list = ctx.builder.insert_value(list, length, 0, None)?;
      Ok(ctx.builder.insert_value(list, storage, 1, name)?)
    },
    _ if ty.is_mutable() => Err(LowerError::UnsupportedAlloc { ty: ty.clone() }),
    _ => {
      let fields = match value_layout(ty)? {
        MirType::Struct(fields) => fields.len(),
        _ => return Err(LowerError::UnsupportedAlloc { ty: ty.clone() }),
      };
      if operands.len() > fields {
        return Err(LowerError::invalid_operand(
          "alloc",
          format!("{} has {} fields, got {} operands", ty, fields, operands.len()),
        ));
      }

      let mut aggregate = ctx.undef(ty)?;
      for (index, operand) in operands.iter().enumerate() {
        let value = ctx.operand(operand)?;
        let last = index + 1 == operands.len();
        aggregate = ctx
          .builder
          .insert_value(aggregate, value, index as u32, if last { name } else { None })?;
      }
      Ok(aggregate)
    },
  }
}

fn local_address<'a>(
  ctx: &mut FunctionContext<'a>,
  env: &'a Operand,
  var: &str,
) -> Result<kernc_mir::Operand, LowerError> {
  let env_ty = match ctx.source_type(env)? {
    Type::Environment(env_ty) => env_ty,
    other => return Err(LowerError::invalid_operand("local access", other.to_string())),
  };
  let frame = ctx.operand(env)?;
  address_of(&mut ctx.builder, frame, env_ty, var)
}

fn element_address<'a>(
  ctx: &mut FunctionContext<'a>,
  list: &'a Operand,
  index: &'a Operand,
) -> Result<kernc_mir::Operand, LowerError> {
  let list = ctx.operand(list)?;
  let index = ctx.operand(index)?;
  let storage = ctx.builder.extract_value(list, 1, None)?;
  Ok(ctx.builder.elem_ptr(storage, index, None)?)
}

fn attribute_index(
  ty: &Type,
  attr: &str,
) -> Result<u32, LowerError> {
  ty.attribute_index(attr)
    .map(|index| index as u32)
    .ok_or_else(|| LowerError::UnknownAttribute {
      ty: ty.clone(),
      attr: attr.to_string(),
    })
}
