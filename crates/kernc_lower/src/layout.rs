use kernc_mir::MirType;
use kernc_type::{EnvironmentType, Type};

use crate::LowerError;

/// Widest integer the layout accepts; constants and the interpreter hold `i64`.
pub const MAX_INT_WIDTH: u32 = 64;

/// Machine representation of a source type.
///
/// `for_alloc` selects the by-value frame of an environment (and of a
/// mutable object) instead of a pointer to it; `for_return` maps `None` to
/// `void` instead of the empty struct.
pub fn layout(
  ty: &Type,
  for_alloc: bool,
  for_return: bool,
) -> Result<MirType, LowerError> {
  match ty {
    Type::None if for_return => Ok(MirType::Void),
    Type::None | Type::Exception => Ok(MirType::empty_struct()),
    Type::Bool => Ok(MirType::I1),
    Type::Int(width) => {
      if *width == 0 || *width > MAX_INT_WIDTH {
        return Err(LowerError::UnsupportedType {
          ty: ty.clone(),
          reason: "integer width must be between 1 and 64 bits",
        });
      }
      Ok(MirType::Int(*width))
    },
    Type::Float => Ok(MirType::Double),
    Type::Tuple(elements) => Ok(MirType::Struct(fields(elements)?)),
    Type::Function(func) => {
      let mut params = vec![MirType::I8.ptr()];
      params.extend(fields(&func.args)?);
      for optarg in &func.optargs {
        params.push(layout(&Type::option(optarg.clone()), false, false)?);
      }
      let ret = layout(&func.ret, false, true)?;
      Ok(MirType::func(ret, params).ptr())
    },
    Type::List(element) => Ok(MirType::Struct(vec![MirType::I32, value_layout(element)?.ptr()])),
    Type::Range(element) => {
      let element = value_layout(element)?;
      Ok(MirType::Struct(vec![element.clone(), element.clone(), element]))
    },
    Type::Option(inner) => Ok(MirType::Struct(vec![MirType::I1, value_layout(inner)?])),
    Type::Environment(env) => {
      let frame = frame_layout(env)?;
      Ok(if for_alloc { frame } else { frame.ptr() })
    },
    Type::Object(object) => {
      let types: Vec<Type> = object.attributes.iter().map(|(_, ty)| ty.clone()).collect();
      let body = MirType::Struct(fields(&types)?);
      Ok(if object.mutable && !for_alloc { body.ptr() } else { body })
    },
    Type::BasicBlockLabel => Ok(MirType::Label),
  }
}

/// Layout of a value held in a register or passed as an argument.
pub fn value_layout(ty: &Type) -> Result<MirType, LowerError> {
  layout(ty, false, false)
}

/// By-value struct of an environment: declared fields, then the `.outer`
/// link when there is an enclosing frame.
pub fn frame_layout(env: &EnvironmentType) -> Result<MirType, LowerError> {
  let mut members = Vec::with_capacity(env.fields.len() + 1);
  for (_, ty) in &env.fields {
    members.push(value_layout(ty)?);
  }
  if let Some(outer) = &env.outer {
    members.push(frame_layout(outer)?.ptr());
  }
  Ok(MirType::Struct(members))
}

/// Signature of a function taking `args` and returning `ret`.
pub fn signature(
  args: &[Type],
  ret: &Type,
) -> Result<(Vec<MirType>, MirType), LowerError> {
  Ok((fields(args)?, layout(ret, false, true)?))
}

fn fields(types: &[Type]) -> Result<Vec<MirType>, LowerError> {
  types.iter().map(value_layout).collect()
}
