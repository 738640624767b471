use kernc_mir::{FunctionBuilder, Operand};
use kernc_type::{EnvironmentType, Type, OUTER_FIELD};

use crate::LowerError;

/// Address of variable `name` as seen from `frame`, a pointer to an
/// environment of type `env`.
///
/// A direct field costs a single field pointer. Otherwise every hop to an
/// enclosing frame loads its `.outer` link first.
pub fn address_of(
  builder: &mut FunctionBuilder,
  frame: Operand,
  env: &EnvironmentType,
  name: &str,
) -> Result<Operand, LowerError> {
  if name == OUTER_FIELD {
    let index = env.outer_index().ok_or_else(|| LowerError::MissingOuterFrame {
      frame: Type::Environment(env.clone()),
    })?;
    return Ok(builder.field_ptr(frame, index as u32, None)?);
  }

  let mut frame = frame;
  let mut current = env;
  loop {
    if let Some(index) = current.field_index(name) {
      return Ok(builder.field_ptr(frame, index as u32, None)?);
    }
    match (&current.outer, current.outer_index()) {
      (Some(outer), Some(index)) => {
        frame = load_outer(builder, frame, index)?;
        current = outer;
      },
      _ => {
        return Err(LowerError::UnresolvedVariable {
          name: name.to_string(),
          frame: Type::Environment(env.clone()),
        });
      },
    }
  }
}

/// The root frame reachable from `frame` by following `.outer` links.
pub fn outermost(
  builder: &mut FunctionBuilder,
  frame: Operand,
  env: &EnvironmentType,
) -> Result<Operand, LowerError> {
  let mut frame = frame;
  let mut current = env;
  while let (Some(outer), Some(index)) = (&current.outer, current.outer_index()) {
    frame = load_outer(builder, frame, index)?;
    current = outer;
  }
  Ok(frame)
}

fn load_outer(
  builder: &mut FunctionBuilder,
  frame: Operand,
  index: usize,
) -> Result<Operand, LowerError> {
  let link = builder.field_ptr(frame, index as u32, None)?;
  Ok(builder.load(link, None)?)
}
