use kernc_ir::Constant;
use kernc_mir::MirConst;
use kernc_type::{Literal, Type};

use crate::{layout::value_layout, LowerError};

/// Machine constant for a typed literal.
pub fn materialize(constant: &Constant) -> Result<MirConst, LowerError> {
  match (&constant.ty, &constant.value) {
    (Type::None, Literal::None) => Ok(MirConst::unit()),
    (Type::Bool, Literal::Bool(value)) => Ok(MirConst::bool(*value)),
    (Type::Int(width), Literal::Int(value)) => {
      value_layout(&constant.ty)?;
      Ok(MirConst::int(*width, *value))
    },
    (Type::Float, Literal::Float(value)) => Ok(MirConst::double(value.0)),
    (ty, value) => Err(LowerError::UnsupportedConstant {
      ty: ty.clone(),
      value: value.to_string(),
    }),
  }
}
