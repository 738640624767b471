use std::fmt::Display;

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

/// Literal payload of a kernel IR constant.
#[derive(Debug, PartialEq, Clone, Hash, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "of", rename_all = "snake_case")]
pub enum Literal {
  None,
  Bool(bool),
  Int(i64),
  Float(OrderedFloat<f64>),
  Str(String),
}

impl Literal {
  pub fn float(value: f64) -> Self {
    Literal::Float(OrderedFloat(value))
  }
}

impl Display for Literal {
  fn fmt(
    &self,
    f: &mut std::fmt::Formatter<'_>,
  ) -> std::fmt::Result {
    match self {
      Literal::None => write!(f, "None"),
      Literal::Bool(value) => write!(f, "{}", value),
      Literal::Int(value) => write!(f, "{}", value),
      Literal::Float(value) => write!(f, "{:?}", value.0),
      Literal::Str(value) => write!(f, "{:?}", value),
    }
  }
}
