use std::fmt;

use serde::{Deserialize, Serialize};

/// Reserved field name of the enclosing-frame link in an environment.
pub const OUTER_FIELD: &str = ".outer";

/// Attribute names of a range, in layout order.
pub const RANGE_ATTRIBUTES: [&str; 3] = ["start", "stop", "step"];

/// Kernel IR value types. Identity is structural; field order is layout order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "of", rename_all = "snake_case")]
pub enum Type {
  None,
  Bool,
  /// Signed integer of the given bit width.
  Int(u32),
  /// 64-bit IEEE float.
  Float,
  Tuple(Vec<Type>),
  Function(FunctionType),
  List(Box<Type>),
  Range(Box<Type>),
  /// Opaque placeholder until exception payloads get a layout.
  Exception,
  Option(Box<Type>),
  Environment(EnvironmentType),
  Object(ObjectType),
  BasicBlockLabel,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FunctionType {
  pub args: Vec<Type>,
  #[serde(default)]
  pub optargs: Vec<Type>,
  pub ret: Box<Type>,
}

/// One lexical scope's captured variables plus an optional link to the
/// enclosing scope.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EnvironmentType {
  pub fields: Vec<(String, Type)>,
  #[serde(default)]
  pub outer: Option<Box<EnvironmentType>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectType {
  pub name: String,
  pub attributes: Vec<(String, Type)>,
  #[serde(default)]
  pub mutable: bool,
}

impl EnvironmentType {
  pub fn new(
    fields: Vec<(String, Type)>,
    outer: Option<EnvironmentType>,
  ) -> Self {
    Self {
      fields,
      outer: outer.map(Box::new),
    }
  }

  /// Declaration index of a variable stored directly in this frame.
  pub fn field_index(
    &self,
    name: &str,
  ) -> Option<usize> {
    self.fields.iter().position(|(field, _)| field == name)
  }

  /// Index of the enclosing-frame link; always after the declared fields.
  pub fn outer_index(&self) -> Option<usize> {
    self.outer.as_ref().map(|_| self.fields.len())
  }

  /// Number of frames from this one to the root, this one included.
  pub fn depth(&self) -> usize {
    let mut depth = 1;
    let mut current = self;
    while let Some(outer) = &current.outer {
      depth += 1;
      current = outer;
    }
    depth
  }
}

impl ObjectType {
  pub fn attribute_index(
    &self,
    name: &str,
  ) -> Option<usize> {
    self.attributes.iter().position(|(attr, _)| attr == name)
  }
}

impl Type {
  pub fn int(width: u32) -> Self {
    Type::Int(width)
  }

  pub fn list(element: Type) -> Self {
    Type::List(Box::new(element))
  }

  pub fn range(element: Type) -> Self {
    Type::Range(Box::new(element))
  }

  pub fn option(inner: Type) -> Self {
    Type::Option(Box::new(inner))
  }

  pub fn function(
    args: Vec<Type>,
    optargs: Vec<Type>,
    ret: Type,
  ) -> Self {
    Type::Function(FunctionType {
      args,
      optargs,
      ret: Box::new(ret),
    })
  }

  pub fn is_none(&self) -> bool {
    matches!(self, Type::None)
  }

  pub fn is_float(&self) -> bool {
    matches!(self, Type::Float)
  }

  pub fn is_int(&self) -> bool {
    matches!(self, Type::Int(_))
  }

  pub fn int_width(&self) -> Option<u32> {
    match self {
      Type::Int(width) => Some(*width),
      _ => None,
    }
  }

  /// Whether values of this type are referenced through a pointer.
  pub fn is_mutable(&self) -> bool {
    match self {
      Type::List(_) | Type::Environment(_) => true,
      Type::Object(object) => object.mutable,
      _ => false,
    }
  }

  /// Position of a named attribute in this type's declared attribute order.
  ///
  /// Every attribute access resolves through here so that reads and writes of
  /// the same name agree on the index.
  pub fn attribute_index(
    &self,
    name: &str,
  ) -> Option<usize> {
    match self {
      Type::Tuple(elements) => name.parse::<usize>().ok().filter(|idx| *idx < elements.len()),
      Type::Range(_) => RANGE_ATTRIBUTES.iter().position(|attr| *attr == name),
      Type::Object(object) => object.attribute_index(name),
      Type::Environment(env) => {
        if name == OUTER_FIELD {
          env.outer_index()
        } else {
          env.field_index(name)
        }
      },
      _ => None,
    }
  }

  /// Type of the attribute at `index` (see [`Type::attribute_index`]).
  pub fn attribute_type(
    &self,
    index: usize,
  ) -> Option<Type> {
    match self {
      Type::Tuple(elements) => elements.get(index).cloned(),
      Type::Range(element) if index < RANGE_ATTRIBUTES.len() => Some((**element).clone()),
      Type::Object(object) => object.attributes.get(index).map(|(_, ty)| ty.clone()),
      Type::Environment(env) => match env.fields.get(index) {
        Some((_, ty)) => Some(ty.clone()),
        None if Some(index) == env.outer_index() => env.outer.as_ref().map(|outer| Type::Environment((**outer).clone())),
        None => None,
      },
      _ => None,
    }
  }
}

fn write_fields(
  f: &mut fmt::Formatter<'_>,
  fields: &[(String, Type)],
) -> fmt::Result {
  for (idx, (name, ty)) in fields.iter().enumerate() {
    if idx > 0 {
      write!(f, ", ")?;
    }
    write!(f, "{}: {}", name, ty)?;
  }
  Ok(())
}

fn write_list(
  f: &mut fmt::Formatter<'_>,
  types: &[Type],
) -> fmt::Result {
  for (idx, ty) in types.iter().enumerate() {
    if idx > 0 {
      write!(f, ", ")?;
    }
    write!(f, "{}", ty)?;
  }
  Ok(())
}

impl fmt::Display for EnvironmentType {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    write!(f, "env{{")?;
    write_fields(f, &self.fields)?;
    if let Some(outer) = &self.outer {
      if !self.fields.is_empty() {
        write!(f, ", ")?;
      }
      write!(f, "{}: {}", OUTER_FIELD, outer)?;
    }
    write!(f, "}}")
  }
}

impl fmt::Display for Type {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    match self {
      Type::None => write!(f, "none"),
      Type::Bool => write!(f, "bool"),
      Type::Int(width) => write!(f, "int({})", width),
      Type::Float => write!(f, "float"),
      Type::Tuple(elements) => {
        write!(f, "(")?;
        write_list(f, elements)?;
        write!(f, ")")
      },
      Type::Function(func) => {
        write!(f, "fn(")?;
        write_list(f, &func.args)?;
        if !func.optargs.is_empty() {
          write!(f, "; ?")?;
          write_list(f, &func.optargs)?;
        }
        write!(f, ") -> {}", func.ret)
      },
      Type::List(element) => write!(f, "list({})", element),
      Type::Range(element) => write!(f, "range({})", element),
      Type::Exception => write!(f, "exception"),
      Type::Option(inner) => write!(f, "option({})", inner),
      Type::Environment(env) => write!(f, "{}", env),
      Type::Object(object) => {
        let prefix = if object.mutable { "mut " } else { "" };
        write!(f, "{}{}{{", prefix, object.name)?;
        write_fields(f, &object.attributes)?;
        write!(f, "}}")
      },
      Type::BasicBlockLabel => write!(f, "label"),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn nested_env() -> EnvironmentType {
    let root = EnvironmentType::new(vec![("g".to_string(), Type::Int(32))], None);
    let mid = EnvironmentType::new(vec![("m".to_string(), Type::Float)], Some(root));
    EnvironmentType::new(vec![("a".to_string(), Type::Bool), ("b".to_string(), Type::Int(8))], Some(mid))
  }

  #[test]
  fn outer_link_comes_after_declared_fields() {
    let env = nested_env();
    assert_eq!(env.field_index("b"), Some(1));
    assert_eq!(env.outer_index(), Some(2));
    assert_eq!(env.depth(), 3);

    let ty = Type::Environment(env);
    assert_eq!(ty.attribute_index(OUTER_FIELD), Some(2));
    assert!(matches!(ty.attribute_type(2), Some(Type::Environment(_))));
  }

  #[test]
  fn tuple_attributes_are_positions() {
    let ty = Type::Tuple(vec![Type::Int(32), Type::Float]);
    assert_eq!(ty.attribute_index("1"), Some(1));
    assert_eq!(ty.attribute_index("2"), None);
    assert_eq!(ty.attribute_type(1), Some(Type::Float));
  }

  #[test]
  fn range_attributes_follow_layout_order() {
    let ty = Type::range(Type::Int(32));
    assert_eq!(ty.attribute_index("start"), Some(0));
    assert_eq!(ty.attribute_index("stop"), Some(1));
    assert_eq!(ty.attribute_index("step"), Some(2));
    assert_eq!(ty.attribute_index("len"), None);
  }

  #[test]
  fn types_round_trip_through_json() {
    let ty = Type::function(vec![Type::Int(32)], vec![Type::Float], Type::None);
    let json = serde_json::to_string(&ty).unwrap();
    assert_eq!(serde_json::from_str::<Type>(&json).unwrap(), ty);
  }

  #[test]
  fn display_is_readable() {
    assert_eq!(Type::option(Type::list(Type::Int(32))).to_string(), "option(list(int(32)))");
    assert_eq!(
      Type::Environment(nested_env()).to_string(),
      "env{a: bool, b: int(8), .outer: env{m: float, .outer: env{g: int(32)}}}"
    );
  }
}
