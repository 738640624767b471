use std::fmt;

/// Machine IR types. Structural: two types are the same type iff equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MirType {
  Void,
  /// Two's-complement integer of the given width; signedness lives in the ops.
  Int(u32),
  Double,
  Label,
  Ptr(Box<MirType>),
  /// Literal (unnamed, unpacked) struct.
  Struct(Vec<MirType>),
  Func {
    ret: Box<MirType>,
    params: Vec<MirType>,
  },
}

impl MirType {
  pub const I1: MirType = MirType::Int(1);
  pub const I8: MirType = MirType::Int(8);
  pub const I32: MirType = MirType::Int(32);

  pub fn ptr(self) -> MirType {
    MirType::Ptr(Box::new(self))
  }

  pub fn empty_struct() -> MirType {
    MirType::Struct(Vec::new())
  }

  pub fn func(
    ret: MirType,
    params: Vec<MirType>,
  ) -> MirType {
    MirType::Func {
      ret: Box::new(ret),
      params,
    }
  }

  pub fn is_void(&self) -> bool {
    matches!(self, MirType::Void)
  }

  pub fn is_double(&self) -> bool {
    matches!(self, MirType::Double)
  }

  pub fn is_int(&self) -> bool {
    matches!(self, MirType::Int(_))
  }

  pub fn is_ptr(&self) -> bool {
    matches!(self, MirType::Ptr(_))
  }

  pub fn int_bits(&self) -> Option<u32> {
    match self {
      MirType::Int(bits) => Some(*bits),
      _ => None,
    }
  }

  pub fn pointee(&self) -> Option<&MirType> {
    match self {
      MirType::Ptr(inner) => Some(inner),
      _ => None,
    }
  }

  pub fn field(
    &self,
    index: u32,
  ) -> Option<&MirType> {
    match self {
      MirType::Struct(fields) => fields.get(index as usize),
      _ => None,
    }
  }
}

impl fmt::Display for MirType {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    match self {
      MirType::Void => write!(f, "void"),
      MirType::Int(bits) => write!(f, "i{}", bits),
      MirType::Double => write!(f, "double"),
      MirType::Label => write!(f, "label"),
      MirType::Ptr(inner) => write!(f, "{}*", inner),
      MirType::Struct(fields) => {
        if fields.is_empty() {
          return write!(f, "{{}}");
        }
        let fields: Vec<_> = fields.iter().map(|field| field.to_string()).collect();
        write!(f, "{{ {} }}", fields.join(", "))
      },
      MirType::Func { ret, params } => {
        let params: Vec<_> = params.iter().map(|param| param.to_string()).collect();
        write!(f, "{} ({})", ret, params.join(", "))
      },
    }
  }
}
