use std::collections::HashMap;
use std::fmt::Write;

use crate::{BlockId, Instr, MirBlock, MirConst, MirFunction, MirModule, MirType, Operand, Terminator, ValueId};

/// Pretty printer for machine IR in LLVM assembly syntax.
pub struct MirPrinter<'a> {
  module: &'a MirModule,
  output: String,
}

impl<'a> MirPrinter<'a> {
  pub fn new(module: &'a MirModule) -> Self {
    Self {
      module,
      output: String::new(),
    }
  }

  pub fn print(mut self) -> String {
    writeln!(self.output, "; ModuleID = '{}'", self.module.name).unwrap();

    for func in &self.module.functions {
      writeln!(self.output).unwrap();
      self.print_function(func);
    }

    if !self.module.declarations.is_empty() {
      writeln!(self.output).unwrap();
    }
    for (name, signature) in &self.module.declarations {
      let MirType::Func { ret, params } = signature else {
        continue;
      };
      let params: Vec<_> = params.iter().map(|param| param.to_string()).collect();
      writeln!(self.output, "declare {} @{}({})", ret, name, params.join(", ")).unwrap();
    }

    self.output
  }

  fn print_function(
    &mut self,
    func: &MirFunction,
  ) {
    let locals = Locals::new(func);
    let params: Vec<_> = func
      .params
      .iter()
      .map(|&param| format!("{} {}", func.value_type(param), locals.value(param)))
      .collect();

    writeln!(self.output, "define {} @{}({}) {{", func.ret, func.name, params.join(", ")).unwrap();

    for (idx, (_, block)) in func.blocks.iter().enumerate() {
      if idx > 0 {
        writeln!(self.output).unwrap();
      }
      self.print_block(&locals, block);
    }

    writeln!(self.output, "}}").unwrap();
  }

  fn print_block(
    &mut self,
    locals: &Locals,
    block: &MirBlock,
  ) {
    writeln!(self.output, "{}:", identifier(&block.label)).unwrap();

    for instr in &block.instructions {
      writeln!(self.output, "  {}", format_instr(locals, instr)).unwrap();
    }

    match &block.terminator {
      Some(term) => writeln!(self.output, "  {}", format_terminator(locals, term)).unwrap(),
      None => writeln!(self.output, "  ; <no terminator>").unwrap(),
    }
  }
}

/// Print a whole module as LLVM-style assembly text.
pub fn print_module(module: &MirModule) -> String {
  MirPrinter::new(module).print()
}

/// Print a single function, without the module header or declarations.
pub fn print_function(func: &MirFunction) -> String {
  let module = MirModule {
    name: String::new(),
    functions: Vec::new(),
    declarations: Default::default(),
  };
  let mut printer = MirPrinter::new(&module);
  printer.print_function(func);
  printer.output
}

/// Local names of one function. Unnamed values print as their slot number.
struct Locals<'f> {
  func: &'f MirFunction,
  slots: HashMap<ValueId, u32>,
}

impl<'f> Locals<'f> {
  fn new(func: &'f MirFunction) -> Self {
    Self {
      func,
      slots: func.value_slots(),
    }
  }

  fn value(
    &self,
    id: ValueId,
  ) -> String {
    if let Some(name) = self.func.values.try_get(&id).and_then(|data| data.name.as_ref()) {
      return format!("%{}", identifier(name));
    }
    match self.slots.get(&id) {
      Some(slot) => format!("%{}", slot),
      None => format!("%<invalid v{}>", id.index()),
    }
  }

  fn block(
    &self,
    id: BlockId,
  ) -> String {
    match self.func.blocks.try_get(&id) {
      Some(block) => format!("%{}", identifier(&block.label)),
      None => format!("%<invalid bb{}>", id.index()),
    }
  }

  fn operand(
    &self,
    op: &Operand,
  ) -> String {
    match op {
      Operand::Value(id) => self.value(*id),
      Operand::Const(constant) => format_const(constant),
    }
  }

  /// Operand prefixed with its type, as in `i32 %x`.
  fn typed(
    &self,
    op: &Operand,
  ) -> String {
    format!("{} {}", self.func.operand_type(op), self.operand(op))
  }
}

/// A local identifier, quoted when it is not a plain LLVM name.
fn identifier(name: &str) -> String {
  let plain = name
    .chars()
    .next()
    .map(|first| first.is_ascii_alphabetic() || "-$._".contains(first))
    .unwrap_or(false)
    && name.chars().all(|c| c.is_ascii_alphanumeric() || "-$._".contains(c));
  if plain {
    name.to_string()
  } else {
    format!("\"{}\"", name)
  }
}

pub fn format_const(constant: &MirConst) -> String {
  match constant {
    MirConst::Int { bits: 1, value } => (if *value != 0 { "true" } else { "false" }).to_string(),
    MirConst::Int { value, .. } => value.to_string(),
    MirConst::Double(value) => {
      let decimal = format!("{:?}", value.0);
      // Exponent forms without a '.' are not accepted, use the exact hex form.
      if value.0.is_finite() && decimal.contains('.') && !decimal.contains('e') {
        decimal
      } else {
        format!("0x{:016X}", value.0.to_bits())
      }
    },
    MirConst::Struct(fields) if fields.is_empty() => "{}".to_string(),
    MirConst::Struct(fields) => {
      let fields: Vec<_> = fields
        .iter()
        .map(|field| format!("{} {}", field.ty(), format_const(field)))
        .collect();
      format!("{{ {} }}", fields.join(", "))
    },
    MirConst::Undef(_) => "undef".to_string(),
  }
}

fn format_instr(
  locals: &Locals,
  instr: &Instr,
) -> String {
  match instr {
    Instr::Phi { dest, incoming } => {
      let edges: Vec<_> = incoming
        .iter()
        .map(|(op, pred)| format!("[ {}, {} ]", locals.operand(op), locals.block(*pred)))
        .collect();
      format!("{} = phi {} {}", locals.value(*dest), locals.func.value_type(*dest), edges.join(", "))
    },
    Instr::Alloca { dest, ty, count } => match count {
      Some(count) => format!("{} = alloca {}, {}", locals.value(*dest), ty, locals.typed(count)),
      None => format!("{} = alloca {}", locals.value(*dest), ty),
    },
    Instr::Load { dest, ptr } => {
      format!("{} = load {}, {}", locals.value(*dest), locals.func.value_type(*dest), locals.typed(ptr))
    },
    Instr::Store { ptr, value: stored } => {
      format!("store {}, {}", locals.typed(stored), locals.typed(ptr))
    },
    Instr::FieldPtr { dest, base, index } => {
      let base_ty = locals.func.operand_type(base);
      let pointee = base_ty.pointee().cloned().unwrap_or(MirType::Void);
      format!(
        "{} = getelementptr {}, {}, i32 0, i32 {}",
        locals.value(*dest),
        pointee,
        locals.typed(base),
        index
      )
    },
    Instr::ElemPtr { dest, base, index } => {
      let base_ty = locals.func.operand_type(base);
      let pointee = base_ty.pointee().cloned().unwrap_or(MirType::Void);
      format!(
        "{} = getelementptr inbounds {}, {}, {}",
        locals.value(*dest),
        pointee,
        locals.typed(base),
        locals.typed(index)
      )
    },
    Instr::ExtractValue { dest, aggregate, index } => {
      format!("{} = extractvalue {}, {}", locals.value(*dest), locals.typed(aggregate), index)
    },
    Instr::InsertValue {
      dest,
      aggregate,
      value: inserted,
      index,
    } => format!(
      "{} = insertvalue {}, {}, {}",
      locals.value(*dest),
      locals.typed(aggregate),
      locals.typed(inserted),
      index
    ),
    Instr::Binary { dest, op, lhs, rhs } => format!(
      "{} = {} {}, {}",
      locals.value(*dest),
      op.mnemonic(),
      locals.typed(lhs),
      locals.operand(rhs)
    ),
    Instr::Cast {
      dest,
      op,
      value: source,
      ty,
    } => format!("{} = {} {} to {}", locals.value(*dest), op.mnemonic(), locals.typed(source), ty),
    Instr::ICmp { dest, pred, lhs, rhs } => format!(
      "{} = icmp {} {}, {}",
      locals.value(*dest),
      pred.mnemonic(),
      locals.typed(lhs),
      locals.operand(rhs)
    ),
    Instr::FCmp { dest, pred, lhs, rhs } => format!(
      "{} = fcmp {} {}, {}",
      locals.value(*dest),
      pred.mnemonic(),
      locals.typed(lhs),
      locals.operand(rhs)
    ),
    Instr::Call { dest, callee, args } => {
      let args: Vec<_> = args.iter().map(|arg| locals.typed(arg)).collect();
      match dest {
        Some(dest) => format!(
          "{} = call {} @{}({})",
          locals.value(*dest),
          locals.func.value_type(*dest),
          callee,
          args.join(", ")
        ),
        None => format!("call void @{}({})", callee, args.join(", ")),
      }
    },
    Instr::Select {
      dest,
      cond,
      if_true,
      if_false,
    } => format!(
      "{} = select {}, {}, {}",
      locals.value(*dest),
      locals.typed(cond),
      locals.typed(if_true),
      locals.typed(if_false)
    ),
  }
}

fn format_terminator(
  locals: &Locals,
  term: &Terminator,
) -> String {
  match term {
    Terminator::Br(target) => format!("br label {}", locals.block(*target)),
    Terminator::CondBr {
      cond,
      then_block,
      else_block,
    } => format!(
      "br {}, label {}, label {}",
      locals.typed(cond),
      locals.block(*then_block),
      locals.block(*else_block)
    ),
    Terminator::Ret(Some(value)) => format!("ret {}", locals.typed(value)),
    Terminator::Ret(None) => "ret void".to_string(),
    Terminator::Unreachable => "unreachable".to_string(),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn unusual_names_are_quoted() {
    assert_eq!(identifier("acc.next"), "acc.next");
    assert_eq!(identifier("$tmp-1"), "$tmp-1");
    assert_eq!(identifier("2nd"), "\"2nd\"");
    assert_eq!(identifier("two words"), "\"two words\"");
  }

  #[test]
  fn constants_print_in_assembly_syntax() {
    assert_eq!(format_const(&MirConst::bool(true)), "true");
    assert_eq!(format_const(&MirConst::i32(-7)), "-7");
    assert_eq!(format_const(&MirConst::double(2.5)), "2.5");
    assert_eq!(format_const(&MirConst::double(f64::INFINITY)), "0x7FF0000000000000");
    assert_eq!(format_const(&MirConst::double(1e300)), "0x7E37E43C8800759C");
    assert_eq!(format_const(&MirConst::unit()), "{}");
    assert_eq!(
      format_const(&MirConst::Struct(vec![MirConst::i32(1), MirConst::bool(false)])),
      "{ i32 1, i1 false }"
    );
  }
}
