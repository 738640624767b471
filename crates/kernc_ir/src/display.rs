use std::fmt::Write;

use crate::{BasicBlock, BlockId, Function, InstrId, InstrKind, Instruction, Module, Operand};

/// Pretty printer for kernel IR, used by `--dump kir`.
pub struct KirPrinter<'a> {
  module: &'a Module,
  output: String,
}

impl<'a> KirPrinter<'a> {
  pub fn new(module: &'a Module) -> Self {
    Self {
      module,
      output: String::new(),
    }
  }

  pub fn print(mut self) -> String {
    writeln!(self.output, "; kernel module '{}'", self.module.name).unwrap();

    for func in &self.module.functions {
      writeln!(self.output).unwrap();
      self.print_function(func);
    }

    self.output
  }

  fn print_function(
    &mut self,
    func: &Function,
  ) {
    let args: Vec<_> = func
      .arguments
      .iter()
      .map(|arg| format!("%{}: {}", arg.name, arg.ty))
      .collect();

    writeln!(self.output, "function {}({}) -> {} {{", func.name, args.join(", "), func.return_type).unwrap();

    for (idx, (_, block)) in func.blocks.iter().enumerate() {
      if idx > 0 {
        writeln!(self.output).unwrap();
      }
      self.print_block(func, block);
    }

    writeln!(self.output, "}}").unwrap();
  }

  fn print_block(
    &mut self,
    func: &Function,
    block: &BasicBlock,
  ) {
    writeln!(self.output, "{}:", block.name).unwrap();

    for &id in &block.instructions {
      let line = match func.instructions.try_get(&id) {
        Some(instr) => format_instr(func, id, instr),
        None => format!("<invalid instr #{}>", id.index()),
      };
      writeln!(self.output, "  {}", line).unwrap();
    }
  }
}

pub fn print_module(module: &Module) -> String {
  KirPrinter::new(module).print()
}

fn value_name(
  func: &Function,
  id: InstrId,
) -> String {
  match func.instructions.try_get(&id).and_then(|instr| instr.name.as_ref()) {
    Some(name) => format!("%{}", name),
    None => format!("%{}", id.index()),
  }
}

fn block_name(
  func: &Function,
  id: BlockId,
) -> String {
  match func.blocks.try_get(&id) {
    Some(block) => block.name.clone(),
    None => format!("<bb{}>", id.index()),
  }
}

pub fn format_operand(
  func: &Function,
  operand: &Operand,
) -> String {
  match operand {
    Operand::Instr(id) => value_name(func, *id),
    Operand::Argument(idx) => match func.arguments.get(*idx as usize) {
      Some(arg) => format!("%{}", arg.name),
      None => format!("%arg{}", idx),
    },
    Operand::Const(constant) => format!("{}:{}", constant.value, constant.ty),
  }
}

fn format_operands(
  func: &Function,
  operands: &[Operand],
) -> String {
  operands
    .iter()
    .map(|op| format_operand(func, op))
    .collect::<Vec<_>>()
    .join(", ")
}

fn format_instr(
  func: &Function,
  id: InstrId,
  instr: &Instruction,
) -> String {
  let op = |operand: &Operand| format_operand(func, operand);

  let body = match &instr.kind {
    InstrKind::Phi { incoming } => {
      let pairs: Vec<_> = incoming
        .iter()
        .map(|(value, block)| format!("[{}, {}]", op(value), block_name(func, *block)))
        .collect();
      format!("phi {}", pairs.join(", "))
    },
    InstrKind::Alloc { operands } => format!("alloc({})", format_operands(func, operands)),
    InstrKind::GetLocal { env, var } => format!("getlocal {}.{}", op(env), var),
    InstrKind::SetLocal { env, var, value } => format!("setlocal {}.{} <- {}", op(env), var, op(value)),
    InstrKind::GetAttr { object, attr } => format!("getattr {}.{}", op(object), attr),
    InstrKind::SetAttr { object, attr, value } => format!("setattr {}.{} <- {}", op(object), attr, op(value)),
    InstrKind::GetElem { list, index } => format!("getelem {}[{}]", op(list), op(index)),
    InstrKind::SetElem { list, index, value } => format!("setelem {}[{}] <- {}", op(list), op(index), op(value)),
    InstrKind::Coerce { value } => format!("coerce {}", op(value)),
    InstrKind::Arith { operator, lhs, rhs } => format!("arith {} {}, {}", operator.symbol(), op(lhs), op(rhs)),
    InstrKind::Compare { operator, lhs, rhs } => {
      format!("compare {} {}, {}", operator.symbol(), op(lhs), op(rhs))
    },
    InstrKind::Builtin { builtin, operands } => format!("builtin {}({})", builtin, format_operands(func, operands)),
    InstrKind::Select {
      cond,
      if_true,
      if_false,
    } => format!("select {}, {}, {}", op(cond), op(if_true), op(if_false)),
    InstrKind::Branch { target } => return format!("branch {}", block_name(func, *target)),
    InstrKind::BranchIf {
      cond,
      if_true,
      if_false,
    } => {
      return format!(
        "branch_if {}, {}, {}",
        op(cond),
        block_name(func, *if_true),
        block_name(func, *if_false)
      );
    },
    InstrKind::Return { value } => {
      return match value {
        Some(value) => format!("return {}", op(value)),
        None => "return".to_string(),
      };
    },
    InstrKind::Unreachable => return "unreachable".to_string(),
    InstrKind::Raise { value } => {
      return match value {
        Some(value) => format!("raise {}", op(value)),
        None => "raise".to_string(),
      };
    },
    InstrKind::Closure { target, env } => format!("closure {}, {}", target, op(env)),
    InstrKind::Call { callee, args } => format!("call {}({})", op(callee), format_operands(func, args)),
    InstrKind::IndirectBranch { address, destinations } => {
      let targets: Vec<_> = destinations.iter().map(|block| block_name(func, *block)).collect();
      return format!("indirect_branch {}, [{}]", op(address), targets.join(", "));
    },
    InstrKind::Invoke {
      callee,
      args,
      normal,
      unwind,
    } => {
      return format!(
        "invoke {}({}) to {} unwind {}",
        op(callee),
        format_operands(func, args),
        block_name(func, *normal),
        block_name(func, *unwind)
      );
    },
    InstrKind::LandingPad => "landing_pad".to_string(),
  };

  if instr.ty.is_none() {
    body
  } else {
    format!("{} = {} : {}", value_name(func, id), body, instr.ty)
  }
}
