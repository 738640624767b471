#![allow(dead_code)]

use kernc_config::LowerOptions;
use kernc_ir::{ArithOp, CompareOp, Function, FunctionBuilder, Module, Operand};
use kernc_lower::{lower_module, LowerError};
use kernc_mir::{
  display::print_module,
  interp::{InterpError, Interpreter, RtValue},
  MirModule,
};
use kernc_type::{EnvironmentType, Type};

pub fn module_of(functions: Vec<Function>) -> Module {
  let mut module = Module::new("demo");
  module.functions = functions;
  module
}

pub fn verifying() -> LowerOptions {
  LowerOptions {
    verify: true,
    ..Default::default()
  }
}

/// Lower with verification enabled; panics on any lowering error.
pub fn lower(functions: Vec<Function>) -> MirModule {
  match lower_module(&module_of(functions), &verifying()) {
    Ok(module) => module,
    Err(error) => panic!("lowering failed: {}", error),
  }
}

pub fn lower_err(functions: Vec<Function>) -> LowerError {
  match lower_module(&module_of(functions), &verifying()) {
    Ok(module) => panic!("lowering succeeded:\n{}", print_module(&module)),
    Err(error) => error,
  }
}

pub fn print(functions: Vec<Function>) -> String {
  print_module(&lower(functions))
}

pub fn run(
  module: &MirModule,
  name: &str,
  args: Vec<RtValue>,
) -> Result<Option<RtValue>, InterpError> {
  Interpreter::new(module).call(name, args)
}

/// Lower `func` alone and call it.
pub fn eval(
  func: Function,
  args: Vec<RtValue>,
) -> Option<RtValue> {
  let name = func.name.clone();
  let module = lower(vec![func]);
  match run(&module, &name, args) {
    Ok(value) => value,
    Err(error) => panic!("{} failed: {}", name, error),
  }
}

/// Root frame `{ g: Float }`, its child `{ m: Int(32) }` and grandchild
/// `{ x: Bool }`.
pub fn frames() -> (EnvironmentType, EnvironmentType, EnvironmentType) {
  let root = EnvironmentType::new(vec![("g".to_string(), Type::Float)], None);
  let middle = EnvironmentType::new(vec![("m".to_string(), Type::Int(32))], Some(root.clone()));
  let inner = EnvironmentType::new(vec![("x".to_string(), Type::Bool)], Some(middle.clone()));
  (root, middle, inner)
}

/// `bump(init)`: adds one to `init` three times around a loop.
pub fn bump_three_times() -> Function {
  let mut b = FunctionBuilder::new("bump", vec![("init", Type::Int(64))], Type::Int(64));
  let init = b.arg(0);
  let entry = b.current_block();
  let body = b.create_block("loop");
  let exit = b.create_block("exit");

  b.branch(body);

  b.switch_to_block(body);
  let count = b.phi(Type::Int(32), vec![(Operand::i32(0), entry)]);
  b.name(count, "count");
  let value = b.phi(Type::Int(64), vec![(init, entry)]);
  b.name(value, "value");
  let next_count = b.arith(ArithOp::Add, Type::Int(32), count.into(), Operand::i32(1));
  let next_value = b.arith(ArithOp::Add, Type::Int(64), value.into(), Operand::int(64, 1));
  b.name(next_value, "value.next");
  b.add_incoming(count, next_count.into(), body);
  b.add_incoming(value, next_value.into(), body);
  let again = b.compare(CompareOp::Lt, next_count.into(), Operand::i32(3));
  b.branch_if(again.into(), body, exit);

  b.switch_to_block(exit);
  b.ret(Some(next_value.into()));

  b.finish()
}

/// A function of one argument returning a single instruction's value.
pub fn unary(
  name: &str,
  arg: Type,
  ret: Type,
  body: impl FnOnce(&mut FunctionBuilder, Operand) -> Operand,
) -> Function {
  let mut b = FunctionBuilder::new(name, vec![("a", arg)], ret);
  let a = b.arg(0);
  let result = body(&mut b, a);
  b.ret(Some(result));
  b.finish()
}

/// A function of two arguments returning a single instruction's value.
pub fn binary(
  name: &str,
  args: (Type, Type),
  ret: Type,
  body: impl FnOnce(&mut FunctionBuilder, Operand, Operand) -> Operand,
) -> Function {
  let mut b = FunctionBuilder::new(name, vec![("a", args.0), ("b", args.1)], ret);
  let (a, c) = (b.arg(0), b.arg(1));
  let result = body(&mut b, a, c);
  b.ret(Some(result));
  b.finish()
}
