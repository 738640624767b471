#![allow(dead_code)]

use kernc_ir::{ArithOp, CompareOp, Function, FunctionBuilder, Module, Operand};
use kernc_type::Type;

/// `count(n)`: counts up from 0 until the counter reaches `n`.
pub fn counting_loop() -> Function {
  let mut b = FunctionBuilder::new("count", vec![("n", Type::Int(32))], Type::Int(32));
  let entry = b.current_block();
  let body = b.create_block("loop");
  let exit = b.create_block("exit");

  b.branch(body);

  b.switch_to_block(body);
  let i = b.phi(Type::Int(32), vec![(Operand::i32(0), entry)]);
  b.name(i, "i");
  let next = b.arith(ArithOp::Add, Type::Int(32), i.into(), Operand::i32(1));
  b.name(next, "next");
  b.add_incoming(i, next.into(), body);
  let n = b.arg(0);
  let done = b.compare(CompareOp::GtE, next.into(), n);
  b.branch_if(done.into(), exit, body);

  b.switch_to_block(exit);
  b.ret(Some(next.into()));

  b.finish()
}

pub fn module_of(functions: Vec<Function>) -> Module {
  let mut module = Module::new("demo");
  module.functions = functions;
  module
}
