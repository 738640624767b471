#![allow(dead_code)]

use kernc_mir::{BinOp, FunctionBuilder, IntPredicate, MirConst, MirFunction, MirModule, MirType};

/// `sum_to(n)`: 0 + 1 + ... + n, as a loop with two phis.
pub fn sum_to() -> MirFunction {
  let mut b = FunctionBuilder::new("sum_to", vec![(MirType::I32, Some("n".to_string()))], MirType::I32);
  let n = b.params()[0];
  let entry = b.create_block("entry");
  let body = b.create_block("loop");
  let exit = b.create_block("exit");

  b.position_at_end(entry);
  b.br(body).unwrap();

  b.position_at_end(body);
  let i = b.phi(MirType::I32, Some("i")).unwrap();
  let acc = b.phi(MirType::I32, Some("acc")).unwrap();
  let acc_next = b.binary(BinOp::Add, acc.into(), i.into(), Some("acc.next")).unwrap();
  let i_next = b.binary(BinOp::Add, i.into(), MirConst::i32(1).into(), Some("i.next")).unwrap();
  let done = b.icmp(IntPredicate::Sgt, i_next.clone(), n.into(), Some("done")).unwrap();
  b.cond_br(done, exit, body).unwrap();

  b.add_incoming(i, MirConst::i32(0).into(), entry);
  b.add_incoming(i, i_next, body);
  b.add_incoming(acc, MirConst::i32(0).into(), entry);
  b.add_incoming(acc, acc_next.clone(), body);

  b.position_at_end(exit);
  b.ret(acc_next).unwrap();

  b.finish()
}

/// `cell(x)`: stores `x` into a `{ i32, double }` slot and reads it back.
pub fn cell() -> MirFunction {
  let slot_ty = MirType::Struct(vec![MirType::I32, MirType::Double]);
  let mut b = FunctionBuilder::new("cell", vec![(MirType::I32, Some("x".to_string()))], MirType::I32);
  let x = b.params()[0];
  let entry = b.create_block("entry");
  b.position_at_end(entry);

  let slot = b.alloca(slot_ty, None, Some("slot")).unwrap();
  let field = b.field_ptr(slot, 0, None).unwrap();
  b.store(x.into(), field.clone()).unwrap();
  let loaded = b.load(field, Some("x.loaded")).unwrap();
  b.ret(loaded).unwrap();

  b.finish()
}

pub fn module_of(functions: Vec<MirFunction>) -> MirModule {
  let mut module = MirModule::new("demo");
  module.functions = functions;
  module
}
