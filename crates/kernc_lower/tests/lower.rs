mod common;

use common::{binary, bump_three_times, eval, frames, lower, lower_err, module_of, print, run, unary};
use insta::assert_snapshot;
use kernc_config::LowerOptions;
use kernc_ir::{ArithOp, CompareOp, FunctionBuilder, InstrKind, Instruction, Operand};
use kernc_lower::{lower_function, lower_module, LowerError};
use kernc_mir::{
  display::{print_function, print_module},
  interp::{InterpError, RtValue},
  Intrinsic,
};
use kernc_type::{ObjectType, Type, OUTER_FIELD};

fn point() -> Type {
  Type::Object(ObjectType {
    name: "point".to_string(),
    attributes: vec![("x".to_string(), Type::Int(32)), ("y".to_string(), Type::Float)],
    mutable: false,
  })
}

fn counter() -> Type {
  Type::Object(ObjectType {
    name: "counter".to_string(),
    attributes: vec![("hits".to_string(), Type::Int(32)), ("misses".to_string(), Type::Int(32))],
    mutable: true,
  })
}

#[test]
fn lowered_module_prints_as_assembly() {
  let scale = binary("scale", (Type::Int(32), Type::Float), Type::Float, |b, x, y| {
    let product = b.arith(ArithOp::Mul, Type::Float, x, y);
    b.name(product, "scaled").into()
  });

  let output = print(vec![bump_three_times(), scale]);

  assert_snapshot!(output.trim_end(), @r###"
  ; ModuleID = 'demo'

  define i64 @bump(i64 %init) {
  entry:
    br label %loop

  loop:
    %count = phi i32 [ 0, %entry ], [ %0, %loop ]
    %value = phi i64 [ %init, %entry ], [ %value.next, %loop ]
    %0 = add i32 %count, 1
    %value.next = add i64 %value, 1
    %1 = icmp slt i32 %0, 3
    br i1 %1, label %loop, label %exit

  exit:
    ret i64 %value.next
  }

  define double @scale(i32 %a, double %b) {
  entry:
    %0 = sitofp i32 %a to double
    %scaled = fmul double %0, %b
    ret double %scaled
  }
  "###);
}

#[test]
fn unnamed_values_are_numbered_without_gaps() {
  let ratio = binary("ratio", (Type::Int(32), Type::Int(32)), Type::Float, |b, x, y| {
    b.arith(ArithOp::Div, Type::Float, x, y).into()
  });
  let text = print(vec![bump_three_times(), ratio]);

  for function in text.split("define ").skip(1) {
    let slots: Vec<u32> = function
      .lines()
      .filter_map(|line| line.trim().strip_prefix('%')?.split(" = ").next()?.parse().ok())
      .collect();
    assert!(!slots.is_empty());
    assert_eq!(slots, (0..slots.len() as u32).collect::<Vec<_>>());
  }
}

#[test]
fn phi_carries_values_around_a_back_edge() {
  let result = eval(bump_three_times(), vec![RtValue::int(64, 10)]);
  assert_eq!(result, Some(RtValue::int(64, 13)));
}

#[test]
fn each_source_block_becomes_one_machine_block() {
  let module = lower(vec![bump_three_times()]);
  let labels: Vec<_> = module.functions[0]
    .blocks
    .get_all()
    .iter()
    .map(|block| block.label.as_str())
    .collect();
  assert_eq!(labels, vec!["entry", "loop", "exit"]);
}

#[test]
fn division_always_produces_a_float() {
  let ratio = binary("ratio", (Type::Int(32), Type::Int(32)), Type::Float, |b, x, y| {
    b.arith(ArithOp::Div, Type::Float, x, y).into()
  });

  let text = print(vec![ratio.clone()]);
  assert!(text.contains("fdiv double"));
  assert!(!text.contains("sdiv"));

  let result = eval(ratio, vec![RtValue::i32(7), RtValue::i32(2)]);
  assert_eq!(result, Some(RtValue::Double(3.5)));
}

#[test]
fn float_floor_division_rounds_to_nearest() {
  let halve = binary("halve", (Type::Float, Type::Float), Type::Float, |b, x, y| {
    b.arith(ArithOp::FloorDiv, Type::Float, x, y).into()
  });

  let module = lower(vec![halve]);
  assert!(module.is_declared(Intrinsic::Round));
  assert!(print_module(&module).contains("call double @llvm.round.f64("));

  // 7 / 2 = 3.5 rounds away from zero, not down
  let result = run(&module, "halve", vec![RtValue::Double(7.0), RtValue::Double(2.0)]).unwrap();
  assert_eq!(result, Some(RtValue::Double(4.0)));
}

#[test]
fn integer_arithmetic_stays_signed() {
  let quotient = binary("quotient", (Type::Int(32), Type::Int(32)), Type::Int(32), |b, x, y| {
    b.arith(ArithOp::FloorDiv, Type::Int(32), x, y).into()
  });
  assert!(print(vec![quotient.clone()]).contains("sdiv i32"));
  assert_eq!(eval(quotient, vec![RtValue::i32(9), RtValue::i32(2)]), Some(RtValue::i32(4)));

  let shift = binary("shift", (Type::Int(32), Type::Int(32)), Type::Int(32), |b, x, y| {
    b.arith(ArithOp::RShift, Type::Int(32), x, y).into()
  });
  assert_eq!(eval(shift, vec![RtValue::i32(-8), RtValue::i32(1)]), Some(RtValue::i32(-4)));

  let rem = binary("rem", (Type::Int(64), Type::Int(64)), Type::Int(64), |b, x, y| {
    b.arith(ArithOp::Mod, Type::Int(64), x, y).into()
  });
  assert_eq!(eval(rem, vec![RtValue::int(64, 17), RtValue::int(64, 5)]), Some(RtValue::int(64, 2)));
}

#[test]
fn remaining_integer_operators() {
  let cases = [
    (ArithOp::Sub, "sub i32", 3, 10, -7),
    (ArithOp::LShift, "shl i32", 1, 4, 16),
    (ArithOp::BitAnd, "and i32", 6, 3, 2),
    (ArithOp::BitOr, "or i32", 6, 1, 7),
  ];

  for (operator, mnemonic, lhs, rhs, expected) in cases {
    let func = binary("op", (Type::Int(32), Type::Int(32)), Type::Int(32), |b, x, y| {
      b.arith(operator, Type::Int(32), x, y).into()
    });
    let module = lower(vec![func]);
    assert!(print_module(&module).contains(mnemonic), "{}", operator.symbol());

    let result = run(&module, "op", vec![RtValue::i32(lhs), RtValue::i32(rhs)]).unwrap();
    assert_eq!(result, Some(RtValue::i32(expected)), "{} {} {}", lhs, operator.symbol(), rhs);
  }
}

#[test]
fn float_remainder_keeps_the_sign_of_the_dividend() {
  let rem = binary("frem", (Type::Float, Type::Float), Type::Float, |b, x, y| {
    b.arith(ArithOp::Mod, Type::Float, x, y).into()
  });

  let module = lower(vec![rem]);
  assert!(print_module(&module).contains("frem double %a, %b"));
  let result = run(&module, "frem", vec![RtValue::Double(-7.5), RtValue::Double(2.0)]).unwrap();
  assert_eq!(result, Some(RtValue::Double(-1.5)));
}

#[test]
fn integers_wider_than_sixty_four_bits_are_rejected() {
  let wide = binary("wide", (Type::Int(128), Type::Int(128)), Type::Int(128), |b, x, y| {
    b.arith(ArithOp::Mul, Type::Int(128), x, y).into()
  });

  let error = lower_err(vec![wide]);
  assert!(matches!(error.root(), LowerError::UnsupportedType { ty: Type::Int(128), .. }));
}

#[test]
fn mixed_operands_are_converted_to_float() {
  let add = binary("mixed", (Type::Int(32), Type::Float), Type::Float, |b, x, y| {
    b.arith(ArithOp::Add, Type::Float, x, y).into()
  });
  assert_eq!(eval(add, vec![RtValue::i32(2), RtValue::Double(0.5)]), Some(RtValue::Double(2.5)));
}

#[test]
fn integer_powers_go_through_powi() {
  let pow = binary("ipow", (Type::Int(32), Type::Int(64)), Type::Int(32), |b, x, y| {
    b.arith(ArithOp::Pow, Type::Int(32), x, y).into()
  });

  let module = lower(vec![pow]);
  let text = print_module(&module);
  assert!(text.contains("trunc i64 %b to i32"));
  assert!(text.contains("@llvm.powi.f64("));
  assert!(text.contains("fptosi double"));

  let result = run(&module, "ipow", vec![RtValue::i32(3), RtValue::int(64, 4)]).unwrap();
  assert_eq!(result, Some(RtValue::i32(81)));
}

#[test]
fn float_powers_call_pow() {
  let pow = binary("fpow", (Type::Float, Type::Float), Type::Float, |b, x, y| {
    b.arith(ArithOp::Pow, Type::Float, x, y).into()
  });

  let result = eval(pow, vec![RtValue::Double(2.0), RtValue::Double(0.5)]);
  let Some(RtValue::Double(value)) = result else {
    panic!("expected a double, got {:?}", result);
  };
  assert!((value - std::f64::consts::SQRT_2).abs() < 1e-12);
}

#[test]
fn bitwise_operators_accept_booleans() {
  let xor = binary("xor", (Type::Bool, Type::Bool), Type::Bool, |b, x, y| {
    b.arith(ArithOp::BitXor, Type::Bool, x, y).into()
  });
  assert_eq!(eval(xor, vec![RtValue::bool(true), RtValue::bool(false)]), Some(RtValue::bool(true)));
}

#[test]
fn narrow_integers_sign_extend() {
  let mut b = FunctionBuilder::new("widen", vec![], Type::Int(32));
  let wide = b.coerce(Type::Int(32), Operand::int(8, -1));
  b.ret(Some(wide.into()));

  assert_eq!(eval(b.finish(), vec![]), Some(RtValue::i32(-1)));
}

#[test]
fn coercions_follow_the_numeric_table() {
  let truncate = unary("truncate", Type::Float, Type::Int(64), |b, a| b.coerce(Type::Int(64), a).into());
  assert_eq!(eval(truncate, vec![RtValue::Double(-2.75)]), Some(RtValue::int(64, -2)));

  let narrow = unary("narrow", Type::Int(32), Type::Int(8), |b, a| b.coerce(Type::Int(8), a).into());
  assert_eq!(eval(narrow, vec![RtValue::i32(300)]), Some(RtValue::int(8, 44)));

  let same = unary("same", Type::Float, Type::Float, |b, a| b.coerce(Type::Float, a).into());
  let text = print(vec![same]);
  assert!(text.contains("ret double %a"));
}

#[test]
fn comparisons_with_nan_are_false() {
  for operator in CompareOp::ALL {
    let compare = unary("compare", Type::Float, Type::Bool, |b, a| {
      b.compare(operator, a, Operand::float(1.0)).into()
    });
    let result = eval(compare, vec![RtValue::Double(f64::NAN)]);
    assert_eq!(result, Some(RtValue::bool(false)), "NaN {} 1.0", operator.symbol());
  }
}

#[test]
fn float_on_either_side_compares_as_float() {
  let below = binary("below", (Type::Int(32), Type::Float), Type::Bool, |b, x, y| {
    b.compare(CompareOp::Lt, x, y).into()
  });

  let module = lower(vec![below]);
  let text = print_module(&module);
  assert!(text.contains("sitofp i32 %a to double"));
  assert!(text.contains("fcmp olt double"));

  let result = run(&module, "below", vec![RtValue::i32(1), RtValue::Double(1.5)]).unwrap();
  assert_eq!(result, Some(RtValue::bool(true)));
  let result = run(&module, "below", vec![RtValue::i32(2), RtValue::Double(1.5)]).unwrap();
  assert_eq!(result, Some(RtValue::bool(false)));
}

#[test]
fn integer_comparisons_are_signed() {
  let less = binary("less", (Type::Int(8), Type::Int(32)), Type::Bool, |b, x, y| {
    b.compare(CompareOp::Lt, x, y).into()
  });

  let module = lower(vec![less]);
  assert!(print_module(&module).contains("icmp slt i32"));
  let result = run(&module, "less", vec![RtValue::int(8, -1), RtValue::i32(0)]).unwrap();
  assert_eq!(result, Some(RtValue::bool(true)));
}

#[test]
fn attribute_reads_and_writes_share_an_index() {
  let y_index = point().attribute_index("y");
  assert_eq!(y_index, Some(1));

  let mut b = FunctionBuilder::new("move_y", vec![("y", Type::Float)], Type::Float);
  let y = b.arg(0);
  let origin = b.alloc(point(), vec![Operand::i32(1), Operand::float(0.5)]);
  let moved = b.set_attr(point(), origin.into(), "y", y);
  let read = b.get_attr(Type::Float, moved.into(), "y");
  b.ret(Some(read.into()));
  let func = b.finish();

  let module = lower(vec![func]);
  let text = print_module(&module);
  assert!(text.contains("double %y, 1\n"));
  assert!(text.lines().any(|line| line.contains("extractvalue") && line.ends_with(", 1")));

  let result = run(&module, "move_y", vec![RtValue::Double(4.0)]).unwrap();
  assert_eq!(result, Some(RtValue::Double(4.0)));
}

#[test]
fn mutable_objects_are_accessed_through_field_pointers() {
  let mut b = FunctionBuilder::new("tally", vec![("stats", counter())], Type::Int(32));
  let stats = b.arg(0);
  b.set_attr(Type::None, stats.clone(), "misses", Operand::i32(3));
  let misses = b.get_attr(Type::Int(32), stats, "misses");
  b.ret(Some(misses.into()));

  let text = print(vec![b.finish()]);
  let field = "getelementptr { i32, i32 }, { i32, i32 }* %stats, i32 0, i32 1";
  assert_eq!(text.matches(field).count(), 2);
  assert!(text.contains("store i32 3"));
}

#[test]
fn range_attributes_follow_start_stop_step() {
  let range = Type::range(Type::Int(64));
  let mut b = FunctionBuilder::new("step_of", vec![], Type::Int(64));
  let r = b.alloc(
    range,
    vec![Operand::int(64, 0), Operand::int(64, 10), Operand::int(64, 2)],
  );
  let step = b.get_attr(Type::Int(64), r.into(), "step");
  b.ret(Some(step.into()));

  assert_eq!(eval(b.finish(), vec![]), Some(RtValue::int(64, 2)));
}

#[test]
fn outer_variables_cost_one_load_per_frame() {
  let (_, _, inner) = frames();
  let mut b = FunctionBuilder::new("read_g", vec![("env", Type::Environment(inner))], Type::Float);
  let env = b.arg(0);
  let g = b.get_local(Type::Float, env, "g");
  b.ret(Some(g.into()));

  let text = print(vec![b.finish()]);
  let body: Vec<_> = text
    .lines()
    .filter(|line| line.contains(" = load ") || line.contains(" = getelementptr "))
    .map(|line| if line.contains(" = load ") { "load" } else { "gep" })
    .collect();
  assert_eq!(body, vec!["gep", "load", "gep", "load", "gep", "load"]);
  assert!(text.contains("load double, double*"));
}

#[test]
fn frames_link_through_outer_and_reach_the_root() {
  let (root, middle, inner) = frames();
  let root_ty = Type::Environment(root);

  let mut b = FunctionBuilder::new("globals", vec![], Type::Float);
  let outer = b.alloc(root_ty.clone(), vec![]);
  let mid = b.alloc(Type::Environment(middle), vec![]);
  let innermost = b.alloc(Type::Environment(inner), vec![]);
  b.set_local(mid.into(), OUTER_FIELD, outer.into());
  b.set_local(innermost.into(), OUTER_FIELD, mid.into());
  b.set_local(innermost.into(), "g", Operand::float(2.5));
  b.set_local(innermost.into(), "m", Operand::i32(7));
  let global = b.builtin("globalenv", root_ty.clone(), vec![innermost.into()]);
  let g = b.get_local(Type::Float, global.into(), "g");
  // The link itself is readable like any other slot.
  let parent = b.get_local(root_ty, mid.into(), OUTER_FIELD);
  let via_parent = b.get_local(Type::Float, parent.into(), "g");
  let total = b.arith(ArithOp::Add, Type::Float, g.into(), via_parent.into());
  b.ret(Some(total.into()));

  assert_eq!(eval(b.finish(), vec![]), Some(RtValue::Double(5.0)));
}

#[test]
fn list_length_round_trips() {
  let list = Type::list(Type::Int(64));
  let pair = Type::Tuple(vec![Type::Int(32), Type::Int(64)]);

  let mut b = FunctionBuilder::new("fill", vec![], pair.clone());
  let items = b.alloc(list, vec![Operand::i32(5)]);
  b.set_elem(items.into(), Operand::i32(2), Operand::int(64, 42));
  let item = b.get_elem(Type::Int(64), items.into(), Operand::i32(2));
  let len = b.builtin("len", Type::Int(32), vec![items.into()]);
  let result = b.alloc(pair, vec![len.into(), item.into()]);
  b.ret(Some(result.into()));

  let result = eval(b.finish(), vec![]);
  assert_eq!(result, Some(RtValue::Struct(vec![RtValue::i32(5), RtValue::int(64, 42)])));
}

#[test]
fn unwrap_picks_payload_or_default() {
  let option = Type::option(Type::Int(64));

  let mut b = FunctionBuilder::new(
    "pick",
    vec![("flag", Type::Bool), ("payload", Type::Int(64)), ("default", Type::Int(64))],
    Type::Int(64),
  );
  let (flag, payload, default) = (b.arg(0), b.arg(1), b.arg(2));
  let opt = b.alloc(option.clone(), vec![flag, payload]);
  let value = b.builtin("unwrap", Type::Int(64), vec![opt.into(), default]);
  b.ret(Some(value.into()));
  let pick = b.finish();

  let mut b = FunctionBuilder::new("absent", vec![("default", Type::Int(64))], Type::Int(64));
  let default = b.arg(0);
  let none = b.alloc(option, vec![Operand::bool(false)]);
  let value = b.builtin("unwrap", Type::Int(64), vec![none.into(), default]);
  b.ret(Some(value.into()));
  let absent = b.finish();

  let module = lower(vec![pick, absent]);
  let args = |flag| vec![RtValue::bool(flag), RtValue::int(64, 7), RtValue::int(64, 9)];
  assert_eq!(run(&module, "pick", args(true)).unwrap(), Some(RtValue::int(64, 7)));
  assert_eq!(run(&module, "pick", args(false)).unwrap(), Some(RtValue::int(64, 9)));
  assert_eq!(
    run(&module, "absent", vec![RtValue::int(64, 5)]).unwrap(),
    Some(RtValue::int(64, 5))
  );
}

#[test]
fn round_to_an_integer_converts_after_rounding() {
  let nearest = unary("nearest", Type::Float, Type::Int(64), |b, a| {
    b.builtin("round", Type::Int(64), vec![a]).into()
  });

  let module = lower(vec![nearest]);
  assert_eq!(
    run(&module, "nearest", vec![RtValue::Double(2.5)]).unwrap(),
    Some(RtValue::int(64, 3))
  );
  assert_eq!(
    run(&module, "nearest", vec![RtValue::Double(-2.5)]).unwrap(),
    Some(RtValue::int(64, -3))
  );
}

#[test]
fn raise_is_terminal() {
  let mut b = FunctionBuilder::new("fail", vec![], Type::None);
  b.raise(None);

  let module = lower(vec![b.finish()]);
  assert_eq!(
    print_function(&module.functions[0]),
    "define void @fail() {\nentry:\n  call void @llvm.trap()\n  unreachable\n}\n"
  );
  assert!(module.is_declared(Intrinsic::Trap));
  assert_eq!(run(&module, "fail", vec![]), Err(InterpError::Trap));
}

#[test]
fn none_returns_are_void_but_none_arguments_are_empty_structs() {
  let mut b = FunctionBuilder::new("ignore", vec![("unit", Type::None)], Type::None);
  b.builtin("nop", Type::None, vec![]);
  b.ret(None);

  let module = lower(vec![b.finish()]);
  let text = print_module(&module);
  assert!(text.contains("define void @ignore({} %unit)"));
  assert!(text.contains("call void @llvm.donothing()"));
  assert!(text.contains("ret void"));
  assert_eq!(run(&module, "ignore", vec![RtValue::Struct(vec![])]).unwrap(), None);
}

#[test]
fn select_chooses_between_values() {
  let mut b = FunctionBuilder::new("max", vec![("a", Type::Int(32)), ("b", Type::Int(32))], Type::Int(32));
  let (x, y) = (b.arg(0), b.arg(1));
  let greater = b.compare(CompareOp::Gt, x.clone(), y.clone());
  let max = b.select(Type::Int(32), greater.into(), x, y);
  b.ret(Some(max.into()));

  assert_eq!(eval(b.finish(), vec![RtValue::i32(3), RtValue::i32(8)]), Some(RtValue::i32(8)));
}

#[test]
fn unknown_builtins_are_rejected_with_their_location() {
  let weird = unary("weird", Type::Int(32), Type::Int(32), |b, a| {
    b.builtin("frobnicate", Type::Int(32), vec![a]).into()
  });

  let error = lower_err(vec![weird]);
  assert!(matches!(error.root(), LowerError::UnknownBuiltin { name } if name == "frobnicate"));
  assert_eq!(error.code(), "LOW0009");
  assert_eq!(
    error.to_string(),
    "LOW0009 Unknown builtin 'frobnicate' (function=weird, block=entry, instr=0 'builtin')"
  );
}

#[test]
fn builtin_arity_is_checked() {
  let len = unary("len", Type::list(Type::Float), Type::Int(32), |b, _| {
    b.builtin("len", Type::Int(32), vec![]).into()
  });

  let error = lower_err(vec![len]);
  assert!(matches!(
    error.root(),
    LowerError::BuiltinArity {
      name: "len",
      expected: 1,
      actual: 0
    }
  ));
}

#[test]
fn instructions_without_a_lowering_are_rejected() {
  let mut b = FunctionBuilder::new("calls", vec![("f", Type::Int(32))], Type::Int(32));
  let callee = b.arg(0);
  let call = b.append(Instruction::new(
    Type::Int(32),
    InstrKind::Call {
      callee,
      args: Vec::new(),
    },
  ));
  b.ret(Some(call.into()));

  let error = lower_err(vec![b.finish()]);
  assert!(matches!(error.root(), LowerError::UnsupportedInstruction { opcode: "call" }));
}

#[test]
fn unresolved_variables_are_rejected() {
  let (_, _, inner) = frames();
  let mut b = FunctionBuilder::new("lost", vec![("env", Type::Environment(inner))], Type::Float);
  let env = b.arg(0);
  let missing = b.get_local(Type::Float, env, "nowhere");
  b.ret(Some(missing.into()));

  let error = lower_err(vec![b.finish()]);
  assert!(matches!(error.root(), LowerError::UnresolvedVariable { name, .. } if name == "nowhere"));
}

#[test]
fn mutable_objects_cannot_be_allocated() {
  let mut b = FunctionBuilder::new("fresh", vec![], Type::None);
  b.alloc(counter(), vec![]);
  b.ret(None);

  let error = lower_err(vec![b.finish()]);
  assert!(matches!(error.root(), LowerError::UnsupportedAlloc { .. }));
}

#[test]
fn invalid_coercions_and_attributes_are_rejected() {
  let coerce = unary("flag_to_float", Type::Bool, Type::Float, |b, a| b.coerce(Type::Float, a).into());
  assert!(matches!(
    lower_err(vec![coerce]).root(),
    LowerError::UnsupportedCoercion {
      from: Type::Bool,
      to: Type::Float
    }
  ));

  let attr = unary("z_of", point(), Type::Float, |b, a| b.get_attr(Type::Float, a, "z").into());
  assert!(matches!(
    lower_err(vec![attr]).root(),
    LowerError::UnknownAttribute { attr, .. } if attr == "z"
  ));
}

#[test]
fn blocks_without_terminators_fail_verification() {
  let mut b = FunctionBuilder::new("open", vec![("a", Type::Int(32))], Type::Int(32));
  let a = b.arg(0);
  b.arith(ArithOp::Add, Type::Int(32), a, Operand::i32(1));

  let error = lower_err(vec![b.finish()]);
  assert!(matches!(error, LowerError::VerificationFailed { ref function, .. } if function == "open"));
  assert_eq!(error.code(), "LOW0013");

  // Without verification the open block is handed back as is.
  let mut b = FunctionBuilder::new("open", vec![("a", Type::Int(32))], Type::Int(32));
  let a = b.arg(0);
  b.arith(ArithOp::Add, Type::Int(32), a, Operand::i32(1));
  assert!(lower_function(&b.finish()).is_ok());
}

#[test]
fn parallel_lowering_matches_sequential() {
  let functions = vec![
    bump_three_times(),
    binary("ratio", (Type::Int(32), Type::Int(32)), Type::Float, |b, x, y| {
      b.arith(ArithOp::Div, Type::Float, x, y).into()
    }),
    binary("halve", (Type::Float, Type::Float), Type::Float, |b, x, y| {
      b.arith(ArithOp::FloorDiv, Type::Float, x, y).into()
    }),
    unary("nearest", Type::Float, Type::Int(64), |b, a| {
      b.builtin("round", Type::Int(64), vec![a]).into()
    }),
    binary("ipow", (Type::Int(32), Type::Int(32)), Type::Int(32), |b, x, y| {
      b.arith(ArithOp::Pow, Type::Int(32), x, y).into()
    }),
  ];
  let module = module_of(functions);

  let sequential = lower_module(&module, &LowerOptions::default()).unwrap();
  let parallel = lower_module(
    &module,
    &LowerOptions {
      verify: true,
      workers: 4,
      module_name: String::new(),
    },
  )
  .unwrap();

  assert_eq!(print_module(&sequential), print_module(&parallel));
  assert_eq!(parallel.declarations.len(), 2);
}

#[test]
fn first_error_in_source_order_wins_in_parallel() {
  let bad = |name: &str, builtin: &str| {
    unary(name, Type::Int(32), Type::Int(32), |b, a| b.builtin(builtin, Type::Int(32), vec![a]).into())
  };
  let module = module_of(vec![bump_three_times(), bad("first", "one"), bad("second", "two")]);

  let options = LowerOptions {
    workers: 3,
    ..Default::default()
  };
  let error = lower_module(&module, &options).unwrap_err();
  assert!(matches!(error.root(), LowerError::UnknownBuiltin { name } if name == "one"));
}

#[test]
fn module_name_can_be_overridden() {
  let options = LowerOptions {
    module_name: "kernel".to_string(),
    ..Default::default()
  };
  let module = lower_module(&module_of(vec![bump_three_times()]), &options).unwrap();
  assert_eq!(module.name, "kernel");
  assert!(print_module(&module).starts_with("; ModuleID = 'kernel'"));
}
