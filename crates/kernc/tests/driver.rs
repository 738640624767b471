mod common;

use common::{demo_path, quiet_config, write_temp};
use insta::assert_snapshot;
use kernc::{lower_file, parse_arguments, run_file, stats::stats_rows};
use kernc_ir::{ArithOp, FunctionBuilder, Module};
use kernc_mir::interp::RtValue;
use kernc_type::Type;

fn args(values: &[&str]) -> Vec<String> {
  values.iter().map(|value| value.to_string()).collect()
}

#[test]
fn lowers_the_demo_module_to_a_file() {
  let dir = tempfile::tempdir().unwrap();
  let output = dir.path().join("kernel.ll");

  let module = lower_file(&quiet_config(), &demo_path(), Some(&output), false).unwrap();
  assert_eq!(module.name, "kernel");

  let text = std::fs::read_to_string(&output).unwrap();
  assert_snapshot!(text.trim_end(), @r###"
  ; ModuleID = 'kernel'

  define i64 @sum_to(i64 %n) {
  entry:
    br label %loop

  loop:
    %i = phi i64 [ 0, %entry ], [ %i.next, %loop ]
    %acc = phi i64 [ 0, %entry ], [ %acc.next, %loop ]
    %i.next = add i64 %i, 1
    %acc.next = add i64 %acc, %i.next
    %done = icmp sge i64 %i.next, %n
    br i1 %done, label %exit, label %loop

  exit:
    ret i64 %acc.next
  }

  define double @mean(i64 %a, i64 %b) {
  entry:
    %total = add i64 %a, %b
    %0 = sitofp i64 %total to double
    %1 = sitofp i64 2 to double
    %mean = fdiv double %0, %1
    ret double %mean
  }
  "###);
}

#[test]
fn runs_functions_from_the_demo_module() {
  let config = quiet_config();

  let sum = run_file(&config, &demo_path(), "sum_to", &args(&["4"])).unwrap();
  assert_eq!(sum, Some(RtValue::int(64, 10)));

  let mean = run_file(&config, &demo_path(), "mean", &args(&["3", "4"])).unwrap();
  assert_eq!(mean, Some(RtValue::Double(3.5)));
}

#[test]
fn stats_count_blocks_instructions_and_phis() {
  let module = lower_file(&quiet_config(), &demo_path(), Some(&std::env::temp_dir().join("kernc_stats.ll")), false)
    .unwrap();

  assert_eq!(
    stats_rows(&module),
    vec![
      vec!["sum_to".to_string(), "3".to_string(), "8".to_string(), "2".to_string()],
      vec!["mean".to_string(), "1".to_string(), "5".to_string(), "0".to_string()],
    ]
  );
}

#[test]
fn arguments_are_parsed_by_parameter_type() {
  let module = lower_file(&quiet_config(), &demo_path(), Some(&std::env::temp_dir().join("kernc_args.ll")), false)
    .unwrap();
  let sum_to = module.function("sum_to").unwrap();

  assert_eq!(parse_arguments(sum_to, &args(&["-3"])).unwrap(), vec![RtValue::int(64, -3)]);
  assert_eq!(
    parse_arguments(sum_to, &args(&["three"])).unwrap_err(),
    "argument 0 ('three') is not a valid i64"
  );
  assert_eq!(
    parse_arguments(sum_to, &args(&[])).unwrap_err(),
    "'sum_to' takes 1 arguments, 0 given"
  );
}

#[test]
fn modules_written_by_the_builder_round_trip_through_json() {
  let mut b = FunctionBuilder::new("twice", vec![("x", Type::Float)], Type::Float);
  let x = b.arg(0);
  let doubled = b.arith(ArithOp::Mul, Type::Float, x.clone(), x);
  b.ret(Some(doubled.into()));

  let mut module = Module::new("generated");
  module.functions.push(b.finish());
  let (_dir, path) = write_temp("generated.json", &module.to_json().unwrap());

  let result = run_file(&quiet_config(), &path, "twice", &args(&["1.25"])).unwrap();
  assert_eq!(result, Some(RtValue::Double(2.5)));
}

#[test]
fn failures_are_reported_as_errors() {
  let config = quiet_config();

  let missing = std::env::temp_dir().join("kernc_no_such_dir").join("missing.json");
  assert!(lower_file(&config, &missing, None, false).is_err());

  let (_dir, garbage) = write_temp("garbage.json", "{ \"name\": 3 }");
  assert!(lower_file(&config, &garbage, None, false).is_err());

  assert!(run_file(&config, &demo_path(), "missing", &[]).is_err());
  assert!(run_file(&config, &demo_path(), "sum_to", &args(&["1", "2"])).is_err());
}

#[test]
fn internal_compiler_errors_reject_the_module() {
  let mut b = FunctionBuilder::new("odd", vec![("x", Type::Int(32))], Type::Int(32));
  let x = b.arg(0);
  let odd = b.builtin("mystery", Type::Int(32), vec![x]);
  b.ret(Some(odd.into()));

  let mut module = Module::new("broken");
  module.functions.push(b.finish());
  let (dir, path) = write_temp("broken.json", &module.to_json().unwrap());
  let output = dir.path().join("broken.ll");

  assert!(lower_file(&quiet_config(), &path, Some(&output), false).is_err());
  assert!(!output.exists());
}

#[test]
fn empty_modules_lower_to_an_empty_file() {
  let (dir, path) = write_temp("empty.json", &Module::new("empty").to_json().unwrap());
  let output = dir.path().join("empty.ll");

  let module = lower_file(&quiet_config(), &path, Some(&output), false).unwrap();
  assert!(module.functions.is_empty());
  assert_eq!(std::fs::read_to_string(&output).unwrap(), "; ModuleID = 'empty'\n");
}
