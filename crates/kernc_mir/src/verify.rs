use std::collections::HashSet;
use std::fmt;

use crate::{BlockId, Instr, MirBlock, MirFunction, MirModule, MirType, Operand, Terminator, ValueId};

/// Errors found during machine IR verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyError {
  /// A block was left without a terminator.
  MissingTerminator { function: String, block: String },

  /// Reference to a non-existent block.
  InvalidBlockRef {
    function: String,
    block: String,
    target: BlockId,
  },

  /// Reference to a non-existent value.
  InvalidValueRef {
    function: String,
    block: String,
    value: ValueId,
  },

  /// A value is defined by more than one instruction.
  DuplicateDefinition {
    function: String,
    block: String,
    value: ValueId,
  },

  /// A phi follows a non-phi instruction.
  PhiNotAtBlockStart { function: String, block: String },

  /// The incoming blocks of a phi differ from the block's predecessors.
  PhiIncomingMismatch {
    function: String,
    block: String,
    expected: Vec<String>,
    actual: Vec<String>,
  },

  /// Branch condition is not an `i1`.
  NonBoolBranchCondition {
    function: String,
    block: String,
    actual: MirType,
  },

  ReturnTypeMismatch {
    function: String,
    block: String,
    expected: MirType,
    actual: MirType,
  },

  MissingReturnValue {
    function: String,
    block: String,
    expected: MirType,
  },

  UnexpectedReturnValue { function: String, block: String },

  /// Two operands that must agree in type do not.
  OperandTypeMismatch {
    function: String,
    block: String,
    context: &'static str,
    expected: MirType,
    actual: MirType,
  },

  /// Store through a pointer whose pointee differs from the stored value.
  StoreTypeMismatch {
    function: String,
    block: String,
    pointee: MirType,
    value: MirType,
  },

  /// Call to a symbol that is neither defined nor declared in the module.
  UndeclaredCallee {
    function: String,
    block: String,
    callee: String,
  },

  CallArityMismatch {
    function: String,
    block: String,
    callee: String,
    expected: usize,
    actual: usize,
  },
}

impl fmt::Display for VerifyError {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    match self {
      VerifyError::MissingTerminator { function, block } => {
        write!(f, "VER0001 {}:{}: block has no terminator", function, block)
      },
      VerifyError::InvalidBlockRef {
        function,
        block,
        target,
      } => write!(f, "VER0002 {}:{}: reference to unknown block #{}", function, block, target.index()),
      VerifyError::InvalidValueRef { function, block, value } => {
        write!(f, "VER0003 {}:{}: reference to unknown value #{}", function, block, value.index())
      },
      VerifyError::DuplicateDefinition { function, block, value } => {
        write!(f, "VER0004 {}:{}: value #{} defined twice", function, block, value.index())
      },
      VerifyError::PhiNotAtBlockStart { function, block } => {
        write!(f, "VER0005 {}:{}: phi after a non-phi instruction", function, block)
      },
      VerifyError::PhiIncomingMismatch {
        function,
        block,
        expected,
        actual,
      } => write!(
        f,
        "VER0006 {}:{}: phi incoming blocks [{}] do not match predecessors [{}]",
        function,
        block,
        actual.join(", "),
        expected.join(", ")
      ),
      VerifyError::NonBoolBranchCondition { function, block, actual } => {
        write!(f, "VER0007 {}:{}: branch condition has type {}, expected i1", function, block, actual)
      },
      VerifyError::ReturnTypeMismatch {
        function,
        block,
        expected,
        actual,
      } => write!(
        f,
        "VER0008 {}:{}: returns {}, function returns {}",
        function, block, actual, expected
      ),
      VerifyError::MissingReturnValue {
        function,
        block,
        expected,
      } => write!(f, "VER0009 {}:{}: 'ret void' in function returning {}", function, block, expected),
      VerifyError::UnexpectedReturnValue { function, block } => {
        write!(f, "VER0010 {}:{}: value returned from void function", function, block)
      },
      VerifyError::OperandTypeMismatch {
        function,
        block,
        context,
        expected,
        actual,
      } => write!(
        f,
        "VER0011 {}:{}: {} operand has type {}, expected {}",
        function, block, context, actual, expected
      ),
      VerifyError::StoreTypeMismatch {
        function,
        block,
        pointee,
        value,
      } => write!(f, "VER0012 {}:{}: store of {} through {}*", function, block, value, pointee),
      VerifyError::UndeclaredCallee {
        function,
        block,
        callee,
      } => write!(f, "VER0013 {}:{}: call to undeclared '@{}'", function, block, callee),
      VerifyError::CallArityMismatch {
        function,
        block,
        callee,
        expected,
        actual,
      } => write!(
        f,
        "VER0014 {}:{}: '@{}' takes {} arguments, {} given",
        function, block, callee, expected, actual
      ),
    }
  }
}

impl std::error::Error for VerifyError {}

/// Machine IR verification result.
pub type VerifyResult = Result<(), Vec<VerifyError>>;

/// Structural and type checks over lowered functions.
pub struct MirVerifier<'a> {
  module: &'a MirModule,
  errors: Vec<VerifyError>,
}

impl<'a> MirVerifier<'a> {
  pub fn new(module: &'a MirModule) -> Self {
    Self {
      module,
      errors: Vec::new(),
    }
  }

  pub fn verify(mut self) -> VerifyResult {
    for func in &self.module.functions {
      self.verify_function(func);
    }
    self.finish()
  }

  fn finish(self) -> VerifyResult {
    if self.errors.is_empty() {
      Ok(())
    } else {
      Err(self.errors)
    }
  }

  fn verify_function(
    &mut self,
    func: &MirFunction,
  ) {
    let mut defined: HashSet<ValueId> = func.params.iter().copied().collect();

    for (id, block) in func.blocks.iter() {
      self.verify_block(func, id, block, &mut defined);
    }
  }

  fn verify_block(
    &mut self,
    func: &MirFunction,
    id: BlockId,
    block: &MirBlock,
    defined: &mut HashSet<ValueId>,
  ) {
    let site = Site {
      function: &func.name,
      block: &block.label,
    };
    let mut seen_non_phi = false;

    for instr in &block.instructions {
      match instr {
        Instr::Phi { .. } if seen_non_phi => {
          self.errors.push(VerifyError::PhiNotAtBlockStart {
            function: site.function(),
            block: site.block(),
          });
        },
        Instr::Phi { .. } => {},
        _ => seen_non_phi = true,
      }

      for operand in instr.operands() {
        self.check_operand(func, &site, operand);
      }

      if let Some(dest) = instr.dest() {
        if func.values.try_get(&dest).is_none() {
          self.errors.push(VerifyError::InvalidValueRef {
            function: site.function(),
            block: site.block(),
            value: dest,
          });
        } else if !defined.insert(dest) {
          self.errors.push(VerifyError::DuplicateDefinition {
            function: site.function(),
            block: site.block(),
            value: dest,
          });
        }
      }

      self.verify_instr(func, id, &site, instr);
    }

    match &block.terminator {
      Some(term) => self.verify_terminator(func, &site, term),
      None => self.errors.push(VerifyError::MissingTerminator {
        function: site.function(),
        block: site.block(),
      }),
    }
  }

  fn verify_instr(
    &mut self,
    func: &MirFunction,
    block: BlockId,
    site: &Site<'_>,
    instr: &Instr,
  ) {
    match instr {
      Instr::Phi { dest, incoming } => {
        let mut expected: Vec<BlockId> = func.predecessors(block);
        let mut actual: Vec<BlockId> = incoming.iter().map(|(_, pred)| *pred).collect();
        for pred in &actual {
          self.check_block(func, site, *pred);
        }
        expected.sort();
        expected.dedup();
        actual.sort();
        actual.dedup();
        if expected != actual {
          self.errors.push(VerifyError::PhiIncomingMismatch {
            function: site.function(),
            block: site.block(),
            expected: expected.iter().map(|id| label(func, *id)).collect(),
            actual: actual.iter().map(|id| label(func, *id)).collect(),
          });
        }
        if let Some(ty) = defined_type(func, *dest) {
          for (value, _) in incoming {
            self.check_same_type(func, site, "phi", &ty, value);
          }
        }
      },
      Instr::Store { ptr, value } => {
        let (Some(ptr_ty), Some(value_ty)) = (operand_type(func, ptr), operand_type(func, value)) else {
          return;
        };
        match ptr_ty.pointee() {
          Some(pointee) if *pointee != value_ty => self.errors.push(VerifyError::StoreTypeMismatch {
            function: site.function(),
            block: site.block(),
            pointee: pointee.clone(),
            value: value_ty,
          }),
          Some(_) => {},
          None => self.errors.push(VerifyError::OperandTypeMismatch {
            function: site.function(),
            block: site.block(),
            context: "store",
            expected: value_ty.ptr(),
            actual: ptr_ty,
          }),
        }
      },
      Instr::Binary { lhs, rhs, .. } | Instr::ICmp { lhs, rhs, .. } | Instr::FCmp { lhs, rhs, .. } => {
        if let Some(lhs_ty) = operand_type(func, lhs) {
          self.check_same_type(func, site, "binary", &lhs_ty, rhs);
        }
      },
      Instr::Select {
        cond,
        if_true,
        if_false,
        ..
      } => {
        self.check_same_type(func, site, "select condition", &MirType::I1, cond);
        if let Some(ty) = operand_type(func, if_true) {
          self.check_same_type(func, site, "select", &ty, if_false);
        }
      },
      Instr::InsertValue {
        dest, aggregate, value, index,
      } => {
        let Some(ty) = defined_type(func, *dest) else {
          return;
        };
        self.check_same_type(func, site, "insertvalue", &ty, aggregate);
        if let Some(field) = ty.field(*index) {
          self.check_same_type(func, site, "insertvalue", field, value);
        }
      },
      Instr::Call { callee, args, .. } => self.verify_call(func, site, callee, args),
      Instr::Alloca { .. }
      | Instr::Load { .. }
      | Instr::FieldPtr { .. }
      | Instr::ElemPtr { .. }
      | Instr::ExtractValue { .. }
      | Instr::Cast { .. } => {},
    }
  }

  fn verify_call(
    &mut self,
    func: &MirFunction,
    site: &Site<'_>,
    callee: &str,
    args: &[Operand],
  ) {
    let signature = match self.module.function(callee) {
      Some(target) => target.signature(),
      None => match self.module.declarations.get(callee) {
        Some(signature) => signature.clone(),
        None => {
          self.errors.push(VerifyError::UndeclaredCallee {
            function: site.function(),
            block: site.block(),
            callee: callee.to_string(),
          });
          return;
        },
      },
    };

    let MirType::Func { params, .. } = signature else {
      return;
    };
    if params.len() != args.len() {
      self.errors.push(VerifyError::CallArityMismatch {
        function: site.function(),
        block: site.block(),
        callee: callee.to_string(),
        expected: params.len(),
        actual: args.len(),
      });
      return;
    }
    for (param, arg) in params.iter().zip(args) {
      self.check_same_type(func, site, "call argument", param, arg);
    }
  }

  fn verify_terminator(
    &mut self,
    func: &MirFunction,
    site: &Site<'_>,
    term: &Terminator,
  ) {
    for target in term.successors() {
      self.check_block(func, site, target);
    }

    match term {
      Terminator::CondBr { cond, .. } => {
        self.check_operand(func, site, cond);
        match operand_type(func, cond) {
          Some(ty) if ty != MirType::I1 => self.errors.push(VerifyError::NonBoolBranchCondition {
            function: site.function(),
            block: site.block(),
            actual: ty,
          }),
          _ => {},
        }
      },
      Terminator::Ret(Some(value)) => {
        self.check_operand(func, site, value);
        if func.ret.is_void() {
          self.errors.push(VerifyError::UnexpectedReturnValue {
            function: site.function(),
            block: site.block(),
          });
        } else if let Some(ty) = operand_type(func, value).filter(|ty| *ty != func.ret) {
          self.errors.push(VerifyError::ReturnTypeMismatch {
            function: site.function(),
            block: site.block(),
            expected: func.ret.clone(),
            actual: ty,
          });
        }
      },
      Terminator::Ret(None) => {
        if !func.ret.is_void() {
          self.errors.push(VerifyError::MissingReturnValue {
            function: site.function(),
            block: site.block(),
            expected: func.ret.clone(),
          });
        }
      },
      Terminator::Br(_) | Terminator::Unreachable => {},
    }
  }

  fn check_operand(
    &mut self,
    func: &MirFunction,
    site: &Site<'_>,
    operand: &Operand,
  ) {
    let Operand::Value(value) = operand else {
      return;
    };
    if func.values.try_get(value).is_none() {
      self.errors.push(VerifyError::InvalidValueRef {
        function: site.function(),
        block: site.block(),
        value: *value,
      });
    }
  }

  fn check_block(
    &mut self,
    func: &MirFunction,
    site: &Site<'_>,
    target: BlockId,
  ) {
    if func.blocks.try_get(&target).is_none() {
      self.errors.push(VerifyError::InvalidBlockRef {
        function: site.function(),
        block: site.block(),
        target,
      });
    }
  }

  fn check_same_type(
    &mut self,
    func: &MirFunction,
    site: &Site<'_>,
    context: &'static str,
    expected: &MirType,
    operand: &Operand,
  ) {
    if let Some(actual) = operand_type(func, operand).filter(|actual| actual != expected) {
      self.errors.push(VerifyError::OperandTypeMismatch {
        function: site.function(),
        block: site.block(),
        context,
        expected: expected.clone(),
        actual,
      });
    }
  }
}

/// Where an error was found.
struct Site<'a> {
  function: &'a str,
  block: &'a str,
}

impl Site<'_> {
  fn function(&self) -> String {
    self.function.to_string()
  }

  fn block(&self) -> String {
    self.block.to_string()
  }
}

/// Operand type, or `None` when it names a value that does not exist.
fn operand_type(
  func: &MirFunction,
  operand: &Operand,
) -> Option<MirType> {
  match operand {
    Operand::Value(value) => func.values.try_get(value).map(|data| data.ty.clone()),
    Operand::Const(constant) => Some(constant.ty()),
  }
}

fn defined_type(
  func: &MirFunction,
  value: ValueId,
) -> Option<MirType> {
  func.values.try_get(&value).map(|data| data.ty.clone())
}

fn label(
  func: &MirFunction,
  id: BlockId,
) -> String {
  func
    .blocks
    .try_get(&id)
    .map(|block| block.label.clone())
    .unwrap_or_else(|| format!("#{}", id.index()))
}

/// Verify every function of a module.
pub fn verify_module(module: &MirModule) -> VerifyResult {
  MirVerifier::new(module).verify()
}

/// Verify one function; calls are resolved against `module`.
pub fn verify_function(
  module: &MirModule,
  func: &MirFunction,
) -> VerifyResult {
  let mut verifier = MirVerifier::new(module);
  verifier.verify_function(func);
  verifier.finish()
}
