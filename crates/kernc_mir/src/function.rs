use std::collections::{BTreeMap, HashMap};

use kernc_type::Store;

use crate::{BlockId, MirBlock, MirType, Operand, ValueData, ValueId};

/// Runtime primitives called by lowered code. Their bodies live in the
/// runtime library; the module only carries declarations.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Intrinsic {
  /// Round to nearest, halves away from zero.
  Round,
  Pow,
  /// Float base raised to an `i32` exponent.
  Powi,
  DoNothing,
  Trap,
}

impl Intrinsic {
  pub const ALL: [Intrinsic; 5] = [
    Intrinsic::Round,
    Intrinsic::Pow,
    Intrinsic::Powi,
    Intrinsic::DoNothing,
    Intrinsic::Trap,
  ];

  pub fn name(&self) -> &'static str {
    match self {
      Intrinsic::Round => "llvm.round.f64",
      Intrinsic::Pow => "llvm.pow.f64",
      Intrinsic::Powi => "llvm.powi.f64",
      Intrinsic::DoNothing => "llvm.donothing",
      Intrinsic::Trap => "llvm.trap",
    }
  }

  pub fn from_name(name: &str) -> Option<Intrinsic> {
    Self::ALL.into_iter().find(|intrinsic| intrinsic.name() == name)
  }

  /// Fixed signature as a function type.
  pub fn signature(&self) -> MirType {
    match self {
      Intrinsic::Round => MirType::func(MirType::Double, vec![MirType::Double]),
      Intrinsic::Pow => MirType::func(MirType::Double, vec![MirType::Double, MirType::Double]),
      Intrinsic::Powi => MirType::func(MirType::Double, vec![MirType::Double, MirType::I32]),
      Intrinsic::DoNothing | Intrinsic::Trap => MirType::func(MirType::Void, Vec::new()),
    }
  }

  pub fn return_type(&self) -> MirType {
    match self {
      Intrinsic::Round | Intrinsic::Pow | Intrinsic::Powi => MirType::Double,
      Intrinsic::DoNothing | Intrinsic::Trap => MirType::Void,
    }
  }
}

/// A single function in machine IR form.
#[derive(Debug, Clone)]
pub struct MirFunction {
  pub name: String,
  pub ret: MirType,
  /// Parameter values, in order. They are the first values of `values`.
  pub params: Vec<ValueId>,
  pub values: Store<ValueData>,
  pub blocks: Store<MirBlock>,
  pub entry: BlockId,
}

impl MirFunction {
  pub fn signature(&self) -> MirType {
    MirType::func(
      self.ret.clone(),
      self.params.iter().map(|param| self.value_type(*param).clone()).collect(),
    )
  }

  pub fn value_type(
    &self,
    value: ValueId,
  ) -> &MirType {
    &self.values.get(&value).ty
  }

  pub fn operand_type(
    &self,
    operand: &Operand,
  ) -> MirType {
    match operand {
      Operand::Value(value) => self.value_type(*value).clone(),
      Operand::Const(constant) => constant.ty(),
    }
  }

  /// Printed name of a value, without the `%` sigil. Unnamed values take
  /// their slot from [`MirFunction::value_slots`].
  pub fn value_name(
    &self,
    value: ValueId,
  ) -> String {
    if let Some(name) = self.values.try_get(&value).and_then(|data| data.name.as_ref()) {
      return name.clone();
    }
    match self.value_slots().get(&value) {
      Some(slot) => slot.to_string(),
      None => format!("<invalid v{}>", value.index()),
    }
  }

  /// Slot numbers of unnamed values: `0, 1, 2, ...` in definition order,
  /// parameters first, then instruction results block by block.
  pub fn value_slots(&self) -> HashMap<ValueId, u32> {
    let defined = self.params.iter().copied().chain(
      self
        .blocks
        .get_all()
        .iter()
        .flat_map(|block| block.instructions.iter().filter_map(|instr| instr.dest())),
    );

    let mut slots = HashMap::new();
    for value in defined {
      let unnamed = self.values.try_get(&value).map(|data| data.name.is_none()).unwrap_or(false);
      if unnamed && !slots.contains_key(&value) {
        let slot = slots.len() as u32;
        slots.insert(value, slot);
      }
    }
    slots
  }

  pub fn block_by_label(
    &self,
    label: &str,
  ) -> Option<BlockId> {
    self.blocks.iter().find(|(_, block)| block.label == label).map(|(id, _)| id)
  }

  pub fn predecessors(
    &self,
    block: BlockId,
  ) -> Vec<BlockId> {
    self
      .blocks
      .iter()
      .filter(|(_, candidate)| {
        candidate
          .terminator
          .as_ref()
          .map(|term| term.successors().contains(&block))
          .unwrap_or(false)
      })
      .map(|(id, _)| id)
      .collect()
  }

  pub fn instruction_count(&self) -> usize {
    self.blocks.get_all().iter().map(|block| block.instructions.len() + 1).sum()
  }

  pub fn phi_count(&self) -> usize {
    self
      .blocks
      .get_all()
      .iter()
      .map(|block| block.instructions.iter().filter(|instr| instr.is_phi()).count())
      .sum()
  }
}

/// Top-level machine IR module.
#[derive(Debug, Clone, Default)]
pub struct MirModule {
  pub name: String,
  /// Function definitions in lowering order.
  pub functions: Vec<MirFunction>,
  /// External declarations referenced by the definitions, by symbol name.
  pub declarations: BTreeMap<String, MirType>,
}

impl MirModule {
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      functions: Vec::new(),
      declarations: BTreeMap::new(),
    }
  }

  pub fn function(
    &self,
    name: &str,
  ) -> Option<&MirFunction> {
    self.functions.iter().find(|func| func.name == name)
  }

  pub fn declare(
    &mut self,
    intrinsic: Intrinsic,
  ) {
    self
      .declarations
      .entry(intrinsic.name().to_string())
      .or_insert_with(|| intrinsic.signature());
  }

  pub fn is_declared(
    &self,
    intrinsic: Intrinsic,
  ) -> bool {
    self.declarations.contains_key(intrinsic.name())
  }
}
