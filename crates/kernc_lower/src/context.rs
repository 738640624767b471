use std::collections::{BTreeSet, HashMap};

use kernc_ir::{BlockId, Function, InstrId, Operand};
use kernc_mir::{CastOp, FunctionBuilder, Intrinsic, MirConst, MirType, ValueId};
use kernc_type::Type;

use crate::{constant::materialize, layout::value_layout, LowerError};

/// Phi whose incoming edges are wired after every block has been lowered.
#[derive(Debug, Clone)]
pub struct PhiFixup {
  pub phi: ValueId,
  /// Source phi, for error locations.
  pub instr: InstrId,
  pub incoming: Vec<(Operand, BlockId)>,
}

/// State for lowering one function; dropped once the function is done.
pub struct FunctionContext<'a> {
  pub source: &'a Function,
  pub builder: FunctionBuilder,

  /// Machine value of every lowered instruction.
  values: HashMap<InstrId, kernc_mir::Operand>,
  /// Machine block of every source block.
  blocks: HashMap<BlockId, kernc_mir::BlockId>,

  pub fixups: Vec<PhiFixup>,
  /// Intrinsics called so far; declared in the module afterwards.
  pub intrinsics: BTreeSet<Intrinsic>,
}

impl<'a> FunctionContext<'a> {
  pub fn new(
    source: &'a Function,
    builder: FunctionBuilder,
  ) -> Self {
    Self {
      source,
      builder,
      values: HashMap::new(),
      blocks: HashMap::new(),
      fixups: Vec::new(),
      intrinsics: BTreeSet::new(),
    }
  }

  pub fn map_block(
    &mut self,
    source: BlockId,
    block: kernc_mir::BlockId,
  ) {
    self.blocks.insert(source, block);
  }

  pub fn block(
    &self,
    source: BlockId,
  ) -> Result<kernc_mir::BlockId, LowerError> {
    self
      .blocks
      .get(&source)
      .copied()
      .ok_or_else(|| LowerError::invalid_operand("branch", format!("unknown block #{}", source.index())))
  }

  pub fn define(
    &mut self,
    instr: InstrId,
    value: kernc_mir::Operand,
  ) {
    self.values.insert(instr, value);
  }

  /// Machine operand for a source operand.
  pub fn operand(
    &self,
    operand: &Operand,
  ) -> Result<kernc_mir::Operand, LowerError> {
    match operand {
      Operand::Instr(id) => self
        .values
        .get(id)
        .cloned()
        .ok_or(LowerError::UndefinedValue { instr: id.index() }),
      Operand::Argument(index) => self
        .builder
        .params()
        .get(*index as usize)
        .map(|param| kernc_mir::Operand::Value(*param))
        .ok_or_else(|| LowerError::invalid_operand("argument", format!("no argument #{}", index))),
      Operand::Const(constant) => Ok(kernc_mir::Operand::Const(materialize(constant)?)),
    }
  }

  /// Source type of an operand.
  pub fn source_type(
    &self,
    operand: &'a Operand,
  ) -> Result<&'a Type, LowerError> {
    let source = self.source;
    source.operand_type(operand).ok_or_else(|| match operand {
      Operand::Instr(id) => LowerError::UndefinedValue { instr: id.index() },
      other => LowerError::invalid_operand("operand", format!("{:?}", other)),
    })
  }

  /// Call an intrinsic, recording it for declaration.
  pub fn call_intrinsic(
    &mut self,
    intrinsic: Intrinsic,
    args: Vec<kernc_mir::Operand>,
    name: Option<&str>,
  ) -> Result<Option<kernc_mir::Operand>, LowerError> {
    self.intrinsics.insert(intrinsic);
    Ok(self.builder.call(intrinsic.name(), intrinsic.return_type(), args, name)?)
  }

  /// `operand` as a `double`; integers are converted with `sitofp`.
  pub fn to_double(
    &mut self,
    operand: &'a Operand,
  ) -> Result<kernc_mir::Operand, LowerError> {
    let ty = self.source_type(operand)?;
    let value = self.operand(operand)?;
    match ty {
      Type::Float => Ok(value),
      Type::Int(_) => Ok(self.builder.cast(CastOp::SiToFp, value, MirType::Double, None)?),
      other => Err(LowerError::invalid_operand("float arithmetic", other.to_string())),
    }
  }

  /// `operand` as an integer of `bits`; sign-extended or truncated as needed.
  pub fn to_int(
    &mut self,
    operand: &'a Operand,
    bits: u32,
  ) -> Result<kernc_mir::Operand, LowerError> {
    let ty = self.source_type(operand)?;
    let value = self.operand(operand)?;
    let width = match ty {
      Type::Int(width) => *width,
      Type::Bool => 1,
      other => return Err(LowerError::invalid_operand("integer arithmetic", other.to_string())),
    };
    self.resize_int(value, width, bits)
  }

  pub fn resize_int(
    &mut self,
    value: kernc_mir::Operand,
    from: u32,
    to: u32,
  ) -> Result<kernc_mir::Operand, LowerError> {
    if from == to {
      return Ok(value);
    }
    let op = if to > from { CastOp::SExt } else { CastOp::Trunc };
    Ok(self.builder.cast(op, value, MirType::Int(to), None)?)
  }

  /// `undef` of the layout of `ty`; the empty struct has a real constant.
  pub fn undef(
    &self,
    ty: &Type,
  ) -> Result<kernc_mir::Operand, LowerError> {
    let layout = value_layout(ty)?;
    Ok(match layout {
      MirType::Struct(fields) if fields.is_empty() => MirConst::unit().into(),
      other => MirConst::Undef(other).into(),
    })
  }
}
