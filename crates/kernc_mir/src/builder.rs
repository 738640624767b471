use std::collections::{HashMap, HashSet};

use kernc_type::Store;

use crate::{
  BinOp, BlockId, BuildError, CastOp, FloatPredicate, Instr, IntPredicate, MirBlock, MirFunction, MirType,
  Operand, Terminator, ValueData, ValueId,
};

/// Builder for constructing a single machine function.
///
/// Mirrors an IR builder with an insertion cursor: instructions are appended
/// to the block selected with [`FunctionBuilder::position_at_end`]. Result
/// types are derived from operand types, so a malformed request surfaces as
/// a [`BuildError`] instead of an ill-typed function.
pub struct FunctionBuilder {
  name: String,
  ret: MirType,
  params: Vec<ValueId>,

  values: Store<ValueData>,
  blocks: Store<MirBlock>,

  /// Block receiving new instructions.
  current_block: Option<BlockId>,

  /// Location of every phi, for adding incoming edges later.
  phis: HashMap<ValueId, (BlockId, usize)>,

  /// Value names and block labels share one namespace, as in LLVM.
  names: HashSet<String>,
}

impl FunctionBuilder {
  /// Start a function. Parameters become values `0..params.len()`.
  pub fn new(
    name: impl Into<String>,
    params: Vec<(MirType, Option<String>)>,
    ret: MirType,
  ) -> Self {
    let mut builder = Self {
      name: name.into(),
      ret,
      params: Vec::new(),
      values: Store::new(),
      blocks: Store::new(),
      current_block: None,
      phis: HashMap::new(),
      names: HashSet::new(),
    };

    for (ty, name) in params {
      let param = builder.fresh_value(ty, name.as_deref());
      builder.params.push(param);
    }

    builder
  }

  pub fn params(&self) -> &[ValueId] {
    &self.params
  }

  pub fn return_type(&self) -> &MirType {
    &self.ret
  }

  /// Create a new basic block. Labels are made unique by suffixing `.N`.
  pub fn create_block(
    &mut self,
    label: &str,
  ) -> BlockId {
    let label = unique_name(&mut self.names, if label.is_empty() { "bb" } else { label });
    self.blocks.alloc(MirBlock::new(label))
  }

  pub fn position_at_end(
    &mut self,
    block: BlockId,
  ) {
    self.current_block = Some(block);
  }

  pub fn current_block(&self) -> Option<BlockId> {
    self.current_block
  }

  pub fn block_label(
    &self,
    block: BlockId,
  ) -> &str {
    &self.blocks.get(&block).label
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

  /// Whether the current block already has a terminator.
  pub fn is_terminated(&self) -> bool {
    self
      .current_block
      .map(|block| self.blocks.get(&block).terminator.is_some())
      .unwrap_or(false)
  }

  fn fresh_value(
    &mut self,
    ty: MirType,
    name: Option<&str>,
  ) -> ValueId {
    let name = name
      .filter(|name| !name.is_empty())
      .map(|name| unique_name(&mut self.names, name));
    self.values.alloc(ValueData { ty, name })
  }

  fn insertion_block(&self) -> Result<BlockId, BuildError> {
    let block = self.current_block.ok_or(BuildError::NoInsertionPoint)?;
    let data = self.blocks.get(&block);
    if data.terminator.is_some() {
      return Err(BuildError::BlockAlreadyTerminated {
        block: data.label.clone(),
      });
    }
    Ok(block)
  }

  /// Append an instruction to the current block.
  pub fn emit(
    &mut self,
    instr: Instr,
  ) -> Result<(), BuildError> {
    let block = self.insertion_block()?;
    self.blocks.get_mut(&block).instructions.push(instr);
    Ok(())
  }

  fn emit_value(
    &mut self,
    ty: MirType,
    name: Option<&str>,
    make: impl FnOnce(ValueId) -> Instr,
  ) -> Result<Operand, BuildError> {
    self.insertion_block()?;
    let dest = self.fresh_value(ty, name);
    self.emit(make(dest))?;
    Ok(Operand::Value(dest))
  }

  /// Set the terminator for the current block.
  pub fn terminate(
    &mut self,
    term: Terminator,
  ) -> Result<(), BuildError> {
    let block = self.insertion_block()?;
    self.blocks.get_mut(&block).terminator = Some(term);
    Ok(())
  }

  /// Empty phi in the current block; see [`FunctionBuilder::add_incoming`].
  pub fn phi(
    &mut self,
    ty: MirType,
    name: Option<&str>,
  ) -> Result<ValueId, BuildError> {
    let block = self.insertion_block()?;
    let dest = self.fresh_value(ty, name);
    let position = self.blocks.get(&block).instructions.len();
    self.emit(Instr::Phi {
      dest,
      incoming: Vec::new(),
    })?;
    self.phis.insert(dest, (block, position));
    Ok(dest)
  }

  /// Wire an incoming edge into a phi created by this builder.
  ///
  /// Allowed after the phi's block is terminated.
  pub fn add_incoming(
    &mut self,
    phi: ValueId,
    value: Operand,
    block: BlockId,
  ) -> bool {
    let Some(&(phi_block, position)) = self.phis.get(&phi) else {
      return false;
    };
    match self.blocks.get_mut(&phi_block).instructions.get_mut(position) {
      Some(Instr::Phi { incoming, .. }) => {
        incoming.push((value, block));
        true
      },
      _ => false,
    }
  }

  pub fn alloca(
    &mut self,
    ty: MirType,
    count: Option<Operand>,
    name: Option<&str>,
  ) -> Result<Operand, BuildError> {
    if let Some(count) = &count {
      let count_ty = self.operand_type(count);
      if !count_ty.is_int() {
        return Err(BuildError::NotAnInteger {
          context: "alloca",
          ty: count_ty,
        });
      }
    }
    self.emit_value(ty.clone().ptr(), name, |dest| Instr::Alloca { dest, ty, count })
  }

  pub fn load(
    &mut self,
    ptr: Operand,
    name: Option<&str>,
  ) -> Result<Operand, BuildError> {
    let ptr_ty = self.operand_type(&ptr);
    let ty = ptr_ty
      .pointee()
      .cloned()
      .ok_or(BuildError::NotAPointer {
        context: "load",
        ty: ptr_ty.clone(),
      })?;
    self.emit_value(ty, name, |dest| Instr::Load { dest, ptr })
  }

  pub fn store(
    &mut self,
    value: Operand,
    ptr: Operand,
  ) -> Result<(), BuildError> {
    let ptr_ty = self.operand_type(&ptr);
    if !ptr_ty.is_ptr() {
      return Err(BuildError::NotAPointer {
        context: "store",
        ty: ptr_ty,
      });
    }
    self.emit(Instr::Store { ptr, value })
  }

  pub fn field_ptr(
    &mut self,
    base: Operand,
    index: u32,
    name: Option<&str>,
  ) -> Result<Operand, BuildError> {
    let base_ty = self.operand_type(&base);
    let pointee = base_ty.pointee().ok_or(BuildError::NotAPointer {
      context: "getelementptr",
      ty: base_ty.clone(),
    })?;
    if !matches!(pointee, MirType::Struct(_)) {
      return Err(BuildError::NotAStruct {
        context: "getelementptr",
        ty: pointee.clone(),
      });
    }
    let field = pointee.field(index).cloned().ok_or(BuildError::FieldOutOfRange {
      context: "getelementptr",
      ty: pointee.clone(),
      index,
    })?;
    self.emit_value(field.ptr(), name, |dest| Instr::FieldPtr { dest, base, index })
  }

  pub fn elem_ptr(
    &mut self,
    base: Operand,
    index: Operand,
    name: Option<&str>,
  ) -> Result<Operand, BuildError> {
    let base_ty = self.operand_type(&base);
    if !base_ty.is_ptr() {
      return Err(BuildError::NotAPointer {
        context: "getelementptr",
        ty: base_ty,
      });
    }
    let index_ty = self.operand_type(&index);
    if !index_ty.is_int() {
      return Err(BuildError::NotAnInteger {
        context: "getelementptr",
        ty: index_ty,
      });
    }
    self.emit_value(base_ty, name, |dest| Instr::ElemPtr { dest, base, index })
  }

  fn aggregate_field(
    &self,
    context: &'static str,
    aggregate: &Operand,
    index: u32,
  ) -> Result<MirType, BuildError> {
    let ty = self.operand_type(aggregate);
    if !matches!(ty, MirType::Struct(_)) {
      return Err(BuildError::NotAStruct { context, ty });
    }
    ty.field(index)
      .cloned()
      .ok_or(BuildError::FieldOutOfRange { context, ty, index })
  }

  pub fn extract_value(
    &mut self,
    aggregate: Operand,
    index: u32,
    name: Option<&str>,
  ) -> Result<Operand, BuildError> {
    let field = self.aggregate_field("extractvalue", &aggregate, index)?;
    self.emit_value(field, name, |dest| Instr::ExtractValue { dest, aggregate, index })
  }

  pub fn insert_value(
    &mut self,
    aggregate: Operand,
    value: Operand,
    index: u32,
    name: Option<&str>,
  ) -> Result<Operand, BuildError> {
    self.aggregate_field("insertvalue", &aggregate, index)?;
    let ty = self.operand_type(&aggregate);
    self.emit_value(ty, name, |dest| Instr::InsertValue {
      dest,
      aggregate,
      value,
      index,
    })
  }

  pub fn binary(
    &mut self,
    op: BinOp,
    lhs: Operand,
    rhs: Operand,
    name: Option<&str>,
  ) -> Result<Operand, BuildError> {
    let ty = self.operand_type(&lhs);
    self.emit_value(ty, name, |dest| Instr::Binary { dest, op, lhs, rhs })
  }

  pub fn cast(
    &mut self,
    op: CastOp,
    value: Operand,
    ty: MirType,
    name: Option<&str>,
  ) -> Result<Operand, BuildError> {
    self.emit_value(ty.clone(), name, |dest| Instr::Cast { dest, op, value, ty })
  }

  pub fn icmp(
    &mut self,
    pred: IntPredicate,
    lhs: Operand,
    rhs: Operand,
    name: Option<&str>,
  ) -> Result<Operand, BuildError> {
    self.emit_value(MirType::I1, name, |dest| Instr::ICmp { dest, pred, lhs, rhs })
  }

  pub fn fcmp(
    &mut self,
    pred: FloatPredicate,
    lhs: Operand,
    rhs: Operand,
    name: Option<&str>,
  ) -> Result<Operand, BuildError> {
    self.emit_value(MirType::I1, name, |dest| Instr::FCmp { dest, pred, lhs, rhs })
  }

  /// Call `callee`. Returns `None` for void calls, which define no value.
  pub fn call(
    &mut self,
    callee: &str,
    ret: MirType,
    args: Vec<Operand>,
    name: Option<&str>,
  ) -> Result<Option<Operand>, BuildError> {
    let callee = callee.to_string();
    if ret.is_void() {
      self.emit(Instr::Call {
        dest: None,
        callee,
        args,
      })?;
      return Ok(None);
    }
    self
      .emit_value(ret, name, |dest| Instr::Call {
        dest: Some(dest),
        callee,
        args,
      })
      .map(Some)
  }

  pub fn select(
    &mut self,
    cond: Operand,
    if_true: Operand,
    if_false: Operand,
    name: Option<&str>,
  ) -> Result<Operand, BuildError> {
    let ty = self.operand_type(&if_true);
    self.emit_value(ty, name, |dest| Instr::Select {
      dest,
      cond,
      if_true,
      if_false,
    })
  }

  pub fn br(
    &mut self,
    target: BlockId,
  ) -> Result<(), BuildError> {
    self.terminate(Terminator::Br(target))
  }

  pub fn cond_br(
    &mut self,
    cond: Operand,
    then_block: BlockId,
    else_block: BlockId,
  ) -> Result<(), BuildError> {
    self.terminate(Terminator::CondBr {
      cond,
      then_block,
      else_block,
    })
  }

  pub fn ret(
    &mut self,
    value: Operand,
  ) -> Result<(), BuildError> {
    self.terminate(Terminator::Ret(Some(value)))
  }

  pub fn ret_void(&mut self) -> Result<(), BuildError> {
    self.terminate(Terminator::Ret(None))
  }

  pub fn unreachable(&mut self) -> Result<(), BuildError> {
    self.terminate(Terminator::Unreachable)
  }

  /// Finish building and return the completed function.
  pub fn finish(self) -> MirFunction {
    MirFunction {
      name: self.name,
      ret: self.ret,
      params: self.params,
      values: self.values,
      blocks: self.blocks,
      entry: BlockId::new(0), // Entry is always first
    }
  }
}

fn unique_name(
  used: &mut HashSet<String>,
  base: &str,
) -> String {
  if used.insert(base.to_string()) {
    return base.to_string();
  }

  let mut suffix = 1;
  loop {
    let candidate = format!("{}.{}", base, suffix);
    if used.insert(candidate.clone()) {
      return candidate;
    }
    suffix += 1;
  }
}
