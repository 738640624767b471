use kernc_type::{Store, Type};

use crate::{
  Argument, ArithOp, BasicBlock, BlockId, CompareOp, Function, InstrId, InstrKind, Instruction, Operand,
};

/// Builder for constructing a single kernel IR function.
///
/// Front ends and tests use this to assemble well-formed input for the
/// lowering pass. Instructions are appended to the current block.
pub struct FunctionBuilder {
  name: String,
  arguments: Vec<Argument>,
  return_type: Type,

  blocks: Store<BasicBlock>,
  instructions: Store<Instruction>,

  /// Block receiving appended instructions.
  current_block: BlockId,
}

impl FunctionBuilder {
  pub fn new(
    name: impl Into<String>,
    arguments: Vec<(&str, Type)>,
    return_type: Type,
  ) -> Self {
    let mut blocks = Store::new();
    let entry = blocks.alloc(BasicBlock::new("entry"));

    Self {
      name: name.into(),
      arguments: arguments
        .into_iter()
        .map(|(name, ty)| Argument {
          name: name.to_string(),
          ty,
        })
        .collect(),
      return_type,
      blocks,
      instructions: Store::new(),
      current_block: entry,
    }
  }

  /// Operand referring to the argument at `index`.
  pub fn arg(
    &self,
    index: u32,
  ) -> Operand {
    Operand::Argument(index)
  }

  pub fn create_block(
    &mut self,
    name: &str,
  ) -> BlockId {
    self.blocks.alloc(BasicBlock::new(name))
  }

  pub fn switch_to_block(
    &mut self,
    block: BlockId,
  ) {
    self.current_block = block;
  }

  pub fn current_block(&self) -> BlockId {
    self.current_block
  }

  pub fn return_type(&self) -> &Type {
    &self.return_type
  }

  /// Append an instruction to the current block.
  pub fn append(
    &mut self,
    instr: Instruction,
  ) -> InstrId {
    let id = self.instructions.alloc(instr);
    self.blocks.get_mut(&self.current_block).instructions.push(id);
    id
  }

  fn push(
    &mut self,
    ty: Type,
    kind: InstrKind,
  ) -> InstrId {
    self.append(Instruction::new(ty, kind))
  }

  /// Attach a diagnostic name to an already appended instruction.
  pub fn name(
    &mut self,
    id: InstrId,
    name: &str,
  ) -> InstrId {
    self.instructions.get_mut(&id).name = Some(name.to_string());
    id
  }

  pub fn phi(
    &mut self,
    ty: Type,
    incoming: Vec<(Operand, BlockId)>,
  ) -> InstrId {
    self.push(ty, InstrKind::Phi { incoming })
  }

  /// Add an incoming edge to a phi created earlier, typically for a back-edge
  /// whose value did not exist yet when the phi was appended.
  pub fn add_incoming(
    &mut self,
    phi: InstrId,
    value: Operand,
    block: BlockId,
  ) {
    if let InstrKind::Phi { incoming } = &mut self.instructions.get_mut(&phi).kind {
      incoming.push((value, block));
    }
  }

  pub fn alloc(
    &mut self,
    ty: Type,
    operands: Vec<Operand>,
  ) -> InstrId {
    self.push(ty, InstrKind::Alloc { operands })
  }

  pub fn get_local(
    &mut self,
    ty: Type,
    env: Operand,
    var: &str,
  ) -> InstrId {
    self.push(
      ty,
      InstrKind::GetLocal {
        env,
        var: var.to_string(),
      },
    )
  }

  pub fn set_local(
    &mut self,
    env: Operand,
    var: &str,
    value: Operand,
  ) -> InstrId {
    self.push(
      Type::None,
      InstrKind::SetLocal {
        env,
        var: var.to_string(),
        value,
      },
    )
  }

  pub fn get_attr(
    &mut self,
    ty: Type,
    object: Operand,
    attr: &str,
  ) -> InstrId {
    self.push(
      ty,
      InstrKind::GetAttr {
        object,
        attr: attr.to_string(),
      },
    )
  }

  /// `ty` is the object's type for value objects (the rebuilt aggregate) and
  /// `None` for mutable objects.
  pub fn set_attr(
    &mut self,
    ty: Type,
    object: Operand,
    attr: &str,
    value: Operand,
  ) -> InstrId {
    self.push(
      ty,
      InstrKind::SetAttr {
        object,
        attr: attr.to_string(),
        value,
      },
    )
  }

  pub fn get_elem(
    &mut self,
    ty: Type,
    list: Operand,
    index: Operand,
  ) -> InstrId {
    self.push(ty, InstrKind::GetElem { list, index })
  }

  pub fn set_elem(
    &mut self,
    list: Operand,
    index: Operand,
    value: Operand,
  ) -> InstrId {
    self.push(Type::None, InstrKind::SetElem { list, index, value })
  }

  pub fn coerce(
    &mut self,
    ty: Type,
    value: Operand,
  ) -> InstrId {
    self.push(ty, InstrKind::Coerce { value })
  }

  pub fn arith(
    &mut self,
    operator: ArithOp,
    ty: Type,
    lhs: Operand,
    rhs: Operand,
  ) -> InstrId {
    self.push(ty, InstrKind::Arith { operator, lhs, rhs })
  }

  pub fn compare(
    &mut self,
    operator: CompareOp,
    lhs: Operand,
    rhs: Operand,
  ) -> InstrId {
    self.push(Type::Bool, InstrKind::Compare { operator, lhs, rhs })
  }

  pub fn builtin(
    &mut self,
    builtin: &str,
    ty: Type,
    operands: Vec<Operand>,
  ) -> InstrId {
    self.push(
      ty,
      InstrKind::Builtin {
        builtin: builtin.to_string(),
        operands,
      },
    )
  }

  pub fn select(
    &mut self,
    ty: Type,
    cond: Operand,
    if_true: Operand,
    if_false: Operand,
  ) -> InstrId {
    self.push(
      ty,
      InstrKind::Select {
        cond,
        if_true,
        if_false,
      },
    )
  }

  pub fn branch(
    &mut self,
    target: BlockId,
  ) -> InstrId {
    self.push(Type::None, InstrKind::Branch { target })
  }

  pub fn branch_if(
    &mut self,
    cond: Operand,
    if_true: BlockId,
    if_false: BlockId,
  ) -> InstrId {
    self.push(
      Type::None,
      InstrKind::BranchIf {
        cond,
        if_true,
        if_false,
      },
    )
  }

  pub fn ret(
    &mut self,
    value: Option<Operand>,
  ) -> InstrId {
    let ty = self.return_type.clone();
    self.push(ty, InstrKind::Return { value })
  }

  pub fn unreachable(&mut self) -> InstrId {
    self.push(Type::None, InstrKind::Unreachable)
  }

  pub fn raise(
    &mut self,
    value: Option<Operand>,
  ) -> InstrId {
    self.push(Type::None, InstrKind::Raise { value })
  }

  /// Finish building and return the completed function.
  pub fn finish(self) -> Function {
    Function {
      name: self.name,
      arguments: self.arguments,
      return_type: self.return_type,
      blocks: self.blocks,
      instructions: self.instructions,
    }
  }
}
