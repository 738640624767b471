pub mod builder;
pub mod display;
pub mod function;
pub mod instr;
pub mod operand;

use kernc_type::Id;

pub use builder::FunctionBuilder;
pub use function::{Argument, BasicBlock, Function, Module};
pub use instr::{ArithOp, CompareOp, InstrKind, Instruction};
pub use operand::{Constant, Operand};

/// Identifier of an instruction (and of the SSA value it defines) within a function.
pub type InstrId = Id<Instruction>;

/// Identifier of a basic block within a function.
pub type BlockId = Id<BasicBlock>;
