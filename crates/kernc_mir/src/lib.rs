pub mod block;
pub mod builder;
pub mod display;
pub mod error;
pub mod function;
pub mod instr;
pub mod interp;
pub mod types;
pub mod value;
pub mod verify;

use kernc_type::Id;

pub use block::{MirBlock, Terminator};
pub use builder::FunctionBuilder;
pub use error::BuildError;
pub use function::{Intrinsic, MirFunction, MirModule};
pub use instr::{BinOp, CastOp, FloatPredicate, Instr, IntPredicate};
pub use types::MirType;
pub use value::{MirConst, Operand, ValueData};
pub use verify::{verify_function, verify_module, VerifyError};

/// Unique identifier for an SSA value within a machine function.
pub type ValueId = Id<ValueData>;

/// Unique identifier for a basic block within a machine function.
pub type BlockId = Id<MirBlock>;
