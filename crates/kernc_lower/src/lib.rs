//! Lowering of kernel IR to LLVM-flavoured machine IR.
//!
//! Functions are lowered independently: types are mapped to machine layouts,
//! every source block becomes exactly one machine block, and phi edges are
//! wired once the whole function body exists.

mod arith;
mod assemble;
mod builtin;
pub mod constant;
mod context;
pub mod env;
mod error;
mod instr;
pub mod layout;
mod module;

pub use assemble::{lower_function, LoweredFunction};
pub use builtin::BuiltinOp;
pub use constant::materialize;
pub use error::LowerError;
pub use layout::{frame_layout, layout, signature, value_layout, MAX_INT_WIDTH};
pub use module::{lower_module, lower_module_traced};
