//! Execution environment interface core for EVM frames.
//!
//! This crate is the boundary through which one in-flight bytecode frame
//! interacts with the surrounding virtual machine: consuming gas, reading
//! and writing linear memory, metering storage writes across hardforks,
//! and performing sub-calls. Opcode decoding and dispatch live outside;
//! handlers read their operands from the stack and drive the operations
//! exposed by [Frame].

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod call;
mod config;
pub mod costs;
mod error;
mod frame;
mod gasometer;
mod jumps;
mod memory;
mod opcode;
mod runtime;
mod stack;
mod storage;
pub mod tracing;
pub mod utils;

pub use crate::call::{
	CallInvocation, CallOutcome, CallParams, CallScheme, CallTarget, CreateParams, CreateScheme,
};
pub use crate::config::Config;
pub use crate::error::{ExitError, ExitException, ExitFatal, ExitResult, ExitSucceed};
pub use crate::frame::Frame;
pub use crate::gasometer::Gasometer;
pub use crate::jumps::JumpTable;
pub use crate::memory::Memory;
pub use crate::opcode::Opcode;
pub use crate::runtime::{Account, Backend, Context, Invoker, Log, TransactionContext, Transfer};
pub use crate::stack::Stack;
pub use crate::storage::{record_sstore, SlotValues};
