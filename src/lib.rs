//! An x86/x86-64 instruction decoder.
//!
//! Decodes raw bytes into structured [`DecodedInstruction`]s in any of the
//! three execution modes (16/32/64-bit), covering legacy, REX, VEX and EVEX
//! encodings. Per-instruction knowledge lives behind the [`OpcodeTable`]
//! trait; the built-in table covers a representative opcode subset and
//! callers can supply a complete generated one.
//!
//! ```
//! use hexane::{Decoder, ExecutionMode};
//!
//! let bytes = [0x66, 0x0F, 0x58, 0x08];
//! let mut decoder = Decoder::new(ExecutionMode::Bits16, &bytes);
//! let instr = decoder.decode().unwrap();
//! assert_eq!(instr.byte_len(), 4);
//! ```
//!
//! [`DecodedInstruction`]: struct.DecodedInstruction.html
//! [`OpcodeTable`]: table/trait.OpcodeTable.html

#![doc(html_root_url = "https://docs.rs/hexane/0.1.0")]
#![warn(missing_debug_implementations)]

#[macro_use] extern crate bitflags;
#[macro_use] extern crate bitpat;
#[macro_use] extern crate log;
#[macro_use] extern crate num_derive;
extern crate num_traits;

pub mod assemble;
pub mod cursor;
pub mod decoder;
pub mod instr;
pub mod modrm;
pub mod operand;
pub mod prefix;
pub mod table;
pub mod vex;

pub use decoder::{DecodeError, Decoder, ExecutionMode};
pub use instr::{DecodedInstruction, InstrFlags, RoundingControl};
pub use operand::{Immediate, MemoryOperand, MemorySize, Operand, Register, Segment};
pub use table::{Code, OpcodeTable};
