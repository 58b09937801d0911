//! # Intermediate Representation (IR)
//!
//! A "bytecode" layer between the receipt layout and raw ESC/POS bytes.
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌──────────┐
//! │   Layout    │ ──► │     IR      │ ──► │ Codegen  │
//! │ (formatter) │     │  (Vec<Op>)  │     │ (bytes)  │
//! └─────────────┘     └─────────────┘     └──────────┘
//! ```
//!
//! ## Example
//!
//! ```
//! use struk::ir::{Op, Program};
//! use struk::protocol::text::Alignment;
//!
//! let mut program = Program::with_init();
//! program.push(Op::SetAlign(Alignment::Center));
//! program.line("HELLO");
//! program.push(Op::Feed { lines: 3 });
//!
//! assert_eq!(program.text_lines(), vec!["HELLO"]);
//! let bytes = program.to_bytes();
//! assert_eq!(&bytes[..2], &[0x1B, 0x40]);
//! ```

mod codegen;
mod ops;

pub use ops::*;
