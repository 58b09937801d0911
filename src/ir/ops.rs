//! # IR Opcodes
//!
//! The intermediate representation between the receipt layout and raw
//! ESC/POS bytes:
//!
//! ```text
//! ReceiptFormatter → IR (inspectable) → Codegen → CommandBuffer
//! ```
//!
//! Each opcode is one atomic printer operation, so a layout can be asserted
//! on in tests and previewed without hardware.

use crate::protocol::text::{Alignment, TextSize};
use crate::render::RasterImage;

/// IR opcodes for receipt printing.
#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    // ========== Printer Control ==========
    /// Initialize printer (ESC @). Resets to default state.
    Init,

    /// Print and feed n lines (ESC d n).
    Feed { lines: u8 },

    /// Feed to cutter and partial cut (GS V 65 0).
    Cut,

    // ========== Style Changes ==========
    /// Set text alignment.
    SetAlign(Alignment),

    /// Enable/disable bold.
    SetBold(bool),

    /// Set character size.
    SetSize(TextSize),

    // ========== Content ==========
    /// Text (no trailing newline).
    Text(String),

    /// Line feed (newline).
    Newline,

    // ========== Graphics ==========
    /// Raster image (GS v 0).
    Raster(RasterImage),
}

/// A compiled IR program.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Program {
    pub ops: Vec<Op>,
}

impl Program {
    /// Create an empty program.
    pub fn new() -> Self {
        Self { ops: Vec::new() }
    }

    /// Create a program with an initial Init op.
    pub fn with_init() -> Self {
        Self {
            ops: vec![Op::Init],
        }
    }

    /// Add an op to the program.
    pub fn push(&mut self, op: Op) {
        self.ops.push(op);
    }

    /// Add a line of text followed by a newline.
    pub fn line(&mut self, text: impl Into<String>) {
        self.ops.push(Op::Text(text.into()));
        self.ops.push(Op::Newline);
    }

    /// Get the number of ops in the program.
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Check if the program is empty.
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Iterate over ops.
    pub fn iter(&self) -> impl Iterator<Item = &Op> {
        self.ops.iter()
    }

    /// The text lines this program prints, in order.
    ///
    /// Text ops are joined until the next `Newline`; graphics and styles are
    /// skipped. Feeds do not produce lines.
    pub fn text_lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        let mut current = String::new();
        for op in &self.ops {
            match op {
                Op::Text(s) => current.push_str(s),
                Op::Newline => lines.push(std::mem::take(&mut current)),
                _ => {}
            }
        }
        if !current.is_empty() {
            lines.push(current);
        }
        lines
    }
}

impl FromIterator<Op> for Program {
    fn from_iter<T: IntoIterator<Item = Op>>(iter: T) -> Self {
        Self {
            ops: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Program {
    type Item = Op;
    type IntoIter = std::vec::IntoIter<Op>;

    fn into_iter(self) -> Self::IntoIter {
        self.ops.into_iter()
    }
}

impl<'a> IntoIterator for &'a Program {
    type Item = &'a Op;
    type IntoIter = std::slice::Iter<'a, Op>;

    fn into_iter(self) -> Self::IntoIter {
        self.ops.iter()
    }
}
