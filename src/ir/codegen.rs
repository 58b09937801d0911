//! # Code Generation
//!
//! Converts IR programs to ESC/POS bytes.

use super::ops::{Op, Program};
use crate::protocol::{commands, text};

impl Program {
    /// Compile the IR program to ESC/POS bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();

        for op in &self.ops {
            match op {
                // ===== Printer Control =====
                Op::Init => out.extend(commands::init()),
                Op::Feed { lines } => out.extend(commands::feed_lines(*lines)),
                Op::Cut => out.extend(commands::cut_partial()),

                // ===== Style Changes =====
                Op::SetAlign(align) => out.extend(text::align(*align)),
                Op::SetBold(enabled) => {
                    if *enabled {
                        out.extend(text::bold_on());
                    } else {
                        out.extend(text::bold_off());
                    }
                }
                Op::SetSize(size) => out.extend(text::size(*size)),

                // ===== Content =====
                Op::Text(s) => encode_text(s, &mut out),
                Op::Newline => out.push(commands::LF),

                // ===== Graphics =====
                Op::Raster(image) => out.extend(image.to_command()),
            }
        }

        out
    }
}

/// Printable ASCII passes through; anything else becomes `?`.
///
/// The printer runs its default code page, so multi-byte UTF-8 would print
/// as garbage and break column alignment.
fn encode_text(s: &str, out: &mut Vec<u8>) {
    out.extend(s.chars().map(|c| {
        if c.is_ascii() && !c.is_ascii_control() {
            c as u8
        } else {
            b'?'
        }
    }));
}
