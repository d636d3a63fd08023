// Translation
mod lexer;
mod translator;
pub use translator::{ErrorPolicy, Translation, Translator};
mod program;
pub use program::{Program, Statement};
mod labels;
pub use labels::LabelTable;

// Running
mod instr;
pub use instr::{Context, Instr, Opcode, Target};
mod machine;
pub use machine::{Machine, State};
mod registers;
pub use registers::RegisterFile;

mod symbol;
pub use symbol::{Addr, Register, Span, Word};

pub mod error;
pub mod source;

pub mod env;

/// Amount of lines to show as context, each side of focus line (line containing span).
pub const DIAGNOSTIC_CONTEXT_LINES: usize = 4;

/// Translate `src` with the default [`ErrorPolicy`].
pub fn translate(src: &str) -> Result<Translation, error::TranslateError> {
    Translator::new().translate(src)
}
