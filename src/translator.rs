use std::mem;

use log::{debug, trace, warn};

use crate::{
    error::{LineError, LineErrorKind, TranslateError},
    instr::{Instr, Opcode, Target},
    labels::LabelTable,
    lexer::{self, cursor::Cursor, Line, Token},
    program::{Program, Statement},
    symbol::{Register, Span, Word},
};

/// What to do with a line that cannot be translated.
#[derive(Clone, Copy, PartialEq, Eq, Default, Debug)]
pub enum ErrorPolicy {
    /// Skip the line, keep translating and collect every error.
    #[default]
    Continue,
    /// Fail on the first bad line.
    Abort,
}

/// Result of a successful translation pass.
#[derive(Debug)]
pub struct Translation {
    pub program: Program,
    /// Lines that were skipped, in source order
    pub diagnostics: Vec<LineError>,
}

impl Translation {
    /// No line was skipped
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

/// Label seen in the source but not yet bound to an address.
#[derive(Debug)]
struct PendingLabel {
    name: String,
    line: usize,
    span: Span,
}

/// Turns SML source into a [`Program`], one line at a time.
///
/// A translator may be reused for any number of sources; each call to
/// [`Translator::translate`] starts from a clean state.
#[derive(Debug, Default)]
pub struct Translator {
    policy: ErrorPolicy,
    labels: LabelTable,
    stmts: Vec<Statement>,
    diagnostics: Vec<LineError>,
    /// Labels waiting for the next instruction
    pending: Vec<PendingLabel>,
}

impl Translator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: ErrorPolicy) -> Self {
        Translator {
            policy,
            ..Self::default()
        }
    }

    pub fn policy(&self) -> ErrorPolicy {
        self.policy
    }

    fn reset(&mut self) {
        self.labels.reset();
        self.stmts.clear();
        self.diagnostics.clear();
        self.pending.clear();
    }

    pub fn translate(&mut self, src: &str) -> Result<Translation, TranslateError> {
        self.reset();

        for line in lexer::lines(src) {
            let carried = self.pending.len();
            match self.translate_line(line) {
                Ok(()) => {}
                Err(TranslateError::Line(err)) if self.policy == ErrorPolicy::Continue => {
                    // A label declared on a skipped line is dropped with it
                    self.pending.truncate(carried);
                    warn!("skipping {err}");
                    self.diagnostics.push(err);
                }
                Err(err) => {
                    debug!("translation aborted: {err}");
                    return Err(err);
                }
            }
        }
        // Labels on the last lines point just past the final instruction
        self.bind_pending()?;

        debug!(
            "translated {} statements with {} labels, {} lines skipped",
            self.stmts.len(),
            self.labels.len(),
            self.diagnostics.len()
        );
        Ok(Translation {
            program: Program::from_parts(mem::take(&mut self.stmts), mem::take(&mut self.labels)),
            diagnostics: mem::take(&mut self.diagnostics),
        })
    }

    fn translate_line(&mut self, line: Line) -> Result<(), TranslateError> {
        let mut cur = Cursor::new(line.text, line.offs);
        let Some(first) = cur.advance_token() else {
            return Ok(());
        };

        let opcode = match first.as_label() {
            // Numeric names would read as literal addresses when used as a target
            Some(name) if name.is_empty() || starts_numeric(name) => {
                return Err(TranslateError::Line(LineError {
                    line: line.number,
                    span: first.span,
                    kind: LineErrorKind::MalformedOperand {
                        expected: "label name",
                        found: Some(first.text.to_string()),
                    },
                }))
            }
            Some(name) => {
                self.pending.push(PendingLabel {
                    name: name.to_string(),
                    line: line.number,
                    span: Span::new(first.span.offs(), name.len()),
                });
                match cur.advance_token() {
                    Some(tok) => tok,
                    // Label only, binds to the next instruction
                    None => return Ok(()),
                }
            }
            None => first,
        };

        let instr = parse_instr(opcode, &mut cur, line.number).map_err(TranslateError::Line)?;
        let span = Span::new(opcode.span.offs(), cur.pos() - opcode.span.offs());
        self.push(instr, span)
    }

    /// Append instruction, binding every pending label to its address.
    fn push(&mut self, instr: Instr, span: Span) -> Result<(), TranslateError> {
        let addr = self.stmts.len();
        let labels = self.bind_pending()?;
        trace!("{addr:>4}: {instr}");
        self.stmts.push(Statement {
            labels,
            instr,
            span,
        });
        Ok(())
    }

    /// Bind pending labels to the next free address. Returns their names.
    fn bind_pending(&mut self) -> Result<Vec<String>, TranslateError> {
        let addr = self.stmts.len();
        let mut bound = Vec::with_capacity(self.pending.len());
        for pending in self.pending.drain(..) {
            if self.labels.add_label(&pending.name, addr).is_err() {
                return Err(TranslateError::DuplicateLabel {
                    name: pending.name,
                    line: pending.line,
                    span: pending.span,
                });
            }
            bound.push(pending.name);
        }
        Ok(bound)
    }
}

fn starts_numeric(text: &str) -> bool {
    text.starts_with(|c: char| c.is_ascii_digit() || c == '-' || c == '+')
}

/// Decode one instruction, consuming exactly the operands its opcode takes.
fn parse_instr(tok: Token, cur: &mut Cursor, line: usize) -> Result<Instr, LineError> {
    let Ok(opcode) = tok.text.parse::<Opcode>() else {
        return Err(LineError {
            line,
            span: tok.span,
            kind: LineErrorKind::UnknownOpcode {
                opcode: tok.text.to_string(),
            },
        });
    };

    let mut ops = Operands { cur, line };
    let instr = match opcode {
        Opcode::Add => Instr::Add {
            dest: ops.reg()?,
            src: ops.reg()?,
        },
        Opcode::Sub => Instr::Sub {
            dest: ops.reg()?,
            src: ops.reg()?,
        },
        Opcode::Mul => Instr::Mul {
            dest: ops.reg()?,
            src: ops.reg()?,
        },
        Opcode::Div => Instr::Div {
            dest: ops.reg()?,
            src: ops.reg()?,
        },
        Opcode::Mov => Instr::Mov {
            dest: ops.reg()?,
            val: ops.int()?,
        },
        Opcode::Out => Instr::Out { src: ops.reg()? },
        Opcode::Jnz => Instr::Jnz {
            src: ops.reg()?,
            target: ops.target()?,
        },
        Opcode::Jmp => Instr::Jmp {
            target: ops.target()?,
        },
    };
    ops.finish()?;
    Ok(instr)
}

/// Operand reader for the remainder of a line.
struct Operands<'c, 'a> {
    cur: &'c mut Cursor<'a>,
    line: usize,
}

impl<'a> Operands<'_, 'a> {
    fn malformed(&self, span: Span, expected: &'static str, found: Option<&str>) -> LineError {
        LineError {
            line: self.line,
            span,
            kind: LineErrorKind::MalformedOperand {
                expected,
                found: found.map(str::to_string),
            },
        }
    }

    fn expect(&mut self, expected: &'static str) -> Result<Token<'a>, LineError> {
        match self.cur.advance_token() {
            Some(tok) => Ok(tok),
            None => Err(self.malformed(self.cur.eol_span(), expected, None)),
        }
    }

    fn reg(&mut self) -> Result<Register, LineError> {
        let tok = self.expect("register")?;
        tok.text
            .parse()
            .map_err(|_| self.malformed(tok.span, "register", Some(tok.text)))
    }

    fn int(&mut self) -> Result<Word, LineError> {
        let tok = self.expect("integer literal")?;
        tok.text
            .parse()
            .map_err(|_| self.malformed(tok.span, "integer literal", Some(tok.text)))
    }

    /// Label name, or a literal address if the operand is numeric.
    fn target(&mut self) -> Result<Target, LineError> {
        let tok = self.expect("label or address")?;
        if !starts_numeric(tok.text) {
            return Ok(Target::Label(tok.text.to_string()));
        }
        tok.text
            .parse()
            .map(Target::Addr)
            .map_err(|_| self.malformed(tok.span, "label or address", Some(tok.text)))
    }

    /// Nothing may follow the last operand.
    fn finish(&mut self) -> Result<(), LineError> {
        match self.cur.peek_token() {
            None => Ok(()),
            Some(tok) => Err(self.malformed(tok.span, "end of line", Some(tok.text))),
        }
    }
}
