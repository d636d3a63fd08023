use std::{error::Error, fmt, io, path::PathBuf};

use miette::{miette, LabeledSpan, NamedSource, Report, Severity};

use crate::symbol::{Addr, Span};

/// Error raised by the label table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LabelError {
    Duplicate { name: String },
    Unknown { name: String },
}

/// Error confined to a single source line. The line contributes no instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineError {
    /// 1-based line number
    pub line: usize,
    /// Offending token, relative to the start of the source
    pub span: Span,
    pub kind: LineErrorKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineErrorKind {
    UnknownOpcode {
        opcode: String,
    },
    /// `found` is `None` when the line ended before the operand.
    MalformedOperand {
        expected: &'static str,
        found: Option<String>,
    },
}

/// Error which leaves the translator without a runnable program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranslateError {
    DuplicateLabel {
        name: String,
        line: usize,
        span: Span,
    },
    /// First line error, when translating with [`ErrorPolicy::Abort`](crate::ErrorPolicy).
    Line(LineError),
}

/// Error raised while executing an instruction. Fatal to the run.
#[derive(Debug)]
pub enum RuntimeError {
    UnknownLabel { name: String, addr: Addr },
    Arithmetic { reason: &'static str, addr: Addr },
    Output { source: io::Error, addr: Addr },
}

/// Source file could not be loaded.
#[derive(Debug)]
pub struct ResourceError {
    pub path: PathBuf,
    pub source: io::Error,
}

impl ResourceError {
    pub fn is_not_found(&self) -> bool {
        self.source.kind() == io::ErrorKind::NotFound
    }
}

impl RuntimeError {
    /// Address of the instruction that failed.
    pub fn addr(&self) -> Addr {
        match self {
            RuntimeError::UnknownLabel { addr, .. }
            | RuntimeError::Arithmetic { addr, .. }
            | RuntimeError::Output { addr, .. } => *addr,
        }
    }
}

impl Error for LabelError {}
impl Error for LineError {}
impl Error for TranslateError {}
impl Error for ResourceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.source)
    }
}
impl Error for RuntimeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            RuntimeError::Output { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl fmt::Display for LabelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Duplicate { name } => write!(f, "Duplicate label `{}`", name),
            Self::Unknown { name } => write!(f, "Label `{}` does not exist", name),
        }
    }
}

impl fmt::Display for LineErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownOpcode { opcode } => write!(f, "Unknown instruction `{}`", opcode),
            Self::MalformedOperand {
                expected,
                found: Some(found),
            } => write!(f, "Expected {}, found `{}`", expected, found),
            Self::MalformedOperand {
                expected,
                found: None,
            } => write!(f, "Expected {}, found end of line", expected),
        }
    }
}

impl fmt::Display for LineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.kind)
    }
}

impl fmt::Display for TranslateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateLabel { name, line, .. } => {
                write!(f, "line {}: Duplicate label `{}`", line, name)
            }
            Self::Line(error) => write!(f, "{}", error),
        }
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownLabel { name, addr } => {
                write!(f, "Jump to unknown label `{}` at address {}", name, addr)
            }
            Self::Arithmetic { reason, addr } => {
                write!(f, "Arithmetic error at address {}: {}", addr, reason)
            }
            Self::Output { source, addr } => {
                write!(f, "Failed to write output at address {}: {}", addr, source)
            }
        }
    }
}

impl fmt::Display for ResourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_not_found() {
            write!(f, "File not found: {}", self.path.display())
        } else {
            write!(f, "Failed to read {}: {}", self.path.display(), self.source)
        }
    }
}

// Diagnostic reports

fn source(name: &str, src: &str) -> NamedSource<String> {
    NamedSource::new(name, src.to_string())
}

impl LineError {
    pub fn report(&self, name: &str, src: &str) -> Report {
        let report = match &self.kind {
            LineErrorKind::UnknownOpcode { .. } => miette!(
                severity = Severity::Error,
                code = "translate::unknown_opcode",
                help = "available instructions are add, sub, mul, div, mov, out, jnz and jmp",
                labels = vec![LabeledSpan::at(self.span, "unknown instruction")],
                "{}",
                self.kind,
            ),
            LineErrorKind::MalformedOperand { found: None, .. } => miette!(
                severity = Severity::Error,
                code = "translate::missing_operand",
                help = "check the number of operands for this instruction",
                labels = vec![LabeledSpan::at(self.span, "line ends here")],
                "{}",
                self.kind,
            ),
            LineErrorKind::MalformedOperand {
                expected: "label name",
                ..
            } => miette!(
                severity = Severity::Error,
                code = "translate::malformed_label",
                help = "labels are non-empty and must not start with a digit or a sign",
                labels = vec![LabeledSpan::at(self.span, "malformed label")],
                "{}",
                self.kind,
            ),
            LineErrorKind::MalformedOperand { .. } => miette!(
                severity = Severity::Error,
                code = "translate::malformed_operand",
                help = "registers are named r0 to r7, literals are decimal integers",
                labels = vec![LabeledSpan::at(self.span, "malformed operand")],
                "{}",
                self.kind,
            ),
        };
        report.with_source_code(source(name, src))
    }
}

impl TranslateError {
    pub fn report(&self, name: &str, src: &str) -> Report {
        match self {
            Self::DuplicateLabel { name: label, span, .. } => miette!(
                severity = Severity::Error,
                code = "labels::duplicate",
                help = "each label may only be declared once per file",
                labels = vec![LabeledSpan::at(*span, "duplicate label")],
                "Duplicate label `{}`",
                label,
            )
            .with_source_code(source(name, src)),
            Self::Line(error) => error.report(name, src),
        }
    }
}

impl RuntimeError {
    /// `span` locates the failing statement in `src`.
    pub fn report(&self, name: &str, src: &str, span: Span) -> Report {
        let report = match self {
            Self::UnknownLabel { .. } => miette!(
                severity = Severity::Error,
                code = "runtime::unknown_label",
                help = "declare the label with `name:` in front of an instruction",
                labels = vec![LabeledSpan::at(span, "jump target is not declared")],
                "{}",
                self,
            ),
            Self::Arithmetic { .. } => miette!(
                severity = Severity::Error,
                code = "runtime::arithmetic",
                labels = vec![LabeledSpan::at(span, "failed here")],
                "{}",
                self,
            ),
            Self::Output { .. } => miette!(
                severity = Severity::Error,
                code = "runtime::output",
                labels = vec![LabeledSpan::at(span, "failed here")],
                "{}",
                self,
            ),
        };
        report.with_source_code(source(name, src))
    }
}

impl ResourceError {
    pub fn report(&self) -> Report {
        if self.is_not_found() {
            miette!(
                severity = Severity::Error,
                code = "io::not_found",
                help = "check that the path is correct",
                "{}",
                self,
            )
        } else {
            miette!(severity = Severity::Error, code = "io::read", "{}", self)
        }
    }
}

/// Warning for a jump target that no label declares.
pub fn undefined_label(name: &str, src: &str, label: &str, span: Span) -> Report {
    miette!(
        severity = Severity::Warning,
        code = "labels::undefined",
        help = "executing this jump will fail",
        labels = vec![LabeledSpan::at(span, "used here")],
        "Label `{}` is never declared",
        label,
    )
    .with_source_code(source(name, src))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_error_messages() {
        let err = LineError {
            line: 3,
            span: Span::new(10, 3),
            kind: LineErrorKind::UnknownOpcode {
                opcode: "foo".into(),
            },
        };
        assert_eq!(err.to_string(), "line 3: Unknown instruction `foo`");

        let err = LineErrorKind::MalformedOperand {
            expected: "register",
            found: None,
        };
        assert_eq!(err.to_string(), "Expected register, found end of line");
    }

    #[test]
    fn resource_not_found() {
        let err = ResourceError {
            path: "missing.sml".into(),
            source: io::Error::from(io::ErrorKind::NotFound),
        };
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "File not found: missing.sml");
    }

    #[test]
    fn reports_carry_codes() {
        let src = "add r1 r9\n";
        let err = LineError {
            line: 1,
            span: Span::new(7, 2),
            kind: LineErrorKind::MalformedOperand {
                expected: "register",
                found: Some("r9".into()),
            },
        };
        let report = err.report("test.sml", src);
        assert_eq!(
            report.code().map(|code| code.to_string()),
            Some("translate::malformed_operand".to_string())
        );
    }

    #[test]
    fn malformed_label_has_own_code() {
        let src = "5: out r0\n";
        let err = LineError {
            line: 1,
            span: Span::new(0, 2),
            kind: LineErrorKind::MalformedOperand {
                expected: "label name",
                found: Some("5:".into()),
            },
        };
        let report = err.report("test.sml", src);
        assert_eq!(
            report.code().map(|code| code.to_string()),
            Some("translate::malformed_label".to_string())
        );
        assert!(report
            .help()
            .map(|help| help.to_string().contains("must not start with a digit"))
            .unwrap_or(false));
    }
}
