use std::fmt;

use crate::{
    instr::{Instr, Target},
    labels::LabelTable,
    symbol::{Addr, Span},
};

/// Instruction together with where it came from.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Statement {
    /// Labels declared for this address, in source order
    pub labels: Vec<String>,
    pub instr: Instr,
    /// Instruction text in the source, opcode to last operand
    pub span: Span,
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for label in &self.labels {
            write!(f, "{label}: ")?;
        }
        write!(f, "{}", self.instr)
    }
}

/// Translated program: statements addressed by index, and the labels pointing into them.
#[derive(Clone, Default, PartialEq, Eq, Debug)]
pub struct Program {
    stmts: Vec<Statement>,
    labels: LabelTable,
}

impl Program {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_parts(stmts: Vec<Statement>, labels: LabelTable) -> Self {
        Program { stmts, labels }
    }

    pub fn get(&self, addr: Addr) -> Option<&Statement> {
        self.stmts.get(addr)
    }

    pub fn len(&self) -> usize {
        self.stmts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stmts.is_empty()
    }

    pub fn labels(&self) -> &LabelTable {
        &self.labels
    }

    pub fn iter(&self) -> impl Iterator<Item = &Statement> {
        self.stmts.iter()
    }

    /// Jump targets naming a label that was never declared, with the jumping statement.
    pub fn undefined_labels(&self) -> impl Iterator<Item = (&str, &Statement)> {
        self.stmts.iter().filter_map(|stmt| match stmt.instr.target() {
            Some(Target::Label(name)) if !self.labels.contains(name) => Some((name.as_str(), stmt)),
            _ => None,
        })
    }
}

impl<'a> IntoIterator for &'a Program {
    type Item = &'a Statement;
    type IntoIter = std::slice::Iter<'a, Statement>;

    fn into_iter(self) -> Self::IntoIter {
        self.stmts.iter()
    }
}

/// Listing with one statement per line, prefixed by its address.
impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (addr, stmt) in self.stmts.iter().enumerate() {
            if addr > 0 {
                writeln!(f)?;
            }
            write!(f, "{addr:>4}  {stmt}")?;
        }
        Ok(())
    }
}
