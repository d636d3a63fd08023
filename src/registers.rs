use std::fmt;

use crate::symbol::{Register, Word};

/// Register bank of the machine. Registers that were never written read as 0.
#[derive(Clone, Default, PartialEq, Eq, Debug)]
pub struct RegisterFile {
    reg: [Word; Register::COUNT],
}

impl RegisterFile {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn get(&self, reg: Register) -> Word {
        self.reg[reg.index()]
    }

    #[inline]
    pub fn set(&mut self, reg: Register, val: Word) {
        self.reg[reg.index()] = val;
    }

    /// Zero every register.
    pub fn clear(&mut self) {
        self.reg = [0; Register::COUNT];
    }

    pub fn iter(&self) -> impl Iterator<Item = (Register, Word)> + '_ {
        Register::ALL.into_iter().map(|reg| (reg, self.get(reg)))
    }
}

impl fmt::Display for RegisterFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "------ Registers ------")?;
        for (reg, val) in self.iter() {
            writeln!(f, "{reg}: {val:.>18}")?;
        }
        write!(f, "-----------------------")
    }
}
