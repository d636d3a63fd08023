use std::{fmt, io, str::FromStr};

use crate::{
    error::{LabelError, RuntimeError},
    symbol::{Addr, Register, Word},
};

/// Capabilities an instruction is given while it executes.
pub trait Context {
    /// Address of the executing instruction.
    fn pc(&self) -> Addr;
    fn reg(&self, reg: Register) -> Word;
    fn set_reg(&mut self, reg: Register, val: Word);
    fn address_of(&self, label: &str) -> Result<Addr, LabelError>;
    /// Continue at `addr` instead of the next instruction.
    fn jump(&mut self, addr: Addr);
    fn output(&mut self, val: Word) -> io::Result<()>;
}

/// Instruction keyword.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Opcode {
    Add,
    Sub,
    Mul,
    Div,
    Mov,
    Out,
    Jnz,
    Jmp,
}

impl Opcode {
    pub fn keyword(self) -> &'static str {
        match self {
            Opcode::Add => "add",
            Opcode::Sub => "sub",
            Opcode::Mul => "mul",
            Opcode::Div => "div",
            Opcode::Mov => "mov",
            Opcode::Out => "out",
            Opcode::Jnz => "jnz",
            Opcode::Jmp => "jmp",
        }
    }
}

impl FromStr for Opcode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "add" => Ok(Opcode::Add),
            "sub" => Ok(Opcode::Sub),
            "mul" => Ok(Opcode::Mul),
            "div" => Ok(Opcode::Div),
            "mov" => Ok(Opcode::Mov),
            "out" => Ok(Opcode::Out),
            "jnz" => Ok(Opcode::Jnz),
            "jmp" => Ok(Opcode::Jmp),
            _ => Err(()),
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// Destination of a jump.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Target {
    Label(String),
    /// Literal statement address
    Addr(Addr),
}

impl Target {
    fn resolve(&self, ctx: &dyn Context) -> Result<Addr, RuntimeError> {
        match self {
            Target::Addr(addr) => Ok(*addr),
            Target::Label(name) => ctx.address_of(name).map_err(|_| RuntimeError::UnknownLabel {
                name: name.clone(),
                addr: ctx.pc(),
            }),
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Label(name) => f.write_str(name),
            Target::Addr(addr) => write!(f, "{addr}"),
        }
    }
}

/// Single decoded SML instruction.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Instr {
    /// Add `src` into `dest`
    Add { dest: Register, src: Register },
    /// Subtract `src` from `dest`
    Sub { dest: Register, src: Register },
    /// Multiply `dest` by `src`
    Mul { dest: Register, src: Register },
    /// Divide `dest` by `src`, truncating towards zero
    Div { dest: Register, src: Register },
    /// Store literal `val` in `dest`
    Mov { dest: Register, val: Word },
    /// Print the contents of `src`
    Out { src: Register },
    /// Jump to `target` if `src` is not zero
    Jnz { src: Register, target: Target },
    /// Jump to `target`
    Jmp { target: Target },
}

impl Instr {
    pub fn opcode(&self) -> Opcode {
        match self {
            Instr::Add { .. } => Opcode::Add,
            Instr::Sub { .. } => Opcode::Sub,
            Instr::Mul { .. } => Opcode::Mul,
            Instr::Div { .. } => Opcode::Div,
            Instr::Mov { .. } => Opcode::Mov,
            Instr::Out { .. } => Opcode::Out,
            Instr::Jnz { .. } => Opcode::Jnz,
            Instr::Jmp { .. } => Opcode::Jmp,
        }
    }

    /// Jump target, for instructions that have one.
    pub fn target(&self) -> Option<&Target> {
        match self {
            Instr::Jnz { target, .. } | Instr::Jmp { target } => Some(target),
            _ => None,
        }
    }

    /// Apply the instruction to the machine.
    pub fn execute(&self, ctx: &mut dyn Context) -> Result<(), RuntimeError> {
        match self {
            Instr::Add { dest, src } => {
                let res = ctx.reg(*dest).wrapping_add(ctx.reg(*src));
                ctx.set_reg(*dest, res);
            }
            Instr::Sub { dest, src } => {
                let res = ctx.reg(*dest).wrapping_sub(ctx.reg(*src));
                ctx.set_reg(*dest, res);
            }
            Instr::Mul { dest, src } => {
                let res = ctx.reg(*dest).wrapping_mul(ctx.reg(*src));
                ctx.set_reg(*dest, res);
            }
            Instr::Div { dest, src } => {
                let divisor = ctx.reg(*src);
                if divisor == 0 {
                    return Err(RuntimeError::Arithmetic {
                        reason: "division by zero",
                        addr: ctx.pc(),
                    });
                }
                let res = ctx.reg(*dest).wrapping_div(divisor);
                ctx.set_reg(*dest, res);
            }
            Instr::Mov { dest, val } => ctx.set_reg(*dest, *val),
            Instr::Out { src } => {
                let val = ctx.reg(*src);
                ctx.output(val).map_err(|source| RuntimeError::Output {
                    source,
                    addr: ctx.pc(),
                })?;
            }
            Instr::Jnz { src, target } => {
                if ctx.reg(*src) != 0 {
                    let addr = target.resolve(ctx)?;
                    ctx.jump(addr);
                }
            }
            Instr::Jmp { target } => {
                let addr = target.resolve(ctx)?;
                ctx.jump(addr);
            }
        }
        Ok(())
    }
}

impl fmt::Display for Instr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = self.opcode();
        match self {
            Instr::Add { dest, src }
            | Instr::Sub { dest, src }
            | Instr::Mul { dest, src }
            | Instr::Div { dest, src } => write!(f, "{op} {dest} {src}"),
            Instr::Mov { dest, val } => write!(f, "{op} {dest} {val}"),
            Instr::Out { src } => write!(f, "{op} {src}"),
            Instr::Jnz { src, target } => write!(f, "{op} {src} {target}"),
            Instr::Jmp { target } => write!(f, "{op} {target}"),
        }
    }
}
