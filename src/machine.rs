use std::io::{self, Stdout, Write};

use log::{debug, trace};

use crate::{
    error::{LabelError, RuntimeError},
    instr::Context,
    labels::LabelTable,
    program::Program,
    registers::RegisterFile,
    symbol::{Addr, Register, Word},
};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum State {
    Running,
    /// Program counter left the program
    Halted,
}

/// Represents complete program state during runtime.
pub struct Machine<W: Write = Stdout> {
    program: Program,
    reg: RegisterFile,
    /// Program counter
    pc: Addr,
    state: State,
    /// Instructions executed so far
    steps: u64,
    /// Receives the values printed by `out`
    out: W,
}

impl Machine<Stdout> {
    /// Machine printing to standard output.
    pub fn new(program: Program) -> Self {
        Machine::with_output(program, io::stdout())
    }
}

impl<W: Write> Machine<W> {
    pub fn with_output(program: Program, out: W) -> Self {
        Machine {
            program,
            reg: RegisterFile::new(),
            pc: 0,
            state: State::Running,
            steps: 0,
            out,
        }
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn labels(&self) -> &LabelTable {
        self.program.labels()
    }

    pub fn registers(&self) -> &RegisterFile {
        &self.reg
    }

    /// Registers may be preset before running.
    pub fn registers_mut(&mut self) -> &mut RegisterFile {
        &mut self.reg
    }

    pub fn pc(&self) -> Addr {
        self.pc
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn output(&self) -> &W {
        &self.out
    }

    pub fn into_output(self) -> W {
        self.out
    }

    /// Start over with zeroed registers.
    pub fn reset(&mut self) {
        self.reg.clear();
        self.pc = 0;
        self.state = State::Running;
        self.steps = 0;
    }

    /// Execute a single instruction, or halt if the program counter is out of bounds.
    ///
    /// On error the program counter stays on the failing instruction and registers keep
    /// whatever values they held at that point.
    pub fn step(&mut self) -> Result<State, RuntimeError> {
        let Some(stmt) = self.program.get(self.pc) else {
            if self.state == State::Running {
                debug!("halted at {} after {} steps", self.pc, self.steps);
            }
            self.state = State::Halted;
            return Ok(self.state);
        };
        trace!("{:>4}: {}", self.pc, stmt.instr);

        let mut frame = Frame {
            pc: self.pc,
            reg: &mut self.reg,
            labels: self.program.labels(),
            jump: None,
            out: &mut self.out,
        };
        stmt.instr.execute(&mut frame)?;
        let next = frame.jump.unwrap_or(self.pc + 1);

        self.steps += 1;
        self.pc = next;
        if self.pc >= self.program.len() {
            debug!("halted at {} after {} steps", self.pc, self.steps);
            self.state = State::Halted;
        }
        Ok(self.state)
    }

    /// Run until the program halts. Never returns for a program that loops forever.
    pub fn run(&mut self) -> Result<(), RuntimeError> {
        while self.step()? == State::Running {}
        Ok(())
    }

    /// Run at most `max_steps` instructions. Returns [`State::Running`] if the limit was hit.
    pub fn run_for(&mut self, max_steps: u64) -> Result<State, RuntimeError> {
        let limit = self.steps.saturating_add(max_steps);
        while self.state == State::Running && self.steps < limit {
            self.step()?;
        }
        // Catch a program counter that is already out of bounds
        if self.state == State::Running && self.program.get(self.pc).is_none() {
            self.step()?;
        }
        Ok(self.state)
    }
}

/// View of the machine handed to an executing instruction.
struct Frame<'m, W> {
    pc: Addr,
    reg: &'m mut RegisterFile,
    labels: &'m LabelTable,
    jump: Option<Addr>,
    out: &'m mut W,
}

impl<W: Write> Context for Frame<'_, W> {
    fn pc(&self) -> Addr {
        self.pc
    }

    fn reg(&self, reg: Register) -> Word {
        self.reg.get(reg)
    }

    fn set_reg(&mut self, reg: Register, val: Word) {
        self.reg.set(reg, val)
    }

    fn address_of(&self, label: &str) -> Result<Addr, LabelError> {
        self.labels.get_address(label)
    }

    fn jump(&mut self, addr: Addr) {
        self.jump = Some(addr)
    }

    fn output(&mut self, val: Word) -> io::Result<()> {
        writeln!(self.out, "{val}")
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;
    use crate::{symbol::Register::*, translator::Translator};

    fn machine(src: &str) -> Machine<Vec<u8>> {
        let translation = Translator::new().translate(src).unwrap();
        assert!(translation.is_clean(), "{:?}", translation.diagnostics);
        Machine::with_output(translation.program, Vec::new())
    }

    fn printed(machine: Machine<Vec<u8>>) -> String {
        String::from_utf8(machine.into_output()).unwrap()
    }

    #[test]
    fn empty_program_halts_immediately() {
        let mut m = machine("");
        assert_eq!(m.state(), State::Running);
        m.run().unwrap();
        assert_eq!(m.state(), State::Halted);
        assert_eq!(m.pc(), 0);
        assert_eq!(m.steps(), 0);
        assert_eq!(m.registers(), &RegisterFile::new());
    }

    #[test]
    fn labeled_add() {
        let mut m = machine("r1: add r1 r2");
        m.registers_mut().set(R1, 3);
        m.registers_mut().set(R2, 4);
        m.run().unwrap();
        assert_eq!(m.registers().get(R1), 7);
        assert_eq!(m.registers().get(R2), 4);
        assert_eq!(m.labels().get_address("r1"), Ok(0));
        assert_eq!(m.state(), State::Halted);
        assert_eq!(m.pc(), 1);
    }

    #[test]
    fn straight_line_takes_one_step_per_instruction() {
        let mut m = machine("mov r0 6\nmov r1 7\nmul r0 r1\nmov r2 2\nsub r0 r2\nout r0\n");
        m.run().unwrap();
        assert_eq!(m.steps(), 6);
        assert_eq!(m.pc(), 6);
        assert_eq!(m.registers().get(R0), 40);
        assert_eq!(printed(m), "40\n");
    }

    #[test]
    fn step_by_step() {
        let mut m = machine("mov r0 1\nout r0");
        assert_eq!(m.step().unwrap(), State::Running);
        assert_eq!(m.pc(), 1);
        assert_eq!(m.step().unwrap(), State::Halted);
        assert_eq!(m.pc(), 2);
        // Stepping a halted machine does nothing
        assert_eq!(m.step().unwrap(), State::Halted);
        assert_eq!(m.steps(), 2);
    }

    #[test]
    fn countdown_loop() {
        let mut m = machine(
            r#"
                  mov r0 3
                  mov r1 1
            loop: out r0
                  sub r0 r1
                  jnz r0 loop
                  out r0
            "#,
        );
        m.run().unwrap();
        assert_eq!(m.registers().get(R0), 0);
        assert_eq!(m.steps(), 2 + 3 * 3 + 1);
        assert_eq!(printed(m), "3\n2\n1\n0\n");
    }

    #[test]
    fn factorial() {
        let mut m = machine(
            r#"
                  mov r0 1
                  mov r1 5
                  mov r2 1
            f:    mul r0 r1
                  sub r1 r2
                  jnz r1 f
                  out r0
            "#,
        );
        m.run().unwrap();
        assert_eq!(m.registers().get(R0), 120);
        assert_eq!(printed(m), "120\n");
    }

    #[test]
    fn jump_past_end_halts() {
        let mut m = machine("jmp end\nmov r0 9\nend:");
        m.run().unwrap();
        assert_eq!(m.registers().get(R0), 0);
        assert_eq!(m.pc(), 2);

        let mut m = machine("jmp 100\nmov r0 9");
        m.run().unwrap();
        assert_eq!(m.state(), State::Halted);
        assert_eq!(m.pc(), 100);
        assert_eq!(m.registers().get(R0), 0);
    }

    #[test]
    fn self_jump_never_halts() {
        let mut m = machine("spin: jmp spin");
        assert_eq!(m.run_for(10_000).unwrap(), State::Running);
        assert_eq!(m.steps(), 10_000);
        assert_eq!(m.pc(), 0);
        // Limit is relative to the steps already taken
        assert_eq!(m.run_for(5).unwrap(), State::Running);
        assert_eq!(m.steps(), 10_005);
    }

    #[test]
    fn run_for_reports_halt() {
        let mut m = machine("mov r0 1\nmov r1 2");
        assert_eq!(m.run_for(100).unwrap(), State::Halted);
        assert_eq!(m.steps(), 2);

        let mut m = machine("");
        assert_eq!(m.run_for(0).unwrap(), State::Halted);
    }

    #[test]
    fn division_by_zero_keeps_partial_state() {
        let mut m = machine("mov r0 8\nmov r1 0\ndiv r0 r1\nmov r2 5");
        let err = m.run().unwrap_err();
        assert!(matches!(err, RuntimeError::Arithmetic { addr: 2, .. }));
        assert_eq!(m.pc(), 2);
        assert_eq!(m.registers().get(R0), 8);
        assert_eq!(m.registers().get(R2), 0);
        assert_eq!(m.state(), State::Running);
    }

    #[test]
    fn unknown_label_is_fatal() {
        let mut m = machine("mov r0 1\njnz r0 missing\nout r0");
        let err = m.run().unwrap_err();
        assert!(matches!(
            err,
            RuntimeError::UnknownLabel { ref name, addr: 1 } if name == "missing"
        ));
        assert_eq!(printed(m), "");
    }

    #[test]
    fn reset_starts_over() {
        let mut m = machine("mov r3 4\nout r3");
        m.run().unwrap();
        m.reset();
        assert_eq!(m.registers().get(R3), 0);
        assert_eq!(m.pc(), 0);
        assert_eq!(m.state(), State::Running);
        m.run().unwrap();
        assert_eq!(printed(m), "4\n4\n");
    }
}
