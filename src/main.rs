use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use colored::Colorize;
use log::debug;
use miette::{bail, Result};

use sml::error::{self, TranslateError};
use sml::{ErrorPolicy, Machine, State, Translation, Translator};

/// Translator and virtual machine for the SML register assembly language.
#[derive(Parser)]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Quickly provide a `.sml` file to run
    path: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Translate and run a `.sml` file, then print the registers
    Run {
        /// `.sml` file to run
        name: PathBuf,
        /// Stop at the first line that cannot be translated
        #[arg(short, long)]
        strict: bool,
        /// Give up after this many instructions
        #[arg(short = 'n', long)]
        max_steps: Option<u64>,
        /// Produce minimal output, suited for blackbox tests
        #[arg(short, long)]
        minimal: bool,
    },
    /// Check a `.sml` file without running it
    Check {
        /// File to check
        name: PathBuf,
        /// Stop at the first line that cannot be translated
        #[arg(short, long)]
        strict: bool,
    },
    /// Print the label table and instruction listing of a `.sml` file
    Labels {
        /// File to translate
        name: PathBuf,
    },
}

fn main() -> miette::Result<()> {
    let args = Args::parse();
    env_logger::init();
    sml::env::init();

    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new() //
                .context_lines(sml::DIAGNOSTIC_CONTEXT_LINES)
                .build(),
        )
    }))?;

    match args.command {
        Some(Command::Run {
            name,
            strict,
            max_steps,
            minimal,
        }) => {
            let opts = RunOptions {
                policy: policy(strict),
                max_steps: max_steps.or_else(sml::env::max_steps),
                minimal,
            };
            run(&name, opts)
        }
        Some(Command::Check { name, strict }) => {
            file_message(MsgColor::Green, "Checking", &name, false);
            let src = read(&name)?;
            let translation = translate(&name, &src, policy(strict))?;
            let skipped = translation.diagnostics.len();
            if skipped > 0 {
                bail!("{skipped} line(s) could not be translated");
            }
            message(MsgColor::Green, "Success", "no errors found!", false);
            Ok(())
        }
        Some(Command::Labels { name }) => {
            let src = read(&name)?;
            let translation = translate(&name, &src, sml::env::error_policy())?;
            let program = translation.program;
            println!("------ Labels ------");
            if !program.labels().is_empty() {
                println!("{}", program.labels());
            }
            println!("------ Program -----");
            if !program.is_empty() {
                println!("{program}");
            }
            Ok(())
        }
        None => {
            if let Some(path) = args.path {
                run(
                    &path,
                    RunOptions {
                        policy: sml::env::error_policy(),
                        max_steps: sml::env::max_steps(),
                        minimal: false,
                    },
                )
            } else {
                println!("\n~ sml v{VERSION} ~");
                println!("{SHORT_INFO}");
                std::process::exit(0);
            }
        }
    }
}

struct RunOptions {
    policy: ErrorPolicy,
    max_steps: Option<u64>,
    minimal: bool,
}

/// Command line flag wins over the environment.
fn policy(strict: bool) -> ErrorPolicy {
    if strict {
        ErrorPolicy::Abort
    } else {
        sml::env::error_policy()
    }
}

enum MsgColor {
    Green,
    Red,
}

fn file_message(color: MsgColor, left: &str, right: &Path, minimal: bool) {
    let right = format!("target {}", right.display());
    message(color, left, &right, minimal);
}

fn message(color: MsgColor, left: &str, right: &str, minimal: bool) {
    if minimal {
        return;
    }
    let left = match color {
        MsgColor::Green => left.green(),
        MsgColor::Red => left.red(),
    };
    println!("{left:>12} {right}");
}

fn read(name: &Path) -> Result<String> {
    sml::source::read(name).map_err(|e| e.report())
}

/// Translate source, printing every skipped line. Fails on a fatal error.
fn translate(name: &Path, src: &str, policy: ErrorPolicy) -> Result<Translation> {
    let name = name.display().to_string();
    debug!("translating {name} with {policy:?} policy");
    let translation = Translator::with_policy(policy)
        .translate(src)
        .map_err(|e: TranslateError| e.report(&name, src))?;

    for diagnostic in &translation.diagnostics {
        eprintln!("{:?}", diagnostic.report(&name, src));
    }
    for (label, stmt) in translation.program.undefined_labels() {
        eprintln!("{:?}", error::undefined_label(&name, src, label, stmt.span));
    }
    Ok(translation)
}

fn run(name: &Path, opts: RunOptions) -> Result<()> {
    file_message(MsgColor::Green, "Translating", name, opts.minimal);
    let src = read(name)?;
    let translation = translate(name, &src, opts.policy)?;
    if !translation.is_clean() {
        let skipped = format!("{} line(s) with errors", translation.diagnostics.len());
        message(MsgColor::Red, "Skipped", &skipped, opts.minimal);
    }

    let mut machine = Machine::new(translation.program);
    let ran = format!("{} instruction(s)", machine.program().len());
    message(MsgColor::Green, "Running", &ran, opts.minimal);

    let result = match opts.max_steps {
        Some(limit) => machine.run_for(limit),
        None => machine.run().map(|_| State::Halted),
    };
    // Registers are shown even when the run failed
    println!("{}", machine.registers());

    match result {
        Ok(State::Halted) => {
            file_message(MsgColor::Green, "Completed", name, opts.minimal);
            Ok(())
        }
        Ok(State::Running) => bail!(
            "Program did not halt within {} steps",
            opts.max_steps.unwrap_or_default()
        ),
        Err(e) => {
            let span = machine
                .program()
                .get(e.addr())
                .map(|stmt| stmt.span)
                .unwrap_or_default();
            Err(e.report(&name.display().to_string(), &src, span))
        }
    }
}

const SHORT_INFO: &str = r"
Welcome to sml, a translator and virtual machine for the SML register language.
Please use `-h` or `--help` to access the usage instructions and documentation.
";

const VERSION: &str = env!("CARGO_PKG_VERSION");
