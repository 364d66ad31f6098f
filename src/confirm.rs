use crate::providers::CommandSuggestion;
use anyhow::Result;
use colored::*;
use std::io::{self, BufRead, Write};

/// The binary choice offered after a suggestion is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Yes,
    No,
}

/// Captured result of one shell invocation.
#[derive(Debug, Clone, Default)]
pub struct ShellOutput {
    pub stdout: String,
    pub stderr: String,
    pub success: bool,
    pub exit_code: Option<i32>,
}

/// Capability to run an accepted command, injected so the confirm flow stays
/// pure and testable.
pub trait ShellRunner {
    fn run(&self, command: &str) -> Result<ShellOutput>;
}

/// How a confirm-and-execute pass ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Declined,
    Executed,
    ExecutionFailed,
}

/// Presents a suggestion, asks for a single yes/no decision, and executes on
/// acceptance.
///
/// Exactly one decision is taken per run; there is no re-prompt after an
/// execution, successful or not.
pub fn run_with_io<R, W>(
    suggestion: &CommandSuggestion,
    runner: &dyn ShellRunner,
    input: &mut R,
    output: &mut W,
) -> Result<Outcome>
where
    R: BufRead,
    W: Write,
{
    writeln!(output, "By running: \"{}\"", suggestion.command.bold())?;
    writeln!(output, "{}", suggestion.explanation)?;

    match await_decision(input, output)? {
        Decision::No => Ok(Outcome::Declined),
        Decision::Yes => execute(&suggestion.command, runner, output),
    }
}

/// Convenience wrapper over [`run_with_io`] bound to stdin/stdout.
pub fn run(suggestion: &CommandSuggestion, runner: &dyn ShellRunner) -> Result<Outcome> {
    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut output = io::stdout();
    run_with_io(suggestion, runner, &mut input, &mut output)
}

fn await_decision<R, W>(input: &mut R, output: &mut W) -> Result<Decision>
where
    R: BufRead,
    W: Write,
{
    loop {
        write!(output, "Do you want to run this command? [Y/n]: ")?;
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            // closed input counts as a decline
            return Ok(Decision::No);
        }

        match line.trim().to_lowercase().as_str() {
            "" | "y" | "yes" => return Ok(Decision::Yes),
            "n" | "no" => return Ok(Decision::No),
            _ => writeln!(output, "Please answer y or n.")?,
        }
    }
}

fn execute<W: Write>(command: &str, runner: &dyn ShellRunner, output: &mut W) -> Result<Outcome> {
    let run = match runner.run(command) {
        Ok(run) => run,
        Err(e) => {
            writeln!(output, "{}", e.to_string().red())?;
            return Ok(Outcome::ExecutionFailed);
        }
    };

    if !run.success {
        let code = run.exit_code.unwrap_or(-1);
        writeln!(
            output,
            "{}",
            format!("Command failed with exit code {code}").red()
        )?;
        if !run.stderr.is_empty() {
            write!(output, "{}", run.stderr)?;
        }
        return Ok(Outcome::ExecutionFailed);
    }

    if !run.stderr.is_empty() {
        write!(output, "{}", run.stderr)?;
        return Ok(Outcome::Executed);
    }

    writeln!(output, "{}", run.stdout)?;
    Ok(Outcome::Executed)
}
