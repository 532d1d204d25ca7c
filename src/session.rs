//! The interactive flow: ask, resolve, pick, confirm, run.

use crate::error::Result;
use crate::executor::Runner;
use crate::planner::{resolve, Translator};
use crate::types::{ExecutionResult, Suggestion};
use crate::ui::{menu_items, print_result, print_selected, print_suggestions, Prompter};
use crossterm::style::Stylize;
use std::io::Write;

/// How a session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    NoMatches,
    Cancelled,
    DryRun(Suggestion),
    Declined(Suggestion),
    Executed(Suggestion, ExecutionResult),
}

enum State {
    CollectInstruction,
    Resolve(String),
    Select(Vec<Suggestion>),
    Confirm(Suggestion),
    Execute(Suggestion),
    Done(Outcome),
}

pub struct Session<'a> {
    pub translator: &'a dyn Translator,
    pub runner: &'a dyn Runner,
    pub prompter: &'a mut dyn Prompter,
    pub out: &'a mut dyn Write,
    pub dry_run: bool,
}

impl Session<'_> {
    /// Drives one instruction from input to outcome. Errors only come from
    /// the terminal itself; everything else ends in an [`Outcome`].
    pub fn run(&mut self, instruction: Option<String>) -> Result<Outcome> {
        let mut state = match instruction {
            Some(text) if !text.trim().is_empty() => State::Resolve(text),
            _ => State::CollectInstruction,
        };

        loop {
            state = match state {
                State::CollectInstruction => State::Resolve(self.prompter.instruction()?),
                State::Resolve(text) => self.resolve(&text)?,
                State::Select(suggestions) => self.select(suggestions)?,
                State::Confirm(choice) => self.confirm(choice)?,
                State::Execute(choice) => self.execute(choice)?,
                State::Done(outcome) => return Ok(outcome),
            };
        }
    }

    fn resolve(&mut self, text: &str) -> Result<State> {
        writeln!(self.out, "{}", "Resolving instruction...".dim())?;
        let suggestions = resolve(self.translator, text);
        if suggestions.is_empty() {
            writeln!(self.out, "{}", "No matching commands found.".yellow())?;
            return Ok(State::Done(Outcome::NoMatches));
        }
        print_suggestions(self.out, &suggestions)?;
        Ok(State::Select(suggestions))
    }

    fn select(&mut self, mut suggestions: Vec<Suggestion>) -> Result<State> {
        let items = menu_items(&suggestions);
        let Some(index) = self.prompter.select(&items)? else {
            writeln!(self.out, "{}", "Operation cancelled.".yellow())?;
            return Ok(State::Done(Outcome::Cancelled));
        };
        let choice = suggestions.swap_remove(index);

        if self.dry_run {
            writeln!(self.out, "{}", "Dry run: command not executed.".cyan())?;
            print_selected(self.out, &choice)?;
            return Ok(State::Done(Outcome::DryRun(choice)));
        }
        Ok(State::Confirm(choice))
    }

    fn confirm(&mut self, choice: Suggestion) -> Result<State> {
        print_selected(self.out, &choice)?;
        let prompt = format!("Execute `{}`?", choice.command);
        if self.prompter.confirm(&prompt)? {
            Ok(State::Execute(choice))
        } else {
            writeln!(self.out, "{}", "Execution cancelled.".yellow())?;
            Ok(State::Done(Outcome::Declined(choice)))
        }
    }

    fn execute(&mut self, choice: Suggestion) -> Result<State> {
        writeln!(self.out, "Running: {}", choice.command.as_str().bold())?;
        let result = self.runner.run(&choice.command);
        print_result(self.out, &result)?;
        Ok(State::Done(Outcome::Executed(choice, result)))
    }
}
