use crate::error::Result;
use crate::types::{ExecutionResult, RiskLevel, Suggestion};
use crossterm::style::{StyledContent, Stylize};
use dialoguer::{theme::ColorfulTheme, Confirm, Input, Select};
use std::io::Write;

/// The three questions a session can ask.
pub trait Prompter {
    /// Asks for a non-blank instruction.
    fn instruction(&mut self) -> Result<String>;

    /// Lets the user pick one of `items`. `None` means cancel.
    fn select(&mut self, items: &[String]) -> Result<Option<usize>>;

    /// Yes/no question that defaults to no.
    fn confirm(&mut self, prompt: &str) -> Result<bool>;
}

pub struct TerminalPrompter {
    theme: ColorfulTheme,
}

impl TerminalPrompter {
    pub fn new() -> Self {
        Self {
            theme: ColorfulTheme::default(),
        }
    }
}

impl Prompter for TerminalPrompter {
    fn instruction(&mut self) -> Result<String> {
        let text = Input::<String>::with_theme(&self.theme)
            .with_prompt("What would you like to do?")
            .validate_with(|input: &String| -> std::result::Result<(), &str> {
                if input.trim().is_empty() {
                    Err("please describe what you want to do")
                } else {
                    Ok(())
                }
            })
            .interact_text()?;
        Ok(text)
    }

    fn select(&mut self, items: &[String]) -> Result<Option<usize>> {
        let mut choices = items.to_vec();
        choices.push("Cancel".to_string());

        let picked = Select::with_theme(&self.theme)
            .with_prompt("Select a command")
            .items(&choices)
            .default(0)
            .interact()?;

        Ok((picked < items.len()).then_some(picked))
    }

    fn confirm(&mut self, prompt: &str) -> Result<bool> {
        let yes = Confirm::with_theme(&self.theme)
            .with_prompt(prompt)
            .default(false)
            .interact()?;
        Ok(yes)
    }
}

pub fn risk_label(risk: RiskLevel) -> StyledContent<String> {
    let tag = format!("[{risk}]");
    match risk {
        RiskLevel::Low => tag.green(),
        RiskLevel::Medium => tag.yellow(),
        RiskLevel::High => tag.red(),
    }
}

/// Short menu entries; descriptions are already in the numbered list above.
pub fn menu_items(suggestions: &[Suggestion]) -> Vec<String> {
    suggestions
        .iter()
        .enumerate()
        .map(|(i, s)| format!("{}. {} {}", i + 1, s.command, risk_label(s.risk)))
        .collect()
}

pub fn print_suggestions(out: &mut dyn Write, suggestions: &[Suggestion]) -> std::io::Result<()> {
    writeln!(out)?;
    writeln!(out, "Suggested commands:")?;
    for (i, s) in suggestions.iter().enumerate() {
        writeln!(out, "  {}. {} {}", i + 1, s.command.as_str().bold(), risk_label(s.risk))?;
        writeln!(out, "     {}", s.description)?;
    }
    writeln!(out)
}

pub fn print_selected(out: &mut dyn Write, s: &Suggestion) -> std::io::Result<()> {
    writeln!(out)?;
    writeln!(out, "  command:     {}", s.command)?;
    writeln!(out, "  description: {}", s.description)?;
    writeln!(out, "  risk:        {}", risk_label(s.risk))?;
    writeln!(out)
}

pub fn print_result(out: &mut dyn Write, result: &ExecutionResult) -> std::io::Result<()> {
    if result.success {
        writeln!(out, "{}", "command completed".green())?;
        if let Some(output) = &result.output {
            writeln!(out, "{output}")?;
        }
        if let Some(stderr) = &result.error {
            writeln!(out, "{stderr}")?;
        }
    } else {
        writeln!(out, "{}", "command failed".red())?;
        if let Some(output) = &result.output {
            writeln!(out, "{output}")?;
        }
        if let Some(error) = &result.error {
            writeln!(out, "error: {error}")?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn menu_items_are_short_and_numbered() {
        let suggestions = [
            Suggestion::new("pwd", "Show where you are", RiskLevel::Low),
            Suggestion::new("rm -rf tmp", "Remove tmp", RiskLevel::High),
        ];
        let items = menu_items(&suggestions);
        assert_eq!(items.len(), 2);
        assert!(items[0].starts_with("1. pwd"));
        assert!(items[1].starts_with("2. rm -rf tmp"));
        assert!(items[1].contains("[high]"));
        assert!(items.iter().all(|item| !item.contains("Show where") && !item.contains("Remove tmp")));

        let mut out = Vec::new();
        print_suggestions(&mut out, &suggestions).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.matches("Show where you are").count(), 1);
    }

    #[test]
    fn failed_result_shows_error() {
        let mut out = Vec::new();
        print_result(&mut out, &ExecutionResult::failed("no such file")).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("command failed"));
        assert!(text.contains("error: no such file"));
    }
}
