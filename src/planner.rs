use crate::error::AiError;
use crate::patterns::match_patterns;
use crate::types::Suggestion;

/// A model-backed source of command suggestions.
pub trait Translator {
    /// Whether a credential is present. Must not touch the network.
    fn is_configured(&self) -> bool;

    fn convert_to_commands(&self, instruction: &str) -> Result<Vec<Suggestion>, AiError>;
}

/// Resolves an instruction into candidate commands. Tries the model first
/// when it is configured; any failure or empty reply falls back to the
/// keyword rules. Model output is returned as-is, never merged.
pub fn resolve(translator: &dyn Translator, instruction: &str) -> Vec<Suggestion> {
    if translator.is_configured() {
        match translator.convert_to_commands(instruction) {
            Ok(suggestions) if !suggestions.is_empty() => {
                tracing::debug!(count = suggestions.len(), "resolved with AI");
                return suggestions;
            }
            Ok(_) => tracing::warn!("AI returned no commands, falling back to pattern matching"),
            Err(e) => tracing::warn!("AI conversion failed ({e}), falling back to pattern matching"),
        }
    } else {
        tracing::debug!("no API key configured, using pattern matching");
    }

    match_patterns(instruction)
}
