//! Local precondition checks run before any request leaves the client.
use crate::PromptParams;

pub const TOPIC_MIN_CHARS: usize = 3;
pub const TOPIC_MAX_CHARS: usize = 300;
pub const DURATION_MIN_SECONDS: u32 = 15;
pub const DURATION_MAX_SECONDS: u32 = 180;
pub const INSTRUCTIONS_MAX_CHARS: usize = 500;
pub const CODE_MAX_CHARS: usize = 100_000;

pub(crate) fn check_prompt(params: &PromptParams) -> Result<(), String> {
    let topic_len = params.topic.trim().chars().count();
    if topic_len == 0 {
        return Err("Topic is required.".to_string());
    }
    if !(TOPIC_MIN_CHARS..=TOPIC_MAX_CHARS).contains(&topic_len) {
        return Err(format!(
            "Topic must be between {TOPIC_MIN_CHARS} and {TOPIC_MAX_CHARS} characters."
        ));
    }
    if !(DURATION_MIN_SECONDS..=DURATION_MAX_SECONDS).contains(&params.duration_seconds) {
        return Err(format!(
            "Duration must be between {DURATION_MIN_SECONDS} and {DURATION_MAX_SECONDS} seconds."
        ));
    }
    if params.additional_instructions.chars().count() > INSTRUCTIONS_MAX_CHARS {
        return Err(format!(
            "Additional instructions must be at most {INSTRUCTIONS_MAX_CHARS} characters."
        ));
    }
    Ok(())
}

pub(crate) fn check_regenerate(code: &str, instruction: &str) -> Result<(), String> {
    if code.trim().is_empty() {
        return Err("Nothing to regenerate: the code buffer is empty.".to_string());
    }
    if instruction.trim().is_empty() {
        return Err("A regenerate instruction is required.".to_string());
    }
    if instruction.chars().count() > INSTRUCTIONS_MAX_CHARS {
        return Err(format!(
            "Regenerate instruction must be at most {INSTRUCTIONS_MAX_CHARS} characters."
        ));
    }
    if code.chars().count() > CODE_MAX_CHARS {
        return Err(format!("Code must be at most {CODE_MAX_CHARS} characters."));
    }
    Ok(())
}

pub(crate) fn check_render(code: &str) -> Result<(), String> {
    if code.trim().is_empty() {
        return Err("Nothing to render: the code buffer is empty.".to_string());
    }
    if code.chars().count() > CODE_MAX_CHARS {
        return Err(format!("Code must be at most {CODE_MAX_CHARS} characters."));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DifficultyLevel, StylePreset};

    fn params(topic: &str, duration_seconds: u32) -> PromptParams {
        PromptParams {
            topic: topic.to_string(),
            duration_seconds,
            style: StylePreset::Minimal,
            level: DifficultyLevel::School,
            additional_instructions: String::new(),
        }
    }

    #[test]
    fn blank_topic_is_rejected() {
        assert_eq!(
            check_prompt(&params("   ", 60)),
            Err("Topic is required.".to_string())
        );
    }

    #[test]
    fn duration_bounds_are_inclusive() {
        assert!(check_prompt(&params("circles", 15)).is_ok());
        assert!(check_prompt(&params("circles", 180)).is_ok());
        assert!(check_prompt(&params("circles", 14)).is_err());
        assert!(check_prompt(&params("circles", 181)).is_err());
    }

    #[test]
    fn topic_length_counts_chars_not_bytes() {
        assert!(check_prompt(&params("π·r²", 30)).is_ok());
        assert!(check_prompt(&params("ab", 30)).is_err());
        assert!(check_prompt(&params(&"x".repeat(301), 30)).is_err());
    }

    #[test]
    fn regenerate_needs_code_and_instruction() {
        assert!(check_regenerate("", "shorter").is_err());
        assert!(check_regenerate("print(1)", " ").is_err());
        assert!(check_regenerate("print(1)", "shorter").is_ok());
    }
}
