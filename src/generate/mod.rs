//! Port to the generative content service. No concrete client lives in this crate.

use crate::models::{CefrLevel, QuizData, QuizSettings, StoryData, StudyGuideContent, WordDetail, WordItem};
use async_trait::async_trait;

/// Generation failure. `Display` is shown to the user as-is.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum GenerateError {
    #[error("API key is missing. Add API_KEY to the environment.")]
    MissingApiKey,
    #[error("No response from the content service")]
    EmptyResponse,
    #[error("{0}")]
    Service(String),
}

pub type GenerateResult<T> = Result<T, GenerateError>;

#[async_trait(?Send)]
pub trait ContentGenerator {
    async fn quiz(&self, settings: &QuizSettings) -> GenerateResult<QuizData>;

    async fn story(&self, settings: &QuizSettings) -> GenerateResult<StoryData>;

    /// A starter word list for `level`.
    async fn vocabulary_list(&self, level: CefrLevel) -> GenerateResult<Vec<WordItem>>;

    async fn word_details(&self, word: &str) -> GenerateResult<WordDetail>;

    async fn study_guide(&self, topic: &str, level: CefrLevel) -> GenerateResult<StudyGuideContent>;

    /// Spoken audio for `text`; the bytes are opaque to this crate.
    async fn speech(&self, text: &str) -> GenerateResult<Vec<u8>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_are_user_facing() {
        assert_eq!(
            GenerateError::Service("Quota exceeded".to_string()).to_string(),
            "Quota exceeded"
        );
        assert!(GenerateError::MissingApiKey.to_string().contains("API_KEY"));
    }
}
