//! Read-through lookups: stored content first, generator on a miss.
//!
//! Generator errors are the only errors that leave this module. Storing the
//! generated result never fails from the caller's point of view.

use crate::generate::{ContentGenerator, GenerateResult};
use crate::models::{
    CefrLevel, QuizSettings, SavedQuiz, SavedStory, StudyGuideContent, VocabularyEntry, WordDetail,
};
use crate::persistence::Persistence;
use crate::remote::RemoteStore;
use crate::storage::LocalStore;

pub struct ContentCache<'a, R, L, G> {
    persistence: &'a Persistence<R, L>,
    generator: &'a G,
}

impl<'a, R: RemoteStore, L: LocalStore, G: ContentGenerator> ContentCache<'a, R, L, G> {
    pub fn new(persistence: &'a Persistence<R, L>, generator: &'a G) -> Self {
        Self {
            persistence,
            generator,
        }
    }

    pub async fn vocabulary_or_generate(&self, level: CefrLevel) -> GenerateResult<Vec<VocabularyEntry>> {
        let stored = self.persistence.vocabulary_by_level(level).await;
        if !stored.is_empty() {
            return Ok(stored);
        }

        tracing::info!(%level, "no vocabulary stored, generating a list");
        let words = self.generator.vocabulary_list(level).await?;
        Ok(self.persistence.save_vocabulary_list(level, words).await)
    }

    pub async fn word_details_or_generate(&self, word: &str) -> GenerateResult<WordDetail> {
        if let Some(details) = self.persistence.word_details(word).await {
            return Ok(details);
        }

        let details = self.generator.word_details(word).await?;
        self.persistence
            .update_word_details(word, details.clone())
            .await;
        Ok(details)
    }

    pub async fn study_guide_or_generate(
        &self,
        topic: &str,
        level: CefrLevel,
    ) -> GenerateResult<StudyGuideContent> {
        if let Some(guide) = self.persistence.study_guide(topic, level).await {
            return Ok(guide);
        }

        let guide = self.generator.study_guide(topic, level).await?;
        self.persistence
            .save_study_guide(topic, level, guide.clone())
            .await;
        Ok(guide)
    }

    /// Generate a quiz and append it to history.
    pub async fn new_quiz(&self, settings: &QuizSettings) -> GenerateResult<SavedQuiz> {
        let quiz = self.generator.quiz(settings).await?;
        Ok(self.persistence.save_quiz(quiz).await)
    }

    /// Generate a story and append it to history.
    pub async fn new_story(&self, settings: &QuizSettings) -> GenerateResult<SavedStory> {
        let story = self.generator.story(settings).await?;
        Ok(self.persistence.save_story(story).await)
    }
}
