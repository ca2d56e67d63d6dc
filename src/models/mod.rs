use serde::{Deserialize, Serialize};

/// CEFR proficiency tier used to scope content difficulty.
#[derive(
    Serialize,
    Deserialize,
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    strum::Display,
    strum::AsRefStr,
    strum::EnumString,
)]
pub enum CefrLevel {
    A1,
    A2,
    B1,
    B2,
}

impl CefrLevel {
    pub const ALL: [CefrLevel; 4] = [CefrLevel::A1, CefrLevel::A2, CefrLevel::B1, CefrLevel::B2];
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, strum::Display)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

/// Input handed to the quiz and story generators.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct QuizSettings {
    pub topic: String,
    pub level: CefrLevel,
    pub difficulty: Difficulty,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    Mcq,
    FillBlank,
    Matching,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct MatchingPair {
    pub left: String,
    pub right: String,
}

/// Type-specific question body. Every field is optional because each
/// question type only fills the ones it uses.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct QuestionContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentence_with_blank: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pairs: Option<Vec<MatchingPair>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_answer: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Question {
    pub id: u32,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub question_text: String,
    pub content: QuestionContent,
    pub explanation: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct GlossaryEntry {
    pub word: String,
    pub definition: String,
    pub phonetics: String,
    pub example: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct QuizData {
    pub title: String,
    pub topic: String,
    pub cefr_level: String,
    pub sub_difficulty: String,
    pub questions: Vec<Question>,
    #[serde(default)]
    pub glossary: Vec<GlossaryEntry>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct StoryData {
    pub title: String,
    pub topic: String,
    pub cefr_level: String,
    pub sub_difficulty: String,
    pub content: String,
    #[serde(default)]
    pub glossary: Vec<GlossaryEntry>,
}

/// A generated payload as kept in history.
///
/// `created_at` is epoch milliseconds and is the only sort key for listings.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct HistoryRecord<T> {
    pub id: String,
    pub created_at: i64,
    pub data: T,
}

pub type SavedQuiz = HistoryRecord<QuizData>;
pub type SavedStory = HistoryRecord<StoryData>;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum WordType {
    Verb,
    Noun,
    Adjective,
    Other,
}

/// A word as produced by the vocabulary-list generator.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct WordItem {
    pub word: String,
    #[serde(rename = "type")]
    pub word_type: WordType,
    pub translation: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Conjugation {
    pub pronoun: String,
    pub form: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct TenseData {
    pub name: String,
    pub conjugations: Vec<Conjugation>,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Masculine,
    Feminine,
    Invariable,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct WordForms {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub masculine_singular: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feminine_singular: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub masculine_plural: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feminine_plural: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Example {
    pub french: String,
    pub english: String,
}

/// Full analysis of a word, generated lazily and cached on its vocabulary entry.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct WordDetail {
    pub word: String,
    #[serde(rename = "type")]
    pub word_type: WordType,
    pub translation: String,
    pub definition: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phonetics: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verb_group: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auxiliary_verb: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenses: Option<Vec<TenseData>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forms: Option<WordForms>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_pronouns: Option<Vec<String>>,
    #[serde(default)]
    pub examples: Vec<Example>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exceptions_or_notes: Option<String>,
}

/// Vocabulary row. `word` is a case-insensitive key within a level.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct VocabularyEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub word: String,
    #[serde(rename = "type")]
    pub word_type: WordType,
    pub translation: String,
    pub level: CefrLevel,
    #[serde(default)]
    pub details: Option<WordDetail>,
}

impl VocabularyEntry {
    pub fn from_item(item: WordItem, level: CefrLevel) -> Self {
        Self {
            id: None,
            word: item.word,
            word_type: item.word_type,
            translation: item.translation,
            level,
            details: None,
        }
    }

    pub fn same_word(&self, word: &str) -> bool {
        self.word.to_lowercase() == word.to_lowercase()
    }
}

/// Score record for one checkpoint of a learning path.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ProgressCheckpoint {
    pub level_id: String,
    pub checkpoint_title: String,
    pub completed: bool,
    pub score: u32,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct PathCheckpoint {
    pub title: String,
    pub description: String,
    pub examples: Vec<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct StudyGuideContent {
    pub concept_explanation: String,
    pub key_rules: Vec<String>,
    pub exceptions: Vec<String>,
    pub examples: Vec<Example>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct StudyGuideEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub level_id: String,
    pub topic_id: String,
    pub content: StudyGuideContent,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cefr_level_serializes_as_code() {
        let v = serde_json::to_value(CefrLevel::B1).expect("should serialize");
        assert_eq!(v, "B1");
        assert_eq!(CefrLevel::A2.to_string(), "A2");
        assert_eq!("B2".parse::<CefrLevel>().ok(), Some(CefrLevel::B2));
    }

    #[test]
    fn test_vocabulary_entry_contract_deserialize() {
        // Shape of a `vocabulary` row as returned by the table store.
        let json = r#"{
            "id": "7d0c",
            "word": "Manger",
            "type": "verb",
            "translation": "to eat",
            "level": "A1",
            "details": null
        }"#;
        let parsed: VocabularyEntry = serde_json::from_str(json).expect("entry should parse");
        assert_eq!(parsed.word_type, WordType::Verb);
        assert_eq!(parsed.level, CefrLevel::A1);
        assert!(parsed.details.is_none());
        assert!(parsed.same_word("manger"));
        assert!(!parsed.same_word("mange"));
    }

    #[test]
    fn test_question_type_uses_snake_case() {
        let json = r#"{
            "id": 1,
            "type": "fill_blank",
            "question_text": "Complete",
            "content": {"sentence_with_blank": "Je ___ français", "correct_answer": "parle"},
            "explanation": "present tense"
        }"#;
        let q: Question = serde_json::from_str(json).expect("question should parse");
        assert_eq!(q.question_type, QuestionType::FillBlank);
        assert_eq!(q.content.correct_answer.as_deref(), Some("parle"));
        assert!(q.content.options.is_none());
    }

    #[test]
    fn test_word_detail_optional_fields_are_omitted() {
        let d = WordDetail {
            word: "chat".to_string(),
            word_type: WordType::Noun,
            translation: "cat".to_string(),
            definition: "a small feline".to_string(),
            phonetics: None,
            verb_group: None,
            auxiliary_verb: None,
            tenses: None,
            gender: Some(Gender::Masculine),
            forms: None,
            related_pronouns: None,
            examples: vec![],
            exceptions_or_notes: None,
        };
        let v = serde_json::to_value(&d).expect("should serialize");
        assert_eq!(v["gender"], "masculine");
        assert!(v.get("tenses").is_none());
    }
}
