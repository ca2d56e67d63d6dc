use super::{attempt, decode_row, to_row, Persistence};
use crate::models::{CefrLevel, StudyGuideContent, StudyGuideEntry};
use crate::remote::{Query, RemoteStore, Table};
use crate::storage::{LocalStore, STUDY_GUIDE_KEY};
use serde_json::Value;

const GUIDE_CONFLICT: &[&str] = &["level_id", "topic_id"];

impl<R: RemoteStore, L: LocalStore> Persistence<R, L> {
    pub async fn study_guide(&self, topic: &str, level: CefrLevel) -> Option<StudyGuideContent> {
        let query = Query::new()
            .eq("level_id", level.as_ref())
            .eq("topic_id", topic);
        let remote = attempt("study guide", self.remote.select_one(Table::StudyGuides, &query)).await;
        if let Some(entry) = remote.flatten().and_then(decode_row::<StudyGuideEntry>) {
            return Some(entry.content);
        }

        self.local
            .list::<StudyGuideEntry>(STUDY_GUIDE_KEY)
            .into_iter()
            .find(|g| g.level_id == level.as_ref() && g.topic_id == topic)
            .map(|g| g.content)
    }

    pub async fn save_study_guide(&self, topic: &str, level: CefrLevel, content: StudyGuideContent) {
        let entry = StudyGuideEntry {
            id: None,
            level_id: level.to_string(),
            topic_id: topic.to_string(),
            content,
        };

        if let Some(row) = to_row(&entry) {
            let call = self
                .remote
                .upsert(Table::StudyGuides, Value::Object(row), GUIDE_CONFLICT);
            if attempt("save study guide", call).await.is_some() {
                return;
            }
        }

        let mut guides: Vec<StudyGuideEntry> = self.local.list(STUDY_GUIDE_KEY);
        match guides
            .iter_mut()
            .find(|g| g.level_id == entry.level_id && g.topic_id == entry.topic_id)
        {
            Some(existing) => existing.content = entry.content,
            None => guides.push(entry),
        }
        self.local.replace(STUDY_GUIDE_KEY, &guides);
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{offline, online};
    use super::*;
    use crate::models::Example;
    use crate::remote::memory::Mode;

    fn guide(explanation: &str) -> StudyGuideContent {
        StudyGuideContent {
            concept_explanation: explanation.to_string(),
            key_rules: vec!["avoir + participe passé".to_string()],
            exceptions: vec!["verbes de mouvement avec être".to_string()],
            examples: vec![Example {
                french: "J'ai mangé.".to_string(),
                english: "I ate.".to_string(),
            }],
        }
    }

    #[tokio::test]
    async fn test_remote_save_then_read() {
        let (p, remote) = online();
        assert_eq!(p.study_guide("passe-compose", CefrLevel::A2).await, None);

        p.save_study_guide("passe-compose", CefrLevel::A2, guide("v1")).await;
        p.save_study_guide("passe-compose", CefrLevel::A2, guide("v2")).await;
        assert_eq!(remote.rows(Table::StudyGuides).len(), 1);

        assert_eq!(
            p.study_guide("passe-compose", CefrLevel::A2).await,
            Some(guide("v2"))
        );
        assert_eq!(p.study_guide("passe-compose", CefrLevel::B1).await, None);
    }

    #[tokio::test]
    async fn test_local_save_then_read() {
        let (p, _) = offline();
        p.save_study_guide("articles", CefrLevel::A1, guide("v1")).await;
        p.save_study_guide("articles", CefrLevel::A1, guide("v2")).await;
        p.save_study_guide("articles", CefrLevel::A2, guide("other")).await;

        let stored: Vec<StudyGuideEntry> = p.local().list(STUDY_GUIDE_KEY);
        assert_eq!(stored.len(), 2);
        assert_eq!(p.study_guide("articles", CefrLevel::A1).await, Some(guide("v2")));
    }

    #[tokio::test]
    async fn test_remote_miss_falls_back_to_local() {
        let (p, remote) = online();
        remote.set_mode(Mode::Offline);
        p.save_study_guide("negation", CefrLevel::A1, guide("ne...pas")).await;
        remote.set_mode(Mode::Online);

        assert_eq!(p.study_guide("negation", CefrLevel::A1).await, Some(guide("ne...pas")));
    }
}
