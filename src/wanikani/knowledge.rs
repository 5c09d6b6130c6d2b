use std::{
    collections::HashMap,
    time::Instant,
};

use super::{
    api::WaniKaniSource,
    types::{
        AssignmentData,
        Filters,
        Resource,
        SubjectData,
    },
};
use crate::{
    core::{
        KnowledgeSnapshot,
        SpeechBubbleError,
        SubjectKind,
        UserMetadata,
        VocabularyItem,
    },
    persistence::JsonCache,
};

/// Cache key derived from the tail of the API key so different accounts don't collide.
pub fn cache_key_for(api_key: &str) -> String {
    let chars: Vec<char> = api_key.chars().collect();
    let tail: String = chars[chars.len().saturating_sub(8)..].iter().collect();
    format!("knowledge_cache_{}", tail)
}

/// Subject id -> assignment, for assignments that have actually been started.
fn started_assignments(
    assignments: Vec<Resource<AssignmentData>>,
) -> HashMap<u64, AssignmentData> {
    assignments
        .into_iter()
        .map(|a| a.data)
        .filter(|a| a.started_at.is_some())
        .map(|a| (a.subject_id, a))
        .collect()
}

fn user_metadata(assignment: &AssignmentData) -> UserMetadata {
    UserMetadata {
        started_at: assignment.started_at,
        unlocked_at: assignment.unlocked_at,
        passed_at: assignment.passed_at,
        burned_at: assignment.burned_at,
    }
}

fn object_kind(object: &str) -> Option<SubjectKind> {
    match object {
        "vocabulary" => Some(SubjectKind::Vocabulary),
        "kanji" => Some(SubjectKind::Kanji),
        "radical" => Some(SubjectKind::Radical),
        _ => None,
    }
}

/// Builds an item from a subject record. Records without an id, characters, a meaning
/// or a reading are dropped.
pub fn to_vocabulary_item(
    subject: Resource<SubjectData>,
    assignment: Option<&AssignmentData>,
) -> Option<VocabularyItem> {
    let id = subject.id?;
    let kind = object_kind(&subject.object)?;
    let data = subject.data;

    let characters = match data.characters {
        Some(characters) if !characters.is_empty() => characters,
        _ => {
            log::warn!("Skipping subject {} without characters", id);
            return None;
        }
    };

    if data.meanings.is_empty() || data.readings.is_empty() {
        log::warn!("Skipping subject {} ({}) without meanings or readings", id, characters);
        return None;
    }

    let mut parts_of_speech: Vec<String> = Vec::with_capacity(data.parts_of_speech.len());
    for pos in data.parts_of_speech {
        if !parts_of_speech.contains(&pos) {
            parts_of_speech.push(pos);
        }
    }

    Some(VocabularyItem {
        id,
        kind,
        level: data.level,
        characters,
        meanings: data.meanings,
        readings: data.readings,
        parts_of_speech,
        component_ids: data.component_subject_ids,
        srs_stage: assignment.map(|a| a.srs_stage),
        user_metadata: assignment.map(user_metadata),
    })
}

fn convert_subjects(
    subjects: Vec<Resource<SubjectData>>,
    started: &HashMap<u64, AssignmentData>,
    started_only: bool,
) -> Vec<VocabularyItem> {
    subjects
        .into_iter()
        .filter_map(|subject| {
            let assignment = subject.id.and_then(|id| started.get(&id));
            if started_only && assignment.is_none() {
                return None;
            }
            to_vocabulary_item(subject, assignment)
        })
        .collect()
}

/// Joins the user's started assignments with subject metadata up to their current level.
/// A subject with no started assignment is never treated as started.
pub fn build_snapshot<S: WaniKaniSource + ?Sized>(
    source: &S,
    started_only: bool,
) -> Result<KnowledgeSnapshot, SpeechBubbleError> {
    let start = Instant::now();

    let user = source.user()?;
    let level = user.level.max(1);
    log::info!("User level: {}", level);

    let assignments = source.assignments(
        &Filters::new()
            .list("subject_types", [SubjectKind::Vocabulary.as_str(), SubjectKind::Kanji.as_str()])
            .flag("started", true),
    )?;
    let started = started_assignments(assignments);
    log::info!("Started assignments: {}", started.len());

    let vocabulary = source.subjects(
        &Filters::new().list("types", [SubjectKind::Vocabulary.as_str()]).list("levels", 1..=level),
    )?;
    let kanji = source.subjects(
        &Filters::new().list("types", [SubjectKind::Kanji.as_str()]).list("levels", 1..=level),
    )?;

    let snapshot = KnowledgeSnapshot {
        vocabulary: convert_subjects(vocabulary, &started, started_only),
        kanji: convert_subjects(kanji, &started, started_only),
        level,
    };

    log::info!(
        "Built knowledge snapshot: {} vocabulary, {} kanji ({:.1}s)",
        snapshot.vocabulary.len(),
        snapshot.kanji.len(),
        start.elapsed().as_secs_f32()
    );
    Ok(snapshot)
}

/// `build_snapshot` behind the JSON cache. Cache problems never fail the run.
pub fn load_or_build_snapshot<S: WaniKaniSource + ?Sized>(
    source: &S,
    cache: &JsonCache,
    cache_key: &str,
    max_age: chrono::Duration,
    use_cache: bool,
) -> Result<KnowledgeSnapshot, SpeechBubbleError> {
    if use_cache {
        if let Some(snapshot) = cache.load::<KnowledgeSnapshot>(cache_key, max_age) {
            log::info!("Using cached knowledge snapshot ({})", cache_key);
            return Ok(snapshot);
        }
    }

    let snapshot = build_snapshot(source, true)?;

    if use_cache {
        if let Err(e) = cache.save(cache_key, &snapshot) {
            log::warn!("Failed to write knowledge cache {}: {}", cache_key, e);
        }
    }

    Ok(snapshot)
}

#[cfg(test)]
pub(crate) mod fake {
    use std::cell::RefCell;

    use serde_json::{
        json,
        Value,
    };

    use super::*;
    use crate::wanikani::types::UserData;

    /// In-memory WaniKani with canned records. Records every filter it was asked for.
    pub struct FakeWaniKani {
        pub level: u32,
        pub assignments: Vec<Value>,
        pub subjects: Vec<Value>,
        pub calls: RefCell<Vec<Filters>>,
    }

    impl FakeWaniKani {
        pub fn new(level: u32, assignments: Vec<Value>, subjects: Vec<Value>) -> Self {
            Self { level, assignments, subjects, calls: RefCell::new(Vec::new()) }
        }
    }

    pub fn assignment(subject_id: u64, subject_type: &str, srs_stage: u8, started: bool) -> Value {
        let started_at = if started { json!("2024-03-01T10:00:00Z") } else { Value::Null };
        json!({
            "id": subject_id + 100_000,
            "object": "assignment",
            "data": {
                "subject_id": subject_id,
                "subject_type": subject_type,
                "srs_stage": srs_stage,
                "unlocked_at": "2024-02-28T09:00:00Z",
                "started_at": started_at,
            }
        })
    }

    pub fn vocabulary(id: u64, characters: &str, reading: &str, meaning: &str, pos: &[&str]) -> Value {
        json!({
            "id": id,
            "object": "vocabulary",
            "data": {
                "level": 1,
                "characters": characters,
                "meanings": [{ "meaning": meaning, "primary": true, "accepted_answer": true }],
                "readings": [{ "reading": reading, "primary": true, "accepted_answer": true }],
                "parts_of_speech": pos,
                "component_subject_ids": [],
            }
        })
    }

    pub fn kanji(id: u64, characters: &str, reading: &str, meaning: &str) -> Value {
        json!({
            "id": id,
            "object": "kanji",
            "data": {
                "level": 1,
                "characters": characters,
                "meanings": [{ "meaning": meaning, "primary": true, "accepted_answer": true }],
                "readings": [{ "reading": reading, "primary": true, "accepted_answer": true, "type": "onyomi" }],
                "component_subject_ids": [1],
            }
        })
    }

    fn decode<T: serde::de::DeserializeOwned>(records: &[Value]) -> Vec<Resource<T>> {
        records.iter().map(|r| serde_json::from_value(r.clone()).unwrap()).collect()
    }

    impl WaniKaniSource for FakeWaniKani {
        fn user(&self) -> Result<UserData, SpeechBubbleError> {
            Ok(UserData { username: Some("tester".to_string()), level: self.level })
        }

        fn assignments(
            &self,
            filters: &Filters,
        ) -> Result<Vec<Resource<AssignmentData>>, SpeechBubbleError> {
            self.calls.borrow_mut().push(filters.clone());
            Ok(decode(&self.assignments))
        }

        fn subjects(
            &self,
            filters: &Filters,
        ) -> Result<Vec<Resource<SubjectData>>, SpeechBubbleError> {
            self.calls.borrow_mut().push(filters.clone());
            let wanted = filters
                .as_query()
                .iter()
                .find(|(key, _)| key == "types")
                .map(|(_, value)| value.clone())
                .unwrap_or_default();
            let matching: Vec<Value> = self
                .subjects
                .iter()
                .filter(|s| wanted.split(',').any(|t| s["object"] == t))
                .cloned()
                .collect();
            Ok(decode(&matching))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{
        fake::*,
        *,
    };
    use crate::wanikani::types::UserData;

    struct FailingWaniKani;

    impl WaniKaniSource for FailingWaniKani {
        fn user(&self) -> Result<UserData, SpeechBubbleError> {
            Err(SpeechBubbleError::Http { status: 401, url: "https://api.wanikani.com/v2/user".into() })
        }

        fn assignments(
            &self,
            _: &Filters,
        ) -> Result<Vec<Resource<AssignmentData>>, SpeechBubbleError> {
            unreachable!()
        }

        fn subjects(&self, _: &Filters) -> Result<Vec<Resource<SubjectData>>, SpeechBubbleError> {
            unreachable!()
        }
    }

    fn sample_source() -> FakeWaniKani {
        FakeWaniKani::new(
            3,
            vec![
                assignment(2467, "vocabulary", 5, true),
                assignment(2468, "vocabulary", 9, true),
                // Unlocked but never started, despite carrying a stage value
                assignment(2469, "vocabulary", 4, false),
                assignment(440, "kanji", 1, true),
            ],
            vec![
                vocabulary(2467, "一", "いち", "one", &["numeral"]),
                vocabulary(2468, "一つ", "ひとつ", "one thing", &["numeral", "noun"]),
                vocabulary(2469, "二", "に", "two", &["numeral"]),
                vocabulary(2470, "三", "さん", "three", &["numeral"]),
                kanji(440, "一", "いち", "one"),
                kanji(441, "二", "に", "two"),
            ],
        )
    }

    #[test]
    fn test_cache_key_uses_key_tail() {
        assert_eq!(cache_key_for("0123456789abcdef"), "knowledge_cache_89abcdef");
        assert_eq!(cache_key_for("short"), "knowledge_cache_short");
    }

    #[test]
    fn test_only_started_subjects_are_kept() {
        let source = sample_source();
        let snapshot = build_snapshot(&source, true).unwrap();

        let ids: Vec<u64> = snapshot.vocabulary.iter().map(|v| v.id).collect();
        assert_eq!(ids, vec![2467, 2468]);
        assert_eq!(snapshot.kanji.len(), 1);
        assert_eq!(snapshot.kanji[0].id, 440);
        assert_eq!(snapshot.level, 3);

        let burned = &snapshot.vocabulary[1];
        assert_eq!(burned.srs_stage, Some(9));
        let expected: chrono::DateTime<chrono::Utc> = "2024-03-01T10:00:00Z".parse().unwrap();
        assert_eq!(burned.started_at(), Some(expected));
    }

    #[test]
    fn test_unstarted_assignment_never_counts() {
        let source = sample_source();
        let snapshot = build_snapshot(&source, false).unwrap();

        let unstarted = snapshot.vocabulary.iter().find(|v| v.id == 2469).unwrap();
        assert!(!unstarted.is_started());
        assert_eq!(unstarted.srs_stage, None);
        assert_eq!(unstarted.user_metadata, None);

        // No progress record at all
        let untouched = snapshot.vocabulary.iter().find(|v| v.id == 2470).unwrap();
        assert!(!untouched.is_started());
        assert_eq!(snapshot.vocabulary.len(), 4);
    }

    #[test]
    fn test_requests_use_level_and_type_filters() {
        let source = sample_source();
        build_snapshot(&source, true).unwrap();

        let calls = source.calls.borrow();
        assert_eq!(calls.len(), 3);
        assert_eq!(
            calls[0],
            Filters::new().list("subject_types", ["vocabulary", "kanji"]).flag("started", true)
        );
        assert_eq!(calls[1], Filters::new().list("types", ["vocabulary"]).list("levels", 1..=3));
        assert_eq!(calls[2], Filters::new().list("types", ["kanji"]).list("levels", 1..=3));
    }

    #[test]
    fn test_incomplete_subjects_are_skipped() {
        let mut broken = vocabulary(9000, "壊", "こわ", "broken", &["noun"]);
        broken["data"]["readings"] = serde_json::json!([]);
        let source = FakeWaniKani::new(1, vec![assignment(9000, "vocabulary", 1, true)], vec![broken]);

        let snapshot = build_snapshot(&source, true).unwrap();
        assert!(snapshot.vocabulary.is_empty());
    }

    #[test]
    fn test_remote_errors_propagate() {
        let result = build_snapshot(&FailingWaniKani, true);
        assert!(matches!(result, Err(SpeechBubbleError::Http { status: 401, .. })));
    }

    #[test]
    fn test_cached_snapshot_is_reused() {
        let dir = tempfile::tempdir().unwrap();
        let cache = JsonCache::new(dir.path());
        let key = cache_key_for("abcdefgh12345678");

        let first =
            load_or_build_snapshot(&sample_source(), &cache, &key, chrono::Duration::hours(24), true)
                .unwrap();
        assert!(cache.path_for(&key).exists());

        // A failing source proves the second call never goes to the network
        let second =
            load_or_build_snapshot(&FailingWaniKani, &cache, &key, chrono::Duration::hours(24), true)
                .unwrap();
        assert_eq!(first, second);

        let bypass =
            load_or_build_snapshot(&FailingWaniKani, &cache, &key, chrono::Duration::hours(24), false);
        assert!(bypass.is_err());
    }
}
