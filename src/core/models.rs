use std::{
    collections::{
        BTreeMap,
        BTreeSet,
    },
    fmt,
};

use chrono::{
    DateTime,
    Utc,
};
use serde::{
    Deserialize,
    Serialize,
};

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadingKind {
    #[serde(alias = "kun")]
    Kunyomi,
    #[serde(alias = "on")]
    Onyomi,
    Nanori,
    #[default]
    Reading,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reading {
    #[serde(rename = "reading")]
    pub text: String,
    #[serde(rename = "primary", default)]
    pub is_primary: bool,
    #[serde(rename = "accepted_answer", default = "default_true")]
    pub is_accepted_answer: bool,
    #[serde(rename = "type", default)]
    pub kind: ReadingKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meaning {
    #[serde(rename = "meaning")]
    pub text: String,
    #[serde(rename = "primary", default)]
    pub is_primary: bool,
    #[serde(rename = "accepted_answer", default = "default_true")]
    pub is_accepted_answer: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubjectKind {
    Vocabulary,
    Kanji,
    Radical,
}

impl SubjectKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubjectKind::Vocabulary => "vocabulary",
            SubjectKind::Kanji => "kanji",
            SubjectKind::Radical => "radical",
        }
    }
}

/// SRS maturity bucket. Stage 0 (or no stage at all) has no bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SrsStage {
    Apprentice,
    Guru,
    Master,
    Enlightened,
    Burned,
}

impl SrsStage {
    pub const ALL: [SrsStage; 5] = [
        SrsStage::Apprentice,
        SrsStage::Guru,
        SrsStage::Master,
        SrsStage::Enlightened,
        SrsStage::Burned,
    ];

    pub fn from_stage(stage: u8) -> Option<Self> {
        match stage {
            1..=4 => Some(SrsStage::Apprentice),
            5..=6 => Some(SrsStage::Guru),
            7 => Some(SrsStage::Master),
            8 => Some(SrsStage::Enlightened),
            9 => Some(SrsStage::Burned),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SrsStage::Apprentice => "apprentice",
            SrsStage::Guru => "guru",
            SrsStage::Master => "master",
            SrsStage::Enlightened => "enlightened",
            SrsStage::Burned => "burned",
        }
    }
}

impl fmt::Display for SrsStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Per-user progress copied from the assignment record.
/// `started_at == None` means the item has not been started (or we don't know).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserMetadata {
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub unlocked_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub passed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub burned_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VocabularyItem {
    pub id: u64,
    pub kind: SubjectKind,
    pub level: u32,
    pub characters: String,
    pub meanings: Vec<Meaning>,
    pub readings: Vec<Reading>,
    #[serde(default)]
    pub parts_of_speech: Vec<String>,
    #[serde(default)]
    pub component_ids: BTreeSet<u64>,
    pub srs_stage: Option<u8>,
    pub user_metadata: Option<UserMetadata>,
}

impl VocabularyItem {
    pub fn primary_reading(&self) -> Option<&str> {
        self.readings.iter().find(|r| r.is_primary).map(|r| r.text.as_str())
    }

    pub fn primary_meaning(&self) -> Option<&str> {
        self.meanings.iter().find(|m| m.is_primary).map(|m| m.text.as_str())
    }

    /// Primary reading, or the first listed one when nothing is flagged primary.
    pub fn display_reading(&self) -> &str {
        self.primary_reading()
            .or_else(|| self.readings.first().map(|r| r.text.as_str()))
            .unwrap_or_default()
    }

    pub fn display_meaning(&self) -> &str {
        self.primary_meaning()
            .or_else(|| self.meanings.first().map(|m| m.text.as_str()))
            .unwrap_or_default()
    }

    pub fn srs_stage_name(&self) -> Option<SrsStage> {
        self.srs_stage.and_then(SrsStage::from_stage)
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.user_metadata.as_ref().and_then(|m| m.started_at)
    }

    pub fn is_started(&self) -> bool {
        self.started_at().is_some()
    }

    pub fn has_part_of_speech(&self, pos: &str) -> bool {
        self.parts_of_speech.iter().any(|p| p == pos)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeSnapshot {
    pub vocabulary: Vec<VocabularyItem>,
    pub kanji: Vec<VocabularyItem>,
    pub level: u32,
}

impl KnowledgeSnapshot {
    pub fn vocab_by_level(&self, level: u32) -> Vec<&VocabularyItem> {
        self.vocabulary.iter().filter(|v| v.level == level).collect()
    }

    pub fn vocab_by_srs(&self, stage: SrsStage) -> Vec<&VocabularyItem> {
        self.vocabulary.iter().filter(|v| v.srs_stage_name() == Some(stage)).collect()
    }

    pub fn vocab_by_part_of_speech(&self, pos: &str) -> Vec<&VocabularyItem> {
        self.vocabulary.iter().filter(|v| v.has_part_of_speech(pos)).collect()
    }

    pub fn kanji_in_vocab(&self, item: &VocabularyItem) -> Vec<&VocabularyItem> {
        self.kanji.iter().filter(|k| item.component_ids.contains(&k.id)).collect()
    }

    /// Raw part-of-speech tag counts over the vocabulary, sorted by tag.
    pub fn part_of_speech_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for item in &self.vocabulary {
            for pos in &item.parts_of_speech {
                *counts.entry(pos.clone()).or_insert(0) += 1;
            }
        }
        counts
    }

    /// Vocabulary count per SRS bucket. Every bucket is present, unstarted items are not counted.
    pub fn srs_breakdown(&self) -> BTreeMap<SrsStage, usize> {
        let mut breakdown: BTreeMap<SrsStage, usize> =
            SrsStage::ALL.iter().map(|stage| (*stage, 0)).collect();
        for stage in self.vocabulary.iter().filter_map(|v| v.srs_stage_name()) {
            *breakdown.entry(stage).or_insert(0) += 1;
        }
        breakdown
    }
}


#[cfg(test)]
mod tests {
    use super::{
        fixtures::word,
        *,
    };

    #[test]
    fn test_srs_buckets() {
        assert_eq!(SrsStage::from_stage(0), None);
        assert_eq!(SrsStage::from_stage(1), Some(SrsStage::Apprentice));
        assert_eq!(SrsStage::from_stage(4), Some(SrsStage::Apprentice));
        assert_eq!(SrsStage::from_stage(5), Some(SrsStage::Guru));
        assert_eq!(SrsStage::from_stage(6), Some(SrsStage::Guru));
        assert_eq!(SrsStage::from_stage(7), Some(SrsStage::Master));
        assert_eq!(SrsStage::from_stage(8), Some(SrsStage::Enlightened));
        assert_eq!(SrsStage::from_stage(9), Some(SrsStage::Burned));
        assert_eq!(SrsStage::from_stage(10), None);
    }

    #[test]
    fn test_primary_entries() {
        let mut item = word(1, "大人", "おとな", "adult", &["noun"]);
        item.readings.insert(
            0,
            Reading {
                text: "たいじん".to_string(),
                is_primary: false,
                is_accepted_answer: false,
                kind: ReadingKind::Reading,
            },
        );
        assert_eq!(item.primary_reading(), Some("おとな"));
        assert_eq!(item.display_reading(), "おとな");

        for r in &mut item.readings {
            r.is_primary = false;
        }
        assert_eq!(item.primary_reading(), None);
        assert_eq!(item.display_reading(), "たいじん");
    }

    #[test]
    fn test_wire_reading_defaults() {
        let reading: Reading = serde_json::from_str(r#"{"reading": "ひと"}"#).unwrap();
        assert!(!reading.is_primary);
        assert!(reading.is_accepted_answer);
        assert_eq!(reading.kind, ReadingKind::Reading);

        let kanji_reading: Reading =
            serde_json::from_str(r#"{"reading": "じん", "primary": true, "type": "onyomi"}"#)
                .unwrap();
        assert_eq!(kanji_reading.kind, ReadingKind::Onyomi);
    }

    #[test]
    fn test_snapshot_lookups() {
        let mut vocab = word(10, "一人", "ひとり", "alone", &["noun", "adverb"]);
        vocab.component_ids = [440, 444].into_iter().collect();
        vocab.srs_stage = Some(5);
        let mut kanji = word(440, "一", "いち", "one", &[]);
        kanji.kind = SubjectKind::Kanji;
        let mut unrelated = word(441, "二", "に", "two", &[]);
        unrelated.kind = SubjectKind::Kanji;

        let snapshot = KnowledgeSnapshot {
            vocabulary: vec![vocab.clone(), word(11, "山", "やま", "mountain", &["noun"])],
            kanji: vec![kanji, unrelated],
            level: 2,
        };

        let components = snapshot.kanji_in_vocab(&vocab);
        assert_eq!(components.len(), 1);
        assert_eq!(components[0].id, 440);

        assert_eq!(snapshot.vocab_by_part_of_speech("noun").len(), 2);
        assert_eq!(snapshot.vocab_by_part_of_speech("adverb").len(), 1);
        assert_eq!(snapshot.vocab_by_srs(SrsStage::Guru).len(), 1);
        assert_eq!(snapshot.vocab_by_level(1).len(), 2);

        let counts = snapshot.part_of_speech_counts();
        assert_eq!(counts.get("noun"), Some(&2));
        assert_eq!(counts.get("adverb"), Some(&1));

        let breakdown = snapshot.srs_breakdown();
        assert_eq!(breakdown.len(), 5);
        assert_eq!(breakdown[&SrsStage::Apprentice], 1);
        assert_eq!(breakdown[&SrsStage::Guru], 1);
        assert_eq!(breakdown[&SrsStage::Burned], 0);
    }
}
