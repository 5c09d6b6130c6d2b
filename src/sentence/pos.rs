use std::{
    collections::BTreeMap,
    fmt,
};

use crate::core::VocabularyItem;

const ADJECTIVE_TAGS: [&str; 3] = ["い adjective", "な adjective", "の adjective"];

/// Collapses WaniKani's part-of-speech tags. "godan verb", "transitive verb" etc. all
/// become "verb"; the three adjective classes become "adjective"; the rest is unchanged.
pub fn normalize_pos(pos: &str) -> &str {
    if pos.contains("verb") && !pos.contains("adverb") {
        return "verb";
    }
    if ADJECTIVE_TAGS.iter().any(|tag| pos.contains(tag)) {
        return "adjective";
    }
    pos
}

/// The fixed buckets sentences are assembled from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PosCategory {
    Verb,
    Noun,
    Adjective,
    Adverb,
    Expression,
}

impl PosCategory {
    pub const ALL: [PosCategory; 5] = [
        PosCategory::Verb,
        PosCategory::Noun,
        PosCategory::Adjective,
        PosCategory::Adverb,
        PosCategory::Expression,
    ];

    pub fn from_normalized(pos: &str) -> Option<Self> {
        match pos {
            "verb" => Some(PosCategory::Verb),
            "noun" => Some(PosCategory::Noun),
            "adjective" => Some(PosCategory::Adjective),
            "adverb" => Some(PosCategory::Adverb),
            "expression" => Some(PosCategory::Expression),
            _ => None,
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            PosCategory::Verb => "verb",
            PosCategory::Noun => "noun",
            PosCategory::Adjective => "adjective",
            PosCategory::Adverb => "adverb",
            PosCategory::Expression => "expression",
        }
    }

    pub fn plural_title(&self) -> &'static str {
        match self {
            PosCategory::Verb => "Verbs",
            PosCategory::Noun => "Nouns",
            PosCategory::Adjective => "Adjectives",
            PosCategory::Adverb => "Adverbs",
            PosCategory::Expression => "Expressions",
        }
    }
}

impl fmt::Display for PosCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

pub type WordsByPos<'a> = BTreeMap<PosCategory, Vec<&'a VocabularyItem>>;

/// Buckets started vocabulary by category. Every category is present, possibly empty,
/// and a word appears at most once per bucket.
pub fn bucket_by_pos<'a, I>(words: I) -> WordsByPos<'a>
where
    I: IntoIterator<Item = &'a VocabularyItem>,
{
    let mut buckets: WordsByPos<'a> =
        PosCategory::ALL.iter().map(|category| (*category, Vec::new())).collect();

    for word in words.into_iter().filter(|w| w.is_started()) {
        for pos in &word.parts_of_speech {
            if let Some(category) = PosCategory::from_normalized(normalize_pos(pos)) {
                let bucket = buckets.entry(category).or_default();
                if !bucket.iter().any(|w| w.id == word.id) {
                    bucket.push(word);
                }
            }
        }
    }

    buckets
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::fixtures::word;

    #[test]
    fn test_normalize_pos() {
        assert_eq!(normalize_pos("godan verb"), "verb");
        assert_eq!(normalize_pos("ichidan verb"), "verb");
        assert_eq!(normalize_pos("transitive verb"), "verb");
        assert_eq!(normalize_pos("する verb"), "verb");
        assert_eq!(normalize_pos("の adjective"), "adjective");
        assert_eq!(normalize_pos("い adjective"), "adjective");
        assert_eq!(normalize_pos("noun"), "noun");
        assert_eq!(normalize_pos("adverb"), "adverb");
        assert_eq!(normalize_pos("numeral"), "numeral");
    }

    #[test]
    fn test_empty_buckets_still_present() {
        let buckets = bucket_by_pos(Vec::<&VocabularyItem>::new());
        assert_eq!(buckets.len(), 5);
        for category in PosCategory::ALL {
            assert!(buckets[&category].is_empty());
        }
    }

    #[test]
    fn test_bucketing_skips_unstarted_and_duplicates() {
        let eat = word(1, "食べる", "たべる", "to eat", &["ichidan verb", "transitive verb"]);
        let mountain = word(2, "山", "やま", "mountain", &["noun"]);
        let mut river = word(3, "川", "かわ", "river", &["noun"]);
        river.user_metadata = None;
        let big = word(4, "大きい", "おおきい", "big", &["い adjective"]);
        let slowly = word(5, "ゆっくり", "ゆっくり", "slowly", &["adverb", "する verb"]);

        let words = vec![eat, mountain, river, big, slowly];
        let buckets = bucket_by_pos(&words);

        let ids = |c: PosCategory| buckets[&c].iter().map(|w| w.id).collect::<Vec<_>>();
        assert_eq!(ids(PosCategory::Verb), vec![1, 5]);
        assert_eq!(ids(PosCategory::Noun), vec![2]);
        assert_eq!(ids(PosCategory::Adjective), vec![4]);
        assert_eq!(ids(PosCategory::Adverb), vec![5]);
        assert!(ids(PosCategory::Expression).is_empty());
    }
}
