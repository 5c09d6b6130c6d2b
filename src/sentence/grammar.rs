use std::fmt;

use serde::{
    Deserialize,
    Serialize,
};

/// Proficiency tier for the grammar table. Beginner material is always included.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum GrammarLevel {
    #[default]
    Beginner,
    Intermediate,
}

impl GrammarLevel {
    pub fn name(&self) -> &'static str {
        match self {
            GrammarLevel::Beginner => "beginner",
            GrammarLevel::Intermediate => "intermediate",
        }
    }
}

impl fmt::Display for GrammarLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrammarElement {
    pub characters: String,
    pub reading: String,
    pub meaning: String,
}

impl GrammarElement {
    fn from_entry(entry: &(&str, &str, &str)) -> Self {
        Self {
            characters: entry.0.to_string(),
            reading: entry.1.to_string(),
            meaning: entry.2.to_string(),
        }
    }
}

/// (characters, romaji reading, meaning)
type Entry = (&'static str, &'static str, &'static str);

pub struct GrammarTier {
    pub particles: &'static [Entry],
    pub verb_endings: &'static [Entry],
}

pub const BEGINNER: GrammarTier = GrammarTier {
    particles: &[
        ("は", "wa", "topic marker"),
        ("が", "ga", "subject marker"),
        ("を", "o", "object marker"),
        ("に", "ni", "indirect object, destination"),
        ("で", "de", "location of action"),
        ("の", "no", "possession"),
        ("と", "to", "with, and"),
        ("も", "mo", "also, too"),
    ],
    verb_endings: &[
        ("ます", "masu", "polite present"),
        ("ました", "mashita", "polite past"),
        ("ません", "masen", "polite negative"),
    ],
};

pub const INTERMEDIATE: GrammarTier = GrammarTier {
    particles: &[
        ("へ", "e", "towards"),
        ("から", "kara", "from"),
        ("まで", "made", "until"),
        ("より", "yori", "than"),
        ("だけ", "dake", "only"),
    ],
    verb_endings: &[
        ("て", "te", "te-form"),
        ("た", "ta", "past"),
        ("ない", "nai", "negative"),
    ],
};

impl GrammarLevel {
    pub fn tier(&self) -> &'static GrammarTier {
        match self {
            GrammarLevel::Beginner => &BEGINNER,
            GrammarLevel::Intermediate => &INTERMEDIATE,
        }
    }
}

/// Merged particles and verb endings, in table order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GrammarElements {
    pub particles: Vec<GrammarElement>,
    pub verb_endings: Vec<GrammarElement>,
}

impl GrammarElements {
    pub fn particle(&self, characters: &str) -> Option<&GrammarElement> {
        self.particles.iter().find(|p| p.characters == characters)
    }

    pub fn verb_ending(&self, characters: &str) -> Option<&GrammarElement> {
        self.verb_endings.iter().find(|v| v.characters == characters)
    }

    /// (heading, elements) pairs in prompt order.
    pub fn categories(&self) -> [(&'static str, &[GrammarElement]); 2] {
        [("Particles", self.particles.as_slice()), ("Verb endings", self.verb_endings.as_slice())]
    }
}

fn merge_into(target: &mut Vec<GrammarElement>, entries: &[Entry]) {
    for entry in entries {
        let element = GrammarElement::from_entry(entry);
        match target.iter_mut().find(|e| e.characters == element.characters) {
            Some(existing) => *existing = element,
            None => target.push(element),
        }
    }
}

/// Later tiers override earlier ones on matching characters; new entries are appended.
pub fn merge_tiers(tiers: &[&GrammarTier]) -> GrammarElements {
    let mut elements = GrammarElements::default();
    for tier in tiers {
        merge_into(&mut elements.particles, tier.particles);
        merge_into(&mut elements.verb_endings, tier.verb_endings);
    }
    elements
}

/// Beginner table merged with the requested tier's.
pub fn get_grammar_elements(level: GrammarLevel) -> GrammarElements {
    merge_tiers(&[&BEGINNER, level.tier()])
}
