use std::fmt::Write;

use rand::{
    seq::IndexedRandom,
    Rng,
};

use super::{
    generator::{
        GeneratedSentence,
        SentenceGenerator,
    },
    grammar::{
        get_grammar_elements,
        GrammarElement,
        GrammarElements,
        GrammarLevel,
    },
    pos::{
        bucket_by_pos,
        PosCategory,
        WordsByPos,
    },
};
use crate::core::{
    KnowledgeSnapshot,
    VocabularyItem,
};

/// Words listed per category in the model prompt.
pub const PROMPT_WORDS_PER_CATEGORY: usize = 5;

const OUTPUT_FORMAT: &str = r#"
{
  "sentences": [
    {
      "japanese": "日本語を勉強します",
      "reading": "にほんごをべんきょうします",
      "english": "I will study Japanese",
      "word_by_word": [
        {
          "word": "日本語",
          "reading": "にほんご",
          "meaning": "Japanese language",
          "pos": "noun"
        },
        {
          "word": "を",
          "reading": "を",
          "meaning": "object marker",
          "pos": "particle"
        },
        {
          "word": "勉強",
          "reading": "べんきょう",
          "meaning": "study",
          "pos": "noun"
        },
        {
          "word": "します",
          "reading": "します",
          "meaning": "to do",
          "pos": "verb"
        }
      ]
    }
  ]
}
"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotSource {
    Word { id: u64 },
    Grammar,
}

/// One position in an assembled sentence. Words and grammar morphemes share this shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentenceSlot {
    pub characters: String,
    pub reading: String,
    pub meaning: String,
    pub source: SlotSource,
}

impl SentenceSlot {
    pub fn from_word(word: &VocabularyItem) -> Self {
        Self {
            characters: word.characters.clone(),
            reading: word.display_reading().to_string(),
            meaning: word.display_meaning().to_string(),
            source: SlotSource::Word { id: word.id },
        }
    }

    pub fn from_grammar(element: &GrammarElement) -> Self {
        Self {
            characters: element.characters.clone(),
            reading: element.reading.clone(),
            meaning: element.meaning.clone(),
            source: SlotSource::Grammar,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicSentence {
    pub japanese: String,
    pub reading: String,
    pub slots: Vec<SentenceSlot>,
}

impl BasicSentence {
    fn from_slots(slots: Vec<SentenceSlot>) -> Self {
        let japanese = slots.iter().map(|s| s.characters.as_str()).collect();
        let reading = slots.iter().map(|s| s.reading.as_str()).collect();
        Self { japanese, reading, slots }
    }
}

pub struct SentenceBuilder<'a> {
    knowledge: &'a KnowledgeSnapshot,
    grammar_level: GrammarLevel,
}

impl<'a> SentenceBuilder<'a> {
    pub fn new(knowledge: &'a KnowledgeSnapshot, grammar_level: GrammarLevel) -> Self {
        Self { knowledge, grammar_level }
    }

    pub fn grammar_level(&self) -> GrammarLevel {
        self.grammar_level
    }

    pub fn get_available_words_by_pos(&self) -> WordsByPos<'a> {
        bucket_by_pos(&self.knowledge.vocabulary)
    }

    pub fn get_grammar_elements(&self) -> GrammarElements {
        get_grammar_elements(self.grammar_level)
    }

    /// Subject は object を verb, picked at random from started vocabulary.
    /// `None` unless there are at least two distinct nouns and a verb.
    pub fn build_basic_sentence(&self) -> Option<BasicSentence> {
        self.build_basic_sentence_with(&mut rand::rng())
    }

    pub fn build_basic_sentence_with<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<BasicSentence> {
        let available = self.get_available_words_by_pos();
        let nouns = available.get(&PosCategory::Noun)?;
        let verbs = available.get(&PosCategory::Verb)?;

        let subject = *nouns.choose(rng)?;
        let objects: Vec<&VocabularyItem> =
            nouns.iter().copied().filter(|n| n.id != subject.id).collect();
        let object = *objects.choose(rng)?;
        let verb = *verbs.choose(rng)?;

        let grammar = self.get_grammar_elements();
        let wa = grammar.particle("は")?;
        let wo = grammar.particle("を")?;

        Some(BasicSentence::from_slots(vec![
            SentenceSlot::from_word(subject),
            SentenceSlot::from_grammar(wa),
            SentenceSlot::from_word(object),
            SentenceSlot::from_grammar(wo),
            SentenceSlot::from_word(verb),
        ]))
    }

    /// Vocabulary and grammar inventory for the language model.
    pub fn get_vocabulary_prompt(&self) -> String {
        let available = self.get_available_words_by_pos();
        let grammar = self.get_grammar_elements();

        let mut prompt = String::from("Generate a natural Japanese sentence using these components:\n\n");
        prompt.push_str("Available vocabulary:\n");

        for (category, words) in &available {
            if words.is_empty() {
                continue;
            }
            let _ = writeln!(prompt, "\n{}:", category.plural_title());
            for word in words.iter().take(PROMPT_WORDS_PER_CATEGORY) {
                let _ = writeln!(
                    prompt,
                    "- {} ({}) - {}",
                    word.characters,
                    word.display_reading(),
                    word.display_meaning()
                );
            }
        }

        prompt.push_str("\nAvailable grammar elements:\n");
        for (heading, elements) in grammar.categories() {
            let _ = writeln!(prompt, "\n{}:", heading);
            for element in elements {
                let _ = writeln!(
                    prompt,
                    "- {} ({}) - {}",
                    element.characters, element.reading, element.meaning
                );
            }
        }

        prompt.push_str(
            "\nPlease generate a natural sentence using some of these vocabulary items and grammar elements.",
        );
        prompt
    }

    /// The vocabulary prompt plus the reply format the model has to follow.
    pub fn generation_prompt(&self, num_sentences: usize) -> String {
        let mut prompt = self.get_vocabulary_prompt();
        let _ = write!(
            prompt,
            "\n\nPlease generate {} natural Japanese sentence(s) and provide:\n",
            num_sentences
        );
        prompt.push_str("1. The Japanese sentence\n");
        prompt.push_str("2. The reading in hiragana\n");
        prompt.push_str("3. English translation\n");
        prompt.push_str("4. Word-by-word breakdown showing:\n");
        prompt.push_str("   - The word in Japanese\n");
        prompt.push_str("   - Its reading\n");
        prompt.push_str("   - Its meaning\n");
        prompt.push_str("   - Its part of speech\n\n");
        prompt.push_str("Format your response in JSON like this:\n");
        prompt.push_str(OUTPUT_FORMAT);
        prompt
    }

    /// Asks the model for sentences. Any failure is logged and yields an empty list.
    pub fn generate_sentences(
        &self,
        generator: &dyn SentenceGenerator,
        num_sentences: usize,
    ) -> Vec<GeneratedSentence> {
        let prompt = self.generation_prompt(num_sentences);
        match generator.generate(&prompt) {
            Ok(sentences) => {
                log::info!("Model returned {} sentence(s)", sentences.len());
                sentences
            }
            Err(e) => {
                log::error!("Error generating sentences: {}", e);
                Vec::new()
            }
        }
    }
}
