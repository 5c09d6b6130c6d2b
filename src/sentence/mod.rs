pub mod builder;
pub mod generator;
pub mod grammar;
pub mod pos;

pub use builder::{
    BasicSentence,
    SentenceBuilder,
    SentenceSlot,
    SlotSource,
    PROMPT_WORDS_PER_CATEGORY,
};
pub use generator::{
    GeneratedSentence,
    OpenAiGenerator,
    SentenceGenerator,
    WordBreakdown,
};
pub use grammar::{
    get_grammar_elements,
    GrammarElement,
    GrammarElements,
    GrammarLevel,
};
pub use pos::{
    normalize_pos,
    PosCategory,
};
