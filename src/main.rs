use std::{
    io,
    path::PathBuf,
    process,
};

use clap::Parser;
use speechbubble::{
    core::{
        AppConfig,
        CredentialKind,
        Credentials,
        KnowledgeSnapshot,
        SpeechBubbleError,
    },
    persistence::JsonCache,
    sentence::{
        BasicSentence,
        GeneratedSentence,
        GrammarLevel,
        OpenAiGenerator,
        PosCategory,
        SentenceBuilder,
        PROMPT_WORDS_PER_CATEGORY,
    },
    wanikani::{
        cache_key_for,
        load_or_build_snapshot,
        WaniKaniClient,
    },
};

#[derive(Parser)]
#[command(
    name = "speechbubble",
    about = "Generate Japanese sentences using your WaniKani vocabulary",
    version
)]
struct Cli {
    /// Number of sentences to generate
    #[arg(short = 'n', long, default_value_t = 3)]
    num_sentences: usize,

    /// Grammar level
    #[arg(short, long, value_enum, default_value_t = GrammarLevel::Beginner)]
    level: GrammarLevel,

    /// Only show vocabulary statistics, don't generate sentences
    #[arg(long)]
    stats_only: bool,

    /// Ignore the cached vocabulary snapshot and refetch from WaniKani
    #[arg(long)]
    no_cache: bool,

    /// Maximum age of the cached vocabulary snapshot, in hours
    #[arg(long, default_value_t = 24)]
    max_age_hours: u32,

    /// Credential file (default: ~/.config/speechbubble/config.json)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the prompt sent to the language model
    #[arg(long)]
    show_prompt: bool,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), SpeechBubbleError> {
    let mut config = AppConfig::from_default_dirs()
        .with_cache(!cli.no_cache)
        .with_cache_max_age_hours(cli.max_age_hours);
    if let Some(path) = cli.config {
        config = config.with_config_file(path);
    }

    let mut credentials = Credentials::load(&config.config_file)?.with_env_fallback();
    let mut input = io::stdin().lock();
    let mut output = io::stdout();

    let wanikani_key = credentials.ensure(
        CredentialKind::WaniKani,
        &config.config_file,
        &mut input,
        &mut output,
    )?;
    let openai_key = if cli.stats_only {
        None
    } else {
        Some(credentials.ensure(
            CredentialKind::OpenAi,
            &config.config_file,
            &mut input,
            &mut output,
        )?)
    };

    println!("Fetching vocabulary data...");
    let client = WaniKaniClient::new(&wanikani_key)?.with_page_delay(config.page_delay);
    let cache = JsonCache::new(config.cache_dir.clone());
    let knowledge = load_or_build_snapshot(
        &client,
        &cache,
        &cache_key_for(&wanikani_key),
        config.cache_max_age,
        config.use_cache,
    )?;

    print_vocabulary_stats(&knowledge);

    let builder = SentenceBuilder::new(&knowledge, cli.level);
    print_words_by_pos(&builder);

    let Some(openai_key) = openai_key else {
        return Ok(());
    };

    if cli.show_prompt {
        println!("\nPrompt:\n{}", builder.generation_prompt(cli.num_sentences));
    }

    let generator = OpenAiGenerator::new(&openai_key)?;
    println!("\nGenerating {} sentences ({} grammar)...", cli.num_sentences, builder.grammar_level());
    let sentences = builder.generate_sentences(&generator, cli.num_sentences);

    if sentences.is_empty() {
        println!("\nSentence generation unavailable, falling back to a template sentence.");
        match builder.build_basic_sentence() {
            Some(sentence) => print_basic_sentence(&sentence),
            None => println!("\nNot enough vocabulary to build a basic sentence yet."),
        }
    } else {
        print_generated_sentences(&sentences);
    }

    Ok(())
}

fn print_vocabulary_stats(knowledge: &KnowledgeSnapshot) {
    println!("\nVocabulary Statistics:");
    println!("User level: {}", knowledge.level);
    println!("Total vocabulary items: {}", knowledge.vocabulary.len());
    println!("Total kanji items: {}", knowledge.kanji.len());

    println!("\nBreakdown by part of speech:");
    for (pos, count) in knowledge.part_of_speech_counts() {
        println!("  {}: {} words", pos, count);
    }

    println!("\nSRS Stage Breakdown:");
    for (stage, count) in knowledge.srs_breakdown() {
        println!("  {}: {} items", stage, count);
    }
}

fn print_words_by_pos(builder: &SentenceBuilder) {
    println!("\nStarted Vocabulary by Part of Speech:");
    for (category, words) in builder.get_available_words_by_pos() {
        println!("\n{}: {} words", category.plural_title(), words.len());
        for word in words.iter().take(PROMPT_WORDS_PER_CATEGORY) {
            let stage = word.srs_stage_name().map(|s| s.name()).unwrap_or("started");
            println!(
                "  {} ({}) - {} [level {}, {}]",
                word.characters,
                word.display_reading(),
                word.display_meaning(),
                word.level,
                stage
            );
        }
    }

    let empty: Vec<PosCategory> = builder
        .get_available_words_by_pos()
        .into_iter()
        .filter(|(_, words)| words.is_empty())
        .map(|(category, _)| category)
        .collect();
    if !empty.is_empty() {
        log::debug!("No started vocabulary for: {:?}", empty);
    }
}

fn print_basic_sentence(sentence: &BasicSentence) {
    println!("\nJapanese: {}", sentence.japanese);
    println!("Reading:  {}", sentence.reading);
    println!("Word-by-word:");
    for slot in &sentence.slots {
        println!("  {} ({}) - {}", slot.characters, slot.reading, slot.meaning);
    }
}

fn print_generated_sentences(sentences: &[GeneratedSentence]) {
    for (i, sentence) in sentences.iter().enumerate() {
        println!("\nSentence {}:", i + 1);
        println!("Japanese: {}", sentence.japanese);
        println!("Reading:  {}", sentence.reading);
        println!("English:  {}", sentence.english);
        println!("Word by word:");
        for word in &sentence.word_by_word {
            println!("  {} ({}) - {} [{}]", word.word, word.reading, word.meaning, word.pos);
        }
    }
}
