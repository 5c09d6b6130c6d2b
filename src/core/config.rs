use std::{
    fs,
    io::{
        BufRead,
        Write,
    },
    path::{
        Path,
        PathBuf,
    },
    time::Duration,
};

use serde::{
    Deserialize,
    Serialize,
};

use super::SpeechBubbleError;
use crate::persistence::{
    get_app_cache_dir,
    get_app_config_dir,
};

pub const CONFIG_FILE_NAME: &str = "config.json";
pub const DEFAULT_CACHE_MAX_AGE_HOURS: i64 = 24;
pub const DEFAULT_PAGE_DELAY: Duration = Duration::from_millis(500);

/// Everything a run needs to know about where things live, built once in `main`.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub config_file: PathBuf,
    pub cache_dir: PathBuf,
    pub cache_max_age: chrono::Duration,
    pub use_cache: bool,
    pub page_delay: Duration,
}

impl AppConfig {
    pub fn from_default_dirs() -> Self {
        Self {
            config_file: get_app_config_dir().join(CONFIG_FILE_NAME),
            cache_dir: get_app_cache_dir(),
            cache_max_age: chrono::Duration::hours(DEFAULT_CACHE_MAX_AGE_HOURS),
            use_cache: true,
            page_delay: DEFAULT_PAGE_DELAY,
        }
    }

    pub fn with_config_file(mut self, path: PathBuf) -> Self {
        self.config_file = path;
        self
    }

    pub fn with_cache_max_age_hours(mut self, hours: u32) -> Self {
        self.cache_max_age = chrono::Duration::hours(i64::from(hours));
        self
    }

    pub fn with_cache(mut self, use_cache: bool) -> Self {
        self.use_cache = use_cache;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialKind {
    WaniKani,
    OpenAi,
}

impl CredentialKind {
    pub fn key_name(&self) -> &'static str {
        match self {
            CredentialKind::WaniKani => "wanikani_api_key",
            CredentialKind::OpenAi => "openai_api_key",
        }
    }

    fn env_var(&self) -> &'static str {
        match self {
            CredentialKind::WaniKani => "WANIKANI_API_KEY",
            CredentialKind::OpenAi => "OPENAI_API_KEY",
        }
    }

    fn prompt(&self) -> (&'static str, &'static str) {
        match self {
            CredentialKind::WaniKani => {
                ("WaniKani API key not found.", "Please enter your WaniKani API key (v2): ")
            }
            CredentialKind::OpenAi => {
                ("OpenAI API key not found.", "Please enter your OpenAI API key: ")
            }
        }
    }
}

/// Contents of the local credential file. Keys that were never entered are omitted on disk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wanikani_api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openai_api_key: Option<String>,
}

impl Credentials {
    pub fn load(path: &Path) -> Result<Self, SpeechBubbleError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| {
            SpeechBubbleError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;

        serde_json::from_str(&content).map_err(|e| {
            SpeechBubbleError::Config(format!("Failed to parse {}: {}", path.display(), e))
        })
    }

    pub fn save(&self, path: &Path) -> Result<(), SpeechBubbleError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        log::info!("Credentials saved to: {}", path.display());
        Ok(())
    }

    pub fn get(&self, kind: CredentialKind) -> Option<&str> {
        let value = match kind {
            CredentialKind::WaniKani => &self.wanikani_api_key,
            CredentialKind::OpenAi => &self.openai_api_key,
        };
        value.as_deref().filter(|v| !v.trim().is_empty())
    }

    fn set(&mut self, kind: CredentialKind, value: String) {
        match kind {
            CredentialKind::WaniKani => self.wanikani_api_key = Some(value),
            CredentialKind::OpenAi => self.openai_api_key = Some(value),
        }
    }

    /// Fills keys missing from the file with `WANIKANI_API_KEY` / `OPENAI_API_KEY`.
    /// Values taken from the environment are not written back.
    pub fn with_env_fallback(mut self) -> Self {
        for kind in [CredentialKind::WaniKani, CredentialKind::OpenAi] {
            if self.get(kind).is_none() {
                if let Ok(value) = std::env::var(kind.env_var()) {
                    if !value.trim().is_empty() {
                        self.set(kind, value.trim().to_string());
                    }
                }
            }
        }
        self
    }

    /// Returns the stored key, or asks for it on `input` and persists the answer to `path`.
    pub fn ensure<R: BufRead, W: Write>(
        &mut self,
        kind: CredentialKind,
        path: &Path,
        input: &mut R,
        output: &mut W,
    ) -> Result<String, SpeechBubbleError> {
        if let Some(value) = self.get(kind) {
            return Ok(value.to_string());
        }

        let (notice, question) = kind.prompt();
        writeln!(output, "{}", notice)?;
        write!(output, "{}", question)?;
        output.flush()?;

        let mut line = String::new();
        input.read_line(&mut line)?;
        let value = line.trim().to_string();
        if value.is_empty() {
            return Err(SpeechBubbleError::MissingCredential(kind.key_name()));
        }

        // Persist on top of what's on disk so env-provided keys stay out of the file
        let mut on_disk = Credentials::load(path)?;
        on_disk.set(kind, value.clone());
        on_disk.save(path)?;

        self.set(kind, value.clone());
        Ok(value)
    }
}
