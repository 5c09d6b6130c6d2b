use std::collections::BTreeSet;

use chrono::{
    DateTime,
    Utc,
};
use serde::{
    Deserialize,
    Serialize,
};

use crate::core::{
    Meaning,
    Reading,
    SubjectKind,
};

/// One page of a collection endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Collection<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<Resource<T>>,
    #[serde(default)]
    pub pages: Option<Pages>,
}

impl<T> Collection<T> {
    pub fn next_url(&self) -> Option<&str> {
        self.pages.as_ref().and_then(|p| p.next_url.as_deref())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Pages {
    pub next_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resource<T> {
    #[serde(default)]
    pub id: Option<u64>,
    pub object: String,
    pub data: T,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserData {
    pub username: Option<String>,
    #[serde(default = "default_level")]
    pub level: u32,
}

fn default_level() -> u32 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentData {
    pub subject_id: u64,
    pub subject_type: SubjectKind,
    #[serde(default)]
    pub srs_stage: u8,
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub unlocked_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub passed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub burned_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubjectData {
    pub level: u32,
    pub characters: Option<String>,
    #[serde(default)]
    pub meanings: Vec<Meaning>,
    #[serde(default)]
    pub readings: Vec<Reading>,
    #[serde(default)]
    pub parts_of_speech: Vec<String>,
    #[serde(default)]
    pub component_subject_ids: BTreeSet<u64>,
}

/// Query parameters for a collection endpoint. Multi-valued filters are comma-joined.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filters {
    params: Vec<(String, String)>,
}

impl Filters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn list<I, S>(mut self, key: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: ToString,
    {
        let joined = values.into_iter().map(|v| v.to_string()).collect::<Vec<_>>().join(",");
        self.params.push((key.to_string(), joined));
        self
    }

    pub fn flag(mut self, key: &str, value: bool) -> Self {
        self.params.push((key.to_string(), value.to_string()));
        self
    }

    pub fn as_query(&self) -> &[(String, String)] {
        &self.params
    }
}
