use std::{
    thread,
    time::Duration,
};

use reqwest::blocking::Client;
use serde::de::DeserializeOwned;

use super::types::{
    AssignmentData,
    Collection,
    Filters,
    Resource,
    SubjectData,
    UserData,
};
use crate::core::{
    config::DEFAULT_PAGE_DELAY,
    http::{
        ensure_success,
        http_client,
    },
    SpeechBubbleError,
};

pub const BASE_URL: &str = "https://api.wanikani.com/v2";
pub const API_REVISION: &str = "20170710";

/// The three reads the knowledge aggregator needs from WaniKani.
pub trait WaniKaniSource {
    fn user(&self) -> Result<UserData, SpeechBubbleError>;

    fn assignments(
        &self,
        filters: &Filters,
    ) -> Result<Vec<Resource<AssignmentData>>, SpeechBubbleError>;

    fn subjects(&self, filters: &Filters) -> Result<Vec<Resource<SubjectData>>, SpeechBubbleError>;
}

pub struct WaniKaniClient {
    client: Client,
    api_key: String,
    base_url: String,
    page_delay: Duration,
}

impl WaniKaniClient {
    pub fn new(api_key: &str) -> Result<Self, SpeechBubbleError> {
        if api_key.trim().is_empty() {
            return Err(SpeechBubbleError::MissingCredential("wanikani_api_key"));
        }

        Ok(Self {
            client: http_client()?,
            api_key: api_key.trim().to_string(),
            base_url: BASE_URL.to_string(),
            page_delay: DEFAULT_PAGE_DELAY,
        })
    }

    pub fn with_page_delay(mut self, page_delay: Duration) -> Self {
        self.page_delay = page_delay;
        self
    }

    fn get<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(String, String)],
    ) -> Result<T, SpeechBubbleError> {
        log::debug!("GET {}", url);
        let resp = self
            .client
            .get(url)
            .bearer_auth(&self.api_key)
            .header("Wanikani-Revision", API_REVISION)
            .query(query)
            .send()?;

        Ok(ensure_success(resp)?.json()?)
    }

    /// Fetches every page of `endpoint`, following `pages.next_url` until it runs out.
    pub fn fetch_collection<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        filters: &Filters,
    ) -> Result<Vec<Resource<T>>, SpeechBubbleError> {
        let first_url = format!("{}/{}", self.base_url, endpoint);

        paginate(&first_url, self.page_delay, |url, is_first| {
            // next_url already carries the first request's query string
            if is_first {
                self.get::<Collection<T>>(url, filters.as_query())
            } else {
                self.get::<Collection<T>>(url, &[])
            }
        })
    }

    pub fn fetch_user_profile(&self) -> Result<UserData, SpeechBubbleError> {
        let url = format!("{}/user", self.base_url);
        let resource: Resource<UserData> = self.get(&url, &[])?;
        Ok(resource.data)
    }
}

impl WaniKaniSource for WaniKaniClient {
    fn user(&self) -> Result<UserData, SpeechBubbleError> {
        self.fetch_user_profile()
    }

    fn assignments(
        &self,
        filters: &Filters,
    ) -> Result<Vec<Resource<AssignmentData>>, SpeechBubbleError> {
        self.fetch_collection("assignments", filters)
    }

    fn subjects(&self, filters: &Filters) -> Result<Vec<Resource<SubjectData>>, SpeechBubbleError> {
        self.fetch_collection("subjects", filters)
    }
}

/// Sequential pagination with a fixed pause between pages. Errors are not retried.
pub fn paginate<T, F>(
    first_url: &str,
    page_delay: Duration,
    mut fetch_page: F,
) -> Result<Vec<Resource<T>>, SpeechBubbleError>
where
    F: FnMut(&str, bool) -> Result<Collection<T>, SpeechBubbleError>,
{
    let mut results = Vec::new();
    let mut url = first_url.to_string();
    let mut page_count = 0usize;

    loop {
        let page = fetch_page(&url, page_count == 0)?;
        page_count += 1;
        let next_url = page.next_url().map(str::to_string);
        results.extend(page.data);

        match next_url {
            Some(next) => {
                if !page_delay.is_zero() {
                    thread::sleep(page_delay);
                }
                url = next;
            }
            None => break,
        }
    }

    log::debug!("Fetched {} records over {} page(s) from {}", results.len(), page_count, first_url);
    Ok(results)
}
