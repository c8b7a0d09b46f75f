//! In-memory data source with scripted latency and failures.

use async_trait::async_trait;
use chrono::NaiveDate;
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::time::Duration;
use tabula_core::{FetchRequest, Page, SortOrder, parse_day};
use tabula_error::{ExportError, FetchError};
use tabula_interface::{DataSource, ExportJob, ExportSink};

/// Row type served by [`MockSource`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Person {
    pub id: u64,
    pub name: String,
    pub team: String,
    pub joined: NaiveDate,
}

/// `count` people with ids from 1, joined one day apart from 2024-01-01.
pub fn people(count: u64) -> Vec<Person> {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).expect("valid date");
    (1..=count)
        .map(|id| Person {
            id,
            name: format!("person {:03}", id),
            team: if id % 2 == 0 { "even" } else { "odd" }.to_string(),
            joined: start + chrono::Days::new(id - 1),
        })
        .collect()
}

/// Serves a fixed set of people, filtering and paging like a real backend.
pub struct MockSource {
    rows: Vec<Person>,
    requests: Mutex<Vec<FetchRequest>>,
    delays: Mutex<HashMap<String, Duration>>,
    default_delay: Duration,
    failures: Mutex<VecDeque<FetchError>>,
    max_limit: Option<u32>,
}

impl MockSource {
    pub fn new(rows: Vec<Person>) -> Self {
        Self {
            rows,
            requests: Mutex::new(Vec::new()),
            delays: Mutex::new(HashMap::new()),
            default_delay: Duration::from_millis(10),
            failures: Mutex::new(VecDeque::new()),
            max_limit: None,
        }
    }

    /// Caps the rows returned per request regardless of `limit`.
    pub fn with_max_limit(mut self, max_limit: u32) -> Self {
        self.max_limit = Some(max_limit);
        self
    }

    /// Latency for requests whose search term is `search` (empty for none).
    pub fn delay_for(&self, search: &str, delay: Duration) {
        self.delays.lock().insert(search.to_string(), delay);
    }

    /// The next request fails with `error`.
    pub fn fail_next(&self, error: FetchError) {
        self.failures.lock().push_back(error);
    }

    pub fn requests(&self) -> Vec<FetchRequest> {
        self.requests.lock().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    pub fn last_request(&self) -> Option<FetchRequest> {
        self.requests.lock().last().cloned()
    }

    fn matches(&self, person: &Person, request: &FetchRequest) -> bool {
        if let Some(search) = request.search() {
            if !person.name.to_lowercase().contains(&search.to_lowercase()) {
                return false;
            }
        }
        if let Some(from) = request.from_date().as_deref().and_then(parse_day) {
            if person.joined < from {
                return false;
            }
        }
        if let Some(to) = request.to_date().as_deref().and_then(parse_day) {
            if person.joined > to {
                return false;
            }
        }
        request.filter().iter().all(|(column, value)| match column.as_str() {
            "team" => &person.team == value,
            _ => true,
        })
    }
}

#[async_trait]
impl DataSource<Person> for MockSource {
    async fn fetch_page(&self, request: &FetchRequest) -> Result<Page<Person>, FetchError> {
        self.requests.lock().push(request.clone());
        let search = request.search().clone().unwrap_or_default();
        let delay = self
            .delays
            .lock()
            .get(&search)
            .copied()
            .unwrap_or(self.default_delay);
        tokio::time::sleep(delay).await;

        if let Some(error) = self.failures.lock().pop_front() {
            return Err(error);
        }

        let mut matched: Vec<Person> = self
            .rows
            .iter()
            .filter(|p| self.matches(p, request))
            .cloned()
            .collect();
        match request.sort_by().as_deref() {
            Some("name") => matched.sort_by(|a, b| a.name.cmp(&b.name)),
            Some("joined") => matched.sort_by_key(|p| p.joined),
            _ => matched.sort_by_key(|p| p.id),
        }
        if *request.sort_order() == Some(SortOrder::Desc) {
            matched.reverse();
        }

        let total = matched.len() as u64;
        let limit = request
            .limit()
            .to_owned()
            .min(self.max_limit.unwrap_or(u32::MAX)) as usize;
        let start = (*request.page() as usize - 1) * *request.limit() as usize;
        let rows = matched.into_iter().skip(start).take(limit).collect();
        Ok(Page::new(rows, total))
    }
}

/// Export sink that keeps every job it receives.
#[derive(Default)]
pub struct RecordingSink {
    jobs: Mutex<Vec<ExportJob>>,
    fail_with: Mutex<Option<ExportError>>,
}

impl RecordingSink {
    pub fn jobs(&self) -> Vec<ExportJob> {
        self.jobs.lock().clone()
    }

    pub fn fail_with(&self, error: ExportError) {
        *self.fail_with.lock() = Some(error);
    }
}

#[async_trait]
impl ExportSink for RecordingSink {
    async fn export(&self, job: ExportJob) -> Result<(), ExportError> {
        if let Some(error) = self.fail_with.lock().take() {
            return Err(error);
        }
        self.jobs.lock().push(job);
        Ok(())
    }
}
