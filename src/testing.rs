//! Scripted collaborators for tests and offline runs.

use async_trait::async_trait;
use reqwest::Url;
use std::sync::{Mutex, PoisonError};

use crate::error::{TransitError, TransitResult};
use crate::gateway::{HttpResponse, Transport};
use crate::predict::{ElementSet, ObserverPosition, PassCandidate, PassSource};

use chrono::{DateTime, Utc};

enum Reply {
    Response(HttpResponse),
    Failure(String),
}

/// Transport answering from a list of `(url prefix, reply)` routes and
/// recording every requested URL. The first matching route wins.
#[derive(Default)]
pub struct FakeTransport {
    routes: Mutex<Vec<(String, Reply)>>,
    requests: Mutex<Vec<String>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, prefix: &str, status: u16, body: &str) -> Self {
        self.lock_routes()
            .push((prefix.to_string(), Reply::Response(HttpResponse::new(status, body))));
        self
    }

    pub fn fail(self, prefix: &str, message: &str) -> Self {
        self.lock_routes()
            .push((prefix.to_string(), Reply::Failure(message.to_string())));
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests().len()
    }

    fn lock_routes(&self) -> std::sync::MutexGuard<'_, Vec<(String, Reply)>> {
        self.routes.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn get(&self, url: &Url) -> TransitResult<HttpResponse> {
        let url = url.to_string();
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(url.clone());

        let routes = self.lock_routes();
        match routes.iter().find(|(prefix, _)| url.starts_with(prefix.as_str())) {
            Some((_, Reply::Response(response))) => Ok(response.clone()),
            Some((_, Reply::Failure(message))) => {
                Err(TransitError::Api(format!("Request failed: {}", message)))
            }
            None => Ok(HttpResponse::new(404, "no route")),
        }
    }
}

/// Pass source returning the same scripted candidates for every query and
/// remembering the window it was asked about.
#[derive(Default)]
pub struct FakePassSource {
    candidates: Vec<PassCandidate>,
    error: Option<TransitError>,
    queries: Mutex<Vec<(String, ObserverPosition, DateTime<Utc>, DateTime<Utc>)>>,
}

impl FakePassSource {
    pub fn new(candidates: Vec<PassCandidate>) -> Self {
        Self {
            candidates,
            ..Self::default()
        }
    }

    pub fn failing(error: TransitError) -> Self {
        Self {
            error: Some(error),
            ..Self::default()
        }
    }

    pub fn queries(&self) -> Vec<(String, ObserverPosition, DateTime<Utc>, DateTime<Utc>)> {
        self.queries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl PassSource for FakePassSource {
    fn transits(
        &self,
        elements: &ElementSet,
        observer: &ObserverPosition,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> TransitResult<Vec<PassCandidate>> {
        self.queries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((elements.text().to_string(), *observer, start, end));
        match &self.error {
            Some(err) => Err(err.clone()),
            None => Ok(self.candidates.clone()),
        }
    }
}
