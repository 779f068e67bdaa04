use std::time::Duration;

use anyhow::{Context, Result};
use tracing::debug;

use crate::config::Settings;
use crate::error::FetchError;

/// Outcome of a single GET. `body` is only present for a 200.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fetched {
    pub status: u16,
    pub body: Option<String>,
}

pub trait Fetch {
    fn fetch(&self, url: &str) -> Result<Fetched, FetchError>;

    /// Body of a 200 response; any other status becomes `FetchError::Status`.
    fn fetch_ok(&self, url: &str) -> Result<String, FetchError> {
        let fetched = self.fetch(url)?;
        match fetched.body {
            Some(body) if fetched.status == 200 => Ok(body),
            _ => Err(FetchError::Status {
                url: url.to_string(),
                status: fetched.status,
            }),
        }
    }
}

/// Blocking reqwest client. Redirects are surfaced as plain 3xx statuses.
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    pub fn new(settings: &Settings) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .user_agent(settings.user_agent.clone())
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self { client })
    }
}

impl Fetch for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<Fetched, FetchError> {
        debug!("Grabbing source code from {}", url);
        let transport = |e: reqwest::Error| FetchError::Transport {
            url: url.to_string(),
            message: e.to_string(),
        };

        let response = self.client.get(url).send().map_err(transport)?;
        let status = response.status().as_u16();
        if status != 200 {
            return Ok(Fetched { status, body: None });
        }
        let body = response.text().map_err(transport)?;
        Ok(Fetched {
            status,
            body: Some(body),
        })
    }
}

#[cfg(test)]
pub mod stub {
    use std::cell::RefCell;
    use std::collections::HashMap;

    use super::*;

    /// Serves canned pages; unknown URLs answer 404. Records every request.
    #[derive(Default)]
    pub struct StubFetcher {
        pages: HashMap<String, Result<Fetched, FetchError>>,
        pub requested: RefCell<Vec<String>>,
    }

    impl StubFetcher {
        pub fn page(mut self, url: &str, html: &str) -> Self {
            let fetched = Fetched {
                status: 200,
                body: Some(html.to_string()),
            };
            self.pages.insert(url.to_string(), Ok(fetched));
            self
        }

        pub fn status(mut self, url: &str, status: u16) -> Self {
            self.pages
                .insert(url.to_string(), Ok(Fetched { status, body: None }));
            self
        }

        pub fn unreachable(mut self, url: &str) -> Self {
            let err = FetchError::Transport {
                url: url.to_string(),
                message: "connection reset".to_string(),
            };
            self.pages.insert(url.to_string(), Err(err));
            self
        }

        pub fn requested(&self) -> Vec<String> {
            self.requested.borrow().clone()
        }
    }

    impl Fetch for StubFetcher {
        fn fetch(&self, url: &str) -> Result<Fetched, FetchError> {
            self.requested.borrow_mut().push(url.to_string());
            self.pages.get(url).cloned().unwrap_or(Ok(Fetched {
                status: 404,
                body: None,
            }))
        }
    }
}
