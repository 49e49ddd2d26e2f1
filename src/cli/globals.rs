use crate::cli::commands::{ARG_API_URL, ARG_TIMEOUT};
use crate::users::HttpGateway;
use anyhow::{Context, Result};
use std::time::Duration;
use url::Url;

/// Options shared by every subcommand that talks to the users API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalArgs {
    pub api_url: Url,
    pub timeout: Option<Duration>,
}

impl GlobalArgs {
    #[must_use]
    pub fn new(api_url: Url) -> Self {
        Self {
            api_url,
            timeout: None,
        }
    }

    /// # Errors
    /// Returns an error if the API URL is missing from the matches.
    pub fn parse(matches: &clap::ArgMatches) -> Result<Self> {
        let api_url = matches
            .get_one::<Url>(ARG_API_URL)
            .cloned()
            .context("missing required argument: --api-url")?;

        Ok(Self {
            api_url,
            timeout: matches
                .get_one::<u64>(ARG_TIMEOUT)
                .map(|secs| Duration::from_secs(*secs)),
        })
    }

    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn gateway(&self) -> Result<HttpGateway> {
        HttpGateway::new(&self.api_url, self.timeout).context("failed to initialize users API client")
    }
}
