//! Free-text notes for filler entries: programming jokes and advice slips.

use async_trait::async_trait;
use hat_core::{NoteKind, NoteSource, SourceError};
use serde::Deserialize;

use crate::{ClientError, http_client, response_text};

const JOKE_API_URL: &str =
    "https://v2.jokeapi.dev/joke/Programming?blacklistFlags=nsfw,racist,sexist,explicit";
const ADVICE_API_URL: &str = "https://api.adviceslip.com/advice";

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum Joke {
    Single { joke: String },
    Twopart { setup: String, delivery: String },
}

impl Joke {
    fn into_text(self) -> String {
        match self {
            Self::Single { joke } => joke,
            Self::Twopart { setup, delivery } => format!("{setup} {delivery}"),
        }
    }
}

#[derive(Debug, Deserialize)]
struct AdviceResponse {
    slip: AdviceSlip,
}

#[derive(Debug, Deserialize)]
struct AdviceSlip {
    advice: String,
}

/// Fetches note text from the public joke and advice services.
#[derive(Debug)]
pub struct NoteClient {
    client: reqwest::Client,
    joke_url: String,
    advice_url: String,
}

impl NoteClient {
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new() -> Result<Self, ClientError> {
        Ok(Self {
            client: http_client()?,
            joke_url: JOKE_API_URL.to_string(),
            advice_url: ADVICE_API_URL.to_string(),
        })
    }

    /// Overrides both endpoints.
    #[must_use]
    pub fn with_urls(mut self, joke_url: impl Into<String>, advice_url: impl Into<String>) -> Self {
        self.joke_url = joke_url.into();
        self.advice_url = advice_url.into();
        self
    }

    async fn fetch(&self, url: &str, service: &'static str) -> Result<String, ClientError> {
        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;
        response_text(service, response).await
    }

    /// A random programming joke.
    ///
    /// # Errors
    /// Returns an error if the request fails or the joke cannot be parsed.
    pub async fn joke(&self) -> Result<String, ClientError> {
        let body = self.fetch(&self.joke_url, "JokeAPI").await?;
        let joke: Joke = serde_json::from_str(&body)
            .map_err(|err| ClientError::InvalidResponse(format!("JokeAPI: {err}")))?;
        Ok(joke.into_text())
    }

    /// A random piece of advice.
    ///
    /// # Errors
    /// Returns an error if the request fails or the slip cannot be parsed.
    pub async fn advice(&self) -> Result<String, ClientError> {
        // The advice service labels its JSON as text/html.
        let body = self.fetch(&self.advice_url, "Advice Slip").await?;
        let advice: AdviceResponse = serde_json::from_str(&body)
            .map_err(|err| ClientError::InvalidResponse(format!("Advice Slip: {err}")))?;
        Ok(advice.slip.advice)
    }
}

#[async_trait]
impl NoteSource for NoteClient {
    async fn note(&self, kind: NoteKind) -> Result<String, SourceError> {
        let text = match kind {
            NoteKind::Joke => self.joke().await?,
            NoteKind::Advice => self.advice().await?,
        };
        Ok(text)
    }
}
