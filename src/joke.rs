use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use encoding_rs::WINDOWS_1251;
use regex::Regex;
use reqwest::{Client, StatusCode};
use thiserror::Error;

pub const DEFAULT_JOKE_URL: &str = "http://rzhunemogu.ru/RandJSON.aspx?CType=1";
pub const JOKE_TIMEOUT: Duration = Duration::from_secs(8);

pub const FALLBACK_SERVER_ERROR: &str = "Сервер вернул ошибку 🐛";
pub const FALLBACK_UNPARSEABLE: &str = "Не удалось распарсить анекдот 🐛";
pub const FALLBACK_EMPTY: &str = "Пустой ответ 🐛";
pub const FALLBACK_UNAVAILABLE: &str = "Не удалось получить анекдот 🐛";

// Ответ сервиса похож на JSON, но не валиден: внутри поля бывают
// неэкранированные переводы строк, поэтому вытаскиваем поле регуляркой.
static CONTENT_FIELD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)"content"\s*:\s*"(.*?)"\s*\}"#).expect("valid content regex")
});

#[derive(Debug, Error, PartialEq)]
enum JokeError {
    #[error("joke server returned HTTP {0}")]
    Status(u16),
    #[error("request failed: {0}")]
    Transport(String),
    #[error("no content field in response")]
    Unparseable,
    #[error("joke is empty")]
    Empty,
}

impl JokeError {
    fn fallback(&self) -> &'static str {
        match self {
            JokeError::Status(_) => FALLBACK_SERVER_ERROR,
            JokeError::Transport(_) => FALLBACK_UNAVAILABLE,
            JokeError::Unparseable => FALLBACK_UNPARSEABLE,
            JokeError::Empty => FALLBACK_EMPTY,
        }
    }
}

/// Источник анекдотов. Всегда возвращает текст для показа, ошибки наружу не выходят.
#[async_trait]
pub trait JokeSource: Send + Sync {
    async fn fetch(&self) -> String;
}

/// Достаёт текст анекдота из тела ответа rzhunemogu.ru.
fn parse_joke_body(raw: &str) -> Result<String, JokeError> {
    let raw = raw.trim_start_matches('\u{feff}');
    let captures = CONTENT_FIELD.captures(raw).ok_or(JokeError::Unparseable)?;

    let joke: String = captures[1]
        .replace("\r\n", "\n")
        .replace('\r', "\n")
        .chars()
        .filter(|c| !matches!(c, '\x00'..='\x08' | '\x0B' | '\x0C' | '\x0E'..='\x1F'))
        .collect();

    let joke = joke.trim();
    if joke.is_empty() {
        return Err(JokeError::Empty);
    }
    Ok(joke.to_string())
}

pub struct RzhunemoguJokes {
    client: Client,
    url: String,
}

impl RzhunemoguJokes {
    pub fn new(url: impl Into<String>) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(JOKE_TIMEOUT).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    async fn try_fetch(&self) -> Result<String, JokeError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| JokeError::Transport(e.to_string()))?;

        if response.status() != StatusCode::OK {
            return Err(JokeError::Status(response.status().as_u16()));
        }

        // Сервис отдаёт windows-1251 независимо от заявленной кодировки
        let bytes = response
            .bytes()
            .await
            .map_err(|e| JokeError::Transport(e.to_string()))?;
        let (body, _, _) = WINDOWS_1251.decode(&bytes);

        parse_joke_body(&body)
    }
}

#[async_trait]
impl JokeSource for RzhunemoguJokes {
    async fn fetch(&self) -> String {
        match self.try_fetch().await {
            Ok(joke) => joke,
            Err(e) => {
                log::warn!("🃏 Joke fetch failed: {}", e);
                e.fallback().to_string()
            }
        }
    }
}
