pub mod config;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};
use thiserror::Error;

use crate::classifier::config::{PredictRequest, PredictResponse};

const RETRIES: u32 = 1;

#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("classifier request failed: {0}")]
    Transport(String),
    #[error("classifier returned HTTP {0}")]
    Status(u16),
    #[error("classifier response could not be decoded: {0}")]
    Decode(String),
    #[error("classifier did not answer within {0:?}")]
    Timeout(Duration),
    #[error("classifier returned {got} scores for {expected} texts")]
    LengthMismatch { expected: usize, got: usize },
    #[error("classifier returned probability {0} outside [0, 1]")]
    OutOfRange(f64),
}

impl From<reqwest_middleware::Error> for ClassifierError {
    fn from(err: reqwest_middleware::Error) -> Self {
        ClassifierError::Transport(err.to_string())
    }
}

impl From<reqwest::Error> for ClassifierError {
    fn from(err: reqwest::Error) -> Self {
        ClassifierError::Transport(err.to_string())
    }
}

/// Внешний сервис оценки токсичности: одна вероятность на каждый текст,
/// в том же порядке.
#[async_trait]
pub trait ToxicityClassifier: Send + Sync {
    async fn score(&self, texts: &[String]) -> Result<Vec<f64>, ClassifierError>;
}

/// Оценка одного сообщения с ограничением по времени и проверкой ответа.
pub async fn score_one(
    classifier: &dyn ToxicityClassifier,
    text: &str,
    timeout: Duration,
) -> Result<f64, ClassifierError> {
    let texts = [text.to_string()];
    let scores = tokio::time::timeout(timeout, classifier.score(&texts))
        .await
        .map_err(|_| ClassifierError::Timeout(timeout))??;

    match scores.as_slice() {
        [p] if p.is_finite() && (0.0..=1.0).contains(p) => Ok(*p),
        [p] => Err(ClassifierError::OutOfRange(*p)),
        other => Err(ClassifierError::LengthMismatch {
            expected: texts.len(),
            got: other.len(),
        }),
    }
}

/// Клиент HTTP-сервиса модели (`POST {base}/predict`).
pub struct HttpClassifier {
    client: ClientWithMiddleware,
    predict_url: String,
}

impl HttpClassifier {
    pub fn new(base_url: &str) -> Self {
        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(RETRIES);

        let client = ClientBuilder::new(Client::new())
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        Self {
            client,
            predict_url: format!("{}/predict", base_url.trim_end_matches('/')),
        }
    }
}

#[async_trait]
impl ToxicityClassifier for HttpClassifier {
    async fn score(&self, texts: &[String]) -> Result<Vec<f64>, ClassifierError> {
        let request = PredictRequest {
            texts: texts.to_vec(),
        };
        let body =
            serde_json::to_vec(&request).map_err(|e| ClassifierError::Decode(e.to_string()))?;

        let response = self
            .client
            .post(&self.predict_url)
            .header("Accept", "application/json")
            .header("Content-Type", "application/json")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClassifierError::Status(status.as_u16()));
        }

        let text = response.text().await?;
        let response = serde_json::from_str::<PredictResponse>(&text)
            .map_err(|e| ClassifierError::Decode(e.to_string()))?;

        if response.probabilities.len() != texts.len() {
            return Err(ClassifierError::LengthMismatch {
                expected: texts.len(),
                got: response.probabilities.len(),
            });
        }

        Ok(response.probabilities)
    }
}


#[cfg(test)]
mod tests {
    use super::stubs::*;
    use super::*;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const SLA: Duration = Duration::from_secs(2);

    #[tokio::test]
    async fn score_one_returns_single_probability() {
        let classifier = ScriptedClassifier::new(&[0.2]);
        let p = score_one(&classifier, "hello", SLA).await.unwrap();
        assert_eq!(p, 0.2);
        assert_eq!(classifier.calls(), 1);
    }

    #[tokio::test]
    async fn score_one_rejects_wrong_length_and_range() {
        let empty = RawClassifier(vec![]);
        assert!(matches!(
            score_one(&empty, "x", SLA).await,
            Err(ClassifierError::LengthMismatch { expected: 1, got: 0 })
        ));

        let too_big = RawClassifier(vec![1.5]);
        assert!(matches!(
            score_one(&too_big, "x", SLA).await,
            Err(ClassifierError::OutOfRange(_))
        ));
    }

    #[tokio::test]
    async fn score_one_times_out() {
        let slow = SlowClassifier(Duration::from_secs(5));
        let result = score_one(&slow, "x", Duration::from_millis(50)).await;
        assert!(matches!(result, Err(ClassifierError::Timeout(_))));
    }

    #[tokio::test]
    async fn http_classifier_posts_texts_and_reads_probabilities() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/predict"))
            .and(body_json(serde_json::json!({ "texts": ["привет", "пока"] })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "probabilities": [0.1, 0.9] })),
            )
            .mount(&server)
            .await;

        let classifier = HttpClassifier::new(&format!("{}/", server.uri()));
        let scores = classifier
            .score(&["привет".to_string(), "пока".to_string()])
            .await
            .unwrap();
        assert_eq!(scores, vec![0.1, 0.9]);
    }

    #[tokio::test]
    async fn http_classifier_reports_status_and_decode_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/predict"))
            .respond_with(ResponseTemplate::new(400))
            .mount(&server)
            .await;
        let classifier = HttpClassifier::new(&server.uri());
        assert!(matches!(
            classifier.score(&["x".into()]).await,
            Err(ClassifierError::Status(400))
        ));

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/predict"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;
        let classifier = HttpClassifier::new(&server.uri());
        assert!(matches!(
            classifier.score(&["x".into()]).await,
            Err(ClassifierError::Decode(_))
        ));
    }
}
