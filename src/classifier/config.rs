use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PredictRequest {
    pub texts: Vec<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PredictResponse {
    pub probabilities: Vec<f64>,
}
