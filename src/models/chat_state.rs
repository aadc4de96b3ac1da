use thiserror::Error;

pub const DEFAULT_THRESHOLD: f64 = 0.5;

/// Политика ответов для активного чата.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    All,
    OnlyToxic,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::All => "all",
            Mode::OnlyToxic => "only_toxic",
        }
    }
}

/// Настройки одного чата. Порог всегда лежит в [0, 1].
#[derive(Debug, Clone, PartialEq)]
pub struct ChatState {
    pub active: bool,
    pub mode: Mode,
    threshold: f64,
}

impl Default for ChatState {
    fn default() -> Self {
        Self {
            active: false,
            mode: Mode::All,
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

#[derive(Debug, Error, PartialEq)]
#[error("threshold must be a number, got {0:?}")]
pub struct ThresholdError(pub String);

pub fn clamp_threshold(value: f64) -> f64 {
    value.clamp(0.0, 1.0)
}

/// Разбор аргумента `/only_toxic`. NaN считается нечисловым вводом.
pub fn parse_threshold(raw: &str) -> Result<f64, ThresholdError> {
    match raw.trim().parse::<f64>() {
        Ok(value) if !value.is_nan() => Ok(value),
        _ => Err(ThresholdError(raw.to_string())),
    }
}

impl ChatState {
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn set_threshold(&mut self, value: f64) {
        self.threshold = clamp_threshold(value);
    }

    /// Полный сброс, как при `/start`.
    pub fn reset_active(&mut self) {
        *self = Self {
            active: true,
            ..Self::default()
        };
    }
}
