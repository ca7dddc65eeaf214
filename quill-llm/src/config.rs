//! Per-request generation settings

use serde::{Deserialize, Deserializer, Serialize};

/// Model used when none is selected
pub const DEFAULT_MODEL: &str = "gemini-3-flash";

/// Sampling temperature used when none is given
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

pub const MIN_TEMPERATURE: f32 = 0.0;
pub const MAX_TEMPERATURE: f32 = 2.0;

/// System instruction used when none is given
pub const DEFAULT_SYSTEM_INSTRUCTION: &str =
    "You are a helpful full-stack development assistant. Keep answers concise and professional.";

/// Clamp a temperature into the range providers accept.
///
/// NaN falls back to [`DEFAULT_TEMPERATURE`].
pub fn clamp_temperature(temperature: f32) -> f32 {
    if temperature.is_nan() {
        DEFAULT_TEMPERATURE
    } else {
        temperature.clamp(MIN_TEMPERATURE, MAX_TEMPERATURE)
    }
}

/// Model, temperature and system instruction for one generation call.
///
/// Built once by the front-end and only read afterwards. The builder methods
/// consume and return the config, so a value handed to a provider can no
/// longer change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    model: String,
    #[serde(deserialize_with = "deserialize_temperature")]
    temperature: f32,
    system_instruction: String,
}

impl GenerationConfig {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            temperature: DEFAULT_TEMPERATURE,
            system_instruction: DEFAULT_SYSTEM_INSTRUCTION.to_string(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the temperature, clamped into `[0, 2]`
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = clamp_temperature(temperature);
        self
    }

    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = instruction.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    pub fn system_instruction(&self) -> &str {
        &self.system_instruction
    }
}

fn deserialize_temperature<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f32, D::Error> {
    f32::deserialize(deserializer).map(clamp_temperature)
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self::new(DEFAULT_MODEL)
    }
}
