use serde::{Deserialize, Serialize};

/// Patient context supplied by the caller when asking for advice.
///
/// Zero or empty fields mean "not provided" and are left out of prompts.
/// Nothing here is validated or persisted by the engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub full_name: String,
    pub age: u32,
    pub gender: String,
    /// Centimetres.
    pub height_cm: f32,
    /// Kilograms.
    pub weight_kg: f32,
    pub medical_conditions: String,
    pub medications: String,
    pub doctor_name: String,
    pub emergency_contact: String,
}

impl UserProfile {
    pub fn named(full_name: &str) -> Self {
        Self {
            full_name: full_name.to_string(),
            ..Self::default()
        }
    }

    pub fn has_age(&self) -> bool {
        self.age > 0
    }

    pub fn has_height(&self) -> bool {
        self.height_cm > 0.0
    }

    pub fn has_weight(&self) -> bool {
        self.weight_kg > 0.0
    }
}
