//! Spanish prompt builders for the advice service.
//!
//! Profile fields that are zero or empty are left out. Personal prompts
//! address the patient by name; the recent-readings prompt needs no profile.

use std::fmt::Write as _;

use chrono::{FixedOffset, TimeZone};

use super::PromptError;
use crate::models::{Reading, UserProfile};

/// Persona sent as the system message of every request.
pub const SYSTEM_PERSONA: &str = "Eres Cardio-IA, un asistente de salud virtual especializado en \
cardiología. Eres amable, empático y te comunicas en español usando un lenguaje claro y sencillo. \
Nunca mencionas que eres una IA. Tu objetivo es proporcionar consejos prácticos y tranquilizadores \
basados en el perfil y las mediciones del usuario.";

/// Readings included in the recent-analysis prompt.
pub const RECENT_ANALYSIS_COUNT: usize = 3;

// ═══════════════════════════════════════════════════════════
// Builders
// ═══════════════════════════════════════════════════════════

/// Immediate advice for a reading that was just recorded (2-3 sentences).
pub fn single_reading_prompt(reading: &Reading, profile: &UserProfile) -> Result<String, PromptError> {
    let name = require_name(profile)?;

    let mut prompt = String::from("Analiza el caso del siguiente paciente: ");
    let _ = write!(prompt, "- Nombre: {name} ");
    if profile.has_age() {
        let _ = write!(prompt, "- Edad: {} años ", profile.age);
    }
    push_field(&mut prompt, "Condiciones Médicas", &profile.medical_conditions);

    let _ = write!(
        prompt,
        " El paciente acaba de registrar la siguiente medición: {}. ",
        reading_line(reading)
    );
    prompt.push_str(
        " Basado en su perfil y esta nueva lectura, dale un consejo inmediato, breve (2-3 frases), \
         y accionable. Dirígete a él por su nombre.",
    );
    Ok(prompt)
}

/// Advice over readings the patient selected, with the full profile (3-4 sentences).
pub fn selected_readings_prompt(
    readings: &[Reading],
    profile: &UserProfile,
    offset: &FixedOffset,
) -> Result<String, PromptError> {
    if readings.is_empty() {
        return Err(PromptError::NoReadings);
    }
    let name = require_name(profile)?;

    let mut prompt = String::from("Analiza el caso del siguiente paciente: ");
    let _ = write!(prompt, "- Nombre: {name} ");
    if profile.has_age() {
        let _ = write!(prompt, "- Edad: {} años ", profile.age);
    }
    push_field(&mut prompt, "Género", &profile.gender);
    if profile.has_weight() {
        let _ = write!(prompt, "- Peso: {:.1} kg ", profile.weight_kg);
    }
    if profile.has_height() {
        let _ = write!(prompt, "- Altura: {:.1} cm ", profile.height_cm);
    }
    push_field(&mut prompt, "Condiciones Médicas Declaradas", &profile.medical_conditions);
    push_field(&mut prompt, "Medicación Actual", &profile.medications);

    prompt.push_str("Estas son las mediciones de presión arterial que ha seleccionado para el análisis: ");
    for reading in readings {
        let _ = write!(
            prompt,
            "- {}. (Registrado el {}) ",
            reading_line(reading),
            format_timestamp(reading.timestamp_ms, offset)
        );
    }

    prompt.push_str(
        " Basado en todo este contexto (perfil y mediciones), actúa como su asistente de salud \
         personal. Por favor, proporciónale un consejo claro, accionable y empático. Dirígete a él \
         por su nombre. Tu respuesta debe ser concisa (máximo 3-4 frases).",
    );
    Ok(prompt)
}

/// Short analysis of the most recent readings, newest first (1-2 sentences).
pub fn recent_analysis_prompt(readings: &[Reading]) -> Result<String, PromptError> {
    if readings.is_empty() {
        return Err(PromptError::NoReadings);
    }

    let mut prompt = String::from("Analiza estas últimas mediciones de un paciente: ");
    for reading in readings.iter().take(RECENT_ANALYSIS_COUNT) {
        let _ = write!(prompt, "- {}. ", reading_line(reading));
    }
    prompt.push_str(
        " Proporciona un análisis muy breve (1 o 2 frases), empático y una recomendación práctica. \
         Usa un lenguaje sencillo.",
    );
    Ok(prompt)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn require_name(profile: &UserProfile) -> Result<&str, PromptError> {
    let name = profile.full_name.trim();
    if name.is_empty() {
        return Err(PromptError::MissingName);
    }
    Ok(name)
}

fn push_field(prompt: &mut String, label: &str, value: &str) {
    let value = value.trim();
    if !value.is_empty() {
        let _ = write!(prompt, "- {label}: {value} ");
    }
}

fn reading_line(reading: &Reading) -> String {
    format!(
        "Sistólica {}, Diastólica {}, Pulso {}",
        reading.systolic, reading.diastolic, reading.pulse
    )
}

fn format_timestamp(timestamp_ms: i64, offset: &FixedOffset) -> String {
    offset
        .timestamp_millis_opt(timestamp_ms)
        .single()
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| timestamp_ms.to_string())
}
