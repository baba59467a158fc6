//! Placeholder advice detection.
//!
//! Older builds stored setup hints such as "No hay una clave de OpenAI
//! configurada en la app." in the advice column instead of real advice.
//! Those records must be treated as missing so they get regenerated.

/// Lowercase substrings that mark a stored advice as a placeholder.
pub const SENTINELS: &[&str] = &[
    "clave de openai",
    "configura tu clave",
    "no hay una clave",
    "ingresa tu clave de openai",
];

/// True when the cached advice needs regeneration.
pub fn is_stale(text: Option<&str>) -> bool {
    let Some(text) = text else {
        return true;
    };
    if text.trim().is_empty() {
        return true;
    }
    let lowered = text.to_lowercase();
    SENTINELS.iter().any(|s| lowered.contains(s))
}
