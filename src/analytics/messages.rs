/// Notification texts. Patient-facing, Spanish, calm framing.
pub struct MessageTemplates;

impl MessageTemplates {
    pub const ALERT_TITLE: &'static str = "⚠️ Alerta CardioCheck";
    pub const GAP_TITLE: &'static str = "Te extrañamos en CardioCheck";
    pub const TIP_TITLE: &'static str = "Consejo de CardioCheck";
    pub const SMART_REMINDER_TITLE: &'static str = "🧠 CardioCheck Inteligente";

    pub fn rising_trend() -> String {
        "Hemos notado que tu presión arterial ha aumentado en los últimos días. \
         Considera consultar con tu médico."
            .to_string()
    }

    pub fn consistently_high() -> String {
        "Tus últimas mediciones muestran valores elevados de forma consistente. \
         Es recomendable contactar a tu médico."
            .to_string()
    }

    pub fn high_variability() -> String {
        "Tus mediciones muestran gran variabilidad. \
         Esto podría indicar estrés o necesidad de ajustar medicación."
            .to_string()
    }

    pub fn measurement_gap(days: i64) -> String {
        format!(
            "Han pasado {days} días desde tu última medición. \
             Tu salud cardiovascular es importante."
        )
    }

    pub fn schedule_tip() -> String {
        "Para mejores resultados, trata de medir tu presión arterial a la misma hora cada día, \
         preferiblemente por la mañana."
            .to_string()
    }

    pub fn reminder_suggestion(hour: u32) -> String {
        format!(
            "He notado que sueles medirte a las {hour}:00. \
             ¿Te parece un buen horario para recordatorios?"
        )
    }
}
