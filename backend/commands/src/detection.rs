/// Free-text normalization: map what the user typed or tapped to a
/// canonical command token.
///
/// Interactive menu taps arrive as the row title, sometimes with the row
/// description on a second line and usually with a leading emoji, so the
/// lookup falls back from exact match to substring match to the
/// emoji-stripped first line.
use once_cell::sync::Lazy;
use regex::Regex;

use crate::registry::{CommandRegistry, DEFAULT_REGISTRY};
use crate::types::Command;

static EMOJI_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        "[",
        r"\x{1F600}-\x{1F64F}",
        r"\x{1F300}-\x{1F5FF}",
        r"\x{1F680}-\x{1F6FF}",
        r"\x{1F1E0}-\x{1F1FF}",
        r"\x{2600}-\x{26FF}",
        r"\x{2700}-\x{27BF}",
        r"\x{1F900}-\x{1F9FF}",
        r"\x{2B00}-\x{2BFF}",
        r"\x{FE0F}",
        r"\x{200D}",
        "]",
    ))
    .unwrap()
});

/// Remove pictographs, flags, variation selectors and joiners.
pub fn strip_emoji(text: &str) -> String {
    EMOJI_RE.replace_all(text, "").into_owned()
}

/// Normalize `raw` with the builtin phrase table.
pub fn normalize(raw: &str) -> String {
    DEFAULT_REGISTRY.normalize(raw)
}

/// Canonical command for `raw`, if the normalized token is one.
pub fn detect_command(raw: &str) -> Option<Command> {
    normalize(raw).parse().ok()
}

/// Command named by the whole message or by its emoji-stripped first line.
/// Unlike [`detect_command`] a phrase buried in a sentence does not count.
pub fn detect_exact(raw: &str) -> Option<Command> {
    DEFAULT_REGISTRY.find_whole(raw)
}

/// Whether `text` selects one of `phrases`, by token or by substring of the
/// raw or emoji-stripped text.
pub fn is_menu_command(text: &str, phrases: &[&str]) -> bool {
    let token = normalize(text);
    if phrases.iter().any(|p| p.to_lowercase() == token) {
        return true;
    }

    let lower = text.to_lowercase();
    let lower = lower.trim();
    let stripped = strip_emoji(lower);
    phrases.iter().any(|p| {
        let p = p.to_lowercase();
        !p.is_empty() && (lower.contains(&p) || stripped.contains(&p))
    })
}

/// Case-insensitive check for any keyword inside `text`.
pub fn contains_keywords(text: &str, keywords: &[&str]) -> bool {
    let lower = text.to_lowercase();
    keywords
        .iter()
        .any(|k| !k.is_empty() && lower.contains(&k.to_lowercase()))
}

impl CommandRegistry {
    /// Lowercase and trim `raw`, then resolve it:
    ///
    /// 1. exact phrase
    /// 2. first phrase (table order) contained in the text
    /// 3. first phrase contained in the emoji-stripped first line
    ///
    /// Unmapped text comes back lowercased and trimmed. Text made only of
    /// emoji normalizes to the empty string.
    pub fn normalize(&self, raw: &str) -> String {
        let normalized = raw.to_lowercase().trim().to_string();
        if normalized.is_empty() {
            return normalized;
        }

        if let Some(cmd) = self.find_exact(&normalized) {
            return cmd.as_str().to_string();
        }
        if let Some(cmd) = self.find_contained(&normalized) {
            return cmd.as_str().to_string();
        }

        let stripped = strip_emoji(&normalized);
        let title = stripped.lines().next().unwrap_or("").trim();
        if !title.is_empty() {
            if let Some(cmd) = self.find_contained(title) {
                return cmd.as_str().to_string();
            }
        }
        if stripped.trim().is_empty() {
            return String::new();
        }

        normalized
    }

    /// Exact lookup of the whole text, then of its emoji-stripped title.
    pub fn find_whole(&self, raw: &str) -> Option<Command> {
        let normalized = raw.to_lowercase();
        let normalized = normalized.trim();
        if normalized.is_empty() {
            return None;
        }
        if let Some(cmd) = self.find_exact(normalized) {
            return Some(cmd);
        }
        let stripped = strip_emoji(normalized);
        let title = stripped.lines().next().unwrap_or("").trim();
        if title.is_empty() {
            return None;
        }
        self.find_exact(title)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn menu_row_with_description_maps_to_ping() {
        assert_eq!(
            normalize("📡 Test de Conexión\nVerificar estado de tu conexión"),
            "ping"
        );
    }

    #[test]
    fn canonical_tokens_are_fixed_points() {
        for cmd in Command::ALL {
            let once = normalize(cmd.as_str());
            assert_eq!(once, cmd.as_str());
            assert_eq!(normalize(&once), once);
        }
    }

    #[test]
    fn unmapped_text_is_lowercased_and_trimmed() {
        assert_eq!(normalize("  Hola, Buenas Tardes  "), "hola, buenas tardes");
        assert_eq!(normalize("Juan Pérez"), "juan pérez");
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("   "), "");
    }

    #[test]
    fn pure_emoji_is_empty() {
        assert_eq!(normalize("👍"), "");
        assert_eq!(normalize("🔥🔥\n✅"), "");
    }

    #[test]
    fn menu_titles_and_synonyms() {
        assert_eq!(normalize("🔧 Soporte Técnico"), "ticket");
        assert_eq!(normalize("Soporte tecnico"), "ticket");
        assert_eq!(normalize("💳 Validar Pago"), "validar_pago");
        assert_eq!(normalize("⬆️ Mejorar Plan"), "mejorar_plan");
        assert_eq!(normalize("Menú"), "menu");
        assert_eq!(normalize("volver"), "menu");
        assert_eq!(normalize("Inicio"), "inicio");
        assert_eq!(normalize("salir"), "finalizar");
        assert_eq!(normalize("quiero hablar con agente"), "hablar_agente");
    }

    #[test]
    fn emoji_title_falls_back_to_first_line() {
        // the emoji sits between words so only the stripped title matches
        assert_eq!(normalize("Puntos 📍de pago"), "puntos_pago");
        assert_eq!(normalize("saldo 💰pendiente\nal día"), "deuda");
        // nothing on the stripped title matches either
        assert_eq!(normalize("buenas 👋noches"), "buenas 👋noches");
    }

    #[test]
    fn detect_command_parses_tokens() {
        assert_eq!(detect_command("📡 Test de Conexión"), Some(Command::Ping));
        assert_eq!(detect_command("quiero contratar"), None);
    }

    #[test]
    fn exact_detection_ignores_buried_phrases() {
        assert_eq!(detect_exact("Menú"), Some(Command::Menu));
        assert_eq!(detect_exact("  INICIO "), Some(Command::Inicio));
        assert_eq!(detect_exact("🏠 Menú principal\nVolver al inicio"), Some(Command::Menu));
        assert_eq!(detect_exact("No tengo internet desde el inicio de la semana"), None);
        assert_eq!(detect_exact("quiero salir de este plan"), None);
        assert_eq!(detect_exact("👍"), None);
    }

    #[test]
    fn menu_command_matching() {
        assert!(is_menu_command("📡 Test de Conexión", &["ping"]));
        assert!(is_menu_command("crear_ticket", &["crear_ticket", "ticket_creation"]));
        assert!(!is_menu_command("🔧 Soporte Técnico", &["crear_ticket", "ticket_creation"]));
        assert!(is_menu_command("Quiero ver PUNTOS DE PAGO", &["puntos de pago"]));
    }

    #[test]
    fn keyword_search_ignores_case() {
        assert!(contains_keywords("Quiero CONTRATAR el plan", &["contratar"]));
        assert!(!contains_keywords("hola", &["contratar", ""]));
    }
}
