use crate::settings::ThemeChoice;

/// Glyph set used by the renderers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Theme {
    Emoji,
    Plain,
}

#[derive(Debug)]
pub struct Glyphs {
    pub bullet: &'static str,
    pub node: &'static str,
    pub vm: &'static str,
    pub container: &'static str,
    pub storage: &'static str,
    pub snapshot: &'static str,
    pub cluster: &'static str,
    pub command: &'static str,
    pub success: &'static str,
    pub error: &'static str,
    pub info: &'static str,
    pub running: &'static str,
    pub start: &'static str,
    pub stop: &'static str,
    pub restart: &'static str,
    pub suspend: &'static str,
    pub resume: &'static str,
    pub create: &'static str,
    pub delete: &'static str,
}

static EMOJI: Glyphs = Glyphs {
    bullet: "•",
    node: "🖥️",
    vm: "🗃️",
    container: "📦",
    storage: "💾",
    snapshot: "📸",
    cluster: "🌐",
    command: "🔧",
    success: "✅",
    error: "❌",
    info: "ℹ️",
    running: "⏳",
    start: "▶️",
    stop: "⏹️",
    restart: "🔄",
    suspend: "⏸️",
    resume: "⏯️",
    create: "✨",
    delete: "🗑️",
};

static PLAIN: Glyphs = Glyphs {
    bullet: "-",
    node: "[NODE]",
    vm: "[VM]",
    container: "[CT]",
    storage: "[STORAGE]",
    snapshot: "[SNAPSHOT]",
    cluster: "[CLUSTER]",
    command: "[EXEC]",
    success: "[OK]",
    error: "[ERROR]",
    info: "[INFO]",
    running: "[RUNNING]",
    start: "[START]",
    stop: "[STOP]",
    restart: "[RESTART]",
    suspend: "[SUSPEND]",
    resume: "[RESUME]",
    create: "[CREATE]",
    delete: "[DELETE]",
};

impl Theme {
    /// Resolves `auto` against the process locale.
    pub fn resolve(choice: ThemeChoice) -> Self {
        Self::resolve_with(choice, |key| std::env::var(key).ok())
    }

    pub(crate) fn resolve_with(choice: ThemeChoice, lookup: impl Fn(&str) -> Option<String>) -> Self {
        match choice {
            ThemeChoice::Emoji => Theme::Emoji,
            ThemeChoice::Plain => Theme::Plain,
            ThemeChoice::Auto => {
                let utf8 = ["LC_ALL", "LC_CTYPE", "LANG"].iter().any(|key| {
                    lookup(key).is_some_and(|v| {
                        let v = v.to_ascii_lowercase();
                        v.contains("utf-8") || v.contains("utf8")
                    })
                });
                if utf8 {
                    Theme::Emoji
                } else {
                    Theme::Plain
                }
            }
        }
    }

    pub fn glyphs(self) -> &'static Glyphs {
        match self {
            Theme::Emoji => &EMOJI,
            Theme::Plain => &PLAIN,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auto_picks_emoji_for_utf8_locale() {
        let theme = Theme::resolve_with(ThemeChoice::Auto, |k| {
            (k == "LANG").then(|| "en_US.UTF-8".to_string())
        });
        assert_eq!(theme, Theme::Emoji);
    }

    #[test]
    fn test_auto_falls_back_to_plain() {
        assert_eq!(Theme::resolve_with(ThemeChoice::Auto, |_| None), Theme::Plain);
        assert_eq!(
            Theme::resolve_with(ThemeChoice::Auto, |_| Some("C".to_string())),
            Theme::Plain
        );
    }

    #[test]
    fn test_explicit_choice_ignores_locale() {
        assert_eq!(Theme::resolve_with(ThemeChoice::Plain, |_| Some("C.UTF-8".into())), Theme::Plain);
        assert_eq!(Theme::resolve_with(ThemeChoice::Emoji, |_| None), Theme::Emoji);
    }

    #[test]
    fn test_plain_glyphs_are_ascii() {
        let g = Theme::Plain.glyphs();
        for s in [g.bullet, g.node, g.vm, g.container, g.success, g.error, g.delete] {
            assert!(s.is_ascii(), "{}", s);
        }
    }
}
