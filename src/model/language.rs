use serde::Serialize;

/// One entry of the fixed language table shown in both selectors.
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
pub struct Language {
    pub name: &'static str,
    pub code: &'static str,
}

/// Supported languages. Populates both the source and the target selector;
/// never changes at runtime.
pub const LANGUAGES: &[Language] = &[
    Language { name: "Español (España)", code: "es-ES" },
    Language { name: "Inglés (US)", code: "en-US" },
    Language { name: "Francés", code: "fr-FR" },
    Language { name: "Alemán", code: "de-DE" },
    Language { name: "Italiano", code: "it-IT" },
    Language { name: "Portugués", code: "pt-BR" },
];

pub const DEFAULT_SOURCE: &str = "es-ES";
pub const DEFAULT_TARGET: &str = "en-US";

pub fn find(code: &str) -> Option<&'static Language> {
    LANGUAGES.iter().find(|l| l.code == code)
}

/// Which side of the language pair a selection applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LanguageRole {
    Source,
    Target,
}

impl LanguageRole {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "source" => Some(LanguageRole::Source),
            "target" => Some(LanguageRole::Target),
            _ => None,
        }
    }
}
