#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Ping,
    LanguagesList,
    SessionState,
    SessionSetText,
    SessionSelectLanguage,
    Translate,
    Speak,
    SpeakStop,
    Unknown,
}

impl From<&str> for Command {
    fn from(s: &str) -> Self {
        match s {
            "ping" => Command::Ping,
            "languages.list" => Command::LanguagesList,
            "session.state" => Command::SessionState,
            "session.set_text" => Command::SessionSetText,
            "session.select_language" => Command::SessionSelectLanguage,
            "translate" => Command::Translate,
            "speak" => Command::Speak,
            "speak.stop" => Command::SpeakStop,
            _ => Command::Unknown,
        }
    }
}
