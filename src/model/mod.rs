pub mod language;
pub mod session;
