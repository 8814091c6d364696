use serde_json::{json, Value};

use crate::model::language::{self, LanguageRole};
use crate::services::controller::{Controller, CoreError};

mod command;
use command::Command;

fn get_cmd(req: &Value) -> &str {
    req.get("cmd").and_then(|v| v.as_str()).unwrap_or("")
}

fn get_id(req: &Value) -> Value {
    req.get("id").cloned().unwrap_or(Value::Null)
}

fn get_payload(req: &Value) -> &Value {
    static EMPTY: Value = Value::Null;
    req.get("payload").unwrap_or(&EMPTY)
}

fn ok(id: Value, payload: Value) -> String {
    json!({
        "id": id,
        "status": "ok",
        "payload": payload
    })
    .to_string()
}

fn err(id: Value, code: &str, message: impl Into<String>) -> String {
    json!({
        "id": id,
        "status": "error",
        "code": code,
        "message": message.into()
    })
    .to_string()
}

fn error_code(error: &CoreError) -> &'static str {
    match error {
        CoreError::EmptyInput | CoreError::UnknownLanguage(_) => "validation",
        CoreError::Busy => "busy",
        CoreError::TranslationFailed => "translation_failed",
    }
}

pub fn handle(controller: &mut Controller, input: &str) -> String {
    let req: Value = match serde_json::from_str(input) {
        Ok(v) => v,
        Err(_) => {
            return json!({
                "status": "error",
                "code": "protocol",
                "message": "invalid json"
            })
            .to_string();
        }
    };

    let id = get_id(&req);
    let payload = get_payload(&req).clone();

    match Command::from(get_cmd(&req)) {
        Command::Ping => ok(id, json!({ "message": "voztrad-core alive" })),

        Command::LanguagesList => ok(id, json!({ "languages": language::LANGUAGES })),

        Command::SessionState => ok(id, json!({ "state": controller.state() })),

        Command::SessionSetText => {
            let text = payload.get("text").and_then(|v| v.as_str()).unwrap_or("");
            controller.set_text(text);
            ok(id, json!({ "state": controller.state() }))
        }

        Command::SessionSelectLanguage => {
            let role_str = payload.get("role").and_then(|v| v.as_str()).unwrap_or("");
            let code = payload.get("code").and_then(|v| v.as_str()).unwrap_or("");

            let Some(role) = LanguageRole::parse(role_str) else {
                return err(id, "validation", format!("unknown language role: {role_str:?}"));
            };
            if code.is_empty() {
                return err(id, "validation", "payload.code is required");
            }

            match controller.select_language(role, code) {
                Ok(()) => ok(id, json!({ "state": controller.state() })),
                Err(e) => err(id, error_code(&e), e.to_string()),
            }
        }

        Command::Translate => match controller.submit_translation() {
            Ok(translated) => ok(
                id,
                json!({ "translated_text": translated, "state": controller.state() }),
            ),
            Err(e) => err(id, error_code(&e), e.to_string()),
        },

        Command::Speak => {
            // Speech failures are logged inside the controller, never
            // surfaced to the view.
            let text = payload.get("text").and_then(|v| v.as_str());
            controller.speak(text);
            ok(id, json!({ "state": controller.state() }))
        }

        Command::SpeakStop => {
            controller.stop_speaking();
            ok(id, json!({ "state": controller.state() }))
        }

        Command::Unknown => err(id, "protocol", "unknown command"),
    }
}
