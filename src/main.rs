#![windows_subsystem = "windows"]
use std::io::{self, BufRead, Write};
use std::panic::{self, AssertUnwindSafe};

use tracing_subscriber::EnvFilter;

mod model;
mod protocol;
mod services;

use services::controller::Controller;
use services::speech::{NullSynthesizer, SpeechSynthesizer};
use services::translate::MyMemoryClient;

fn build_synthesizer() -> Box<dyn SpeechSynthesizer> {
    #[cfg(feature = "system-tts")]
    {
        match services::speech::SystemSynthesizer::new() {
            Ok(synth) => return Box::new(synth),
            Err(error) => tracing::warn!(%error, "system speech unavailable, running silent"),
        }
    }
    Box::new(NullSynthesizer)
}

fn main() {
    // Stdout carries protocol responses only; logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let mut controller = Controller::new(Box::new(MyMemoryClient::new()), build_synthesizer());

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(_) => continue,
        };

        if line.trim().is_empty() {
            continue;
        }

        let result =
            panic::catch_unwind(AssertUnwindSafe(|| protocol::handle(&mut controller, &line)));

        let response = match result {
            Ok(resp) => resp,
            Err(_) => serde_json::json!({
                "status": "error",
                "code": "protocol",
                "message": "internal core error"
            })
            .to_string(),
        };

        if writeln!(stdout, "{response}").is_err() {
            break;
        }

        let _ = stdout.flush();
    }
}
