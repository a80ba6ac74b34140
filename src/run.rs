mod cli;

use serde::Serialize;
use serde_json::Value;
use std::process::ExitCode;

use crate::error::{LedgerError, ValidationError};

pub(crate) use cli::as_cli;

/// The single JSON document a command prints on stdout.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
enum Envelope {
    Ok { data: Value },
    Error { message: String },
}

/// Short code for known failures, the full message otherwise.
fn error_message(e: &anyhow::Error) -> String {
    e.chain()
        .find_map(|cause| {
            if let Some(err) = cause.downcast_ref::<LedgerError>() {
                Some(err.code())
            } else {
                cause.downcast_ref::<ValidationError>().map(|v| v.to_string())
            }
        })
        .unwrap_or_else(|| format!("{e:#}"))
}

fn respond(outcome: anyhow::Result<Value>) -> ExitCode {
    let (envelope, status) = match outcome {
        Ok(data) => (Envelope::Ok { data }, ExitCode::SUCCESS),
        Err(e) => {
            tracing::error!("{e:#}");
            let message = error_message(&e);
            (Envelope::Error { message }, ExitCode::FAILURE)
        }
    };
    match serde_json::to_string(&envelope) {
        Ok(text) => println!("{text}"),
        Err(e) => {
            eprintln!("Failed to encode response: {e}");
            return ExitCode::FAILURE;
        }
    }
    status
}
