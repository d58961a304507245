use scaffold_core::ParseError;
use scaffold_exec::EngineError;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

pub fn print_result<T: Serialize>(format: OutputFormat, quiet: bool, result: &T) {
    if quiet {
        return;
    }
    let json = match format {
        OutputFormat::Text => serde_json::to_string_pretty(result),
        OutputFormat::Json => serde_json::to_string(result),
    };
    if let Ok(json) = json {
        println!("{json}");
    }
}

pub fn print_error(format: OutputFormat, quiet: bool, message: &str) {
    if quiet {
        return;
    }
    match format {
        OutputFormat::Text => eprintln!("error: {message}"),
        OutputFormat::Json => {
            let err = serde_json::json!({"error": message});
            eprintln!("{}", serde_json::to_string(&err).unwrap_or_default());
        }
    }
}

/// One line per validation violation carried by `err`.
pub fn error_details(err: &EngineError) -> Vec<String> {
    match err {
        EngineError::Validation(v)
        | EngineError::Parse {
            source: ParseError::StepShape(v),
            ..
        } => v.messages(),
        _ => Vec::new(),
    }
}

pub fn print_engine_error(format: OutputFormat, quiet: bool, err: &EngineError) {
    let details = error_details(err);
    if quiet {
        return;
    }
    match format {
        OutputFormat::Text => {
            eprintln!("error: {err}");
            for d in &details {
                eprintln!("- {d}");
            }
        }
        OutputFormat::Json => {
            let mut body = serde_json::json!({"error": err.to_string()});
            if !details.is_empty() {
                body["violations"] = serde_json::json!(details);
            }
            eprintln!("{}", serde_json::to_string(&body).unwrap_or_default());
        }
    }
}
