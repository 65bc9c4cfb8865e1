//! Payload encoding per payload mode

use reqwest::multipart::{Form, Part};
use serde_json::{Map, Value};
use std::path::Path;

use super::DispatchFailure;
use crate::common::paths::resolve_relative;

/// Text form of a payload value: strings verbatim, everything else as
/// compact JSON
pub(super) fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Key/value pairs for query strings and form bodies
pub(super) fn pairs(payload: &Map<String, Value>) -> Vec<(String, String)> {
    payload
        .iter()
        .map(|(k, v)| (k.clone(), value_text(v)))
        .collect()
}

/// Multipart upload; string values name files relative to `base_dir`
pub(super) async fn multipart(
    payload: &Map<String, Value>,
    base_dir: Option<&Path>,
) -> Result<Form, DispatchFailure> {
    let mut form = Form::new();

    for (name, value) in payload {
        let Value::String(path) = value else {
            form = form.text(name.clone(), value_text(value));
            continue;
        };

        let file_path = resolve_relative(Path::new(path), base_dir);
        let content = tokio::fs::read(&file_path)
            .await
            .map_err(|e| DispatchFailure::PayloadBuild {
                message: format!("{}: {}", file_path.display(), e),
            })?;

        let filename = file_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("file")
            .to_string();
        let mime_type = mime_guess::from_path(&file_path)
            .first_or_octet_stream()
            .to_string();

        let part = Part::bytes(content)
            .file_name(filename)
            .mime_str(&mime_type)
            .map_err(|e| DispatchFailure::PayloadBuild {
                message: format!("Invalid MIME type: {}", e),
            })?;

        form = form.part(name.clone(), part);
    }

    Ok(form)
}
