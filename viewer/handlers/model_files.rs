use std::io::Cursor;
use tiny_http::Response;

use crate::state::SharedState;

/// `GET /model/{file}`
///
/// Serves `model.json` and the weight shards from the model directory so a
/// TF.js client can load the model over HTTP.
pub fn handle_get(file: &str, state: SharedState) -> Response<Cursor<Vec<u8>>> {
    if !is_plain_file_name(file) {
        return crate::routes::not_found();
    }

    let path = state.lock().unwrap().model_dir.join(file);
    match std::fs::read(&path) {
        Ok(bytes) => crate::routes::bytes_response(bytes, content_type(file)),
        Err(_) => crate::routes::not_found(),
    }
}

/// Rejects empty names and path traversal attempts.
fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty() && !name.contains('/') && !name.contains('\\') && !name.contains("..")
}

fn content_type(file: &str) -> &'static str {
    if file.ends_with(".json") {
        "application/json"
    } else {
        "application/octet-stream"
    }
}
