use std::io::Cursor;
use tiny_http::{Header, Method, Request, Response, StatusCode};
use tracing::debug;

use crate::state::SharedState;
use crate::handlers;

// ---------------------------------------------------------------------------
// Response helpers
// ---------------------------------------------------------------------------

pub fn html_response(body: String) -> Response<Cursor<Vec<u8>>> {
    bytes_response(body.into_bytes(), "text/html; charset=utf-8")
}

pub fn bytes_response(bytes: Vec<u8>, content_type: &str) -> Response<Cursor<Vec<u8>>> {
    let len = bytes.len();
    Response::new(
        StatusCode(200),
        vec![Header::from_bytes(b"Content-Type", content_type.as_bytes()).unwrap()],
        Cursor::new(bytes),
        Some(len),
        None,
    )
}

pub fn redirect(location: &str) -> Response<Cursor<Vec<u8>>> {
    Response::new(
        StatusCode(303),
        vec![
            Header::from_bytes(b"Location", location.as_bytes()).unwrap(),
            Header::from_bytes(b"Content-Length", b"0").unwrap(),
        ],
        Cursor::new(Vec::new()),
        Some(0),
        None,
    )
}

pub fn not_found() -> Response<Cursor<Vec<u8>>> {
    let body = b"404 Not Found".to_vec();
    let len = body.len();
    Response::new(
        StatusCode(404),
        vec![Header::from_bytes(b"Content-Type", b"text/plain").unwrap()],
        Cursor::new(body),
        Some(len),
        None,
    )
}

// ---------------------------------------------------------------------------
// Request dispatcher
// ---------------------------------------------------------------------------

pub fn dispatch(request: Request, state: SharedState) {
    let method = request.method().clone();
    let url    = request.url().to_owned();
    let path   = url.split('?').next().unwrap_or("").to_owned();

    debug!(%method, %path, "request");

    // Model files — dynamic path segment.
    if method == Method::Get {
        if let Some(file) = path.strip_prefix("/model/") {
            let resp = handlers::model_files::handle_get(file, state);
            let _ = request.respond(resp);
            return;
        }
    }

    let response = match (method, path.as_str()) {
        (Method::Get,  "/")        => handlers::predict::handle_get(state),
        (Method::Post, "/predict") => handlers::predict::handle_predict(state),
        (Method::Post, "/reload")  => handlers::predict::handle_reload(state),
        _ => not_found(),
    };

    let _ = request.respond(response);
}
