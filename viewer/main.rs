/// ferrite-tfjs viewer
///
/// Serves the exported `model/` directory and a one-button page that runs the
/// loaded model on a fixed input, mirroring what a TensorFlow.js page would do
/// with `tf.loadLayersModel("model/model.json")`.
///
/// Run with:
///   cargo run --bin viewer
/// Then open http://127.0.0.1:7878
///
/// Routes:
///   GET  /              — page with the "Make Prediction" button
///   POST /predict       — predict on [0.1, 0.2, 0.3, 0.4]
///   POST /reload        — re-read the model from disk
///   GET  /model/{file}  — raw model.json / weight shards for TF.js clients

mod state;
mod render;
mod routes;
mod handlers;

use std::sync::{Arc, Mutex};
use tiny_http::Server;
use tracing::{error, info};

use state::ViewerState;

fn main() {
    tracing_subscriber::fmt().compact().init();

    let addr = "127.0.0.1:7878";
    let server = match Server::http(addr) {
        Ok(server) => server,
        Err(e) => {
            error!(%addr, error = %e, "failed to bind HTTP server");
            std::process::exit(1);
        }
    };

    let state = ViewerState::load("model");
    match &state.load_error {
        None => info!(dir = %state.model_dir.display(), "model loaded successfully"),
        Some(reason) => error!(dir = %state.model_dir.display(), %reason, "model not loaded"),
    }
    let shared_state = Arc::new(Mutex::new(state));

    info!("open http://{} in your browser", addr);

    // One thread per request so a slow client does not stall the others.
    for request in server.incoming_requests() {
        let state_clone = shared_state.clone();
        std::thread::spawn(move || {
            routes::dispatch(request, state_clone);
        });
    }
}
