//! Trains the demo classifier on random data and writes it to `./model` as a
//! TensorFlow.js layers model.  Takes no arguments.
//!
//! Run with:
//!   cargo run --release
//! then serve the result with:
//!   cargo run --bin viewer

use std::error::Error;

use ferrite_tfjs::{run, DemoConfig};
use tracing::info;

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt().compact().init();

    let summary = run(&DemoConfig::default())?;

    if let Some(last) = summary.history.last() {
        info!(epochs = summary.history.len(), loss = last.loss, "training finished");
    }
    println!("Saved TF.js model to {}", summary.artifacts.model_json.display());
    Ok(())
}
