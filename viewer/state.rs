use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use ferrite_tfjs::{load_layers_model, LoadedModel};

/// The input the demo page predicts on, shape (1, 4).
pub const DUMMY_INPUT: [f64; 4] = [0.1, 0.2, 0.3, 0.4];

pub struct ViewerState {
    pub model_dir: PathBuf,
    /// `None` until a model has been loaded successfully.
    pub model: Option<LoadedModel>,
    /// Why the last load attempt failed, if it did.
    pub load_error: Option<String>,
}

pub type SharedState = Arc<Mutex<ViewerState>>;

impl ViewerState {
    pub fn load(model_dir: impl Into<PathBuf>) -> ViewerState {
        let mut state = ViewerState {
            model_dir: model_dir.into(),
            model: None,
            load_error: None,
        };
        state.reload();
        state
    }

    /// Re-reads the model directory; keeps the previous model if loading fails.
    pub fn reload(&mut self) {
        match load_layers_model(&self.model_dir) {
            Ok(model) => {
                self.model = Some(model);
                self.load_error = None;
            }
            Err(e) => self.load_error = Some(e.to_string()),
        }
    }

    /// Runs the loaded model on `DUMMY_INPUT`.
    pub fn predict_dummy(&mut self) -> Result<Vec<f64>, String> {
        let model = self.model.as_mut().ok_or_else(|| "Model is not loaded yet!".to_owned())?;
        model.network.predict(&DUMMY_INPUT).map_err(|e| e.to_string())
    }

    pub fn status_line(&self) -> String {
        match (&self.model, &self.load_error) {
            (Some(_), None) => "Model Loaded Successfully!".to_owned(),
            (Some(_), Some(reason)) => format!("Reload failed ({}); serving the previous model.", reason),
            (None, Some(reason)) => format!("Model not loaded: {}", reason),
            (None, None) => "Model not loaded.".to_owned(),
        }
    }
}
