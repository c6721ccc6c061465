use std::io::Cursor;
use tiny_http::Response;
use tracing::info;

use crate::render::render_page;
use crate::state::{SharedState, ViewerState, DUMMY_INPUT};

/// `GET /`
pub fn handle_get(state: SharedState) -> Response<Cursor<Vec<u8>>> {
    let st = state.lock().unwrap();
    crate::routes::html_response(page(&st, ""))
}

/// `POST /predict` — runs the model on the fixed input and shows the result.
pub fn handle_predict(state: SharedState) -> Response<Cursor<Vec<u8>>> {
    let mut st = state.lock().unwrap();
    let prediction = match st.predict_dummy() {
        Ok(probabilities) => {
            let text = format_prediction(&probabilities);
            info!(input = ?DUMMY_INPUT, output = ?probabilities, "prediction");
            text
        }
        Err(reason) => reason,
    };
    crate::routes::html_response(page(&st, &prediction))
}

/// `POST /reload` — re-reads the model directory, then back to the page.
pub fn handle_reload(state: SharedState) -> Response<Cursor<Vec<u8>>> {
    let mut st = state.lock().unwrap();
    st.reload();
    info!(status = %st.status_line(), "model reloaded");
    crate::routes::redirect("/")
}

fn page(st: &ViewerState, prediction: &str) -> String {
    let input = DUMMY_INPUT.iter().map(|x| x.to_string()).collect::<Vec<_>>().join(", ");
    render_page(&st.status_line(), &input, prediction)
}

pub fn format_prediction(probabilities: &[f64]) -> String {
    let joined = probabilities.iter().map(|p| format!("{:.6}", p)).collect::<Vec<_>>().join(", ");
    format!("Prediction: {}", joined)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_prediction() {
        assert_eq!(format_prediction(&[0.25, 0.5, 0.25]), "Prediction: 0.250000, 0.500000, 0.250000");
    }
}
