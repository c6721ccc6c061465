pub mod predict;
pub mod model_files;
