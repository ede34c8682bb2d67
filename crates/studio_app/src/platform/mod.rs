mod app;
mod code_file;
mod effects;
mod render;

pub use app::Session;
pub use render::Outcome;
