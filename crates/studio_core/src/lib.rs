//! Studio core: pure workflow state machine and view-model helpers.
mod effect;
mod msg;
mod state;
mod types;
mod update;
mod validate;
mod view_model;

pub use effect::Effect;
pub use msg::Msg;
pub use state::{AppState, CodeBuffer, PollState, DEFAULT_CODE, DEFAULT_INSTRUCTION};
pub use types::{
    DifficultyLevel, GeneratedCode, JobId, JobSnapshot, JobStatus, PromptParams, RenderAccepted,
    RenderQuality, StylePreset, TrackingId, UnknownVariant,
};
pub use update::update;
pub use validate::{
    CODE_MAX_CHARS, DURATION_MAX_SECONDS, DURATION_MIN_SECONDS, INSTRUCTIONS_MAX_CHARS,
    TOPIC_MAX_CHARS, TOPIC_MIN_CHARS,
};
pub use view_model::{AppViewModel, JobRowView};
