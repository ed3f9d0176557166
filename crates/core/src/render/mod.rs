//! Subtitle rendering.

mod cues;
mod srt;

pub use cues::{split_long_cues, split_text};
pub use srt::{format_timestamp, render_srt, RenderError};
