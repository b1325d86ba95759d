pub mod recording;
pub mod text;
