//! ffmpeg-backed media operations.

mod concat;
mod faststart;

pub use concat::{
    augmented_output_path, concat_directive, loop_to_duration, repeat_count,
    MAX_REPEATS,
};
pub use faststart::{faststart_output_path, faststart_remux, FASTSTART_PREFIX};
