//! Redub - automated video dubbing
//!
//! Transcribes a short video, translates the transcript, voices it with a
//! neural text-to-speech engine and muxes the new speech back into the video,
//! optionally regenerating lip movement.

pub mod cli;
pub mod command;
pub mod config;
pub mod error;
pub mod language;
pub mod lipsync;
pub mod media;
pub mod run;
pub mod server;
pub mod setup;
pub mod synthesize;
pub mod transcribe;
pub mod translate;
pub mod workflow;
