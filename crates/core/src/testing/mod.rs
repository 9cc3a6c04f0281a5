//! Testing utilities and mock implementations.
//!
//! This module provides an in-memory implementation of the engine trait,
//! allowing detection, conversion and HTTP tests without an ffmpeg binary.
//!
//! # Example
//!
//! ```rust,ignore
//! use transmute_core::testing::{fixtures, MockEngine};
//!
//! let engine = Arc::new(MockEngine::new());
//! engine.set_exec_logs(["Stream #0:0: Audio: mp3, 44100 Hz, stereo"]).await;
//!
//! let record = fixtures::file_record("song.wav", b"RIFF");
//! ```

mod mock_engine;

pub use mock_engine::MockEngine;

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::files::FileRecord;

    /// Typical probe output for a single-frame PNG.
    pub const PNG_PROBE_LOG: &[&str] = &[
        "Input #0, png_pipe, from 'image.png':",
        "  Duration: N/A, bitrate: N/A",
        "  Stream #0:0: Video: png, rgba(pc), 100x100, 25 fps, 25 tbr, 25 tbn",
    ];

    /// Typical probe output for a QuickTime clip with audio.
    pub const MOV_PROBE_LOG: &[&str] = &[
        "Input #0, mov,mp4,m4a,3gp,3g2,mj2, from 'clip.mov':",
        "  Duration: 00:00:10.00, start: 0.000000, bitrate: 1205 kb/s",
        "  Stream #0:0[0x1](und): Video: h264 (High) (avc1 / 0x31637661), yuv420p, 1280x720, 1000 kb/s",
        "  Stream #0:1[0x2](und): Audio: aac (LC) (mp4a / 0x6134706D), 44100 Hz, stereo, fltp, 128 kb/s",
    ];

    /// Create a file record with the default display-name limit.
    pub fn file_record(name: &str, data: &[u8]) -> FileRecord {
        FileRecord::new(name, data.to_vec(), 32)
    }
}
