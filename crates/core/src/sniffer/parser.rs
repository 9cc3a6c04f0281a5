//! Log line parsers for format detection.

use once_cell::sync::Lazy;
use regex_lite::Regex;

/// Extracts a format name from one engine log line.
pub trait LogFormatParser: Send + Sync {
    /// Returns the lower-cased format name reported by `line`, if any.
    fn parse_line(&self, line: &str) -> Option<String>;
}

static STREAM_RE: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"(?i)Stream #\d+:\d+.*: (\w+),").ok());

/// Matches stream description lines such as
/// `Stream #0:0: Video: png, rgba(pc), 100x100`.
///
/// The capture is the last `: <word>,` on the line, which for ffmpeg's
/// stream lines is the codec. Codecs followed by a parenthesized profile
/// (`h264 (High)`) do not match.
#[derive(Debug, Default, Clone, Copy)]
pub struct StreamInfoParser;

impl LogFormatParser for StreamInfoParser {
    fn parse_line(&self, line: &str) -> Option<String> {
        let caps = STREAM_RE.as_ref()?.captures(line)?;
        Some(caps.get(1)?.as_str().to_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_image_stream() {
        let parser = StreamInfoParser;
        assert_eq!(
            parser.parse_line("  Stream #0:0: Video: png, rgba(pc), 100x100, 25 fps"),
            Some("png".to_string())
        );
    }

    #[test]
    fn test_parses_audio_stream_case_insensitive() {
        let parser = StreamInfoParser;
        assert_eq!(
            parser.parse_line("STREAM #0:0: Audio: MP3, 44100 Hz, stereo, fltp, 128 kb/s"),
            Some("mp3".to_string())
        );
    }

    #[test]
    fn test_ignores_non_stream_lines() {
        let parser = StreamInfoParser;
        assert_eq!(parser.parse_line("Input #0, png_pipe, from 'a.png':"), None);
        assert_eq!(parser.parse_line("  Duration: N/A, bitrate: N/A"), None);
        assert_eq!(
            parser.parse_line("At least one output file must be specified"),
            None
        );
    }

    #[test]
    fn test_profile_suffix_does_not_match() {
        let parser = StreamInfoParser;
        assert_eq!(
            parser.parse_line(
                "  Stream #0:0[0x1](und): Video: h264 (High) (avc1 / 0x31637661), yuv420p, 1280x720"
            ),
            None
        );
    }
}
