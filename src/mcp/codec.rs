//! NDJSON codec for the stdio transport.
//!
//! Wraps [`tokio_util::codec::LinesCodec`] with a fixed maximum line
//! length to prevent memory exhaustion caused by unterminated or
//! maliciously large messages from a misbehaving client.

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder, LinesCodec, LinesCodecError};

use crate::errors::{AppError, Result};

/// Maximum line length accepted by the codec: 1 MiB.
///
/// Inbound lines exceeding this limit cause [`McpCodec::decode`] to return
/// [`AppError::Transport`] with `"line too long"` rather than allocating
/// unbounded memory for a single message.
pub const MAX_LINE_BYTES: usize = 1_048_576;

/// NDJSON codec for the bidirectional stdio stream.
///
/// Delegates line-framing to [`LinesCodec`] with a fixed
/// [`MAX_LINE_BYTES`] limit. Each newline-terminated (`\n`) UTF-8 string
/// is one complete protocol message.
#[derive(Debug)]
pub struct McpCodec(LinesCodec);

impl McpCodec {
    /// Create a new `McpCodec` with the default [`MAX_LINE_BYTES`] limit.
    #[must_use]
    pub fn new() -> Self {
        Self(LinesCodec::new_with_max_length(MAX_LINE_BYTES))
    }
}

impl Default for McpCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for McpCodec {
    type Item = String;
    type Error = AppError;

    /// Decode the next newline-terminated line from `src`.
    ///
    /// Returns `Ok(None)` when `src` contains no complete line yet.
    /// Returns `Err(AppError::Transport("line too long: …"))` when the
    /// line exceeds [`MAX_LINE_BYTES`]; the decoder recovers at the next
    /// newline, so one oversized line never poisons the stream.
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        self.0.decode(src).map_err(map_codec_error)
    }

    /// Decode the final line when the stream reaches EOF.
    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        self.0.decode_eof(src).map_err(map_codec_error)
    }
}

impl Encoder<String> for McpCodec {
    type Error = AppError;

    /// Encode `item` as a `\n`-terminated NDJSON line into `dst`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Io`] on underlying I/O failures.
    fn encode(&mut self, item: String, dst: &mut BytesMut) -> Result<()> {
        // LinesCodec::encode does not enforce a max line length;
        // the limit applies only to decoding.
        self.0.encode(item, dst).map_err(map_codec_error)
    }
}

// ── Private helper ────────────────────────────────────────────────────────────

/// Map a [`LinesCodecError`] to an [`AppError`].
fn map_codec_error(e: LinesCodecError) -> AppError {
    match e {
        LinesCodecError::MaxLineLengthExceeded => {
            AppError::Transport(format!("line too long: exceeded {MAX_LINE_BYTES} bytes"))
        }
        LinesCodecError::Io(io_err) => AppError::Io(io_err.to_string()),
    }
}
