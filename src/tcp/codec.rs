use bytes::BytesMut;
use std::io;
use tokio_util::codec::{Decoder, Encoder, LinesCodec, LinesCodecError};

/// One inbound line, or notice that a line was skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Line(String),
    /// Longer than the configured limit
    Oversized,
    /// Not valid UTF-8
    Malformed,
}

/// Newline delimited frames with a length cap.
///
/// Unlike a bare [`LinesCodec`], an overlong line does not end the stream: it
/// is reported as [`Frame::Oversized`], discarded up to its newline, and
/// decoding resumes with the next line. A line that is not UTF-8 has already
/// been consumed when the check fails, so it is reported as
/// [`Frame::Malformed`] and the stream carries on as well.
#[derive(Debug, Clone)]
pub struct FrameCodec {
    lines: LinesCodec,
}

impl FrameCodec {
    pub fn new(max_len: usize) -> Self {
        FrameCodec {
            lines: LinesCodec::new_with_max_length(max_len),
        }
    }
}

impl Decoder for FrameCodec {
    type Item = Frame;
    type Error = LinesCodecError;

    fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<Frame>, LinesCodecError> {
        lift(self.lines.decode(buf))
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<Frame>, LinesCodecError> {
        lift(self.lines.decode_eof(buf))
    }
}

impl<T: AsRef<str>> Encoder<T> for FrameCodec {
    type Error = LinesCodecError;

    fn encode(&mut self, line: T, buf: &mut BytesMut) -> Result<(), LinesCodecError> {
        self.lines.encode(line, buf)
    }
}

fn lift(
    decoded: Result<Option<String>, LinesCodecError>,
) -> Result<Option<Frame>, LinesCodecError> {
    match decoded {
        Ok(line) => Ok(line.map(Frame::Line)),
        Err(LinesCodecError::MaxLineLengthExceeded) => Ok(Some(Frame::Oversized)),
        Err(LinesCodecError::Io(e)) if e.kind() == io::ErrorKind::InvalidData => {
            Ok(Some(Frame::Malformed))
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_lines_and_waits_for_the_rest() {
        let mut codec = FrameCodec::new(64);
        let mut buf = BytesMut::from("{\"a\":1}\r\n{\"b\":");
        assert_eq!(
            codec.decode(&mut buf).unwrap(),
            Some(Frame::Line("{\"a\":1}".to_string()))
        );
        assert_eq!(codec.decode(&mut buf).unwrap(), None);

        buf.extend_from_slice(b"2}\n");
        assert_eq!(
            codec.decode(&mut buf).unwrap(),
            Some(Frame::Line("{\"b\":2}".to_string()))
        );
    }

    #[test]
    fn oversized_line_is_skipped() {
        let mut codec = FrameCodec::new(8);
        let mut buf = BytesMut::from("0123456789abcdef\n{\"a\":1}\n");
        assert_eq!(codec.decode(&mut buf).unwrap(), Some(Frame::Oversized));
        assert_eq!(
            codec.decode(&mut buf).unwrap(),
            Some(Frame::Line("{\"a\":1}".to_string()))
        );
        assert_eq!(codec.decode(&mut buf).unwrap(), None);
    }

    #[test]
    fn invalid_utf8_line_is_skipped() {
        let mut codec = FrameCodec::new(64);
        let mut buf = BytesMut::from(&b"{\"player_name\":\"\xff\xfe\"}\n{\"a\":1}\n"[..]);
        assert_eq!(codec.decode(&mut buf).unwrap(), Some(Frame::Malformed));
        assert_eq!(
            codec.decode(&mut buf).unwrap(),
            Some(Frame::Line("{\"a\":1}".to_string()))
        );
    }

    #[test]
    fn encodes_with_trailing_newline() {
        let mut codec = FrameCodec::new(8);
        let mut buf = BytesMut::new();
        codec.encode("{\"type\":\"error\"}", &mut buf).unwrap();
        assert_eq!(&buf[..], b"{\"type\":\"error\"}\n");
    }
}
