//! gRPC-Web body framing.
//!
//! A body is a sequence of frames, each a one-byte flag followed by a
//! four-byte big-endian payload length. Flag `0x00` carries a protobuf
//! message; flag `0x80` carries trailers as `name: value` lines separated
//! by CRLF.

use std::collections::BTreeMap;

use prost::Message;
use thiserror::Error;

pub const DATA_FLAG: u8 = 0x00;
pub const TRAILER_FLAG: u8 = 0x80;
const COMPRESSED_BIT: u8 = 0x01;
const HEADER_LEN: usize = 5;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrameError {
    #[error("frame header truncated: {available} of 5 bytes")]
    TruncatedHeader { available: usize },

    #[error("frame payload truncated: expected {expected} bytes, {available} available")]
    TruncatedPayload { expected: usize, available: usize },

    #[error("compressed frames are not supported")]
    Compressed,

    #[error("more than one message frame in a unary response")]
    MultipleMessages,

    #[error("trailer frame is not valid UTF-8")]
    InvalidTrailers,
}

/// Frames found in one unary response body.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Frames {
    /// Payload of the single message frame, if any.
    pub message: Option<Vec<u8>>,
    /// Trailer names are lower-cased.
    pub trailers: BTreeMap<String, String>,
}

impl Frames {
    pub fn trailer(&self, name: &str) -> Option<&str> {
        self.trailers.get(name).map(String::as_str)
    }
}

/// Wraps one message in a data frame.
pub fn encode_message(message: &impl Message) -> Vec<u8> {
    frame(DATA_FLAG, &message.encode_to_vec())
}

/// Builds a trailer frame from `(name, value)` pairs.
pub fn encode_trailers<'a>(trailers: impl IntoIterator<Item = (&'a str, &'a str)>) -> Vec<u8> {
    let text: String = trailers
        .into_iter()
        .map(|(name, value)| format!("{name}: {value}\r\n"))
        .collect();
    frame(TRAILER_FLAG, text.as_bytes())
}

fn frame(flag: u8, payload: &[u8]) -> Vec<u8> {
    // Payloads here are single protobuf messages, far below 4 GiB.
    let len = payload.len() as u32;
    let mut buf = Vec::with_capacity(HEADER_LEN + payload.len());
    buf.push(flag);
    buf.extend_from_slice(&len.to_be_bytes());
    buf.extend_from_slice(payload);
    buf
}

/// Splits a response body into its message and trailers.
pub fn decode_frames(mut body: &[u8]) -> Result<Frames, FrameError> {
    let mut frames = Frames::default();

    while !body.is_empty() {
        if body.len() < HEADER_LEN {
            return Err(FrameError::TruncatedHeader {
                available: body.len(),
            });
        }
        let flag = body[0];
        let len = u32::from_be_bytes([body[1], body[2], body[3], body[4]]) as usize;
        let rest = &body[HEADER_LEN..];
        if rest.len() < len {
            return Err(FrameError::TruncatedPayload {
                expected: len,
                available: rest.len(),
            });
        }
        let (payload, tail) = rest.split_at(len);
        body = tail;

        if flag & COMPRESSED_BIT != 0 {
            return Err(FrameError::Compressed);
        }
        if flag & TRAILER_FLAG != 0 {
            let text = std::str::from_utf8(payload).map_err(|_| FrameError::InvalidTrailers)?;
            frames.trailers.extend(parse_trailers(text));
        } else if frames.message.replace(payload.to_vec()).is_some() {
            return Err(FrameError::MultipleMessages);
        }
    }

    Ok(frames)
}

fn parse_trailers(text: &str) -> impl Iterator<Item = (String, String)> + '_ {
    text.split("\r\n").filter_map(|line| {
        let (name, value) = line.split_once(':')?;
        Some((name.trim().to_ascii_lowercase(), value.trim().to_string()))
    })
}
