//
// Copyright 2017-2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! Line codec for the relay protocol

use bytes::BytesMut;
use std::io;
use tokio_util::codec::{Decoder, Encoder, LinesCodec, LinesCodecError};

/// One decoded inbound frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundLine {
    /// A complete line, without its terminator
    Line(String),
    /// A line longer than the limit; its bytes are discarded
    Overflow,
    /// A line that is not valid UTF-8; its bytes are discarded
    Invalid,
}

/// Newline-delimited text codec with a per-line length limit
///
/// Wraps [`LinesCodec`] so that an over-long line surfaces as
/// [`InboundLine::Overflow`] and a line of invalid UTF-8 as
/// [`InboundLine::Invalid`] instead of a decoder error. A decoder error would
/// end the framed stream, while these only cost the client that line.
#[derive(Debug, Clone)]
pub struct RelayLineCodec {
    inner: LinesCodec,
}

impl RelayLineCodec {
    /// Create a codec accepting lines of at most `max_length` bytes
    pub fn new(max_length: usize) -> Self {
        Self {
            inner: LinesCodec::new_with_max_length(max_length),
        }
    }

    /// Get the line length limit
    pub fn max_length(&self) -> usize {
        self.inner.max_length()
    }

    fn lift(
        result: Result<Option<String>, LinesCodecError>,
    ) -> Result<Option<InboundLine>, LinesCodecError> {
        match result {
            Ok(line) => Ok(line.map(InboundLine::Line)),
            Err(LinesCodecError::MaxLineLengthExceeded) => Ok(Some(InboundLine::Overflow)),
            // The inner codec has already split the offending line off the buffer
            Err(LinesCodecError::Io(e)) if e.kind() == io::ErrorKind::InvalidData => {
                Ok(Some(InboundLine::Invalid))
            }
            Err(e) => Err(e),
        }
    }
}

impl Decoder for RelayLineCodec {
    type Item = InboundLine;
    type Error = LinesCodecError;

    fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<InboundLine>, LinesCodecError> {
        Self::lift(self.inner.decode(buf))
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<InboundLine>, LinesCodecError> {
        Self::lift(self.inner.decode_eof(buf))
    }
}

impl Encoder<String> for RelayLineCodec {
    type Error = LinesCodecError;

    fn encode(&mut self, line: String, buf: &mut BytesMut) -> Result<(), LinesCodecError> {
        self.inner.encode(line, buf)
    }
}
