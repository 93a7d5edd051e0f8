//! Control stream decoder
//!
//! [`DirectiveCodec`] splits the control stream into `\n`-terminated lines
//! and turns them into [`ControlFrame`]s. The `New` directive spans two
//! lines, so the codec keeps state between lines.

use super::types::{ControlFrame, Directive, LINE_TERMINATOR, MAX_LINE_LENGTH, NEW_SESSION_MARKER};
use crate::error::DirectiveError;
use bytes::BytesMut;
use tokio_util::codec::Decoder;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum State {
    #[default]
    Idle,
    /// `New` was read; the next line is the session id
    AwaitingId,
}

/// Stateful decoder for the line-delimited control protocol
#[derive(Debug, Default)]
pub struct DirectiveCodec {
    state: State,
    /// Index in the buffer already scanned for a terminator
    next_index: usize,
}

impl DirectiveCodec {
    /// Create a codec in the idle state
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a `New` marker was consumed and its id line is still pending
    pub fn is_awaiting_id(&self) -> bool {
        self.state == State::AwaitingId
    }

    /// Feed one line (terminator already stripped) through the state machine
    ///
    /// Returns `None` when the line was the `New` marker and the id line is
    /// still needed. Matching is exact: no trimming and no case folding.
    pub fn decode_line(&mut self, line: String) -> Option<ControlFrame> {
        match self.state {
            State::Idle if line == NEW_SESSION_MARKER => {
                self.state = State::AwaitingId;
                None
            }
            State::Idle => Some(ControlFrame::Unknown(line)),
            State::AwaitingId => {
                self.state = State::Idle;
                Some(ControlFrame::Directive(Directive::NewSession { id: line }))
            }
        }
    }

    /// Split the next complete line off `src`, without its terminator
    fn next_line(&mut self, src: &mut BytesMut) -> Result<Option<String>, DirectiveError> {
        let offset = src[self.next_index..]
            .iter()
            .position(|b| *b == LINE_TERMINATOR);

        match offset {
            Some(offset) => {
                let end = self.next_index + offset;
                self.next_index = 0;
                let mut line = src.split_to(end + 1);
                line.truncate(end);
                if line.len() > MAX_LINE_LENGTH {
                    return Err(DirectiveError::LineTooLong(MAX_LINE_LENGTH));
                }
                let line = String::from_utf8(line.to_vec()).map_err(|_| DirectiveError::InvalidUtf8)?;
                debug!("Control line: {:?}", line);
                Ok(Some(line))
            }
            None if src.len() > MAX_LINE_LENGTH => Err(DirectiveError::LineTooLong(MAX_LINE_LENGTH)),
            None => {
                self.next_index = src.len();
                Ok(None)
            }
        }
    }
}

impl Decoder for DirectiveCodec {
    type Item = ControlFrame;
    type Error = DirectiveError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<ControlFrame>, DirectiveError> {
        while let Some(line) = self.next_line(src)? {
            if let Some(frame) = self.decode_line(line) {
                return Ok(Some(frame));
            }
        }
        Ok(None)
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<ControlFrame>, DirectiveError> {
        if let Some(frame) = self.decode(src)? {
            return Ok(Some(frame));
        }

        if self.state == State::AwaitingId {
            self.state = State::Idle;
            self.next_index = 0;
            src.clear();
            return Err(DirectiveError::Truncated);
        }

        if !src.is_empty() {
            warn!(
                "Discarding {} bytes of unterminated control line at end of stream",
                src.len()
            );
            self.next_index = 0;
            src.clear();
        }
        Ok(None)
    }
}
