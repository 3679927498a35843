// Copyright 2026 TagSense Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Physical-link handle for one discovered tag.

use thiserror::Error;
use tracing::debug;

/// Link-level failures.
#[derive(Debug, Error)]
pub enum LinkError {
    /// The peer is out of range. Expected and frequent: the tag is a
    /// physically-moveable object held against the reader by hand.
    #[error("tag out of range")]
    Unavailable,

    /// I/O fault on the link. Fatal to the current polling run.
    #[error("transport fault: {0}")]
    Transport(String),

    /// The link-level data format is broken. Fatal to the current run.
    #[error("malformed link data: {0}")]
    Format(String),
}

impl LinkError {
    /// `Unavailable` means "try again next tick"; everything else kills the
    /// polling run.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, LinkError::Unavailable)
    }
}

/// Backend seam to the platform NFC stack.
///
/// Implementations block for the duration of each call, bounded by the
/// underlying transport; the poll loop provides the retry cadence around them.
pub trait TagTransport: Send {
    /// Name of the backend (e.g. "sim", the platform stack).
    fn backend_name(&self) -> &'static str;

    /// Open the link to the tag.
    fn connect(&mut self) -> Result<(), LinkError>;

    /// Read one message if the tag has produced one. `Ok(None)` means
    /// "no message yet", which is not an error.
    fn read_message(&mut self) -> Result<Option<Vec<u8>>, LinkError>;

    /// Close the link. Must be safe to call in any state.
    fn close(&mut self);
}

/// Lifecycle of a [`TagLink`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    /// Tag handle available, link not open.
    Discovered,
    /// Link open, able to request a message.
    Connected,
    /// Link closed or superseded. Terminal.
    Closed,
}

/// The transient handle to one discovered tag.
///
/// Created on a discovery notification and replaced wholesale by the next
/// one; there is no link pooling. The transport is always given a close
/// attempt, whichever path the state was exited through.
pub struct TagLink {
    transport: Box<dyn TagTransport>,
    state: LinkState,
}

impl TagLink {
    /// Wrap a freshly discovered tag handle.
    pub fn discovered(transport: Box<dyn TagTransport>) -> Self {
        debug!("tag link created over {} backend", transport.backend_name());
        Self {
            transport,
            state: LinkState::Discovered,
        }
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == LinkState::Connected
    }

    /// Open the link. On `Unavailable` the link stays `Discovered` so the
    /// next cadence tick can retry; a fatal fault closes it.
    pub fn connect(&mut self) -> Result<(), LinkError> {
        match self.state {
            LinkState::Connected => Ok(()),
            LinkState::Closed => Err(LinkError::Transport("link already closed".into())),
            LinkState::Discovered => match self.transport.connect() {
                Ok(()) => {
                    self.state = LinkState::Connected;
                    Ok(())
                }
                Err(err) => {
                    if err.is_fatal() {
                        self.close();
                    }
                    Err(err)
                }
            },
        }
    }

    /// Request one message from the connected tag. A transport or format
    /// fault closes the link before the error is returned.
    pub fn read_message(&mut self) -> Result<Option<Vec<u8>>, LinkError> {
        if self.state != LinkState::Connected {
            return Err(LinkError::Transport("read on unconnected link".into()));
        }
        match self.transport.read_message() {
            Err(err) if err.is_fatal() => {
                self.close();
                Err(err)
            }
            other => other,
        }
    }

    /// End-of-iteration cleanup: drop the connection but keep the handle
    /// usable, so the next iteration re-establishes the link fresh.
    pub fn release(&mut self) {
        if self.state == LinkState::Connected {
            self.transport.close();
            self.state = LinkState::Discovered;
        }
    }

    /// Close the link for good. Used when a new discovery supersedes this
    /// handle or a hard fault ends the run.
    pub fn close(&mut self) {
        if self.state != LinkState::Closed {
            self.transport.close();
            self.state = LinkState::Closed;
        }
    }
}

impl Drop for TagLink {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FlakyTransport {
        misses_left: u32,
        closes: u32,
    }

    impl TagTransport for FlakyTransport {
        fn backend_name(&self) -> &'static str {
            "flaky"
        }

        fn connect(&mut self) -> Result<(), LinkError> {
            if self.misses_left > 0 {
                self.misses_left -= 1;
                return Err(LinkError::Unavailable);
            }
            Ok(())
        }

        fn read_message(&mut self) -> Result<Option<Vec<u8>>, LinkError> {
            Ok(None)
        }

        fn close(&mut self) {
            self.closes += 1;
        }
    }

    #[test]
    fn test_unavailable_keeps_link_discovered() {
        let mut link = TagLink::discovered(Box::new(FlakyTransport {
            misses_left: 1,
            closes: 0,
        }));

        assert!(matches!(link.connect(), Err(LinkError::Unavailable)));
        assert_eq!(link.state(), LinkState::Discovered);

        // Next attempt goes through.
        link.connect().unwrap();
        assert!(link.is_connected());
    }

    #[test]
    fn test_release_allows_reconnect() {
        let mut link = TagLink::discovered(Box::new(FlakyTransport {
            misses_left: 0,
            closes: 0,
        }));
        link.connect().unwrap();
        link.release();
        assert_eq!(link.state(), LinkState::Discovered);
        link.connect().unwrap();
        assert!(link.is_connected());
    }

    #[test]
    fn test_close_is_terminal() {
        let mut link = TagLink::discovered(Box::new(FlakyTransport {
            misses_left: 0,
            closes: 0,
        }));
        link.connect().unwrap();
        link.close();
        assert_eq!(link.state(), LinkState::Closed);
        assert!(link.connect().is_err());
    }

    #[test]
    fn test_read_on_unconnected_link_faults() {
        let mut link = TagLink::discovered(Box::new(FlakyTransport {
            misses_left: 0,
            closes: 0,
        }));
        assert!(link.read_message().is_err());
    }
}
