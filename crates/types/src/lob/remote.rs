//! Server-resident lob proxy
//!
//! Every [`LobStore`] operation becomes one [`LobRequest`] sent through the
//! owning session's transport and one [`LobResponse`] back. The call is
//! synchronous and blocks the calling thread; handles are bound to a single
//! owning session and must not be shared across threads without external
//! synchronization.

use super::LobStore;
use crate::error::{Error, Result};
use silica_value::LobId;

#[derive(Debug, Clone, PartialEq)]
pub enum LobRequest {
    CreateBlob { length_hint: u64 },
    CreateClob { length_hint: u64 },
    BlobLength { id: LobId },
    ClobLength { id: LobId },
    ReadBytes { id: LobId, offset: u64, len: usize },
    WriteBytes { id: LobId, offset: u64, data: Vec<u8> },
    ReadChars { id: LobId, offset: u64, len: usize },
    WriteChars { id: LobId, offset: u64, data: String },
    TruncateBlob { id: LobId, len: u64 },
    TruncateClob { id: LobId, len: u64 },
    DuplicateBlob { id: LobId },
    DuplicateClob { id: LobId },
    PositionBytes { id: LobId, pattern: Vec<u8>, start: u64 },
    PositionChars { id: LobId, pattern: String, start: u64 },
}

#[derive(Debug, Clone, PartialEq)]
pub enum LobResponse {
    Created(LobId),
    Length(u64),
    Bytes(Vec<u8>),
    Chars(String),
    Position(Option<u64>),
    Done,
}

/// Session-owned transport carrying one request/response round trip.
pub trait LobTransport {
    fn call(&self, request: LobRequest) -> Result<LobResponse>;
}

pub struct RemoteLobStore<T: LobTransport> {
    transport: T,
}

impl<T: LobTransport> RemoteLobStore<T> {
    pub fn new(transport: T) -> Self {
        RemoteLobStore { transport }
    }

    fn expect_id(&self, request: LobRequest) -> Result<LobId> {
        match self.transport.call(request)? {
            LobResponse::Created(id) => Ok(id),
            other => Err(unexpected(other)),
        }
    }

    fn expect_length(&self, request: LobRequest) -> Result<u64> {
        match self.transport.call(request)? {
            LobResponse::Length(len) => Ok(len),
            other => Err(unexpected(other)),
        }
    }

    fn expect_done(&self, request: LobRequest) -> Result<()> {
        match self.transport.call(request)? {
            LobResponse::Done => Ok(()),
            other => Err(unexpected(other)),
        }
    }
}

fn unexpected(response: LobResponse) -> Error {
    Error::Internal(format!("unexpected lob response: {:?}", response))
}

impl<T: LobTransport> LobStore for RemoteLobStore<T> {
    fn create_blob(&self, length_hint: u64) -> Result<LobId> {
        self.expect_id(LobRequest::CreateBlob { length_hint })
    }

    fn create_clob(&self, length_hint: u64) -> Result<LobId> {
        self.expect_id(LobRequest::CreateClob { length_hint })
    }

    fn blob_length(&self, id: LobId) -> Result<u64> {
        self.expect_length(LobRequest::BlobLength { id })
    }

    fn clob_length(&self, id: LobId) -> Result<u64> {
        self.expect_length(LobRequest::ClobLength { id })
    }

    fn read_bytes(&self, id: LobId, offset: u64, len: usize) -> Result<Vec<u8>> {
        match self
            .transport
            .call(LobRequest::ReadBytes { id, offset, len })?
        {
            LobResponse::Bytes(data) => Ok(data),
            other => Err(unexpected(other)),
        }
    }

    fn write_bytes(&self, id: LobId, offset: u64, data: &[u8]) -> Result<()> {
        self.expect_done(LobRequest::WriteBytes {
            id,
            offset,
            data: data.to_vec(),
        })
    }

    fn read_chars(&self, id: LobId, offset: u64, len: usize) -> Result<String> {
        match self
            .transport
            .call(LobRequest::ReadChars { id, offset, len })?
        {
            LobResponse::Chars(data) => Ok(data),
            other => Err(unexpected(other)),
        }
    }

    fn write_chars(&self, id: LobId, offset: u64, data: &str) -> Result<()> {
        self.expect_done(LobRequest::WriteChars {
            id,
            offset,
            data: data.to_string(),
        })
    }

    fn truncate_blob(&self, id: LobId, len: u64) -> Result<()> {
        self.expect_done(LobRequest::TruncateBlob { id, len })
    }

    fn truncate_clob(&self, id: LobId, len: u64) -> Result<()> {
        self.expect_done(LobRequest::TruncateClob { id, len })
    }

    fn duplicate_blob(&self, id: LobId) -> Result<LobId> {
        self.expect_id(LobRequest::DuplicateBlob { id })
    }

    fn duplicate_clob(&self, id: LobId) -> Result<LobId> {
        self.expect_id(LobRequest::DuplicateClob { id })
    }

    fn position_bytes(&self, id: LobId, pattern: &[u8], start: u64) -> Result<Option<u64>> {
        match self.transport.call(LobRequest::PositionBytes {
            id,
            pattern: pattern.to_vec(),
            start,
        })? {
            LobResponse::Position(pos) => Ok(pos),
            other => Err(unexpected(other)),
        }
    }

    fn position_chars(&self, id: LobId, pattern: &str, start: u64) -> Result<Option<u64>> {
        match self.transport.call(LobRequest::PositionChars {
            id,
            pattern: pattern.to_string(),
            start,
        })? {
            LobResponse::Position(pos) => Ok(pos),
            other => Err(unexpected(other)),
        }
    }
}
