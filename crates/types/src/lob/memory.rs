//! In-process lob backing
//!
//! Direct buffers behind a lock; used by embedded sessions and tests. Clob
//! offsets are character indices, so char-boundary bookkeeping happens here
//! rather than in the kernels.

use super::{LobRequest, LobResponse, LobStore};
use crate::error::{Error, Result};
use parking_lot::RwLock;
use silica_value::LobId;
use std::collections::HashMap;

#[derive(Default)]
pub struct MemoryLobStore {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    next_id: u64,
    blobs: HashMap<u64, Vec<u8>>,
    clobs: HashMap<u64, String>,
}

impl Inner {
    fn allocate(&mut self) -> LobId {
        self.next_id += 1;
        LobId(self.next_id)
    }

    fn blob(&self, id: LobId) -> Result<&Vec<u8>> {
        self.blobs.get(&id.0).ok_or(Error::LobNotFound(id))
    }

    fn blob_mut(&mut self, id: LobId) -> Result<&mut Vec<u8>> {
        self.blobs.get_mut(&id.0).ok_or(Error::LobNotFound(id))
    }

    fn clob(&self, id: LobId) -> Result<&String> {
        self.clobs.get(&id.0).ok_or(Error::LobNotFound(id))
    }
}

impl MemoryLobStore {
    pub fn new() -> Self {
        MemoryLobStore::default()
    }

    /// Answer one remote request against this store; the server side of
    /// [`super::RemoteLobStore`].
    pub fn serve(&self, request: LobRequest) -> Result<LobResponse> {
        match request {
            LobRequest::CreateBlob { length_hint } => {
                self.create_blob(length_hint).map(LobResponse::Created)
            }
            LobRequest::CreateClob { length_hint } => {
                self.create_clob(length_hint).map(LobResponse::Created)
            }
            LobRequest::BlobLength { id } => self.blob_length(id).map(LobResponse::Length),
            LobRequest::ClobLength { id } => self.clob_length(id).map(LobResponse::Length),
            LobRequest::ReadBytes { id, offset, len } => {
                self.read_bytes(id, offset, len).map(LobResponse::Bytes)
            }
            LobRequest::WriteBytes { id, offset, data } => {
                self.write_bytes(id, offset, &data).map(|_| LobResponse::Done)
            }
            LobRequest::ReadChars { id, offset, len } => {
                self.read_chars(id, offset, len).map(LobResponse::Chars)
            }
            LobRequest::WriteChars { id, offset, data } => {
                self.write_chars(id, offset, &data).map(|_| LobResponse::Done)
            }
            LobRequest::TruncateBlob { id, len } => {
                self.truncate_blob(id, len).map(|_| LobResponse::Done)
            }
            LobRequest::TruncateClob { id, len } => {
                self.truncate_clob(id, len).map(|_| LobResponse::Done)
            }
            LobRequest::DuplicateBlob { id } => {
                self.duplicate_blob(id).map(LobResponse::Created)
            }
            LobRequest::DuplicateClob { id } => {
                self.duplicate_clob(id).map(LobResponse::Created)
            }
            LobRequest::PositionBytes { id, pattern, start } => self
                .position_bytes(id, &pattern, start)
                .map(LobResponse::Position),
            LobRequest::PositionChars { id, pattern, start } => self
                .position_chars(id, &pattern, start)
                .map(LobResponse::Position),
        }
    }
}

impl LobStore for MemoryLobStore {
    fn create_blob(&self, length_hint: u64) -> Result<LobId> {
        let mut inner = self.inner.write();
        let id = inner.allocate();
        inner
            .blobs
            .insert(id.0, Vec::with_capacity(length_hint.min(1 << 20) as usize));
        Ok(id)
    }

    fn create_clob(&self, length_hint: u64) -> Result<LobId> {
        let mut inner = self.inner.write();
        let id = inner.allocate();
        inner
            .clobs
            .insert(id.0, String::with_capacity(length_hint.min(1 << 20) as usize));
        Ok(id)
    }

    fn blob_length(&self, id: LobId) -> Result<u64> {
        Ok(self.inner.read().blob(id)?.len() as u64)
    }

    fn clob_length(&self, id: LobId) -> Result<u64> {
        Ok(self.inner.read().clob(id)?.chars().count() as u64)
    }

    fn read_bytes(&self, id: LobId, offset: u64, len: usize) -> Result<Vec<u8>> {
        let inner = self.inner.read();
        let data = inner.blob(id)?;
        let start = (offset as usize).min(data.len());
        let end = start.saturating_add(len).min(data.len());
        Ok(data[start..end].to_vec())
    }

    fn write_bytes(&self, id: LobId, offset: u64, data: &[u8]) -> Result<()> {
        let mut inner = self.inner.write();
        let body = inner.blob_mut(id)?;
        let offset = offset as usize;
        if body.len() < offset + data.len() {
            body.resize(offset + data.len(), 0);
        }
        body[offset..offset + data.len()].copy_from_slice(data);
        Ok(())
    }

    fn read_chars(&self, id: LobId, offset: u64, len: usize) -> Result<String> {
        let inner = self.inner.read();
        let data = inner.clob(id)?;
        Ok(data.chars().skip(offset as usize).take(len).collect())
    }

    fn write_chars(&self, id: LobId, offset: u64, data: &str) -> Result<()> {
        let mut inner = self.inner.write();
        let body = inner.clobs.get_mut(&id.0).ok_or(Error::LobNotFound(id))?;
        let offset = offset as usize;
        let written = data.chars().count();
        let mut out: String = body.chars().take(offset).collect();
        for _ in out.chars().count()..offset {
            out.push(' ');
        }
        out.push_str(data);
        out.extend(body.chars().skip(offset + written));
        *body = out;
        Ok(())
    }

    fn truncate_blob(&self, id: LobId, len: u64) -> Result<()> {
        let mut inner = self.inner.write();
        let body = inner.blob_mut(id)?;
        body.truncate(len as usize);
        Ok(())
    }

    fn truncate_clob(&self, id: LobId, len: u64) -> Result<()> {
        let mut inner = self.inner.write();
        let body = inner.clobs.get_mut(&id.0).ok_or(Error::LobNotFound(id))?;
        *body = body.chars().take(len as usize).collect();
        Ok(())
    }

    fn duplicate_blob(&self, id: LobId) -> Result<LobId> {
        let mut inner = self.inner.write();
        let body = inner.blob(id)?.clone();
        let copy = inner.allocate();
        inner.blobs.insert(copy.0, body);
        Ok(copy)
    }

    fn duplicate_clob(&self, id: LobId) -> Result<LobId> {
        let mut inner = self.inner.write();
        let body = inner.clob(id)?.clone();
        let copy = inner.allocate();
        inner.clobs.insert(copy.0, body);
        Ok(copy)
    }

    fn position_bytes(&self, id: LobId, pattern: &[u8], start: u64) -> Result<Option<u64>> {
        let inner = self.inner.read();
        let data = inner.blob(id)?;
        if pattern.is_empty() || data.len() < pattern.len() {
            return Ok(None);
        }
        let from = (start as usize).min(data.len());
        Ok(data[from..]
            .windows(pattern.len())
            .position(|w| w == pattern)
            .map(|i| (from + i) as u64))
    }

    fn position_chars(&self, id: LobId, pattern: &str, start: u64) -> Result<Option<u64>> {
        let inner = self.inner.read();
        let data = inner.clob(id)?;
        if pattern.is_empty() {
            return Ok(None);
        }
        let skipped: String = data.chars().skip(start as usize).collect();
        Ok(skipped
            .find(pattern)
            .map(|byte_idx| start + skipped[..byte_idx].chars().count() as u64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blob_write_read() {
        let store = MemoryLobStore::new();
        let id = store.create_blob(0).unwrap();
        store.write_bytes(id, 0, b"hello").unwrap();
        store.write_bytes(id, 5, b" world").unwrap();
        assert_eq!(store.blob_length(id).unwrap(), 11);
        assert_eq!(store.read_bytes(id, 6, 5).unwrap(), b"world");
    }

    #[test]
    fn test_blob_write_past_end_zero_fills() {
        let store = MemoryLobStore::new();
        let id = store.create_blob(0).unwrap();
        store.write_bytes(id, 3, b"x").unwrap();
        assert_eq!(store.read_bytes(id, 0, 4).unwrap(), vec![0, 0, 0, b'x']);
    }

    #[test]
    fn test_clob_char_offsets() {
        let store = MemoryLobStore::new();
        let id = store.create_clob(0).unwrap();
        store.write_chars(id, 0, "héllo wörld").unwrap();
        assert_eq!(store.clob_length(id).unwrap(), 11);
        assert_eq!(store.read_chars(id, 6, 5).unwrap(), "wörld");
        assert_eq!(store.position_chars(id, "wörld", 0).unwrap(), Some(6));
    }

    #[test]
    fn test_duplicate_is_independent() {
        let store = MemoryLobStore::new();
        let id = store.create_blob(0).unwrap();
        store.write_bytes(id, 0, b"abc").unwrap();
        let copy = store.duplicate_blob(id).unwrap();
        store.truncate_blob(id, 1).unwrap();
        assert_eq!(store.blob_length(copy).unwrap(), 3);
        assert_eq!(store.blob_length(id).unwrap(), 1);
    }

    #[test]
    fn test_position_bytes() {
        let store = MemoryLobStore::new();
        let id = store.create_blob(0).unwrap();
        store.write_bytes(id, 0, b"abcabc").unwrap();
        assert_eq!(store.position_bytes(id, b"abc", 1).unwrap(), Some(3));
        assert_eq!(store.position_bytes(id, b"zzz", 0).unwrap(), None);
    }

    #[test]
    fn test_missing_lob() {
        let store = MemoryLobStore::new();
        assert_eq!(
            store.blob_length(LobId(42)),
            Err(Error::LobNotFound(LobId(42)))
        );
    }
}
