//! Sequential lob readers
//!
//! Buffered, block-sized views for bulk export without materializing the
//! whole object. One read against the store per block; the cursor never
//! seeks backwards.

use super::LobStore;
use crate::error::Result;
use silica_value::LobId;
use std::io;

const BLOCK_SIZE: usize = 8 * 1024;

pub struct BlobReader<'a> {
    store: &'a dyn LobStore,
    id: LobId,
    position: u64,
    length: u64,
    buffer: Vec<u8>,
    buffer_offset: usize,
}

impl<'a> BlobReader<'a> {
    pub fn new(store: &'a dyn LobStore, id: LobId) -> Result<Self> {
        let length = store.blob_length(id)?;
        Ok(BlobReader {
            store,
            id,
            position: 0,
            length,
            buffer: Vec::new(),
            buffer_offset: 0,
        })
    }

    fn fill(&mut self) -> Result<()> {
        if self.buffer_offset < self.buffer.len() || self.position >= self.length {
            return Ok(());
        }
        let want = BLOCK_SIZE.min((self.length - self.position) as usize);
        self.buffer = self.store.read_bytes(self.id, self.position, want)?;
        self.buffer_offset = 0;
        self.position += self.buffer.len() as u64;
        Ok(())
    }
}

impl io::Read for BlobReader<'_> {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        self.fill().map_err(io::Error::other)?;
        let available = &self.buffer[self.buffer_offset..];
        let n = available.len().min(out.len());
        out[..n].copy_from_slice(&available[..n]);
        self.buffer_offset += n;
        Ok(n)
    }
}

pub struct ClobReader<'a> {
    store: &'a dyn LobStore,
    id: LobId,
    position: u64,
    length: u64,
}

impl<'a> ClobReader<'a> {
    pub fn new(store: &'a dyn LobStore, id: LobId) -> Result<Self> {
        let length = store.clob_length(id)?;
        Ok(ClobReader {
            store,
            id,
            position: 0,
            length,
        })
    }

    /// Next block of characters, or `None` at end of data.
    pub fn read_block(&mut self) -> Result<Option<String>> {
        if self.position >= self.length {
            return Ok(None);
        }
        let want = BLOCK_SIZE.min((self.length - self.position) as usize);
        let block = self.store.read_chars(self.id, self.position, want)?;
        self.position += block.chars().count() as u64;
        Ok(Some(block))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lob::MemoryLobStore;
    use std::io::Read;

    #[test]
    fn test_blob_reader_spans_blocks() {
        let store = MemoryLobStore::new();
        let id = store.create_blob(0).unwrap();
        let data: Vec<u8> = (0..20_000u32).map(|i| (i % 251) as u8).collect();
        store.write_bytes(id, 0, &data).unwrap();

        let mut reader = BlobReader::new(&store, id).unwrap();
        let mut out = Vec::new();
        reader.read_to_end(&mut out).unwrap();
        assert_eq!(out, data);
    }

    #[test]
    fn test_clob_reader_blocks() {
        let store = MemoryLobStore::new();
        let id = store.create_clob(0).unwrap();
        let text = "abcdefgh".repeat(2048); // 16384 chars, two blocks
        store.write_chars(id, 0, &text).unwrap();

        let mut reader = ClobReader::new(&store, id).unwrap();
        let mut out = String::new();
        while let Some(block) = reader.read_block().unwrap() {
            out.push_str(&block);
        }
        assert_eq!(out, text);
    }
}
