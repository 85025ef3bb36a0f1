//! Large-object indirection
//!
//! Type kernels operate on CLOB/BLOB values through [`LobStore`], a small
//! capability interface over the backing data. Two variants exist: an
//! in-process store over byte/char buffers ([`MemoryLobStore`]) and a proxy
//! that forwards every operation to a server-resident lob manager as a
//! synchronous request/response round trip ([`RemoteLobStore`]). Kernel code
//! never branches on which variant it holds.
//!
//! Offsets and lengths are byte-granular for blobs and character-granular
//! for clobs. Calls block the calling thread for the duration of each
//! operation; timeouts and cancellation are the transport's concern.

mod memory;
mod remote;
mod stream;

pub use memory::MemoryLobStore;
pub use remote::{LobRequest, LobResponse, LobTransport, RemoteLobStore};
pub use stream::{BlobReader, ClobReader};

use crate::error::Result;
use silica_value::LobId;

pub trait LobStore {
    fn create_blob(&self, length_hint: u64) -> Result<LobId>;
    fn create_clob(&self, length_hint: u64) -> Result<LobId>;

    fn blob_length(&self, id: LobId) -> Result<u64>;
    fn clob_length(&self, id: LobId) -> Result<u64>;

    fn read_bytes(&self, id: LobId, offset: u64, len: usize) -> Result<Vec<u8>>;
    fn write_bytes(&self, id: LobId, offset: u64, data: &[u8]) -> Result<()>;
    fn read_chars(&self, id: LobId, offset: u64, len: usize) -> Result<String>;
    fn write_chars(&self, id: LobId, offset: u64, data: &str) -> Result<()>;

    fn truncate_blob(&self, id: LobId, len: u64) -> Result<()>;
    fn truncate_clob(&self, id: LobId, len: u64) -> Result<()>;

    fn duplicate_blob(&self, id: LobId) -> Result<LobId>;
    fn duplicate_clob(&self, id: LobId) -> Result<LobId>;

    /// Byte offset of the first occurrence of `pattern` at or after `start`.
    fn position_bytes(&self, id: LobId, pattern: &[u8], start: u64) -> Result<Option<u64>>;
    /// Character offset of the first occurrence of `pattern` at or after `start`.
    fn position_chars(&self, id: LobId, pattern: &str, start: u64) -> Result<Option<u64>>;
}
