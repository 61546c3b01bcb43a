use crate::checksum::{DxbcChecksum, write_checksum};
use crate::cursor::Writer;
use crate::reader::{CHUNK_HEADER_SIZE, DXBC_MAGIC, HEADER_SIZE, TOTAL_SIZE_OFFSET};
use crate::version::ShaderVersion;

/// Container format version written into new containers.
pub const CONTAINER_VERSION: u32 = 1;

/// A chunk ready for serialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputChunk {
    pub tag: [u8; 4],
    pub data: Vec<u8>,
}

impl OutputChunk {
    pub fn new(tag: [u8; 4], data: Vec<u8>) -> Self {
        Self { tag, data }
    }
}

/// Assemble chunks into a complete, checksummed container.
///
/// Chunks are laid out in the given order right after the offset table, each
/// padded to a 4-byte boundary. The recorded payload size is the unpadded one.
pub fn assemble_container(chunks: &[OutputChunk]) -> Vec<u8> {
    let table_end = HEADER_SIZE + chunks.len() * 4;
    let body: usize = chunks
        .iter()
        .map(|c| CHUNK_HEADER_SIZE + c.data.len().next_multiple_of(4))
        .sum();
    let mut w = Writer::with_capacity(table_end + body);

    w.write_tag(&DXBC_MAGIC);
    w.write_bytes(&[0u8; 16]);
    w.write_u32(CONTAINER_VERSION);
    w.write_u32(0); // total size, backpatched
    w.write_u32(chunks.len() as u32);

    let table_pos = w.position();
    for _ in chunks {
        w.write_u32(0);
    }

    for (i, chunk) in chunks.iter().enumerate() {
        let offset = w.position() as u32;
        w.patch_u32(table_pos + i * 4, offset);
        w.write_tag(&chunk.tag);
        w.write_u32(chunk.data.len() as u32);
        w.write_bytes(&chunk.data);
        w.align4();
    }

    let total = w.position() as u32;
    w.patch_u32(TOTAL_SIZE_OFFSET, total);

    let mut out = w.into_bytes();
    write_checksum(&mut out, &DxbcChecksum);
    out
}

/// Build an instruction chunk payload: version token, word count, tokens.
///
/// The word count covers the two leading tokens as well as the stream.
pub fn shader_chunk(version: ShaderVersion, tokens: &[u32]) -> Vec<u8> {
    let mut w = Writer::with_capacity((tokens.len() + 2) * 4);
    w.write_u32(version.to_token());
    w.write_u32(tokens.len() as u32 + 2);
    for &t in tokens {
        w.write_u32(t);
    }
    w.into_bytes()
}
