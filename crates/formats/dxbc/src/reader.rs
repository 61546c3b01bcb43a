use crate::cursor::Cursor;
use crate::error::{Error, Result};

/// Magic bytes for the container.
pub const DXBC_MAGIC: [u8; 4] = *b"DXBC";

/// Instruction chunk tag for shader model 4 programs.
pub const SHDR_TAG: [u8; 4] = *b"SHDR";
/// Instruction chunk tag for shader model 5 programs.
pub const SHEX_TAG: [u8; 4] = *b"SHEX";

/// Size of the fixed container header, up to the chunk offset table.
pub const HEADER_SIZE: usize = 32;
/// Byte range of the 16-byte checksum inside the header.
pub const CHECKSUM_RANGE: std::ops::Range<usize> = 4..20;
/// Header field holding the total container size.
pub const TOTAL_SIZE_OFFSET: usize = 24;
/// Size of a chunk's tag + payload size prefix.
pub const CHUNK_HEADER_SIZE: usize = 8;

/// The fixed 32-byte container header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainerHeader {
    pub checksum: [u8; 16],
    /// Container format version (1 in every file fxc produces). Copied, never interpreted.
    pub version: u32,
    /// Total container size in bytes, header included.
    pub total_size: u32,
    pub chunk_count: u32,
}

impl ContainerHeader {
    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut cursor = Cursor::new(data);

        let magic = cursor.read_tag()?;
        if magic != DXBC_MAGIC {
            return Err(Error::malformed(
                0,
                format!("bad magic {:?}, expected \"DXBC\"", String::from_utf8_lossy(&magic)),
            ));
        }
        let mut checksum = [0u8; 16];
        checksum.copy_from_slice(cursor.read_bytes(16)?);
        let version = cursor.read_u32()?;
        let total_size = cursor.read_u32()?;
        let chunk_count = cursor.read_u32()?;

        Ok(Self {
            checksum,
            version,
            total_size,
            chunk_count,
        })
    }
}

/// A single chunk entry in the container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkEntry {
    /// 4-byte ASCII tag identifying the chunk type.
    pub tag: [u8; 4],
    /// Absolute byte offset of the chunk header (tag field) in the container.
    pub offset: usize,
    /// Size of the chunk's payload (excluding the 8-byte header).
    pub size: usize,
}

impl ChunkEntry {
    /// Absolute offset where chunk payload begins (after tag + size fields).
    pub fn data_offset(&self) -> usize {
        self.offset + CHUNK_HEADER_SIZE
    }

    /// Absolute offset one past the last payload byte.
    pub fn end(&self) -> usize {
        self.data_offset() + self.size
    }

    /// Whether this chunk carries the instruction token stream.
    pub fn is_shader(&self) -> bool {
        self.tag == SHDR_TAG || self.tag == SHEX_TAG
    }

    /// Tag as a string (for display).
    pub fn tag_str(&self) -> &str {
        std::str::from_utf8(&self.tag).unwrap_or("????")
    }
}

/// Header plus the ordered chunk table of a container.
///
/// Only the container envelope is parsed here; chunk payloads are left alone.
#[derive(Debug, Clone)]
pub struct ChunkIndex {
    header: ContainerHeader,
    /// Chunks in table order, which is also physical order.
    chunks: Vec<ChunkEntry>,
}

impl ChunkIndex {
    /// Parse the header and chunk offset table.
    ///
    /// `data` must be exactly the container: its length has to match the
    /// declared total size. Offsets must be strictly increasing and every
    /// chunk must lie inside the container without overlapping its successor.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let header = ContainerHeader::parse(data)?;

        if header.total_size as usize != data.len() {
            return Err(Error::malformed(
                TOTAL_SIZE_OFFSET,
                format!(
                    "declared size {} does not match buffer size {}",
                    header.total_size,
                    data.len()
                ),
            ));
        }

        let mut cursor = Cursor::new(data);
        cursor.seek(HEADER_SIZE);
        let offsets = cursor.read_u32_array(header.chunk_count as usize)?;
        let table_end = cursor.position();

        let mut chunks: Vec<ChunkEntry> = Vec::with_capacity(offsets.len());
        for (i, &raw) in offsets.iter().enumerate() {
            let offset = raw as usize;
            let lower_bound = chunks.last().map_or(table_end, ChunkEntry::end);
            if offset < lower_bound {
                return Err(Error::malformed(
                    HEADER_SIZE + i * 4,
                    format!(
                        "chunk {i} offset {offset:#x} overlaps preceding data ending at {lower_bound:#x}"
                    ),
                ));
            }

            let mut c = cursor.at_offset(offset);
            let tag = c.read_tag()?;
            let size = c.read_u32()? as usize;
            let entry = ChunkEntry { tag, offset, size };
            if entry.end() > data.len() {
                return Err(Error::malformed(
                    offset,
                    format!(
                        "chunk {} payload ({} bytes) runs past end of container",
                        entry.tag_str(),
                        size
                    ),
                ));
            }
            chunks.push(entry);
        }

        Ok(Self { header, chunks })
    }

    pub fn header(&self) -> &ContainerHeader {
        &self.header
    }

    /// All chunks in table order.
    pub fn chunks(&self) -> &[ChunkEntry] {
        &self.chunks
    }

    /// Number of chunks.
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Whether the index is empty.
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Find a chunk by its 4-byte tag. Returns the first match.
    pub fn find(&self, tag: &[u8; 4]) -> Option<&ChunkEntry> {
        self.chunks.iter().find(|c| &c.tag == tag)
    }

    /// Locate the instruction chunk (`SHDR` or `SHEX`), returning its table index.
    ///
    /// A container carrying more than one instruction chunk is rejected.
    pub fn shader_chunk(&self) -> Result<(usize, &ChunkEntry)> {
        let mut found = self.chunks.iter().enumerate().filter(|(_, c)| c.is_shader());
        let (index, entry) = found.next().ok_or(Error::ChunkNotFound)?;
        if let Some((_, second)) = found.next() {
            return Err(Error::malformed(
                second.offset,
                format!(
                    "second instruction chunk {} (first is {} at {:#x})",
                    second.tag_str(),
                    entry.tag_str(),
                    entry.offset
                ),
            ));
        }
        Ok((index, entry))
    }

    /// Get the raw payload bytes for a chunk from the container data.
    pub fn chunk_data<'a>(&self, data: &'a [u8], entry: &ChunkEntry) -> Result<&'a [u8]> {
        let mut c = Cursor::new(data);
        c.seek(entry.data_offset());
        c.read_bytes(entry.size)
    }
}
