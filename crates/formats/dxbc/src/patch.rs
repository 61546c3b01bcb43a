//! Instruction insertion.
//!
//! [`ShaderProgram`] is the read-only model of a source container: chunk
//! index, the instruction chunk, and its decoded records. [`patch`] and
//! [`patch_many`] splice raw token streams into it at instruction
//! boundaries, fix up every size and offset field that the insertion moves,
//! and re-checksum the result.
//!
//! All preconditions are checked before the destination buffer is touched.

use crate::bytecode::decode::{OpcodeRecord, decode};
use crate::checksum::{Checksum, DxbcChecksum, write_checksum};
use crate::cursor::{Cursor, add_u32_at};
use crate::diagnostics::Diagnostics;
use crate::error::{Error, Result};
use crate::reader::{ChunkEntry, ChunkIndex, HEADER_SIZE, SHEX_TAG, TOTAL_SIZE_OFFSET};
use crate::version::ShaderVersion;

/// Version token plus length token at the start of the instruction chunk payload.
const PROGRAM_HEADER_WORDS: usize = 2;

/// Runtime switches for the debug output of a patch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PatchOptions {
    /// Hand the source container to `Diagnostics::disassembly` before patching.
    pub dump_disassembly: bool,
    /// Report every decoded source record to `Diagnostics::opcode`.
    pub dump_raw_opcodes: bool,
}

/// A raw token stream to insert before instruction `index`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Insertion<'a> {
    /// Instruction number in the source stream, `0..=record_count`.
    pub index: usize,
    /// Little-endian instruction words. Not decoded or validated.
    pub stream: &'a [u8],
}

/// Decoded view of a source container.
#[derive(Debug, Clone)]
pub struct ShaderProgram<'a> {
    data: &'a [u8],
    index: ChunkIndex,
    shader_index: usize,
    chunk: ChunkEntry,
    version: ShaderVersion,
    /// Word count N from the length token.
    declared_words: usize,
    records: Vec<OpcodeRecord<'a>>,
}

impl<'a> ShaderProgram<'a> {
    /// Parse the container envelope, locate the instruction chunk and decode
    /// its token stream.
    pub fn parse(data: &'a [u8]) -> Result<Self> {
        let index = ChunkIndex::parse(data)?;
        let (shader_index, chunk) = index.shader_chunk()?;
        let chunk = *chunk;

        let payload = index.chunk_data(data, &chunk)?;
        let mut c = Cursor::new(payload);
        let version = ShaderVersion::from_token(c.read_u32().map_err(|_| {
            Error::malformed(chunk.data_offset(), "instruction chunk too short for version token")
        })?);
        let declared_words = c.read_u32().map_err(|_| {
            Error::malformed(chunk.data_offset() + 4, "instruction chunk too short for length token")
        })? as usize;

        if declared_words < PROGRAM_HEADER_WORDS {
            return Err(Error::malformed(
                chunk.data_offset() + 4,
                format!("program length {declared_words} words is shorter than its own header"),
            ));
        }
        let program_bytes = declared_words
            .checked_mul(4)
            .filter(|&n| n <= payload.len())
            .ok_or_else(|| {
                Error::malformed(
                    chunk.data_offset() + 4,
                    format!(
                        "program length {declared_words} words exceeds chunk payload of {} bytes",
                        payload.len()
                    ),
                )
            })?;

        let tokens_start = chunk.data_offset() + PROGRAM_HEADER_WORDS * 4;
        let tokens = &payload[PROGRAM_HEADER_WORDS * 4..program_bytes];
        let records = decode(tokens).map_err(|e| rebase(e, tokens_start))?;

        Ok(Self {
            data,
            index,
            shader_index,
            chunk,
            version,
            declared_words,
            records,
        })
    }

    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    pub fn index(&self) -> &ChunkIndex {
        &self.index
    }

    /// Position of the instruction chunk in the chunk table.
    pub fn shader_index(&self) -> usize {
        self.shader_index
    }

    pub fn chunk(&self) -> &ChunkEntry {
        &self.chunk
    }

    pub fn version(&self) -> ShaderVersion {
        self.version
    }

    /// Word count from the length token, version and length tokens included.
    pub fn declared_words(&self) -> usize {
        self.declared_words
    }

    pub fn records(&self) -> &[OpcodeRecord<'a>] {
        &self.records
    }

    /// Absolute offset of the first instruction token.
    pub fn tokens_start(&self) -> usize {
        self.chunk.data_offset() + PROGRAM_HEADER_WORDS * 4
    }

    /// Absolute offset one past the last instruction token.
    pub fn tokens_end(&self) -> usize {
        self.chunk.data_offset() + self.declared_words * 4
    }

    /// Absolute offset of the boundary before instruction `index`
    /// (`index == records().len()` is the end of the stream).
    pub fn boundary(&self, index: usize) -> Result<usize> {
        match self.records.get(index) {
            Some(rec) => Ok(self.tokens_start() + rec.offset),
            None if index == self.records.len() => Ok(self.tokens_end()),
            None => Err(Error::InvalidInsertionIndex {
                index,
                count: self.records.len(),
            }),
        }
    }

    /// First custom-data block, if any.
    pub fn custom_data(&self) -> Option<&OpcodeRecord<'a>> {
        self.records.iter().find(|r| r.custom_data_class.is_some())
    }
}

/// Decoder offsets are relative to the token stream; report them absolutely.
fn rebase(err: Error, base: usize) -> Error {
    match err {
        Error::MalformedContainer { offset, reason } => Error::MalformedContainer {
            offset: base + offset,
            reason,
        },
        other => other,
    }
}

/// Insert `insert` before instruction `index` of `source`, writing the
/// patched container into `dst`. Returns the patched size, which is always
/// `source.len() + insert.len()`.
///
/// `index` ranges over `0..=record_count`; the upper bound appends after the
/// last instruction. Fails without writing to `dst` if the container is
/// malformed, has no instruction chunk, contains a custom-data block, or if
/// the index, stream alignment or `dst` capacity is wrong.
pub fn patch(
    source: &[u8],
    insert: &[u8],
    index: usize,
    dst: &mut [u8],
    options: &PatchOptions,
    diagnostics: &mut dyn Diagnostics,
) -> Result<usize> {
    patch_many(
        source,
        &[Insertion {
            index,
            stream: insert,
        }],
        dst,
        options,
        diagnostics,
    )
}

/// [`patch`] into a freshly allocated buffer.
pub fn patch_to_vec(
    source: &[u8],
    insert: &[u8],
    index: usize,
    options: &PatchOptions,
    diagnostics: &mut dyn Diagnostics,
) -> Result<Vec<u8>> {
    let mut dst = vec![0u8; source.len() + insert.len()];
    let len = patch(source, insert, index, &mut dst, options, diagnostics)?;
    dst.truncate(len);
    Ok(dst)
}

/// Apply several insertions in one pass.
///
/// Every index refers to the source numbering. Insertions at the same index
/// land in the order given. The result equals applying them one at a time
/// from the highest index down.
pub fn patch_many(
    source: &[u8],
    insertions: &[Insertion<'_>],
    dst: &mut [u8],
    options: &PatchOptions,
    diagnostics: &mut dyn Diagnostics,
) -> Result<usize> {
    patch_many_with(source, insertions, dst, options, diagnostics, &DxbcChecksum)
}

/// [`patch_many`] with a caller-supplied checksum engine.
pub fn patch_many_with(
    source: &[u8],
    insertions: &[Insertion<'_>],
    dst: &mut [u8],
    options: &PatchOptions,
    diagnostics: &mut dyn Diagnostics,
    checksum: &dyn Checksum,
) -> Result<usize> {
    for ins in insertions {
        if !ins.stream.len().is_multiple_of(4) {
            return Err(Error::InvalidStreamAlignment {
                size: ins.stream.len(),
            });
        }
    }

    if options.dump_disassembly {
        diagnostics.disassembly(source);
    }

    let program = ShaderProgram::parse(source)?;

    if options.dump_raw_opcodes {
        for (i, rec) in program.records().iter().enumerate() {
            diagnostics.opcode(i, rec);
        }
    }
    if (program.chunk().tag == SHEX_TAG) != program.version().uses_shex() {
        diagnostics.warning(&format!(
            "{} chunk holds a {} program",
            program.chunk().tag_str(),
            program.version()
        ));
    }

    if let Some(rec) = program.custom_data() {
        return Err(Error::UnsupportedOpcodeClass {
            offset: program.tokens_start() + rec.offset,
            class: rec.custom_data_class.map_or(0, |c| c.as_u32()),
        });
    }

    // Absolute split point per insertion, in output order.
    let mut splits = Vec::with_capacity(insertions.len());
    for ins in insertions {
        splits.push((program.boundary(ins.index)?, ins.stream));
    }
    splits.sort_by_key(|&(at, _)| at);

    let inserted: usize = insertions.iter().map(|i| i.stream.len()).sum();
    let new_len = source.len() + inserted;
    let delta = u32::try_from(inserted)
        .ok()
        .filter(|_| u32::try_from(new_len).is_ok())
        .ok_or_else(|| {
            Error::malformed(
                TOTAL_SIZE_OFFSET,
                format!("patched size {new_len} does not fit the 32-bit size field"),
            )
        })?;
    if dst.len() < new_len {
        return Err(Error::BufferTooSmall {
            need: new_len,
            have: dst.len(),
        });
    }

    // Splice: unaffected runs of source bytes interleaved with the new streams.
    let out = &mut dst[..new_len];
    let mut src_pos = 0;
    let mut dst_pos = 0;
    for (at, stream) in splits {
        let run = at - src_pos;
        out[dst_pos..dst_pos + run].copy_from_slice(&source[src_pos..at]);
        dst_pos += run;
        out[dst_pos..dst_pos + stream.len()].copy_from_slice(stream);
        dst_pos += stream.len();
        src_pos = at;
    }
    out[dst_pos..].copy_from_slice(&source[src_pos..]);

    rebuild_metadata(out, &program, delta)?;
    write_checksum(out, checksum);

    Ok(new_len)
}

/// Shift every size and offset field that sits past the instruction stream.
fn rebuild_metadata(out: &mut [u8], program: &ShaderProgram<'_>, delta: u32) -> Result<()> {
    add_u32_at(out, TOTAL_SIZE_OFFSET, delta)?;

    for i in program.shader_index() + 1..program.index().len() {
        add_u32_at(out, HEADER_SIZE + i * 4, delta)?;
    }

    let chunk = program.chunk();
    add_u32_at(out, chunk.offset + 4, delta)?;
    add_u32_at(out, chunk.data_offset() + 4, delta / 4)?;
    Ok(())
}
