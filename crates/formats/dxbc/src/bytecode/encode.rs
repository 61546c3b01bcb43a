use crate::bytecode::decode::OpcodeRecord;
use crate::bytecode::opcode::OpcodeType;

/// Build an instruction token: opcode type in bits 0-10, length in bits 24-30.
///
/// `length` is the full instruction length in words and is masked to 7 bits.
pub fn instruction(opcode: OpcodeType, length: u32) -> u32 {
    (opcode.code() as u32) | ((length & 0x7F) << 24)
}

/// Single-word `nop` (0x0100003a).
pub fn nop() -> u32 {
    instruction(OpcodeType::Nop, 1)
}

/// Single-word `ret` (0x0100003e).
pub fn ret() -> u32 {
    instruction(OpcodeType::Ret, 1)
}

/// `dcl_globalFlags` with no flags set (0x0100006a).
pub fn dcl_global_flags() -> u32 {
    instruction(OpcodeType::DclGlobalFlags, 1)
}

/// `dcl_temps n`.
pub fn dcl_temps(count: u32) -> [u32; 2] {
    [instruction(OpcodeType::DclTemps, 2), count]
}

/// Serialize words as a little-endian byte stream, the form `patch` accepts.
pub fn to_bytes(words: &[u32]) -> Vec<u8> {
    let mut out = Vec::with_capacity(words.len() * 4);
    for w in words {
        out.extend_from_slice(&w.to_le_bytes());
    }
    out
}

/// Re-encode decoded records back into a token stream.
///
/// This is the inverse of `decode::decode`: records are copied verbatim, so
/// decoding a stream and encoding the result reproduces the input.
pub fn encode(records: &[OpcodeRecord<'_>]) -> Vec<u8> {
    let mut out = Vec::with_capacity(records.iter().map(OpcodeRecord::byte_len).sum());
    for rec in records {
        out.extend_from_slice(rec.bytes);
    }
    out
}
