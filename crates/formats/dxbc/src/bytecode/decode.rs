use crate::bytecode::opcode::{CustomDataClass, OpcodeType};
use crate::error::{Error, Result};

/// Opcode-type field of an instruction token.
const OPCODE_TYPE_MASK: u32 = 0x0000_07FF;
/// Instruction length in words, header token included.
const LENGTH_MASK: u32 = 0x7F00_0000;
const LENGTH_SHIFT: u32 = 24;
/// Set when one or more extended opcode tokens follow the first token.
const EXTENDED_BIT: u32 = 0x8000_0000;
/// Custom-data class field of a custom-data block's first word.
const CUSTOM_DATA_CLASS_SHIFT: u32 = 11;

/// One decoded instruction (or custom-data block) of the token stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpcodeRecord<'a> {
    /// Byte offset from the start of the token stream.
    pub offset: usize,
    /// Raw opcode-type code (bits 0-10 of the first token).
    pub code: u16,
    /// Length in 32-bit words, first token included.
    pub length: usize,
    /// Extended-opcode flag (bit 31). The extra tokens are counted in `length`.
    pub extended: bool,
    /// Class of a custom-data block; `None` for ordinary instructions.
    pub custom_data_class: Option<CustomDataClass>,
    /// The instruction's bytes in the source stream.
    pub bytes: &'a [u8],
}

impl OpcodeRecord<'_> {
    /// Known opcode type, or `None` for codes outside the D3D11 set.
    pub fn opcode(&self) -> Option<OpcodeType> {
        OpcodeType::from_code(self.code)
    }

    pub fn byte_len(&self) -> usize {
        self.length * 4
    }

    /// Offset one past the record's last byte.
    pub fn end(&self) -> usize {
        self.offset + self.byte_len()
    }

    /// The record's tokens as little-endian words.
    pub fn words(&self) -> impl Iterator<Item = u32> + '_ {
        self.bytes
            .chunks_exact(4)
            .map(|w| u32::from_le_bytes([w[0], w[1], w[2], w[3]]))
    }
}

/// Decode the instruction token stream of a shader chunk.
///
/// `tokens` is the stream without the version and length tokens; its length
/// must be a multiple of 4. Records come back in stream order, contiguous and
/// non-overlapping, and their byte lengths sum to `tokens.len()`.
///
/// Custom-data blocks are skipped structurally (their length comes from the
/// second word) and recorded with their class; their payload is never read.
pub fn decode(tokens: &[u8]) -> Result<Vec<OpcodeRecord<'_>>> {
    if !tokens.len().is_multiple_of(4) {
        return Err(Error::malformed(
            tokens.len(),
            format!("token stream length {} is not word aligned", tokens.len()),
        ));
    }

    let mut records = Vec::new();
    let mut pos = 0;

    while pos < tokens.len() {
        let word = read_word(tokens, pos)?;
        let code = (word & OPCODE_TYPE_MASK) as u16;

        let is_custom_data = OpcodeType::from_code(code).is_some_and(OpcodeType::is_custom_data);
        let (length, extended, custom_data_class) = if is_custom_data {
            let block_len = read_word(tokens, pos + 4)? as usize;
            if block_len < 2 {
                return Err(Error::malformed(
                    pos,
                    format!("custom-data block in token stream declares {block_len} words (minimum 2)"),
                ));
            }
            let class = CustomDataClass::from_u32(word >> CUSTOM_DATA_CLASS_SHIFT);
            (block_len, false, Some(class))
        } else {
            let length = ((word & LENGTH_MASK) >> LENGTH_SHIFT) as usize;
            if length == 0 {
                return Err(Error::malformed(
                    pos,
                    format!("zero-length instruction {word:#010x} in token stream"),
                ));
            }
            (length, word & EXTENDED_BIT != 0, None)
        };

        let end = length
            .checked_mul(4)
            .and_then(|n| pos.checked_add(n))
            .filter(|&end| end <= tokens.len())
            .ok_or_else(|| {
                Error::malformed(
                    pos,
                    format!(
                        "instruction of {length} words runs past end of token stream ({} bytes)",
                        tokens.len()
                    ),
                )
            })?;

        records.push(OpcodeRecord {
            offset: pos,
            code,
            length,
            extended,
            custom_data_class,
            bytes: &tokens[pos..end],
        });
        pos = end;
    }

    Ok(records)
}

fn read_word(tokens: &[u8], pos: usize) -> Result<u32> {
    if pos + 4 > tokens.len() {
        return Err(Error::malformed(
            pos,
            format!("truncated token in token stream ({} bytes remaining)", tokens.len() - pos.min(tokens.len())),
        ));
    }
    Ok(u32::from_le_bytes([
        tokens[pos],
        tokens[pos + 1],
        tokens[pos + 2],
        tokens[pos + 3],
    ]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode::encode as token;

    fn stream(words: &[u32]) -> Vec<u8> {
        words.iter().flat_map(|w| w.to_le_bytes()).collect()
    }

    #[test]
    fn decodes_single_word_instructions() {
        let bytes = stream(&[
            token::instruction(OpcodeType::DclGlobalFlags, 1),
            token::instruction(OpcodeType::Ret, 1),
        ]);
        let records = decode(&bytes).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].opcode(), Some(OpcodeType::DclGlobalFlags));
        assert_eq!(records[0].offset, 0);
        assert_eq!(records[1].opcode(), Some(OpcodeType::Ret));
        assert_eq!(records[1].offset, 4);
    }

    #[test]
    fn multi_word_instruction_advances_by_length() {
        // mov r0.xyzw, l(1.0, 1.0, 1.0, 1.0): 8 words
        let mut words = vec![token::instruction(OpcodeType::Mov, 8)];
        words.extend_from_slice(&[0x0010_00F2, 0, 0x0000_4001, 0x3F80_0000, 0x3F80_0000, 0x3F80_0000, 0x3F80_0000]);
        words.push(token::instruction(OpcodeType::Ret, 1));
        let bytes = stream(&words);

        let records = decode(&bytes).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].length, 8);
        assert_eq!(records[0].bytes.len(), 32);
        assert_eq!(records[1].offset, 32);
        let total: usize = records.iter().map(OpcodeRecord::byte_len).sum();
        assert_eq!(total, bytes.len());
    }

    #[test]
    fn extended_flag_is_recorded() {
        let word = token::instruction(OpcodeType::Sample, 2) | EXTENDED_BIT;
        let bytes = stream(&[word, 0x0000_0001]);
        let records = decode(&bytes).unwrap();
        assert!(records[0].extended);
        assert_eq!(records[0].length, 2);
    }

    #[test]
    fn custom_data_block_is_skipped_structurally() {
        let icb_class = 3u32 << CUSTOM_DATA_CLASS_SHIFT;
        let bytes = stream(&[
            OpcodeType::Customdata.code() as u32 | icb_class,
            4,
            0xDEAD_BEEF,
            0xFFFF_FFFF,
            token::instruction(OpcodeType::Ret, 1),
        ]);
        let records = decode(&bytes).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].length, 4);
        assert_eq!(
            records[0].custom_data_class,
            Some(CustomDataClass::ImmediateConstantBuffer)
        );
        assert!(!records[0].extended);
        assert_eq!(records[1].offset, 16);
    }

    #[test]
    fn empty_custom_data_block() {
        let bytes = stream(&[OpcodeType::Customdata.code() as u32, 2]);
        let records = decode(&bytes).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].length, 2);
    }

    #[test]
    fn custom_data_length_below_two_rejected() {
        let bytes = stream(&[OpcodeType::Customdata.code() as u32, 1]);
        assert!(decode(&bytes).is_err());
    }

    #[test]
    fn zero_length_instruction_rejected() {
        let bytes = stream(&[OpcodeType::Nop.code() as u32]);
        assert!(decode(&bytes).is_err());
    }

    #[test]
    fn overlong_instruction_rejected() {
        let bytes = stream(&[token::instruction(OpcodeType::Mov, 5), 0]);
        assert!(decode(&bytes).is_err());
    }

    #[test]
    fn unaligned_stream_rejected() {
        assert!(decode(&[0x3E, 0, 0, 1, 0]).is_err());
    }

    #[test]
    fn unknown_code_still_decodes() {
        let bytes = stream(&[(1 << 24) | 0x3FF]);
        let records = decode(&bytes).unwrap();
        assert_eq!(records[0].code, 0x3FF);
        assert_eq!(records[0].opcode(), None);
    }

    #[test]
    fn empty_stream() {
        assert!(decode(&[]).unwrap().is_empty());
    }
}
