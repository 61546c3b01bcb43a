use dxbc::bytecode::encode::{dcl_global_flags, dcl_temps, nop, ret, to_bytes};
use dxbc::bytecode::{OpcodeType, decode};
use dxbc::checksum::verify_checksum;
use dxbc::diagnostics::BufferedDiagnostics;
use dxbc::reader::{ChunkIndex, TOTAL_SIZE_OFFSET};
use dxbc::version::ProgramType;
use dxbc::writer::{OutputChunk, assemble_container, shader_chunk};
use dxbc::{ErrorKind, NoDiagnostics, PatchOptions, ShaderProgram, ShaderVersion, patch, patch_to_vec};

const VS_4_0: ShaderVersion = ShaderVersion {
    major: 4,
    minor: 0,
    program_type: ProgramType::Vertex,
};

/// A container shaped like fxc output: signatures around the program, stats after it.
fn vertex_shader(tokens: &[u32]) -> Vec<u8> {
    assemble_container(&[
        OutputChunk::new(*b"RDEF", vec![0x01; 44]),
        OutputChunk::new(*b"ISGN", vec![0x02; 30]),
        OutputChunk::new(*b"OSGN", vec![0x03; 32]),
        OutputChunk::new(*b"SHDR", shader_chunk(VS_4_0, tokens)),
        OutputChunk::new(*b"STAT", vec![0x04; 116]),
    ])
}

fn load_if_exists(path: &str) -> Option<Vec<u8>> {
    std::fs::read(path).ok()
}

#[test]
fn declaration_nop_return() {
    let data = vertex_shader(&[dcl_global_flags(), ret()]);
    let out = patch_to_vec(&data, &to_bytes(&[nop()]), 1, &PatchOptions::default(), &mut NoDiagnostics)
        .expect("patch failed");

    assert_eq!(out.len(), data.len() + 4);
    let program = ShaderProgram::parse(&out).expect("patched container must parse");
    assert_eq!(program.declared_words(), 5);
    let names: Vec<&str> = program
        .records()
        .iter()
        .map(|r| r.opcode().map_or("?", OpcodeType::name))
        .collect();
    assert_eq!(names, ["dcl_global_flags", "nop", "ret"]);
    assert_eq!(program.records()[1].offset, 4);
    assert!(verify_checksum(&out));
}

#[test]
fn prefix_and_suffix_records_are_preserved() {
    let mut tokens = dcl_temps(4).to_vec();
    tokens.push(dcl_global_flags());
    tokens.push(nop());
    tokens.push(ret());
    let data = vertex_shader(&tokens);
    let insert = to_bytes(&[nop(), nop(), nop()]);

    let source = ShaderProgram::parse(&data).unwrap();
    for k in 0..=source.records().len() {
        let out = patch_to_vec(&data, &insert, k, &PatchOptions::default(), &mut NoDiagnostics).unwrap();
        let patched = ShaderProgram::parse(&out).unwrap();
        let start = source.tokens_start();

        for rec in &source.records()[..k] {
            let at = start + rec.offset;
            assert_eq!(&out[at..at + rec.byte_len()], rec.bytes);
        }
        for rec in &source.records()[k..] {
            let at = start + rec.offset + insert.len();
            assert_eq!(&out[at..at + rec.byte_len()], rec.bytes);
        }
        assert_eq!(patched.records().len(), source.records().len() + 3);
    }
}

#[test]
fn chunk_table_and_sizes_follow_insert() {
    let data = vertex_shader(&[dcl_global_flags(), ret()]);
    let before = ChunkIndex::parse(&data).unwrap();
    let insert = to_bytes(&[nop(); 5]);

    let out = patch_to_vec(&data, &insert, 0, &PatchOptions::default(), &mut NoDiagnostics).unwrap();
    let after = ChunkIndex::parse(&out).unwrap();

    assert_eq!(after.header().total_size as usize, data.len() + 20);
    assert_eq!(after.header().version, before.header().version);
    for (b, a) in before.chunks().iter().zip(after.chunks()) {
        assert_eq!(a.tag, b.tag);
        if &b.tag == b"STAT" {
            assert_eq!(a.offset, b.offset + 20);
        } else {
            assert_eq!(a.offset, b.offset);
        }
        if &b.tag == b"SHDR" {
            assert_eq!(a.size, b.size + 20);
        } else {
            assert_eq!(a.size, b.size);
            assert_eq!(after.chunk_data(&out, a).unwrap(), before.chunk_data(&data, b).unwrap());
        }
    }
}

#[test]
fn checksum_changes_with_content() {
    let data = vertex_shader(&[ret()]);
    let same = patch_to_vec(&data, &[], 0, &PatchOptions::default(), &mut NoDiagnostics).unwrap();
    let grown = patch_to_vec(&data, &to_bytes(&[nop()]), 0, &PatchOptions::default(), &mut NoDiagnostics)
        .unwrap();
    assert_eq!(same[4..20], data[4..20]);
    assert_ne!(grown[4..20], data[4..20]);
}

#[test]
fn failures_do_not_write() {
    let data = vertex_shader(&[dcl_global_flags(), ret()]);
    let nop_bytes = to_bytes(&[nop()]);
    let cases: [(&[u8], usize, usize, ErrorKind); 3] = [
        (&nop_bytes[..], 7, 4, ErrorKind::InvalidInsertionIndex),
        (&nop_bytes[..2], 0, 2, ErrorKind::InvalidStreamAlignment),
        (&nop_bytes[..], 0, 0, ErrorKind::BufferTooSmall),
    ];
    for (insert, index, extra, kind) in cases {
        let mut dst = vec![0x5A; data.len() + extra];
        let err = patch(&data, insert, index, &mut dst, &PatchOptions::default(), &mut NoDiagnostics)
            .unwrap_err();
        assert_eq!(err.kind(), kind);
        assert!(dst.iter().all(|&b| b == 0x5A), "{kind:?} wrote to dst");
    }
}

#[test]
fn truncated_container_is_malformed() {
    let mut data = vertex_shader(&[ret()]);
    data.truncate(data.len() - 4);
    let err = patch_to_vec(&data, &[], 0, &PatchOptions::default(), &mut NoDiagnostics).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedContainer);

    // Fix the size field and the last chunk now runs off the end.
    let len = data.len() as u32;
    data[TOTAL_SIZE_OFFSET..TOTAL_SIZE_OFFSET + 4].copy_from_slice(&len.to_le_bytes());
    let err = patch_to_vec(&data, &[], 0, &PatchOptions::default(), &mut NoDiagnostics).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedContainer);
}

#[test]
fn raw_opcode_dump() {
    let data = vertex_shader(&[dcl_global_flags(), ret()]);
    let options = PatchOptions {
        dump_raw_opcodes: true,
        ..PatchOptions::default()
    };
    let mut sink = BufferedDiagnostics::default();
    patch_to_vec(&data, &[], 0, &options, &mut sink).unwrap();
    assert_eq!(
        sink.opcodes,
        [
            "000. [offset: 00000, length: 04]\tdcl_global_flags\t{ 16777322 }",
            "001. [offset: 00004, length: 04]\tret\t{ 16777278 }",
        ]
    );
}

/// Real fxc output, when one is available locally.
#[test]
fn real_shader_round_trip() {
    let Ok(path) = std::env::var("DXBC_SAMPLE") else {
        eprintln!("skipping: DXBC_SAMPLE not set");
        return;
    };
    let Some(data) = load_if_exists(&path) else {
        eprintln!("skipping: {path} not found");
        return;
    };
    assert!(verify_checksum(&data), "stored checksum does not match");

    let program = ShaderProgram::parse(&data).expect("failed to parse sample");
    let tokens = &data[program.tokens_start()..program.tokens_end()];
    let total: usize = decode(tokens).unwrap().iter().map(|r| r.byte_len()).sum();
    assert_eq!(total, tokens.len());

    if program.custom_data().is_none() {
        let out = patch_to_vec(&data, &[], 0, &PatchOptions::default(), &mut NoDiagnostics).unwrap();
        assert_eq!(out, data);
    }
}
