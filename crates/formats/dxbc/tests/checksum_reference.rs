//! Stored digests in `tests/fixtures/` were computed outside this crate, with
//! a separate MD5 implementation following the block layout of the DirectX
//! shader compiler's retail hash. Re-checksumming must reproduce them.

use dxbc::checksum::{Checksum, DxbcChecksum, verify_checksum, write_checksum};
use dxbc::reader::CHECKSUM_RANGE;
use dxbc::{NoDiagnostics, PatchOptions, ShaderProgram, patch_to_vec};

struct Fixture {
    name: &'static str,
    bytes: &'static [u8],
    digest: &'static str,
    hashed_tail: usize,
}

const FIXTURES: [Fixture; 3] = [
    Fixture {
        name: "ps_short_tail",
        bytes: include_bytes!("fixtures/ps_short_tail.dxbc"),
        digest: "aa2c27204c674dc16878bbb5fb87d123",
        hashed_tail: 40,
    },
    Fixture {
        name: "vs_long_tail",
        bytes: include_bytes!("fixtures/vs_long_tail.dxbc"),
        digest: "8bcd90efe893a4bedf29025772be3c70",
        hashed_tail: 60,
    },
    Fixture {
        name: "ps_boundary_tail",
        bytes: include_bytes!("fixtures/ps_boundary_tail.dxbc"),
        digest: "e3139e19092e514fd23d1468e5c2f522",
        hashed_tail: 56,
    },
];

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[test]
fn fixtures_cover_both_final_block_layouts() {
    for f in &FIXTURES {
        assert_eq!((f.bytes.len() - 20) % 64, f.hashed_tail, "{}", f.name);
    }
}

#[test]
fn stored_digests_verify() {
    for f in &FIXTURES {
        assert_eq!(hex(&f.bytes[CHECKSUM_RANGE]), f.digest, "{}", f.name);
        assert!(verify_checksum(f.bytes), "{}: stored checksum rejected", f.name);
    }
}

#[test]
fn rechecksum_reproduces_stored_digest() {
    for f in &FIXTURES {
        assert_eq!(hex(&DxbcChecksum.digest(f.bytes)), f.digest, "{}", f.name);

        let mut data = f.bytes.to_vec();
        data[CHECKSUM_RANGE].fill(0);
        write_checksum(&mut data, &DxbcChecksum);
        assert_eq!(data, f.bytes, "{}", f.name);
    }
}

#[test]
fn empty_patch_is_identity() {
    for f in &FIXTURES {
        ShaderProgram::parse(f.bytes).unwrap_or_else(|e| panic!("{}: {e}", f.name));
        let out = patch_to_vec(f.bytes, &[], 0, &PatchOptions::default(), &mut NoDiagnostics).unwrap();
        assert_eq!(out, f.bytes, "{}", f.name);
    }
}
