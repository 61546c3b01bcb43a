//! Reader, writer and instruction patcher for compiled D3D shader containers (DXBC).
//!
//! Three-layer architecture:
//! - **Layer 1** (`reader`/`writer`): Raw chunk I/O: container header, chunk index
//! - **Layer 2** (`bytecode`): Opcode-type table and token stream decoding
//! - **Layer 3** (`patch`): Instruction insertion with size/offset fix-up and re-checksum

pub mod bytecode;
pub mod checksum;
pub mod cursor;
pub mod diagnostics;
pub mod error;
pub mod patch;
pub mod reader;
pub mod version;
pub mod writer;

pub use diagnostics::{Diagnostics, NoDiagnostics, StderrDiagnostics};
pub use error::{Error, ErrorKind, Result};
pub use patch::{Insertion, PatchOptions, ShaderProgram, patch, patch_many, patch_to_vec};
pub use reader::ChunkIndex;
pub use version::ShaderVersion;
