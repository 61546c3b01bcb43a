//! Observation hooks for the patch operation.
//!
//! Nothing here affects the patched bytes. `patch` reports what it sees to a
//! [`Diagnostics`] sink, gated by [`PatchOptions`](crate::patch::PatchOptions).

use crate::bytecode::decode::OpcodeRecord;
use crate::bytecode::opcode::opcode_name;

/// Sink for the optional debug output of a patch.
///
/// Every method has a no-op default, so an implementation only overrides the
/// events it cares about.
pub trait Diagnostics {
    /// The source container, before patching. Called only when
    /// `PatchOptions::dump_disassembly` is set.
    fn disassembly(&mut self, _container: &[u8]) {}

    /// One decoded record of the source token stream, in stream order.
    /// Called only when `PatchOptions::dump_raw_opcodes` is set.
    fn opcode(&mut self, _index: usize, _record: &OpcodeRecord<'_>) {}

    /// A non-fatal observation about the input.
    fn warning(&mut self, _message: &str) {}
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoDiagnostics;

impl Diagnostics for NoDiagnostics {}

/// Turns a container into human-readable assembly.
///
/// The crate has no disassembler of its own. Callers plug one in, usually an
/// external tool such as the system shader compiler.
pub trait Disassembler {
    /// `None` when the container could not be disassembled.
    fn disassemble(&self, container: &[u8]) -> Option<String>;
}

fn unavailable(container: &[u8]) -> String {
    format!("no disassembly available ({} byte container)", container.len())
}

/// Prints to stderr with `[tag]` prefixes.
#[derive(Default)]
pub struct StderrDiagnostics {
    disassembler: Option<Box<dyn Disassembler>>,
}

impl StderrDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_disassembler(disassembler: Box<dyn Disassembler>) -> Self {
        Self {
            disassembler: Some(disassembler),
        }
    }
}

impl Diagnostics for StderrDiagnostics {
    fn disassembly(&mut self, container: &[u8]) {
        match self.disassembler.as_ref().and_then(|d| d.disassemble(container)) {
            Some(text) => eprintln!("{text}"),
            None => eprintln!("[disasm] {}", unavailable(container)),
        }
    }

    fn opcode(&mut self, index: usize, record: &OpcodeRecord<'_>) {
        eprintln!("{}", format_record(index, record));
    }

    fn warning(&mut self, message: &str) {
        eprintln!("[warn] {message}");
    }
}

/// Collects output in memory, for writing to a file afterwards.
#[derive(Default)]
pub struct BufferedDiagnostics {
    disassembler: Option<Box<dyn Disassembler>>,
    /// Disassembler output for the source container.
    pub disassembly: Option<String>,
    pub opcodes: Vec<String>,
    pub warnings: Vec<String>,
}

impl BufferedDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_disassembler(disassembler: Box<dyn Disassembler>) -> Self {
        Self {
            disassembler: Some(disassembler),
            ..Self::default()
        }
    }
}

impl Diagnostics for BufferedDiagnostics {
    fn disassembly(&mut self, container: &[u8]) {
        match self.disassembler.as_ref().and_then(|d| d.disassemble(container)) {
            Some(text) => self.disassembly = Some(text),
            None => self.warnings.push(unavailable(container)),
        }
    }

    fn opcode(&mut self, index: usize, record: &OpcodeRecord<'_>) {
        self.opcodes.push(format_record(index, record));
    }

    fn warning(&mut self, message: &str) {
        self.warnings.push(message.to_string());
    }
}

/// One line of the raw-opcode listing.
///
/// `NNN. [offset: OOOOO, length: LL]\tNAME\t{ w0 w1 ... }`, where the offset
/// is relative to the token stream and the length is in bytes.
pub fn format_record(index: usize, record: &OpcodeRecord<'_>) -> String {
    let words: Vec<String> = record.words().map(|w| w.to_string()).collect();
    format!(
        "{index:03}. [offset: {:05}, length: {:02}]\t{}\t{{ {} }}",
        record.offset,
        record.byte_len(),
        opcode_name(record.code),
        words.join(" ")
    )
}
