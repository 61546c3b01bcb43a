mod disasm;
mod manifest;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use dxbc::bytecode::OpcodeType;
use dxbc::checksum::verify_checksum;
use dxbc::diagnostics::{BufferedDiagnostics, format_record};
use dxbc::{Insertion, PatchOptions, ShaderProgram, StderrDiagnostics, patch_many};

use crate::disasm::ExternalDisassembler;
use crate::manifest::load_manifest;

#[derive(Parser)]
#[command(name = "dxbc-patch", about = "Splice instruction streams into compiled DXBC shaders")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show the container header, chunk table and program summary.
    Info {
        /// Path to a compiled shader.
        file: PathBuf,
    },
    /// List the decoded instructions of the program.
    Dump {
        /// Path to a compiled shader.
        file: PathBuf,
        /// Write the listing here instead of stdout.
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Insert one token stream before an instruction.
    Patch {
        /// Path to a compiled shader.
        file: PathBuf,
        /// Raw little-endian token file to insert.
        #[arg(long, required_unless_present = "words", conflicts_with = "words")]
        stream: Option<PathBuf>,
        /// Tokens to insert, comma separated (decimal or 0x-prefixed hex).
        #[arg(long, value_delimiter = ',', value_parser = parse_word)]
        words: Vec<u32>,
        /// Instruction number to insert before; the instruction count appends.
        #[arg(long)]
        index: usize,
        /// Output path.
        #[arg(short, long)]
        output: PathBuf,
        /// Print every source instruction to stderr.
        #[arg(long)]
        dump_raw_opcodes: bool,
        /// Disassemble the source container before patching.
        #[arg(long)]
        dump_disassembly: bool,
        /// Program that reads a container on stdin and prints its disassembly.
        #[arg(long, value_name = "PROGRAM", requires = "dump_disassembly")]
        disassembler: Option<PathBuf>,
        /// Extra argument for the disassembler (repeatable).
        #[arg(long = "disassembler-arg", value_name = "ARG", allow_hyphen_values = true, requires = "disassembler")]
        disassembler_args: Vec<String>,
        /// Collect dumps and warnings into this file instead of stderr.
        #[arg(long = "dump-file")]
        dump_file: Option<PathBuf>,
    },
    /// Apply a batch of insertions described by a JSON manifest.
    Apply {
        /// Path to the patch manifest.
        #[arg(default_value = "patch.json")]
        manifest: PathBuf,
    },
}

fn parse_word(s: &str) -> std::result::Result<u32, String> {
    let s = s.trim();
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|e| format!("invalid token {s:?}: {e}"))
}

fn read_shader(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).with_context(|| format!("failed to read shader: {}", path.display()))
}

fn cmd_info(file: &Path) -> Result<()> {
    let data = read_shader(file)?;
    let program = ShaderProgram::parse(&data)
        .with_context(|| format!("failed to parse shader: {}", file.display()))?;
    let header = program.index().header();

    println!("Container: {}", file.display());
    println!("Version:   {}", header.version);
    println!("Size:      {} bytes", header.total_size);
    println!(
        "Checksum:  {} ({})",
        hex(&header.checksum),
        if verify_checksum(&data) { "ok" } else { "MISMATCH" }
    );
    println!("Chunks:");
    for (i, chunk) in program.index().chunks().iter().enumerate() {
        let marker = if i == program.shader_index() { " *" } else { "" };
        println!(
            "  {i:2}. {} @ {:#07x}, {} bytes{marker}",
            chunk.tag_str(),
            chunk.offset,
            chunk.size
        );
    }
    println!("Program:   {}", program.version());
    println!("Words:     {}", program.declared_words());
    let declarations = program
        .records()
        .iter()
        .filter(|r| r.opcode().is_some_and(OpcodeType::is_declaration))
        .count();
    println!(
        "Instructions: {} ({declarations} declarations)",
        program.records().len()
    );
    if let Some(rec) = program.custom_data() {
        println!("Custom data at token offset {:#x} (patching unsupported)", rec.offset);
    }
    Ok(())
}

fn cmd_dump(file: &Path, out: Option<&Path>) -> Result<()> {
    let data = read_shader(file)?;
    let program = ShaderProgram::parse(&data)
        .with_context(|| format!("failed to parse shader: {}", file.display()))?;

    let mut listing = String::new();
    for (i, rec) in program.records().iter().enumerate() {
        listing.push_str(&format_record(i, rec));
        listing.push('\n');
    }

    match out {
        Some(path) => {
            fs::write(path, &listing).with_context(|| format!("failed to write {}", path.display()))?;
            eprintln!("[dump] {} instructions -> {}", program.records().len(), path.display());
        }
        None => print!("{listing}"),
    }
    Ok(())
}

/// Where the diagnostics of a patch go.
#[derive(Debug, Default)]
struct DumpTarget {
    file: Option<PathBuf>,
    disassembler: Option<ExternalDisassembler>,
}

/// Run the patch and write the result, reporting dumps either to stderr or a file.
fn run_patch(
    input: &Path,
    streams: &[(usize, Vec<u8>)],
    output: &Path,
    options: &PatchOptions,
    dump: DumpTarget,
) -> Result<()> {
    let data = read_shader(input)?;
    let insertions: Vec<Insertion<'_>> = streams
        .iter()
        .map(|(index, stream)| Insertion {
            index: *index,
            stream: stream.as_slice(),
        })
        .collect();
    let inserted: usize = streams.iter().map(|(_, s)| s.len()).sum();
    let mut dst = vec![0u8; data.len() + inserted];

    let len = match dump.file {
        Some(path) => {
            let mut sink = match dump.disassembler {
                Some(d) => BufferedDiagnostics::with_disassembler(Box::new(d)),
                None => BufferedDiagnostics::new(),
            };
            let result = patch_many(&data, &insertions, &mut dst, options, &mut sink);
            write_dump(&path, &sink)?;
            result
        }
        None => {
            let mut sink = match dump.disassembler {
                Some(d) => StderrDiagnostics::with_disassembler(Box::new(d)),
                None => StderrDiagnostics::new(),
            };
            patch_many(&data, &insertions, &mut dst, options, &mut sink)
        }
    }
    .with_context(|| format!("failed to patch {}", input.display()))?;

    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
    }
    fs::write(output, &dst[..len]).with_context(|| format!("failed to write {}", output.display()))?;
    eprintln!(
        "[patch] {} -> {} (+{} bytes, {} insertion(s))",
        input.display(),
        output.display(),
        inserted,
        streams.len()
    );
    Ok(())
}

fn write_dump(path: &Path, sink: &BufferedDiagnostics) -> Result<()> {
    let mut text = String::new();
    if let Some(listing) = &sink.disassembly {
        text.push_str(listing);
        if !listing.ends_with('\n') {
            text.push('\n');
        }
    }
    for line in &sink.opcodes {
        text.push_str(line);
        text.push('\n');
    }
    for warning in &sink.warnings {
        text.push_str(&format!("// warning: {warning}\n"));
    }
    fs::write(path, text).with_context(|| format!("failed to write dump: {}", path.display()))?;
    eprintln!("[dump] wrote {}", path.display());
    Ok(())
}

fn cmd_apply(manifest_path: &Path) -> Result<()> {
    let manifest = load_manifest(manifest_path)?;
    if manifest.insertions.is_empty() {
        bail!("manifest {} lists no insertions", manifest_path.display());
    }

    let mut streams = Vec::with_capacity(manifest.insertions.len());
    for ins in &manifest.insertions {
        streams.push((ins.index, ins.source.load()?));
    }
    let options = PatchOptions {
        dump_disassembly: manifest.dump_disassembly,
        dump_raw_opcodes: manifest.dump_raw_opcodes,
    };
    let dump = DumpTarget {
        file: manifest.dump_file,
        disassembler: manifest
            .disassembler
            .map(|program| ExternalDisassembler::new(program, manifest.disassembler_args)),
    };
    run_patch(&manifest.input, &streams, &manifest.output, &options, dump)
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match &cli.command {
        Command::Info { file } => cmd_info(file),
        Command::Dump { file, out } => cmd_dump(file, out.as_deref()),
        Command::Patch {
            file,
            stream,
            words,
            index,
            output,
            dump_raw_opcodes,
            dump_disassembly,
            disassembler,
            disassembler_args,
            dump_file,
        } => {
            let bytes = match stream {
                Some(path) => fs::read(path).with_context(|| format!("failed to read stream: {}", path.display()))?,
                None => words.iter().flat_map(|w| w.to_le_bytes()).collect(),
            };
            let options = PatchOptions {
                dump_disassembly: *dump_disassembly,
                dump_raw_opcodes: *dump_raw_opcodes,
            };
            let dump = DumpTarget {
                file: dump_file.clone(),
                disassembler: disassembler
                    .as_ref()
                    .map(|program| ExternalDisassembler::new(program, disassembler_args.clone())),
            };
            run_patch(file, &[(*index, bytes)], output, &options, dump)
        }
        Command::Apply { manifest } => cmd_apply(manifest),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_decimal_and_hex_words() {
        assert_eq!(parse_word("16777274"), Ok(0x0100_003a));
        assert_eq!(parse_word("0x0100003e"), Ok(0x0100_003e));
        assert_eq!(parse_word(" 0X6A "), Ok(0x6a));
        assert!(parse_word("ret").is_err());
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn patch_accepts_word_list() {
        let cli = Cli::try_parse_from([
            "dxbc-patch", "patch", "ps.dxbc", "--words", "0x0100003a,0x0100003a", "--index", "1", "-o", "out.dxbc",
        ])
        .unwrap();
        match cli.command {
            Command::Patch { words, index, stream, .. } => {
                assert_eq!(words, [0x0100_003a, 0x0100_003a]);
                assert_eq!(index, 1);
                assert!(stream.is_none());
            }
            _ => panic!("expected patch"),
        }
    }

    #[test]
    fn patch_requires_a_stream() {
        assert!(Cli::try_parse_from(["dxbc-patch", "patch", "ps.dxbc", "--index", "0", "-o", "o"]).is_err());
    }

    #[test]
    fn disassembler_options() {
        let cli = Cli::try_parse_from([
            "dxbc-patch", "patch", "ps.dxbc", "--words", "0x0100003a", "--index", "0", "-o", "out.dxbc",
            "--dump-disassembly", "--disassembler", "fxc", "--disassembler-arg", "/dumpbin",
            "--disassembler-arg", "-",
        ])
        .unwrap();
        match cli.command {
            Command::Patch { disassembler, disassembler_args, .. } => {
                assert_eq!(disassembler, Some(PathBuf::from("fxc")));
                assert_eq!(disassembler_args, ["/dumpbin", "-"]);
            }
            _ => panic!("expected patch"),
        }

        let without_dump = Cli::try_parse_from([
            "dxbc-patch", "patch", "ps.dxbc", "--words", "0x0100003a", "--index", "0", "-o", "out.dxbc",
            "--disassembler", "fxc",
        ]);
        assert!(without_dump.is_err());
    }

    #[cfg(unix)]
    #[test]
    fn dump_file_holds_disassembly() {
        use dxbc::ShaderVersion;
        use dxbc::bytecode::encode::{dcl_global_flags, nop, ret, to_bytes};
        use dxbc::checksum::verify_checksum;
        use dxbc::version::ProgramType;
        use dxbc::writer::{OutputChunk, assemble_container, shader_chunk};

        let dir = tempfile::tempdir().unwrap();
        let version = ShaderVersion {
            major: 5,
            minor: 0,
            program_type: ProgramType::Pixel,
        };
        let tokens = [dcl_global_flags(), ret()];
        let source = assemble_container(&[OutputChunk::new(*b"SHEX", shader_chunk(version, &tokens))]);
        let input = dir.path().join("ps.dxbc");
        let output = dir.path().join("out/ps.dxbc");
        let dump_file = dir.path().join("ps.txt");
        fs::write(&input, &source).unwrap();

        let options = PatchOptions {
            dump_disassembly: true,
            dump_raw_opcodes: true,
        };
        let dump = DumpTarget {
            file: Some(dump_file.clone()),
            disassembler: Some(ExternalDisassembler::new(
                "sh",
                vec!["-c".into(), "printf 'ps_5_0 %s bytes' $(wc -c | tr -d ' ')".into()],
            )),
        };
        let streams = [(1, to_bytes(&[nop()]))];
        run_patch(&input, &streams, &output, &options, dump).unwrap();

        let text = fs::read_to_string(&dump_file).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some(format!("ps_5_0 {} bytes", source.len()).as_str()));
        assert!(lines.next().unwrap().contains("\tdcl_global_flags\t"));
        assert!(lines.next().unwrap().contains("\tret\t"));
        assert_eq!(lines.next(), None);

        let patched = fs::read(&output).unwrap();
        assert_eq!(patched.len(), source.len() + 4);
        assert!(verify_checksum(&patched));
    }
}
