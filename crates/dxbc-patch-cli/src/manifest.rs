use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

/// Batch patch description (`patch.json`).
///
/// Insertion indices all refer to the instruction numbering of `input`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatchManifest {
    /// Source container.
    pub input: PathBuf,
    /// Where the patched container is written.
    pub output: PathBuf,
    pub insertions: Vec<InsertionSpec>,
    #[serde(default)]
    pub dump_raw_opcodes: bool,
    #[serde(default)]
    pub dump_disassembly: bool,
    /// External tool that turns the source container into a listing.
    #[serde(default)]
    pub disassembler: Option<PathBuf>,
    #[serde(default)]
    pub disassembler_args: Vec<String>,
    /// Collect dumps and warnings here instead of stderr.
    #[serde(default)]
    pub dump_file: Option<PathBuf>,
}

/// One stream to splice in before instruction `index`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsertionSpec {
    pub index: usize,
    #[serde(flatten)]
    pub source: StreamSource,
}

/// Where an insertion's token stream comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamSource {
    /// Raw little-endian token file.
    Stream(PathBuf),
    /// Tokens inline in the manifest.
    Words(Vec<u32>),
}

impl StreamSource {
    pub fn load(&self) -> Result<Vec<u8>> {
        match self {
            Self::Stream(path) => std::fs::read(path)
                .with_context(|| format!("failed to read stream: {}", path.display())),
            Self::Words(words) => Ok(words.iter().flat_map(|w| w.to_le_bytes()).collect()),
        }
    }
}

impl PatchManifest {
    /// Resolve relative paths against `base`.
    pub fn resolve_paths(&mut self, base: &Path) {
        if self.input.is_relative() {
            self.input = base.join(&self.input);
        }
        if self.output.is_relative() {
            self.output = base.join(&self.output);
        }
        if let Some(path) = &mut self.dump_file {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
        // Bare program names are looked up on PATH.
        if let Some(program) = &mut self.disassembler {
            if program.is_relative() && program.components().count() > 1 {
                *program = base.join(&*program);
            }
        }
        for ins in &mut self.insertions {
            if let StreamSource::Stream(path) = &mut ins.source {
                if path.is_relative() {
                    *path = base.join(&*path);
                }
            }
        }
    }
}

pub fn load_manifest(path: &Path) -> Result<PatchManifest> {
    if !path.exists() {
        bail!("manifest not found: {}", path.display());
    }
    let file = File::open(path).with_context(|| format!("failed to open manifest: {}", path.display()))?;
    let reader = BufReader::new(file);
    let mut manifest: PatchManifest =
        serde_json::from_reader(reader).with_context(|| format!("failed to parse manifest: {}", path.display()))?;

    if let Some(base) = path.canonicalize()?.parent() {
        manifest.resolve_paths(base);
    }
    Ok(manifest)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "input": "shaders/ps.dxbc",
        "output": "out/ps.dxbc",
        "insertions": [
            { "index": 3, "stream": "inject/marker.bin" },
            { "index": 0, "words": [16777274, 16777274] }
        ],
        "dump_raw_opcodes": true,
        "dump_disassembly": true,
        "disassembler": "tools/disasm.sh",
        "disassembler_args": ["--stdin"],
        "dump_file": "out/ps.txt"
    }"#;

    #[test]
    fn parses_both_stream_sources() {
        let manifest: PatchManifest = serde_json::from_str(SAMPLE).unwrap();
        assert_eq!(manifest.insertions.len(), 2);
        assert_eq!(
            manifest.insertions[0].source,
            StreamSource::Stream(PathBuf::from("inject/marker.bin"))
        );
        assert_eq!(manifest.insertions[1].index, 0);
        assert!(manifest.dump_raw_opcodes);
        assert!(manifest.dump_disassembly);
        assert_eq!(manifest.disassembler_args, ["--stdin"]);
    }

    #[test]
    fn dump_settings_default_off() {
        let manifest: PatchManifest =
            serde_json::from_str(r#"{ "input": "a.dxbc", "output": "b.dxbc", "insertions": [] }"#).unwrap();
        assert!(!manifest.dump_raw_opcodes);
        assert!(!manifest.dump_disassembly);
        assert!(manifest.disassembler.is_none());
        assert!(manifest.disassembler_args.is_empty());
        assert!(manifest.dump_file.is_none());
    }

    #[test]
    fn inline_words_are_little_endian() {
        let source = StreamSource::Words(vec![0x0100_003a]);
        assert_eq!(source.load().unwrap(), [0x3a, 0x00, 0x00, 0x01]);
    }

    #[test]
    fn relative_paths_resolve_against_base() {
        let mut manifest: PatchManifest = serde_json::from_str(SAMPLE).unwrap();
        manifest.resolve_paths(Path::new("/work"));
        assert_eq!(manifest.input, PathBuf::from("/work/shaders/ps.dxbc"));
        assert_eq!(manifest.output, PathBuf::from("/work/out/ps.dxbc"));
        assert_eq!(
            manifest.insertions[0].source,
            StreamSource::Stream(PathBuf::from("/work/inject/marker.bin"))
        );
        assert_eq!(manifest.dump_file, Some(PathBuf::from("/work/out/ps.txt")));
        assert_eq!(manifest.disassembler, Some(PathBuf::from("/work/tools/disasm.sh")));
    }

    #[test]
    fn bare_disassembler_name_stays_on_path() {
        let mut manifest: PatchManifest = serde_json::from_str(SAMPLE).unwrap();
        manifest.disassembler = Some(PathBuf::from("fxc"));
        manifest.resolve_paths(Path::new("/work"));
        assert_eq!(manifest.disassembler, Some(PathBuf::from("fxc")));
    }
}
