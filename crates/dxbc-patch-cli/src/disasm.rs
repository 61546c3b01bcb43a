use std::io::{self, ErrorKind, Write};
use std::path::PathBuf;
use std::process::{Command, Output, Stdio};
use std::thread;

use dxbc::diagnostics::Disassembler;

/// Runs an external tool with the container on stdin and takes its stdout as
/// the listing.
#[derive(Debug, Clone)]
pub struct ExternalDisassembler {
    pub program: PathBuf,
    pub args: Vec<String>,
}

impl ExternalDisassembler {
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    fn run(&self, container: &[u8]) -> io::Result<Output> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        // stdin is written from its own thread: the tool may fill stdout
        // before it has read all of its input.
        let feeder = child.stdin.take().map(|mut stdin| {
            let data = container.to_vec();
            thread::spawn(move || stdin.write_all(&data))
        });
        let output = child.wait_with_output()?;
        if let Some(feeder) = feeder {
            match feeder.join() {
                Ok(Ok(())) => {}
                // The tool stopped reading early; its exit status decides.
                Ok(Err(e)) if e.kind() == ErrorKind::BrokenPipe => {}
                Ok(Err(e)) => return Err(e),
                Err(_) => return Err(io::Error::other("stdin writer panicked")),
            }
        }
        Ok(output)
    }
}

impl Disassembler for ExternalDisassembler {
    fn disassemble(&self, container: &[u8]) -> Option<String> {
        match self.run(container) {
            Ok(output) if output.status.success() => Some(String::from_utf8_lossy(&output.stdout).into_owned()),
            Ok(output) => {
                eprintln!(
                    "[disasm] {} exited with {}: {}",
                    self.program.display(),
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                );
                None
            }
            Err(e) => {
                eprintln!("[disasm] failed to run {}: {e}", self.program.display());
                None
            }
        }
    }
}
