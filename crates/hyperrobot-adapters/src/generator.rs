//! Puzzle source backed by the external generator process.
//!
//! The generator is run as `<command> <args..> <depth> <h> <w> <walls>` and
//! its stdout is decoded with [`decode_report`]. There is no retry and no
//! timeout here; the dispatcher never issues two requests at once.

use crate::report::{ProtocolError, decode_report};
use async_trait::async_trait;
use hyperrobot_core::{GeneratorConfig, Puzzle, PuzzleSource, PuzzleSpec};
use hyperrobot_proto::Error;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, warn};

/// Number of stderr lines kept for error messages.
const STDERR_TAIL: usize = 5;

/// Errors raised while running the generator.
#[derive(Debug, thiserror::Error)]
pub enum GeneratorError {
    #[error("failed to start generator `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("generator produced no output")]
    NoOutput,

    #[error("generator exited with code {code:?}: {stderr}")]
    Exited { code: Option<i32>, stderr: String },

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Runs the generator executable once per puzzle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorSource {
    command: String,
    args: Vec<String>,
}

impl GeneratorSource {
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            args,
        }
    }

    pub fn from_config(config: &GeneratorConfig) -> Self {
        Self::new(config.command.clone(), config.args.clone())
    }

    /// Full argument list for one request.
    pub fn arguments(&self, spec: PuzzleSpec) -> Vec<String> {
        let mut args = self.args.clone();
        args.extend([
            spec.depth.to_string(),
            spec.height.to_string(),
            spec.width.to_string(),
            spec.walls.to_string(),
        ]);
        args
    }

    /// Runs the generator and decodes its report.
    pub async fn run(&self, spec: PuzzleSpec) -> Result<Puzzle, GeneratorError> {
        let args = self.arguments(spec);
        debug!(command = %self.command, args = ?args, "Spawning puzzle generator");

        let mut child = Command::new(&self.command)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| GeneratorError::Spawn {
                command: self.command.clone(),
                source,
            })?;

        let stdout_handle = child.stdout.take();
        let stderr_handle = child.stderr.take();

        // Read both pipes together so a chatty stderr cannot block stdout.
        let stdout_future = async {
            let mut lines_out = Vec::new();
            if let Some(stdout) = stdout_handle {
                let mut lines = BufReader::new(stdout).lines();
                while let Some(line) = lines.next_line().await? {
                    lines_out.push(line);
                }
            }
            Ok::<_, std::io::Error>(lines_out)
        };
        let stderr_future = async {
            let mut lines_out = Vec::new();
            if let Some(stderr) = stderr_handle {
                let mut lines = BufReader::new(stderr).lines();
                while let Some(line) = lines.next_line().await? {
                    lines_out.push(line);
                }
            }
            Ok::<_, std::io::Error>(lines_out)
        };
        let (stdout_lines, stderr_lines) = tokio::try_join!(stdout_future, stderr_future)?;
        let status = child.wait().await?;

        if !status.success() {
            let tail = stderr_lines[stderr_lines.len().saturating_sub(STDERR_TAIL)..].join("\n");
            warn!(code = ?status.code(), stderr = %tail, "Puzzle generator failed");
            return Err(GeneratorError::Exited {
                code: status.code(),
                stderr: tail,
            });
        }
        if stdout_lines.iter().all(|line| line.trim().is_empty()) {
            return Err(GeneratorError::NoOutput);
        }

        let puzzle = decode_report(&stdout_lines.join("\n"))?;
        debug!(
            height = puzzle.board.height(),
            width = puzzle.board.width(),
            answer_len = puzzle.answer_len(),
            "Puzzle generated"
        );
        Ok(puzzle)
    }
}

#[async_trait]
impl PuzzleSource for GeneratorSource {
    async fn generate(&self, spec: PuzzleSpec) -> hyperrobot_proto::Result<Puzzle> {
        self.run(spec).await.map_err(Error::puzzle)
    }
}
