//! Operator input for the simulated peripherals.
//!
//! Commands are read one per line from stdin:
//!
//! - `tap <hex>` presents a token with the given UID (`0AFF`, `0a:ff` and
//!   `0a ff` are all accepted)
//! - `fail-read` makes the next UID read fail
//! - `fail-frame` makes the next capture fail
//! - `help` lists the commands

use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::Context;
use doorcam_hardware::mock::{MockCameraHandle, MockReaderHandle};
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{info, warn};

/// Minimal JPEG (SOI, EOI) served when no frames directory is given.
pub const PLACEHOLDER_JPEG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xD9];

const HELP: &str = "commands: tap <hex> | fail-read | fail-frame | help";

/// One operator command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Tap(Vec<u8>),
    FailRead,
    FailFrame,
    Help,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("Unknown command: {0}")]
    Unknown(String),

    #[error("Missing UID after tap")]
    MissingUid,

    #[error("Invalid UID {0:?}: expected pairs of hex digits")]
    InvalidUid(String),
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (word, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));

        match word.to_ascii_lowercase().as_str() {
            "tap" => parse_uid(rest).map(Command::Tap),
            "fail-read" => Ok(Command::FailRead),
            "fail-frame" => Ok(Command::FailFrame),
            "help" | "?" => Ok(Command::Help),
            _ => Err(CommandError::Unknown(word.to_string())),
        }
    }
}

fn parse_uid(text: &str) -> Result<Vec<u8>, CommandError> {
    let digits: String = text
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ':')
        .collect();

    if digits.is_empty() {
        return Err(CommandError::MissingUid);
    }
    if digits.len() % 2 != 0 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(CommandError::InvalidUid(text.trim().to_string()));
    }

    (0..digits.len())
        .step_by(2)
        .map(|i| {
            u8::from_str_radix(&digits[i..i + 2], 16)
                .map_err(|_| CommandError::InvalidUid(text.trim().to_string()))
        })
        .collect()
}

/// Handles onto the simulated reader and camera.
#[derive(Debug, Clone)]
pub struct Simulator {
    reader: MockReaderHandle,
    camera: MockCameraHandle,
}

impl Simulator {
    pub fn new(reader: MockReaderHandle, camera: MockCameraHandle) -> Self {
        Self { reader, camera }
    }

    /// Apply one command to the simulated devices.
    pub async fn apply(&self, command: Command) -> doorcam_hardware::Result<()> {
        match command {
            Command::Tap(uid) => {
                info!(uid = ?uid, "Presenting token");
                self.reader.present_token(uid).await
            }
            Command::FailRead => self.reader.fail_next_read().await,
            Command::FailFrame => {
                self.camera.push_failure();
                Ok(())
            }
            Command::Help => {
                info!("{HELP}");
                Ok(())
            }
        }
    }

    /// Read commands until `input` ends.
    pub async fn run<I>(&self, input: I) -> std::io::Result<()>
    where
        I: AsyncBufRead + Unpin,
    {
        let mut lines = input.lines();
        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            match line.parse::<Command>() {
                Ok(command) => {
                    if let Err(e) = self.apply(command).await {
                        warn!(error = %e, "Simulator command failed");
                    }
                }
                Err(e) => warn!(error = %e, "{HELP}"),
            }
        }
        info!("Simulator input closed");
        Ok(())
    }
}

/// Load `*.jpg` / `*.jpeg` files from `dir`, ordered by file name.
pub fn load_frames(dir: &Path) -> anyhow::Result<Vec<Vec<u8>>> {
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read frames directory {}", dir.display()))?;

    let mut paths: Vec<PathBuf> = Vec::new();
    for entry in entries {
        let path = entry
            .with_context(|| format!("failed to list {}", dir.display()))?
            .path();
        let is_jpeg = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("jpg") || ext.eq_ignore_ascii_case("jpeg"));
        if is_jpeg && path.is_file() {
            paths.push(path);
        }
    }
    paths.sort();

    if paths.is_empty() {
        anyhow::bail!("no JPEG files in {}", dir.display());
    }

    paths
        .iter()
        .map(|path| {
            std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))
        })
        .collect()
}

/// Queue `frames` on the camera, holding the last one afterwards.
pub fn feed_frames(camera: &MockCameraHandle, frames: Vec<Vec<u8>>) {
    if let Some(last) = frames.last() {
        camera.set_repeating_frame(last.clone());
    }
    for frame in frames {
        camera.push_frame(frame);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("tap 0AFF", Command::Tap(vec![0x0A, 0xFF]))]
    #[case("tap 0a:ff", Command::Tap(vec![0x0A, 0xFF]))]
    #[case("  TAP 01 02 03 04 ", Command::Tap(vec![1, 2, 3, 4]))]
    #[case("fail-read", Command::FailRead)]
    #[case("fail-frame", Command::FailFrame)]
    #[case("help", Command::Help)]
    fn test_parse(#[case] line: &str, #[case] expected: Command) {
        assert_eq!(line.parse::<Command>().unwrap(), expected);
    }

    #[rstest]
    #[case("tap", CommandError::MissingUid)]
    #[case("tap 0AF", CommandError::InvalidUid("0AF".to_string()))]
    #[case("tap zz", CommandError::InvalidUid("zz".to_string()))]
    #[case("open", CommandError::Unknown("open".to_string()))]
    fn test_parse_errors(#[case] line: &str, #[case] expected: CommandError) {
        assert_eq!(line.parse::<Command>().unwrap_err(), expected);
    }

    #[test]
    fn test_load_frames_sorted_jpegs_only() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.jpg"), [2u8]).unwrap();
        std::fs::write(dir.path().join("a.JPEG"), [1u8]).unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"skip").unwrap();

        let frames = load_frames(dir.path()).unwrap();
        assert_eq!(frames, vec![vec![1u8], vec![2u8]]);
    }

    #[test]
    fn test_load_frames_empty_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_frames(dir.path()).is_err());
    }
}
