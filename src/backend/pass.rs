//! Password-store (pass) backend.
//!
//! Each item is a pass entry named `<prefix>/<percent-encoded key>` holding a
//! sealed envelope. Keys too long for one file name are filed under a digest
//! instead; the envelope still records the full key. `pass` does the GPG work; this module picks entry names
//! and moves bytes over stdin/stdout.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use sha2::{Digest, Sha256};

use crate::config::BackendKind;

use super::{envelope, BackendError, Keyring};

/// Longest encoded key used verbatim as an entry name. File systems cap a
/// name at 255 bytes and `pass` appends `.gpg`.
const MAX_ENTRY_SEGMENT: usize = 200;

/// Keyring backed by a password-store directory.
#[derive(Debug)]
pub struct PassKeyring {
    dir: PathBuf,
    prefix: String,
    command: PathBuf,
}

impl PassKeyring {
    /// Open the store at `dir`.
    ///
    /// Fails if the directory does not exist or `command` cannot be found.
    pub fn open(
        dir: impl Into<PathBuf>,
        prefix: impl Into<String>,
        command: impl AsRef<Path>,
    ) -> Result<Self, BackendError> {
        let dir = dir.into();
        if !dir.is_dir() {
            return Err(BackendError::Unavailable {
                backend: BackendKind::Pass,
                reason: format!("password store directory {} does not exist", dir.display()),
            });
        }

        let command = command.as_ref();
        let command = which::which(command).map_err(|err| BackendError::Unavailable {
            backend: BackendKind::Pass,
            reason: format!("{} not found: {err}", command.display()),
        })?;

        Ok(Self {
            dir,
            prefix: prefix.into(),
            command,
        })
    }

    /// Entry name for a key. Keys are URLs, so they are percent-encoded into
    /// a single path segment, or replaced by their SHA-256 when that segment
    /// would be too long.
    fn entry_name(&self, key: &str) -> String {
        let encoded = urlencoding::encode(key);
        if encoded.len() <= MAX_ENTRY_SEGMENT {
            return format!("{}/{}", self.prefix, encoded);
        }

        let digest = Sha256::digest(key.as_bytes());
        format!("{}/sha256-{}", self.prefix, URL_SAFE_NO_PAD.encode(digest))
    }

    fn entry_exists(&self, name: &str) -> bool {
        self.dir.join(format!("{name}.gpg")).is_file()
    }

    fn pass(&self) -> Command {
        let mut cmd = Command::new(&self.command);
        cmd.env("PASSWORD_STORE_DIR", &self.dir);
        cmd
    }

    fn failure(&self, action: &'static str, status: ExitStatus, stderr: &[u8]) -> BackendError {
        BackendError::Command {
            program: self.command.display().to_string(),
            action,
            status,
            stderr: String::from_utf8_lossy(stderr).trim().to_string(),
        }
    }
}

impl Keyring for PassKeyring {
    fn backend_name(&self) -> &'static str {
        "pass"
    }

    fn set(&self, key: &str, label: &str, data: &[u8]) -> Result<(), BackendError> {
        let name = self.entry_name(key);
        let sealed = envelope::seal(key, label, data)?;

        let mut child = self
            .pass()
            .args(["insert", "--multiline", "--force"])
            .arg(&name)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()?;

        // Reap the child before reporting a write error; a `pass` that exits
        // early breaks the pipe and its stderr says why.
        let written = match child.stdin.take() {
            Some(mut stdin) => stdin.write_all(&sealed),
            None => Ok(()),
        };

        let output = child.wait_with_output()?;
        if !output.status.success() {
            return Err(self.failure("insert", output.status, &output.stderr));
        }
        written?;

        tracing::debug!(entry = %name, "Stored pass entry");
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Vec<u8>, BackendError> {
        let name = self.entry_name(key);
        if !self.entry_exists(&name) {
            return Err(BackendError::NotFound {
                key: key.to_string(),
            });
        }

        let output = self.pass().arg("show").arg(&name).output()?;
        if !output.status.success() {
            return Err(self.failure("show", output.status, &output.stderr));
        }

        envelope::unseal(key, &output.stdout)
    }

    fn remove(&self, key: &str) -> Result<(), BackendError> {
        let name = self.entry_name(key);
        if !self.entry_exists(&name) {
            return Err(BackendError::NotFound {
                key: key.to_string(),
            });
        }

        let output = self.pass().args(["rm", "--force"]).arg(&name).output()?;
        if !output.status.success() {
            return Err(self.failure("rm", output.status, &output.stderr));
        }

        Ok(())
    }
}
