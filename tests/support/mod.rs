#![allow(dead_code)]

use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::Result;
use authkeep::backend::MemoryKeyring;
use authkeep::KeyringHelper;
use tracing::Dispatch;
use tracing_subscriber::fmt::MakeWriter;

/// Log output captured from a helper's injected dispatcher.
#[derive(Clone, Default)]
pub struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    pub fn dispatch(&self) -> Dispatch {
        let subscriber = tracing_subscriber::fmt()
            .with_writer(self.clone())
            .with_ansi(false)
            .finish();
        Dispatch::new(subscriber)
    }

    pub fn contents(&self) -> String {
        let bytes = self.0.lock().expect("log buffer lock poisoned");
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0
            .lock()
            .expect("log buffer lock poisoned")
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedLogs;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// A helper over a fresh memory keyring, plus a handle to that keyring and
/// the helper's log output.
pub fn memory_helper() -> (KeyringHelper, MemoryKeyring, CapturedLogs) {
    let keyring = MemoryKeyring::new();
    let logs = CapturedLogs::default();
    let helper = KeyringHelper::with_keyring(Box::new(keyring.clone()), logs.dispatch());
    (helper, keyring, logs)
}

/// Stand-in for `pass` that keeps entries unencrypted under
/// `$PASSWORD_STORE_DIR/<name>.gpg`. The entry name is always the last argument.
/// Inserting an entry whose name contains `refused` fails without reading stdin.
const FAKE_PASS: &str = r#"#!/bin/sh
set -eu
action="$1"
shift
for name in "$@"; do :; done
file="$PASSWORD_STORE_DIR/$name.gpg"
case "$action" in
  show)
    cat "$file"
    ;;
  insert)
    case "$name" in
      *refused*)
        echo "fake pass: refusing $name" >&2
        exit 1
        ;;
    esac
    mkdir -p "$(dirname "$file")"
    cat > "$file"
    ;;
  rm)
    rm "$file"
    ;;
  *)
    echo "fake pass: unsupported command $action" >&2
    exit 2
    ;;
esac
"#;

/// Write an executable fake `pass` into `dir` and return its path.
#[cfg(unix)]
pub fn write_fake_pass(dir: &Path) -> Result<PathBuf> {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join("pass");
    std::fs::write(&path, FAKE_PASS)?;
    let mut perms = std::fs::metadata(&path)?.permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms)?;
    Ok(path)
}
