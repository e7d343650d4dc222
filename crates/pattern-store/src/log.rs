use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::mpsc::{self, Sender};
use std::thread;

use tracing::warn;

use crate::model::OutcomeLine;

/// Handle to the dedicated outcome-log writer thread.
#[derive(Clone)]
pub struct OutcomeLogHandle {
    tx: Sender<Command>,
}

enum Command {
    Append(OutcomeLine),
    Flush(mpsc::Sender<io::Result<()>>),
    Shutdown,
}

impl OutcomeLogHandle {
    pub fn append(&self, line: OutcomeLine) -> io::Result<()> {
        self.tx
            .send(Command::Append(line))
            .map_err(|err| io::Error::new(io::ErrorKind::BrokenPipe, err.to_string()))
    }

    pub fn flush(&self) -> io::Result<()> {
        let (tx, rx) = mpsc::channel();
        self.tx
            .send(Command::Flush(tx))
            .map_err(|err| io::Error::new(io::ErrorKind::BrokenPipe, err.to_string()))?;
        rx.recv()
            .unwrap_or_else(|err| Err(io::Error::new(io::ErrorKind::Other, err.to_string())))
    }
}

impl Drop for OutcomeLogHandle {
    fn drop(&mut self) {
        let _ = self.tx.send(Command::Shutdown);
    }
}

pub fn spawn(path: PathBuf) -> Option<OutcomeLogHandle> {
    let (tx, rx) = mpsc::channel();
    let mut state = WriterState::new(path);
    if thread::Builder::new()
        .name("pattern-log-writer".into())
        .spawn(move || {
            while let Ok(cmd) = rx.recv() {
                match cmd {
                    Command::Append(line) => {
                        if let Err(err) = state.append(&line) {
                            warn!(?err, "outcome log append failed");
                        }
                    }
                    Command::Flush(reply) => {
                        let _ = reply.send(state.flush());
                    }
                    Command::Shutdown => {
                        let _ = state.flush();
                        break;
                    }
                }
            }
        })
        .is_err()
    {
        return None;
    }
    Some(OutcomeLogHandle { tx })
}

struct WriterState {
    path: PathBuf,
    file: Option<File>,
}

impl WriterState {
    fn new(path: PathBuf) -> Self {
        Self { path, file: None }
    }

    fn append(&mut self, line: &OutcomeLine) -> io::Result<()> {
        let raw = serde_json::to_vec(line)
            .map_err(|err| io::Error::new(io::ErrorKind::Other, err.to_string()))?;
        let file = self.ensure_file()?;
        file.write_all(&raw)?;
        file.write_all(b"\n")?;
        Ok(())
    }

    fn ensure_file(&mut self) -> io::Result<&mut File> {
        if self.file.is_none() {
            if let Some(parent) = self.path.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent)?;
                }
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)?;
            self.file = Some(file);
        }
        Ok(self.file.as_mut().expect("writer must be ready"))
    }

    fn flush(&mut self) -> io::Result<()> {
        if let Some(file) = self.file.as_mut() {
            file.flush()?;
            file.sync_all()?;
        }
        Ok(())
    }
}
