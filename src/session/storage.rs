//! On-disk layout of a session
//!
//! ```text
//! <root>/session_<id>/session.json     metadata
//! <root>/session_<id>/messages.jsonl   one Message per line
//! ```
//!
//! Both files are replaced whole through a temp file and a rename, so a crash
//! mid-save leaves the previous version in place.

use std::fs;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::core::AgentResult;
use crate::llm::Message;

use super::metadata::SessionMetadata;

const METADATA_FILE: &str = "session.json";
const TRANSCRIPT_FILE: &str = "messages.jsonl";

#[derive(Debug, Clone)]
pub struct SessionStorage {
    root: PathBuf,
}

impl SessionStorage {
    pub fn with_dir(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn base_dir(&self) -> &Path {
        &self.root
    }

    pub fn session_dir(&self, session_id: &str) -> PathBuf {
        self.root.join(format!("session_{session_id}"))
    }

    pub fn metadata_path(&self, session_id: &str) -> PathBuf {
        self.session_dir(session_id).join(METADATA_FILE)
    }

    pub fn history_path(&self, session_id: &str) -> PathBuf {
        self.session_dir(session_id).join(TRANSCRIPT_FILE)
    }

    pub fn session_exists(&self, session_id: &str) -> bool {
        self.metadata_path(session_id).is_file()
    }

    pub fn save_metadata(&self, metadata: &SessionMetadata) -> AgentResult<()> {
        let path = self.metadata_path(&metadata.session_id);
        replace_file(&path, |writer| {
            serde_json::to_writer_pretty(&mut *writer, metadata)?;
            writeln!(writer)?;
            Ok(())
        })
    }

    /// `None` when the session was never saved
    pub fn load_metadata(&self, session_id: &str) -> AgentResult<Option<SessionMetadata>> {
        let path = self.metadata_path(session_id);
        if !path.is_file() {
            return Ok(None);
        }
        let reader = BufReader::new(fs::File::open(&path)?);
        Ok(Some(serde_json::from_reader(reader)?))
    }

    /// Replace the transcript with `messages`
    pub fn save_messages(&self, session_id: &str, messages: &[Message]) -> AgentResult<()> {
        let path = self.history_path(session_id);
        replace_file(&path, |writer| {
            for message in messages {
                write_line(writer, message)?;
            }
            Ok(())
        })
    }

    /// Read the transcript. Lines that no longer parse are skipped with a warning.
    pub fn load_messages(&self, session_id: &str) -> AgentResult<Vec<Message>> {
        let path = self.history_path(session_id);
        if !path.is_file() {
            return Ok(Vec::new());
        }

        let reader = BufReader::new(fs::File::open(&path)?);
        let mut messages = Vec::new();
        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<Message>(&line) {
                Ok(message) => messages.push(message),
                Err(e) => tracing::warn!(
                    "[SessionStorage] Skipping line {} of {}: {}",
                    index + 1,
                    path.display(),
                    e
                ),
            }
        }
        Ok(messages)
    }

    /// Remove the session directory; `false` when there was nothing to remove
    pub fn delete_session(&self, session_id: &str) -> AgentResult<bool> {
        let dir = self.session_dir(session_id);
        if !dir.is_dir() {
            return Ok(false);
        }
        fs::remove_dir_all(&dir)?;
        Ok(true)
    }
}

fn write_line<W: Write, T: Serialize>(writer: &mut W, value: &T) -> AgentResult<()> {
    serde_json::to_writer(&mut *writer, value)?;
    writer.write_all(b"\n")?;
    Ok(())
}

/// Write `path` via a sibling temp file and rename it into place
fn replace_file<F>(path: &Path, write: F) -> AgentResult<()>
where
    F: FnOnce(&mut BufWriter<fs::File>) -> AgentResult<()>,
{
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }

    let tmp = path.with_extension("tmp");
    let mut writer = BufWriter::new(fs::File::create(&tmp)?);
    write(&mut writer)?;
    writer.flush()?;
    drop(writer);

    fs::rename(&tmp, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn storage() -> (SessionStorage, TempDir) {
        let temp = TempDir::new().unwrap();
        (SessionStorage::with_dir(temp.path()), temp)
    }

    #[test]
    fn test_layout() {
        let storage = SessionStorage::with_dir("/tmp/sessions");
        assert_eq!(
            storage.metadata_path("main-001"),
            PathBuf::from("/tmp/sessions/session_main-001/session.json")
        );
        assert_eq!(
            storage.history_path("main-001"),
            PathBuf::from("/tmp/sessions/session_main-001/messages.jsonl")
        );
    }

    #[test]
    fn test_metadata_roundtrip() {
        let (storage, _temp) = storage();
        assert!(storage.load_metadata("s1").unwrap().is_none());

        storage
            .save_metadata(&SessionMetadata::new("s1", "main", "model-x"))
            .unwrap();
        let loaded = storage.load_metadata("s1").unwrap().unwrap();
        assert_eq!(loaded.session_id, "s1");
        assert_eq!(loaded.agent_name, "main");
        assert!(!storage.metadata_path("s1").with_extension("tmp").exists());
    }

    #[test]
    fn test_save_replaces_transcript() {
        let (storage, _temp) = storage();

        storage
            .save_messages("s", &[Message::user("a"), Message::assistant("b")])
            .unwrap();
        assert_eq!(storage.load_messages("s").unwrap().len(), 2);

        storage.save_messages("s", &[Message::user("c")]).unwrap();
        assert_eq!(storage.load_messages("s").unwrap(), vec![Message::user("c")]);
    }

    #[test]
    fn test_corrupt_lines_are_skipped() {
        let (storage, _temp) = storage();
        storage.save_messages("s", &[Message::user("kept")]).unwrap();

        let path = storage.history_path("s");
        let mut raw = fs::read_to_string(&path).unwrap();
        raw.push_str("{not json\n\n");
        raw.push_str(&serde_json::to_string(&Message::assistant("also kept")).unwrap());
        fs::write(&path, raw).unwrap();

        let messages = storage.load_messages("s").unwrap();
        assert_eq!(
            messages,
            vec![Message::user("kept"), Message::assistant("also kept")]
        );
    }

    #[test]
    fn test_delete_session() {
        let (storage, _temp) = storage();
        storage
            .save_metadata(&SessionMetadata::new("gone", "main", ""))
            .unwrap();
        assert!(storage.session_exists("gone"));

        assert!(storage.delete_session("gone").unwrap());
        assert!(!storage.session_exists("gone"));
        assert!(!storage.delete_session("gone").unwrap());
    }
}
