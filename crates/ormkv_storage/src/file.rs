//! File-based storage backend for persistent storage.

use crate::backend::{Backend, KvIter, ReadBackend, WriteOp};
use crate::error::{StorageError, StorageResult};
use crate::range::{self, Direction, KeyRange, SnapshotIter};
use fs2::FileExt;
use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicUsize;
use std::sync::Arc;

const OP_SET: u8 = 1;
const OP_DELETE: u8 = 2;
const OP_BATCH: u8 = 3;
const MAX_ENTRY_LEN: usize = u32::MAX as usize;

/// A persistent ordered key-value backend.
///
/// Every `set` and `delete` is appended to a log file as a frame:
///
/// ```text
/// op: u8 | key_len: u32 BE | key | (set only) val_len: u32 BE | val
/// ```
///
/// A batch from [`Backend::apply`] is one frame wrapping the frames of its
/// operations, so replay sees all of them or none:
///
/// ```text
/// 3: u8 | body_len: u32 BE | set and delete frames
/// ```
///
/// On open the log is replayed into an in-memory ordered map which serves
/// all reads. A trailing frame cut short by a crash is dropped and the file
/// is truncated back to the last complete frame.
///
/// # Durability
///
/// - `flush()` pushes buffered frames to the OS
/// - `sync()` additionally calls `File::sync_data()`
///
/// # Locking
///
/// The log file is locked exclusively for the lifetime of the backend; the
/// lock is released when the file handle is closed on drop.
///
/// # Example
///
/// ```no_run
/// use ormkv_storage::{Backend, FileBackend, ReadBackend};
/// use std::path::Path;
///
/// let mut backend = FileBackend::open(Path::new("data.log")).unwrap();
/// backend.set(b"key", b"persistent").unwrap();
/// backend.sync().unwrap();
/// ```
#[derive(Debug)]
pub struct FileBackend {
    path: PathBuf,
    writer: BufWriter<File>,
    entries: BTreeMap<Vec<u8>, Vec<u8>>,
    open_iterators: Arc<AtomicUsize>,
}

impl FileBackend {
    /// Opens or creates a file backend at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Another process holds the lock (`Locked`)
    /// - The log contains an unknown frame (`Corrupted`)
    /// - An I/O error occurs
    pub fn open(path: &Path) -> StorageResult<Self> {
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;

        file.try_lock_exclusive()
            .map_err(|_| StorageError::Locked)?;

        let mut log = Vec::new();
        file.read_to_end(&mut log)?;

        let (entries, valid_len) = replay(&log)?;
        if valid_len < log.len() {
            tracing::warn!(
                path = %path.display(),
                dropped = log.len() - valid_len,
                "dropping incomplete trailing frame"
            );
            file.set_len(valid_len as u64)?;
        }
        file.seek(SeekFrom::Start(valid_len as u64))?;
        tracing::debug!(path = %path.display(), entries = entries.len(), "replayed log");

        Ok(Self {
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
            entries,
            open_iterators: Arc::default(),
        })
    }

    /// Opens or creates a file backend, creating parent directories if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if directories cannot be created or file cannot be opened.
    pub fn open_with_create_dirs(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Self::open(path)
    }

    /// Returns the path to the underlying file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the number of live entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Flushes and syncs all frames to durable storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the sync operation fails.
    pub fn sync(&mut self) -> StorageResult<()> {
        self.writer.flush()?;
        self.writer.get_ref().sync_data()?;
        Ok(())
    }

    fn append_frame(&mut self, op: &WriteOp) -> StorageResult<()> {
        let mut frame = Vec::with_capacity(9 + op.key().len());
        encode_frame(&mut frame, op)?;
        self.writer.write_all(&frame)?;
        Ok(())
    }

    fn apply_to_map(&mut self, op: &WriteOp) {
        match op {
            WriteOp::Set { key, value } => {
                self.entries.insert(key.clone(), value.clone());
            }
            WriteOp::Delete { key } => {
                self.entries.remove(key);
            }
        }
    }
}

fn encode_frame(frame: &mut Vec<u8>, op: &WriteOp) -> StorageResult<()> {
    match op {
        WriteOp::Set { key, value } => {
            frame.push(OP_SET);
            push_chunk(frame, key)?;
            push_chunk(frame, value)?;
        }
        WriteOp::Delete { key } => {
            frame.push(OP_DELETE);
            push_chunk(frame, key)?;
        }
    }
    Ok(())
}

fn push_chunk(frame: &mut Vec<u8>, chunk: &[u8]) -> StorageResult<()> {
    let len = u32::try_from(chunk.len()).map_err(|_| StorageError::EntryTooLarge {
        len: chunk.len(),
        max: MAX_ENTRY_LEN,
    })?;
    frame.extend_from_slice(&len.to_be_bytes());
    frame.extend_from_slice(chunk);
    Ok(())
}

/// Reads a length-prefixed chunk at `pos`, or `None` if the log ends first.
fn read_chunk(log: &[u8], pos: usize) -> Option<(&[u8], usize)> {
    let header = log.get(pos..pos + 4)?;
    let len = u32::from_be_bytes([header[0], header[1], header[2], header[3]]) as usize;
    let start = pos + 4;
    let chunk = log.get(start..start.checked_add(len)?)?;
    Some((chunk, start + len))
}

/// A decoded log frame borrowing from the log.
enum Frame<'a> {
    Set(&'a [u8], &'a [u8]),
    Delete(&'a [u8]),
    Batch(&'a [u8]),
}

/// Reads the frame at `pos`, or `None` if the log ends inside it.
fn read_frame(log: &[u8], pos: usize) -> StorageResult<Option<(Frame<'_>, usize)>> {
    let op = log[pos];
    let Some((chunk, after)) = read_chunk(log, pos + 1) else {
        return Ok(None);
    };
    match op {
        OP_SET => Ok(read_chunk(log, after).map(|(value, end)| (Frame::Set(chunk, value), end))),
        OP_DELETE => Ok(Some((Frame::Delete(chunk), after))),
        OP_BATCH => Ok(Some((Frame::Batch(chunk), after))),
        other => Err(StorageError::Corrupted(format!(
            "unknown frame op {other:#04x} at offset {pos}"
        ))),
    }
}

fn replay_frame(entries: &mut BTreeMap<Vec<u8>, Vec<u8>>, frame: Frame<'_>) -> StorageResult<()> {
    match frame {
        Frame::Set(key, value) => {
            entries.insert(key.to_vec(), value.to_vec());
        }
        Frame::Delete(key) => {
            entries.remove(key);
        }
        Frame::Batch(body) => {
            let mut pos = 0;
            while pos < body.len() {
                match read_frame(body, pos)? {
                    Some((Frame::Batch(_), _)) => {
                        return Err(StorageError::Corrupted("nested batch frame".into()));
                    }
                    Some((inner, next)) => {
                        replay_frame(entries, inner)?;
                        pos = next;
                    }
                    None => {
                        return Err(StorageError::Corrupted(
                            "incomplete frame inside batch".into(),
                        ));
                    }
                }
            }
        }
    }
    Ok(())
}

/// Replays the log, returning the resulting map and the length of the
/// complete-frame prefix.
fn replay(log: &[u8]) -> StorageResult<(BTreeMap<Vec<u8>, Vec<u8>>, usize)> {
    let mut entries = BTreeMap::new();
    let mut pos = 0;

    while pos < log.len() {
        let Some((frame, next)) = read_frame(log, pos)? else {
            break;
        };
        replay_frame(&mut entries, frame)?;
        pos = next;
    }

    Ok((entries, pos))
}

impl ReadBackend for FileBackend {
    fn get(&self, key: &[u8]) -> StorageResult<Option<Vec<u8>>> {
        if key.is_empty() {
            return Err(StorageError::EmptyKey);
        }
        Ok(self.entries.get(key).cloned())
    }

    fn iter(&self, range: &KeyRange, direction: Direction) -> StorageResult<KvIter<'_>> {
        let entries = range::snapshot(&self.entries, range, direction);
        Ok(Box::new(SnapshotIter::new(entries, &self.open_iterators)))
    }
}

impl Backend for FileBackend {
    fn set(&mut self, key: &[u8], value: &[u8]) -> StorageResult<()> {
        if key.is_empty() {
            return Err(StorageError::EmptyKey);
        }
        let op = WriteOp::set(key, value);
        self.append_frame(&op)?;
        self.apply_to_map(&op);
        Ok(())
    }

    fn delete(&mut self, key: &[u8]) -> StorageResult<()> {
        if key.is_empty() {
            return Err(StorageError::EmptyKey);
        }
        if self.entries.contains_key(key) {
            let op = WriteOp::delete(key);
            self.append_frame(&op)?;
            self.apply_to_map(&op);
        }
        Ok(())
    }

    fn apply(&mut self, ops: &[WriteOp]) -> StorageResult<()> {
        if ops.iter().any(|op| op.key().is_empty()) {
            return Err(StorageError::EmptyKey);
        }
        match ops {
            [] => return Ok(()),
            [op] => self.append_frame(op)?,
            _ => {
                let mut body = Vec::new();
                for op in ops {
                    encode_frame(&mut body, op)?;
                }
                let mut frame = Vec::with_capacity(5 + body.len());
                frame.push(OP_BATCH);
                push_chunk(&mut frame, &body)?;
                self.writer.write_all(&frame)?;
            }
        }
        for op in ops {
            self.apply_to_map(op);
        }
        tracing::trace!(ops = ops.len(), "appended batch");
        Ok(())
    }

    fn flush(&mut self) -> StorageResult<()> {
        self.writer.flush()?;
        Ok(())
    }
}

impl Drop for FileBackend {
    fn drop(&mut self) {
        if let Err(err) = self.writer.flush() {
            tracing::warn!(path = %self.path.display(), error = %err, "flush on drop failed");
        }
    }
}
