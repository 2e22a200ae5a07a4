use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use tracing::{error, info, warn};

use crate::codec::{self, CodecError, Record};
use crate::error::{DbError, DbResult};

/// Records of one table plus its id counter.
pub(crate) struct Rows<T> {
    pub records: BTreeMap<u64, T>,
    next_id: u64,
}

impl<T: Record> Rows<T> {
    fn new(records: BTreeMap<u64, T>) -> Result<Self, CodecError> {
        let next_id = match records.keys().next_back() {
            None => 1,
            Some(&max) => max
                .checked_add(1)
                .ok_or(CodecError::IdSpaceExhausted { id: max })?,
        };
        Ok(Self { records, next_id })
    }

    /// Hand out the next id. Ids are never handed out twice, even after deletes.
    ///
    /// `u64::MAX` is never handed out, so the counter can always move past
    /// the id it returns.
    pub fn allocate_id(&mut self) -> DbResult<u64> {
        let id = self.next_id;
        self.next_id = id
            .checked_add(1)
            .ok_or(DbError::IdsExhausted { table: T::TABLE })?;
        Ok(id)
    }
}

/// One lock-guarded table backed by one JSON file.
///
/// Writers hold the lock across the snapshot write so the file always matches
/// the last completed mutation.
pub(crate) struct Table<T> {
    path: PathBuf,
    rows: RwLock<Rows<T>>,
}

impl<T: Record> Table<T> {
    /// Load the table from `path`, creating an empty file when none exists.
    pub fn open(path: PathBuf) -> DbResult<Self> {
        let records: BTreeMap<u64, T> = match fs::read(&path) {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => BTreeMap::new(),
            Ok(bytes) => codec::decode(&bytes).map_err(|source| DbError::Format {
                path: path.display().to_string(),
                source,
            })?,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                let empty = BTreeMap::new();
                write_snapshot(&path, &empty).map_err(|source| DbError::Persistence {
                    table: T::TABLE,
                    source,
                })?;
                empty
            }
            Err(source) => {
                return Err(DbError::Persistence {
                    table: T::TABLE,
                    source,
                });
            }
        };

        let rows = Rows::new(records).map_err(|source| DbError::Format {
            path: path.display().to_string(),
            source,
        })?;

        info!(
            "Loaded {} {} from {}",
            rows.records.len(),
            T::TABLE,
            path.display()
        );
        Ok(Self {
            path,
            rows: RwLock::new(rows),
        })
    }

    /// Run `f` under a shared lock.
    pub fn read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&Rows<T>) -> R,
    {
        // A panicking writer never leaves the map half-updated, so the data is usable.
        let rows = self.rows.read().unwrap_or_else(PoisonError::into_inner);
        f(&rows)
    }

    /// Run `f` under the exclusive lock and persist if it succeeds.
    ///
    /// `f` must not touch the rows when it returns an error. If the snapshot
    /// write fails the mutation stays in memory and `Persistence` is returned.
    pub fn write<F, R>(&self, f: F) -> DbResult<R>
    where
        F: FnOnce(&mut Rows<T>) -> DbResult<R>,
    {
        let mut rows = self.rows.write().unwrap_or_else(PoisonError::into_inner);
        let result = f(&mut rows)?;

        write_snapshot(&self.path, &rows.records).map_err(|source| {
            error!("Failed to persist {} to {}: {}", T::TABLE, self.path.display(), source);
            DbError::Persistence {
                table: T::TABLE,
                source,
            }
        })?;

        Ok(result)
    }
}

/// Write to a sibling temp file, sync, rename over the real file, then sync
/// the directory so the rename itself is durable.
fn write_snapshot<T: Record>(path: &Path, records: &BTreeMap<u64, T>) -> io::Result<()> {
    let payload = codec::encode(records).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

    let tmp_path = tmp_path(path);
    let replaced = write_synced(&tmp_path, &payload).and_then(|()| fs::rename(&tmp_path, path));
    if let Err(err) = replaced {
        // Never leave a half-written sibling behind.
        if let Err(cleanup) = fs::remove_file(&tmp_path) {
            if cleanup.kind() != io::ErrorKind::NotFound {
                warn!("Failed to remove {}: {}", tmp_path.display(), cleanup);
            }
        }
        return Err(err);
    }

    fsync_dir(path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new(".")))
}

fn write_synced(path: &Path, payload: &[u8]) -> io::Result<()> {
    let mut file = fs::File::create(path)?;
    file.write_all(payload)?;
    file.sync_all()
}

fn fsync_dir(dir: &Path) -> io::Result<()> {
    fs::File::open(dir)?.sync_all()
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use chirpy_types::models::Post;
    use tempfile::TempDir;

    use super::*;

    fn post(id: u64, body: &str) -> Post {
        Post {
            id,
            body: body.to_string(),
            author: None,
        }
    }

    fn insert(table: &Table<Post>, body: &str) -> DbResult<u64> {
        table.write(|rows| {
            let id = rows.allocate_id()?;
            rows.records.insert(id, post(id, body));
            Ok(id)
        })
    }

    #[test]
    fn test_open_creates_empty_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("chirps.json");

        let table = Table::<Post>::open(path.clone()).unwrap();
        assert!(table.read(|rows| rows.records.is_empty()));
        assert_eq!(fs::read(&path).unwrap(), b"{}");
    }

    #[test]
    fn test_open_accepts_zero_length_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("chirps.json");
        fs::write(&path, b"").unwrap();

        let table = Table::<Post>::open(path).unwrap();
        assert_eq!(insert(&table, "first").unwrap(), 1);
    }

    #[test]
    fn test_counter_resumes_after_max_id() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("chirps.json");
        fs::write(&path, br#"{"2": {"id": 2, "body": "a"}, "7": {"id": 7, "body": "b"}}"#).unwrap();

        let table = Table::<Post>::open(path).unwrap();
        assert_eq!(insert(&table, "next").unwrap(), 8);
    }

    #[test]
    fn test_corrupt_file_is_format_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("chirps.json");
        fs::write(&path, b"{not json").unwrap();

        assert!(matches!(
            Table::<Post>::open(path),
            Err(DbError::Format { .. })
        ));
    }

    #[test]
    fn test_failed_write_leaves_memory_mutated() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("chirps.json");
        let table = Table::<Post>::open(path.clone()).unwrap();

        // A directory squatting on the temp path makes the snapshot write fail.
        fs::create_dir(tmp_path(&path)).unwrap();

        assert!(matches!(
            insert(&table, "lost"),
            Err(DbError::Persistence { table: "chirps", .. })
        ));
        assert!(table.read(|rows| rows.records.contains_key(&1)));
        assert_eq!(fs::read(&path).unwrap(), b"{}");

        fs::remove_dir(tmp_path(&path)).unwrap();
        assert_eq!(insert(&table, "kept").unwrap(), 2);
        let on_disk = codec::decode::<Post>(&fs::read(&path).unwrap()).unwrap();
        assert_eq!(on_disk.keys().copied().collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn test_max_id_on_disk_fails_open() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("chirps.json");
        let max = u64::MAX;
        fs::write(&path, format!(r#"{{"{max}": {{"id": {max}, "body": "edge"}}}}"#)).unwrap();

        assert!(matches!(
            Table::<Post>::open(path),
            Err(DbError::Format {
                source: CodecError::IdSpaceExhausted { id: u64::MAX },
                ..
            })
        ));
    }

    #[test]
    fn test_counter_never_wraps() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("chirps.json");
        let last = u64::MAX - 1;
        fs::write(&path, format!(r#"{{"{last}": {{"id": {last}, "body": "edge"}}}}"#)).unwrap();

        let table = Table::<Post>::open(path.clone()).unwrap();
        assert!(matches!(
            insert(&table, "overflow"),
            Err(DbError::IdsExhausted { table: "chirps" })
        ));
        assert!(matches!(
            insert(&table, "again"),
            Err(DbError::IdsExhausted { .. })
        ));
        assert_eq!(table.read(|rows| rows.records.len()), 1);
        assert!(!table.read(|rows| rows.records.contains_key(&0)));
    }

    #[test]
    fn test_failed_rename_removes_temp_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("chirps.json");
        let table = Table::<Post>::open(path.clone()).unwrap();

        // A non-empty directory in place of the table file makes the rename fail.
        fs::remove_file(&path).unwrap();
        fs::create_dir(&path).unwrap();
        fs::write(path.join("keep"), b"x").unwrap();

        assert!(matches!(
            insert(&table, "stranded"),
            Err(DbError::Persistence { .. })
        ));
        assert!(!tmp_path(&path).exists());
    }

    #[test]
    fn test_snapshot_leaves_no_temp_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("chirps.json");
        let table = Table::<Post>::open(path.clone()).unwrap();

        insert(&table, "first").unwrap();
        assert!(path.is_file());
        assert!(!tmp_path(&path).exists());
    }

    #[test]
    fn test_failed_closure_skips_write() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("chirps.json");
        let table = Table::<Post>::open(path.clone()).unwrap();
        fs::create_dir(tmp_path(&path)).unwrap();

        let result: DbResult<()> = table.write(|_| Err(DbError::Forbidden));
        assert!(matches!(result, Err(DbError::Forbidden)));
    }
}
