//! Reader, Writer, and the builder that opens them.

use crate::codec::{Codec, CsvCodec, Format, JsonCodec};
use crate::collection::Collection;
use crate::error::{Error, Result};
use crate::fs::{FileAccess, OsFs};
use crate::record::{IdGenerator, Record, RecordId};
use chrono::Utc;
use parking_lot::RwLock;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Read-only view of a file-backed collection.
///
/// The whole file is decoded once, in [`open`](Self::open). After that every
/// query is served from memory under a shared lock; no further reads hit the
/// file.
pub struct Reader<R: Record> {
    pub(crate) collection: RwLock<Collection<R>>,
    pub(crate) path: PathBuf,
    pub(crate) codec: Box<dyn Codec<R>>,
    pub(crate) fs: Arc<dyn FileAccess>,
}

impl<R: Record> Reader<R> {
    /// Open a JSON file on the local file system.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::builder(path).reader()
    }

    /// Open a JSON file through a custom [`FileAccess`].
    pub fn open_with(fs: Arc<dyn FileAccess>, path: impl AsRef<Path>) -> Result<Self> {
        Self::builder(path).file_access(fs).reader()
    }

    /// Start configuring a store. Finish with
    /// [`.reader()`](StoreBuilder::reader) or [`.writer()`](StoreBuilder::writer).
    pub fn builder(path: impl AsRef<Path>) -> StoreBuilder<R> {
        StoreBuilder::new(path)
    }

    fn load(path: PathBuf, codec: Box<dyn Codec<R>>, fs: Arc<dyn FileAccess>) -> Result<Self> {
        let bytes = fs.read(&path)?;
        let records = codec.decode(&bytes)?;
        tracing::debug!(
            path = %path.display(),
            codec = codec.name(),
            records = records.len(),
            "loaded collection"
        );
        Ok(Self {
            collection: RwLock::new(Collection::from_records(records)),
            path,
            codec,
            fs,
        })
    }

    // ---- reads ----

    /// Snapshot of every record, in file order.
    #[must_use]
    pub fn read_all(&self) -> Vec<R> {
        self.collection.read().records().to_vec()
    }

    /// The record with `id`, or [`Error::NotFound`].
    pub fn read_one(&self, id: &R::Id) -> Result<R> {
        self.collection
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| Error::NotFound(id.to_string()))
    }

    /// Records matching `predicate`, in file order.
    pub fn find<F>(&self, predicate: F) -> Vec<R>
    where
        F: Fn(&R) -> bool,
    {
        self.collection
            .read()
            .records()
            .iter()
            .filter(|r| predicate(r))
            .cloned()
            .collect()
    }

    /// `true` if a record with `id` exists.
    #[must_use]
    pub fn contains(&self, id: &R::Id) -> bool {
        self.collection.read().contains(id)
    }

    /// Number of records (duplicates included).
    #[must_use]
    pub fn len(&self) -> usize {
        self.collection.read().len()
    }

    /// `true` when the collection is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl<R: Record> std::fmt::Debug for Reader<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reader")
            .field("path", &self.path)
            .field("codec", &self.codec.name())
            .field("records", &self.len())
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Writer
// ---------------------------------------------------------------------------

/// Read-write store. Derefs to [`Reader`] for queries.
///
/// Every mutation takes the exclusive lock, edits the in-memory collection,
/// encodes the whole collection, and overwrites the file before releasing
/// the lock. Two mutations never interleave their writes and readers never
/// see a half-applied change.
///
/// A failed encode or write is **not** rolled back: the in-memory change
/// stays, the error is returned, and memory and disk disagree until the next
/// successful write.
pub struct Writer<R: Record> {
    reader: Reader<R>,
    generator: Option<IdGenerator<R>>,
}

impl<R: Record> Writer<R> {
    /// Open a JSON file on the local file system for writing.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::builder(path).writer()
    }

    /// Open a JSON file through a custom [`FileAccess`].
    pub fn open_with(fs: Arc<dyn FileAccess>, path: impl AsRef<Path>) -> Result<Self> {
        Self::builder(path).file_access(fs).writer()
    }

    /// Start configuring a store.
    pub fn builder(path: impl AsRef<Path>) -> StoreBuilder<R> {
        StoreBuilder::new(path)
    }

    // ---- writes ----

    /// Store a new record and return it as stored.
    ///
    /// The id is kept if already set, otherwise taken from the configured
    /// generator, otherwise from the id type's fallback (max + 1 for integer
    /// ids, a fresh v4 for [`Uuid`](uuid::Uuid)). An id that is already
    /// present is rejected with [`Error::AlreadyExists`] and nothing is
    /// written. `created_at` is stamped with the current time.
    pub fn create(&self, record: R) -> Result<R> {
        self.write_through("create", |collection| self.insert(collection, record))
    }

    /// Replace the record stored under `id`, in place.
    ///
    /// The stored id and `created_at` are carried over onto `record`, and
    /// `updated_at` is stamped when the type tracks it. Missing ids give
    /// [`Error::NotFound`] with no write.
    pub fn update(&self, id: &R::Id, record: R) -> Result<R> {
        self.write_through("update", |collection| {
            let pos = collection
                .position(id)
                .ok_or_else(|| Error::NotFound(id.to_string()))?;
            Ok(replace_at(collection, pos, record))
        })
    }

    /// Remove the record stored under `id` and return it. Missing ids give
    /// [`Error::NotFound`] with no write.
    pub fn delete(&self, id: &R::Id) -> Result<R> {
        self.write_through("delete", |collection| {
            collection
                .remove(id)
                .ok_or_else(|| Error::NotFound(id.to_string()))
        })
    }

    /// Update the record with the same id if there is one, otherwise create
    /// it. Always writes on success.
    pub fn upsert(&self, record: R) -> Result<R> {
        self.write_through("upsert", |collection| {
            let existing = if record.id().is_unset() {
                None
            } else {
                collection.position(record.id())
            };
            match existing {
                Some(pos) => Ok(replace_at(collection, pos, record)),
                None => self.insert(collection, record),
            }
        })
    }

    // ---- internal ----

    fn insert(&self, collection: &mut Collection<R>, mut record: R) -> Result<R> {
        let id = collection.assign_id(&record, self.generator.as_ref())?;
        if id.is_unset() {
            return Err(Error::MissingId);
        }
        if collection.contains(&id) {
            return Err(Error::AlreadyExists(id.to_string()));
        }
        record.set_id(id);
        record.set_created_at(Utc::now());
        collection.push(record.clone());
        Ok(record)
    }

    /// Run `mutate` under the exclusive lock, then persist the whole
    /// collection while still holding it. Nothing is written if `mutate`
    /// fails.
    fn write_through<T, F>(&self, op: &'static str, mutate: F) -> Result<T>
    where
        F: FnOnce(&mut Collection<R>) -> Result<T>,
    {
        let mut collection = self.reader.collection.write();
        let out = mutate(&mut *collection)?;
        if let Err(err) = self.persist(&*collection) {
            tracing::warn!(
                op,
                path = %self.reader.path.display(),
                error = %err,
                "persist failed; in-memory collection no longer matches the file"
            );
            return Err(err);
        }
        Ok(out)
    }

    fn persist(&self, collection: &Collection<R>) -> Result<()> {
        let bytes = self.reader.codec.encode(collection.records())?;
        self.reader.fs.write(&self.reader.path, &bytes)?;
        tracing::debug!(
            path = %self.reader.path.display(),
            records = collection.len(),
            bytes = bytes.len(),
            "persisted collection"
        );
        Ok(())
    }
}

fn replace_at<R: Record>(collection: &mut Collection<R>, pos: usize, mut record: R) -> R {
    let stored = &collection.records()[pos];
    record.set_id(stored.id().clone());
    if let Some(created) = stored.created_at() {
        record.set_created_at(created);
    }
    record.set_updated_at(Utc::now());
    collection.replace(pos, record.clone());
    record
}

impl<R: Record> std::ops::Deref for Writer<R> {
    type Target = Reader<R>;

    fn deref(&self) -> &Self::Target {
        &self.reader
    }
}

impl<R: Record> std::fmt::Debug for Writer<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Writer")
            .field("reader", &self.reader)
            .field("id_generator", &self.generator.is_some())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Configures and opens a [`Reader`] or [`Writer`].
///
/// ```rust,no_run
/// use recfile::{Format, Record, Timestamp, Writer};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Clone, Serialize, Deserialize)]
/// struct Task {
///     id: u64,
///     created_at: Option<Timestamp>,
///     title: String,
/// }
///
/// impl Record for Task {
///     type Id = u64;
///     fn id(&self) -> &u64 { &self.id }
///     fn set_id(&mut self, id: u64) { self.id = id }
///     fn created_at(&self) -> Option<Timestamp> { self.created_at }
///     fn set_created_at(&mut self, at: Timestamp) { self.created_at = Some(at) }
/// }
///
/// let tasks = Writer::<Task>::builder("tasks.csv")
///     .format(Format::Csv)
///     .delimiter(b';')
///     .writer()
///     .unwrap();
/// ```
pub struct StoreBuilder<R: Record> {
    path: PathBuf,
    format: Format,
    pretty: bool,
    delimiter: u8,
    codec: Option<Box<dyn Codec<R>>>,
    fs: Arc<dyn FileAccess>,
    generator: Option<IdGenerator<R>>,
}

impl<R: Record> StoreBuilder<R> {
    fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            format: Format::Json,
            pretty: false,
            delimiter: b',',
            codec: None,
            fs: Arc::new(OsFs),
            generator: None,
        }
    }

    /// On-disk format (default: [`Format::Json`]).
    pub fn format(mut self, format: Format) -> Self {
        self.format = format;
        self
    }

    /// Write indented JSON (default: compact). Ignored for CSV.
    pub fn pretty(mut self, yes: bool) -> Self {
        self.pretty = yes;
        self
    }

    /// CSV field delimiter (default: `b','`). Ignored for JSON.
    pub fn delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Use a custom codec instead of the built-in ones. Overrides
    /// [`format`](Self::format).
    pub fn codec(mut self, codec: impl Codec<R> + 'static) -> Self {
        self.codec = Some(Box::new(codec));
        self
    }

    /// Read and write through `fs` instead of the local file system.
    pub fn file_access(mut self, fs: Arc<dyn FileAccess>) -> Self {
        self.fs = fs;
        self
    }

    /// Generate ids for records created without one. Runs under the store's
    /// exclusive lock with the current sequence and the candidate record.
    pub fn id_generator<F>(mut self, generate: F) -> Self
    where
        F: Fn(&[R], &R) -> R::Id + Send + Sync + 'static,
    {
        self.generator = Some(Arc::new(generate));
        self
    }

    fn build_codec(&mut self) -> Result<Box<dyn Codec<R>>> {
        if let Some(codec) = self.codec.take() {
            return Ok(codec);
        }
        Ok(match self.format {
            Format::Json if self.pretty => Box::new(JsonCodec::pretty()),
            Format::Json => Box::new(JsonCodec::new()),
            Format::Csv => {
                CsvCodec::validate_delimiter(self.delimiter)?;
                Box::new(CsvCodec::with_delimiter(self.delimiter))
            }
        })
    }

    /// Load the file and return a read-only store.
    pub fn reader(mut self) -> Result<Reader<R>> {
        let codec = self.build_codec()?;
        Reader::load(self.path, codec, self.fs)
    }

    /// Load the file and return a read-write store.
    pub fn writer(mut self) -> Result<Writer<R>> {
        let codec = self.build_codec()?;
        let generator = self.generator.take();
        let reader = Reader::load(self.path, codec, self.fs)?;
        Ok(Writer { reader, generator })
    }
}

impl<R: Record> std::fmt::Debug for StoreBuilder<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreBuilder")
            .field("path", &self.path)
            .field("format", &self.format)
            .field("pretty", &self.pretty)
            .field("delimiter", &(self.delimiter as char))
            .field("fs", &self.fs)
            .field("id_generator", &self.generator.is_some())
            .finish_non_exhaustive()
    }
}
