use rocksdb::{DBWithThreadMode, MultiThreaded};
use std::path::PathBuf;
use std::sync::Arc;

/// The DB type used for treepath stores
pub type DB = DBWithThreadMode<MultiThreaded>;

/// Deletes an existing DB if it exists
pub fn delete_db(db_dir: PathBuf) {
    if !db_dir.exists() {
        return;
    }
    let options = rocksdb::Options::default();
    DB::destroy(&options, db_dir).expect("DB is expected to be deletable");
}

/// Builder for a store connection.
#[derive(Debug, Clone)]
pub struct ConnBuilder {
    db_path: PathBuf,
    create_if_missing: bool,
    parallelism: usize,
    mem_budget: usize,
}

impl ConnBuilder {
    pub fn new(db_path: PathBuf) -> Self {
        Self { db_path, create_if_missing: true, parallelism: 1, mem_budget: 64 * 1024 * 1024 }
    }

    pub fn with_create_if_missing(self, create_if_missing: bool) -> Self {
        Self { create_if_missing, ..self }
    }

    pub fn with_parallelism(self, parallelism: impl Into<usize>) -> Self {
        Self { parallelism: parallelism.into(), ..self }
    }

    pub fn with_mem_budget(self, mem_budget: impl Into<usize>) -> Self {
        Self { mem_budget: mem_budget.into(), ..self }
    }

    pub fn build(self) -> Result<Arc<DB>, rocksdb::Error> {
        let mut opts = rocksdb::Options::default();
        if self.parallelism > 1 {
            opts.increase_parallelism(self.parallelism as i32);
        }
        opts.optimize_level_style_compaction(self.mem_budget);
        opts.create_if_missing(self.create_if_missing);
        Ok(Arc::new(DB::open(&opts, self.db_path)?))
    }
}

/// Keeps the temporary directory of a test DB alive; dropping it deletes
/// the directory.
pub struct TempDbLifetime {
    _tempdir: tempfile::TempDir,
}

/// Creates a DB in a fresh temporary directory, for tests.
pub fn create_temp_db() -> (TempDbLifetime, Arc<DB>) {
    let tempdir = tempfile::tempdir().expect("a temp dir is expected to be creatable");
    let db = ConnBuilder::new(tempdir.path().to_path_buf()).build().expect("a temp db is expected to be creatable");
    (TempDbLifetime { _tempdir: tempdir }, db)
}
