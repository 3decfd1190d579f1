use super::geojson::read_boundaries;
use super::mapping::FieldMap;
use super::parser::read_dataset;
use super::{BoundaryBatch, DatasetBatch, ImportError, IngestionFeed};
use crate::attributes::DatasetKind;
use crate::boundaries::BoundaryLevel;
use chrono::{NaiveDate, Utc};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Feed backed by a data directory laid out with fixed file names.
///
/// ```text
/// states.geojson  counties.geojson  tracts.geojson
/// coal_closure.csv  ffe_unemployment.csv  persistent_poverty.csv
/// <dataset>.mapping.json   (optional field map override)
/// ```
#[derive(Debug, Clone)]
pub struct DirectoryFeed {
    root: PathBuf,
    ingested_on: NaiveDate,
}

impl DirectoryFeed {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self {
            root: root.into(),
            ingested_on: Utc::now().date_naive(),
        }
    }

    /// Date stamped on records whose file has no "added" column.
    pub fn with_ingested_on(mut self, date: NaiveDate) -> Self {
        self.ingested_on = date;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn boundary_path(&self, level: BoundaryLevel) -> PathBuf {
        let file = match level {
            BoundaryLevel::State => "states.geojson",
            BoundaryLevel::County => "counties.geojson",
            BoundaryLevel::Tract => "tracts.geojson",
        };
        self.root.join(file)
    }

    pub fn dataset_path(&self, kind: DatasetKind) -> PathBuf {
        self.root.join(format!("{}.csv", kind.as_str()))
    }

    fn mapping_path(&self, kind: DatasetKind) -> PathBuf {
        self.root.join(format!("{}.mapping.json", kind.as_str()))
    }

    /// Override from the data directory when present, the standard map otherwise.
    pub fn field_map(&self, kind: DatasetKind) -> Result<FieldMap, ImportError> {
        let path = self.mapping_path(kind);
        if !path.is_file() {
            return Ok(FieldMap::standard(kind));
        }

        let map = FieldMap::from_json(&std::fs::read_to_string(&path)?)?;
        map.validate_for(kind)?;
        info!(dataset = %kind, path = %path.display(), "using field map override");
        Ok(map)
    }
}

impl IngestionFeed for DirectoryFeed {
    fn boundaries(&self, level: BoundaryLevel) -> Result<Option<BoundaryBatch>, ImportError> {
        let path = self.boundary_path(level);
        if !path.is_file() {
            debug!(%level, path = %path.display(), "no boundary file; keeping current layer");
            return Ok(None);
        }

        let source = path.display().to_string();
        let boundaries = read_boundaries(BufReader::new(File::open(&path)?), level, &source)?;
        info!(%level, path = %source, boundaries = boundaries.len(), "read boundary file");
        Ok(Some(BoundaryBatch {
            level,
            source,
            boundaries,
        }))
    }

    fn dataset(&self, kind: DatasetKind) -> Result<Option<DatasetBatch>, ImportError> {
        let path = self.dataset_path(kind);
        if !path.is_file() {
            debug!(dataset = %kind, path = %path.display(), "no dataset file; keeping current records");
            return Ok(None);
        }

        let map = self.field_map(kind)?;
        let source = path.display().to_string();
        let batch = read_dataset(
            BufReader::new(File::open(&path)?),
            &map,
            &source,
            self.ingested_on,
        )?;
        info!(
            dataset = %kind,
            path = %source,
            version = %batch.version,
            records = batch.records.len(),
            "read dataset file"
        );
        Ok(Some(batch))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn scratch_dir() -> TempDir {
        TempDir::new().expect("create scratch dir")
    }

    #[test]
    fn missing_files_are_skipped() {
        let dir = scratch_dir();
        let feed = DirectoryFeed::new(dir.path());

        assert!(feed
            .boundaries(BoundaryLevel::Tract)
            .expect("no error")
            .is_none());
        assert!(feed
            .dataset(DatasetKind::CoalClosure)
            .expect("no error")
            .is_none());
    }

    #[test]
    fn mapping_override_replaces_the_standard_map() {
        let dir = scratch_dir();
        std::fs::write(
            dir.path().join("persistent_poverty.mapping.json"),
            r#"{"dataset": "persistent_poverty", "boundary": "fips",
                "facts": [{"fact": "persistent_poverty", "column": "pp"}],
                "default_version": "2019.0"}"#,
        )
        .expect("write map");
        std::fs::write(dir.path().join("persistent_poverty.csv"), "fips,pp\n54039,1\n")
            .expect("write csv");

        let feed = DirectoryFeed::new(dir.path())
            .with_ingested_on(NaiveDate::from_ymd_opt(2024, 5, 1).expect("valid date"));
        let batch = feed
            .dataset(DatasetKind::PersistentPoverty)
            .expect("read dataset")
            .expect("dataset present");

        assert_eq!(batch.records.len(), 1);
        assert_eq!(batch.version.to_string(), "2019.0");
    }

    #[test]
    fn override_for_another_dataset_is_rejected() {
        let dir = scratch_dir();
        std::fs::write(
            dir.path().join("coal_closure.mapping.json"),
            r#"{"dataset": "persistent_poverty", "boundary": "fips",
                "facts": [{"fact": "persistent_poverty", "column": "pp"}],
                "default_version": "1.0"}"#,
        )
        .expect("write map");

        let feed = DirectoryFeed::new(dir.path());
        assert!(matches!(
            feed.field_map(DatasetKind::CoalClosure),
            Err(ImportError::Mapping(_))
        ));
    }
}
