//! Locating and parsing the files of a data directory.
//!
//! A table is stored as `<table>.ron`, `<table>.json` or `<table>.toml`.
//! RON and JSON files hold the row list directly; TOML files hold it under
//! a top-level key named after the table (`[[wares]]`).

use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

use crate::loader::DataLoadError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Ron,
    Json,
    Toml,
}

impl Format {
    /// Extensions tried for a table, in lookup order.
    const EXTENSIONS: [(&'static str, Format); 3] = [
        ("ron", Format::Ron),
        ("json", Format::Json),
        ("toml", Format::Toml),
    ];

    pub fn from_path(path: &Path) -> Result<Format, DataLoadError> {
        let ext = path.extension().and_then(|e| e.to_str());
        Self::EXTENSIONS
            .iter()
            .find(|(known, _)| Some(*known) == ext)
            .map(|(_, format)| *format)
            .ok_or_else(|| DataLoadError::UnknownExtension {
                path: path.to_path_buf(),
            })
    }
}

/// One data file and its format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataFile {
    path: PathBuf,
    format: Format,
}

impl DataFile {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, DataLoadError> {
        let path = path.into();
        let format = Format::from_path(&path)?;
        Ok(Self { path, format })
    }

    /// Find the file holding `table` in `dir`. Two files for the same table
    /// are an error.
    pub fn locate(dir: &Path, table: &str) -> Result<Option<Self>, DataLoadError> {
        let mut found: Option<DataFile> = None;
        for (ext, format) in Format::EXTENSIONS {
            let path = dir.join(format!("{table}.{ext}"));
            if !path.is_file() {
                continue;
            }
            if let Some(first) = &found {
                return Err(DataLoadError::AmbiguousTable {
                    first: first.path.clone(),
                    second: path,
                });
            }
            found = Some(DataFile { path, format });
        }
        Ok(found)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> Format {
        self.format
    }

    /// Parse the whole file as one value.
    pub fn parse<T: DeserializeOwned>(&self) -> Result<T, DataLoadError> {
        let text = std::fs::read_to_string(&self.path)?;
        match self.format {
            Format::Ron => ron::from_str(&text).map_err(|e| self.parse_error(e)),
            Format::Json => serde_json::from_str(&text).map_err(|e| self.parse_error(e)),
            Format::Toml => toml::from_str(&text).map_err(|e| self.parse_error(e)),
        }
    }

    /// Parse the row list of `table`.
    pub fn parse_rows<T: DeserializeOwned>(&self, table: &str) -> Result<Vec<T>, DataLoadError> {
        if self.format != Format::Toml {
            return self.parse();
        }
        let mut doc: toml::Table = self.parse()?;
        let rows = doc
            .remove(table)
            .ok_or_else(|| self.parse_error(format!("no `{table}` array")))?;
        rows.try_into()
            .map_err(|e: toml::de::Error| self.parse_error(e))
    }

    fn parse_error(&self, message: impl ToString) -> DataLoadError {
        DataLoadError::Parse {
            path: self.path.clone(),
            message: message.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::WareData;
    use std::fs;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "stationplan_files_test_{name}_{}",
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn format_follows_extension() {
        assert_eq!(Format::from_path(Path::new("a/wares.ron")).unwrap(), Format::Ron);
        assert_eq!(Format::from_path(Path::new("wares.json")).unwrap(), Format::Json);
        assert_eq!(Format::from_path(Path::new("wares.toml")).unwrap(), Format::Toml);
        for name in ["wares.xml", "wares"] {
            assert!(matches!(
                Format::from_path(Path::new(name)),
                Err(DataLoadError::UnknownExtension { .. })
            ));
        }
    }

    #[test]
    fn locate_finds_one_file_per_table() {
        let dir = scratch_dir("locate");
        assert!(DataFile::locate(&dir, "wares").unwrap().is_none());

        fs::write(dir.join("wares.json"), "[]").unwrap();
        let file = DataFile::locate(&dir, "wares").unwrap().unwrap();
        assert_eq!(file.path(), dir.join("wares.json"));
        assert_eq!(file.format(), Format::Json);

        fs::write(dir.join("wares.ron"), "[]").unwrap();
        assert!(matches!(
            DataFile::locate(&dir, "wares"),
            Err(DataLoadError::AmbiguousTable { .. })
        ));
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn rows_parse_in_every_format() {
        let dir = scratch_dir("rows");
        fs::write(dir.join("a.ron"), r#"[(name: "ore"), (name: "silicon")]"#).unwrap();
        fs::write(dir.join("b.json"), r#"[{"name": "ore"}, {"name": "silicon"}]"#).unwrap();
        fs::write(
            dir.join("c.toml"),
            "[[wares]]\nname = \"ore\"\n\n[[wares]]\nname = \"silicon\"\n",
        )
        .unwrap();

        for name in ["a.ron", "b.json", "c.toml"] {
            let rows: Vec<WareData> = DataFile::open(dir.join(name))
                .unwrap()
                .parse_rows("wares")
                .unwrap();
            let names: Vec<&str> = rows.iter().map(|r| r.name.as_str()).collect();
            assert_eq!(names, ["ore", "silicon"], "{name}");
        }
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn toml_without_the_table_key_is_a_parse_error() {
        let dir = scratch_dir("toml_key");
        let path = dir.join("wares.toml");
        fs::write(&path, "[[ships]]\nname = \"ore\"\n").unwrap();
        let result: Result<Vec<WareData>, _> = DataFile::open(&path).unwrap().parse_rows("wares");
        match result {
            Err(DataLoadError::Parse { path: p, message }) => {
                assert_eq!(p, path);
                assert!(message.contains("wares"));
            }
            other => panic!("expected a parse error, got {other:?}"),
        }
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn malformed_ron_is_a_parse_error() {
        let dir = scratch_dir("bad_ron");
        let path = dir.join("wares.ron");
        fs::write(&path, "[(name: ").unwrap();
        let result: Result<Vec<WareData>, _> = DataFile::open(&path).unwrap().parse_rows("wares");
        assert!(matches!(result, Err(DataLoadError::Parse { .. })));
        let _ = fs::remove_dir_all(&dir);
    }
}
