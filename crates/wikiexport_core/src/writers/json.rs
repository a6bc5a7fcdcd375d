use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use super::{DataSetView, DataSetWriter, WriterOptions, dataset_folder, parts};
use crate::dataset::DataSet;

/// `<out>/<name>/{header,spells,feats,monsters}.json`, pretty printed.
pub struct JsonWriter;

impl DataSetWriter for JsonWriter {
    fn format(&self) -> &'static str {
        "json"
    }

    fn accept(&self, options: &WriterOptions) -> bool {
        options.json
    }

    fn write(&self, name: &str, data_set: &DataSet, directory: &Path) -> Result<Vec<PathBuf>> {
        let folder = dataset_folder(directory, name)?;
        let mut written = Vec::new();
        for (stem, view) in parts(data_set) {
            let path = folder.join(format!("{stem}.json"));
            write_file(&path, &view)?;
            written.push(path);
        }
        Ok(written)
    }
}

fn write_file(path: &Path, view: &DataSetView<'_>) -> Result<()> {
    let file = File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, view)
        .with_context(|| format!("failed to serialize {}", path.display()))?;
    writer
        .write_all(b"\n")
        .and_then(|()| writer.flush())
        .with_context(|| format!("failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use std::fs;

    use serde_json::Value;
    use tempfile::tempdir;

    use super::JsonWriter;
    use crate::writers::DataSetWriter;
    use crate::writers::tests::sample_data_set;

    #[test]
    fn writes_one_file_per_section_and_skips_empty_values() {
        let temp = tempdir().expect("tempdir");
        let written = JsonWriter
            .write("pathfinder-rpg", &sample_data_set(), temp.path())
            .expect("write");
        assert_eq!(written.len(), 2);

        let content =
            fs::read_to_string(temp.path().join("pathfinder-rpg").join("spells.json")).expect("read");
        let json: Value = serde_json::from_str(&content).expect("json");
        assert_eq!(json["lang"], "fr-FR");
        assert_eq!(json["sources"][0]["id"], "pathfinder-rpg");
        let spell = &json["spells"][0];
        assert_eq!(spell["school"], "evocation");
        assert_eq!(spell["levels"][0]["list"], "cleric");
        assert!(spell.get("range").is_none());
        assert!(spell.get("descriptor").is_none());
        assert!(json.get("feats").is_none());
    }
}
