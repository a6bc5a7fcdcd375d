//! Dataset serialization: XML (always), JSON and CSV on demand.

pub mod csv;
pub mod json;
pub mod xml;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;

use crate::config::OutputSection;
use crate::dataset::{DataSet, DataSetCollection, DataSetHeader, Source};
use crate::model::{Feat, Monster, Spell};

pub use self::csv::CsvWriter;
pub use self::json::JsonWriter;
pub use self::xml::{XmlSingleWriter, XmlWriter};

/// Output formats selected for a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriterOptions {
    pub json: bool,
    pub csv: bool,
    pub single_file: bool,
}

impl WriterOptions {
    pub fn from_config(output: &OutputSection) -> Self {
        Self {
            json: output.json,
            csv: output.csv,
            single_file: output.single_file,
        }
    }
}

pub trait DataSetWriter {
    fn format(&self) -> &'static str;

    fn accept(&self, options: &WriterOptions) -> bool;

    /// Writes one dataset below `directory`, returning the files written.
    fn write(&self, name: &str, data_set: &DataSet, directory: &Path) -> Result<Vec<PathBuf>>;
}

pub fn writers() -> Vec<Box<dyn DataSetWriter>> {
    vec![
        Box::new(XmlWriter),
        Box::new(JsonWriter),
        Box::new(CsvWriter),
        Box::new(XmlSingleWriter),
    ]
}

/// Runs every accepted writer over every dataset.
pub fn write_all(
    data_sets: &DataSetCollection,
    directory: &Path,
    options: &WriterOptions,
) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(directory)
        .with_context(|| format!("failed to create {}", directory.display()))?;

    let writers = writers();
    let mut written = Vec::new();
    for (name, data_set) in data_sets.iter() {
        for writer in writers.iter().filter(|writer| writer.accept(options)) {
            let files = writer
                .write(name, data_set, directory)
                .with_context(|| format!("failed to write {} dataset {name}", writer.format()))?;
            tracing::debug!(dataset = name, format = writer.format(), files = files.len(), "dataset written");
            written.extend(files);
        }
    }
    Ok(written)
}

/// Borrowed slice of a dataset: its sources plus one or more sections.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct DataSetView<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lang: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header: Option<&'a DataSetHeader>,
    pub sources: &'a [Source],
    #[serde(skip_serializing_if = "<[_]>::is_empty")]
    pub spells: &'a [Spell],
    #[serde(skip_serializing_if = "<[_]>::is_empty")]
    pub feats: &'a [Feat],
    #[serde(skip_serializing_if = "<[_]>::is_empty")]
    pub monsters: &'a [Monster],
}

impl<'a> DataSetView<'a> {
    pub fn full(data_set: &'a DataSet) -> Self {
        Self {
            lang: data_set.lang.as_deref(),
            header: data_set.header.as_ref(),
            sources: &data_set.sources,
            spells: &data_set.spells,
            feats: &data_set.feats,
            monsters: &data_set.monsters,
        }
    }

    fn sources_only(data_set: &'a DataSet) -> Self {
        Self {
            header: None,
            spells: &[],
            feats: &[],
            monsters: &[],
            ..Self::full(data_set)
        }
    }
}

/// Per-section files of a dataset folder, by file stem; empty sections are skipped.
pub fn parts(data_set: &DataSet) -> Vec<(&'static str, DataSetView<'_>)> {
    let base = DataSetView::sources_only(data_set);
    let mut parts = Vec::new();
    if data_set.header.is_some() {
        parts.push((
            "header",
            DataSetView {
                header: data_set.header.as_ref(),
                ..base
            },
        ));
    }
    if !data_set.spells.is_empty() {
        parts.push((
            "spells",
            DataSetView {
                spells: &data_set.spells,
                ..base
            },
        ));
    }
    if !data_set.feats.is_empty() {
        parts.push((
            "feats",
            DataSetView {
                feats: &data_set.feats,
                ..base
            },
        ));
    }
    if !data_set.monsters.is_empty() {
        parts.push((
            "monsters",
            DataSetView {
                monsters: &data_set.monsters,
                ..base
            },
        ));
    }
    parts
}

fn dataset_folder(directory: &Path, name: &str) -> Result<PathBuf> {
    let folder = if name.is_empty() {
        directory.to_path_buf()
    } else {
        directory.join(name)
    };
    fs::create_dir_all(&folder).with_context(|| format!("failed to create {}", folder.display()))?;
    Ok(folder)
}
