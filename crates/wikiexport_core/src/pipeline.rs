//! One export run: load the wiki, run the commands, then write every dataset.

use std::path::PathBuf;

use anyhow::Result;

use crate::commands::{Command, CommandContext, CommandReport, run_commands};
use crate::config::ExportConfig;
use crate::dataset::DataSetCollection;
use crate::lists::ParserLists;
use crate::log::RunLog;
use crate::runtime::ResolvedPaths;
use crate::wiki::WikiExport;
use crate::writers::{WriterOptions, write_all};

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub pages: usize,
    pub reports: Vec<CommandReport>,
    pub data_sets: Vec<String>,
    pub files: Vec<PathBuf>,
    pub warnings: usize,
    pub errors: usize,
}

/// Writers only run once every command has succeeded.
pub fn run_export(
    paths: &ResolvedPaths,
    config: &ExportConfig,
    commands: &[Box<dyn Command>],
    options: &WriterOptions,
    log: &mut RunLog,
) -> Result<RunSummary> {
    let export = WikiExport::load(&paths.input_dir, config.default_namespace(), log)?;
    log.information(format!("{} pages chargées", export.len()));
    let lists = ParserLists::load(paths.lists_dir.as_deref())?;

    let mut data_sets = DataSetCollection::new(config.lang());
    let reports = {
        let mut context = CommandContext {
            export: &export,
            lists: &lists,
            log: &mut *log,
            output_dir: &paths.output_dir,
        };
        run_commands(commands, &mut context, &mut data_sets)?
    };

    let files = write_all(&data_sets, &paths.output_dir, options)?;

    Ok(RunSummary {
        pages: export.len(),
        reports,
        data_sets: data_sets.names().into_iter().map(str::to_string).collect(),
        files,
        warnings: log.warning_count(),
        errors: log.error_count(),
    })
}
