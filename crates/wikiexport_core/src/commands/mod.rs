//! Export commands run by the CLI against one shared dataset collection.

pub mod feats;
pub mod monsters;
pub mod spell_glossary;
pub mod spells;

use std::path::Path;

use anyhow::Result;

use crate::dataset::{DataSet, DataSetCollection};
use crate::lists::ParserLists;
use crate::log::RunLog;
use crate::wiki::WikiExport;

pub struct CommandContext<'a> {
    pub export: &'a WikiExport,
    pub lists: &'a ParserLists,
    pub log: &'a mut RunLog,
    pub output_dir: &'a Path,
}

pub trait Command {
    fn alias(&self) -> &'static str;

    fn help(&self) -> &'static str;

    /// Runs the command and returns the number of entities it read.
    fn execute(
        &self,
        context: &mut CommandContext<'_>,
        data_sets: &mut DataSetCollection,
    ) -> Result<usize>;
}

pub fn all_commands() -> Vec<Box<dyn Command>> {
    vec![
        Box::new(spells::SpellsCommand),
        Box::new(feats::FeatsCommand),
        Box::new(monsters::MonstersCommand),
        Box::new(spell_glossary::SpellGlossaryCommand),
    ]
}

pub fn find(alias: &str) -> Option<Box<dyn Command>> {
    all_commands()
        .into_iter()
        .find(|command| command.alias().eq_ignore_ascii_case(alias))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandReport {
    pub alias: &'static str,
    pub count: usize,
}

/// Runs `commands` in order; the first failure aborts the remaining ones.
pub fn run_commands(
    commands: &[Box<dyn Command>],
    context: &mut CommandContext<'_>,
    data_sets: &mut DataSetCollection,
) -> Result<Vec<CommandReport>> {
    let mut reports = Vec::with_capacity(commands.len());
    for command in commands {
        context
            .log
            .information(format!("Exécution commande {}", command.alias()));
        let count = command.execute(context, data_sets)?;
        reports.push(CommandReport {
            alias: command.alias(),
            count,
        });
    }
    Ok(reports)
}

/// Appends each item to the dataset named after its source id.
/// Items without a source are left out.
fn add_by_source<T>(
    data_sets: &mut DataSetCollection,
    items: Vec<T>,
    source_of: impl Fn(&T) -> &str,
    section: impl Fn(&mut DataSet) -> &mut Vec<T>,
) {
    for item in items {
        let source = source_of(&item).to_string();
        if source.is_empty() {
            continue;
        }
        let data_set = data_sets.resolve(&source);
        data_set.add_source(&source);
        section(data_set).push(item);
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::{CommandContext, add_by_source, all_commands, find, run_commands};
    use crate::dataset::DataSetCollection;
    use crate::lists::ParserLists;
    use crate::log::{LogLevel, RunLog};
    use crate::model::{ElementSource, Feat, source_ids};
    use crate::wiki::WikiExport;

    fn feat(id: &str, source: &str) -> Feat {
        Feat {
            id: id.to_string(),
            name: id.to_string(),
            source: ElementSource::new(source),
            ..Feat::default()
        }
    }

    #[test]
    fn find_is_case_insensitive() {
        assert_eq!(find("SPELLS").map(|command| command.alias()), Some("spells"));
        assert_eq!(
            find("SpellGlossary").map(|command| command.alias()),
            Some("spellglossary")
        );
        assert!(find("items").is_none());
        let aliases: Vec<&str> = all_commands().iter().map(|command| command.alias()).collect();
        assert_eq!(aliases, vec!["spells", "feats", "monsters", "spellglossary"]);
    }

    #[test]
    fn add_by_source_groups_and_skips_missing_sources() {
        let mut sets = DataSetCollection::new("fr-FR");
        add_by_source(
            &mut sets,
            vec![
                feat("esquive", source_ids::PATHFINDER_RPG),
                feat("attaque-en-puissance", source_ids::PATHFINDER_RPG),
                feat("sans-source", ""),
                feat("tir-rapide", source_ids::ADVANCED_PLAYERS_GUIDE),
            ],
            |feat| feat.source.id.as_str(),
            |set| &mut set.feats,
        );

        assert_eq!(sets.names(), vec!["advanced-players-guide", "pathfinder-rpg"]);
        let core = sets.get(source_ids::PATHFINDER_RPG).expect("core");
        assert_eq!(core.feats.len(), 2);
        assert_eq!(core.sources.len(), 1);
        assert_eq!(core.lang.as_deref(), Some("fr-FR"));
    }

    #[test]
    fn run_commands_logs_each_command_and_stops_on_failure() {
        let temp = tempdir().expect("tempdir");
        let export = WikiExport::new("Pathfinder-RPG");
        let lists = ParserLists::embedded().expect("lists");
        let mut log = RunLog::new();
        let mut sets = DataSetCollection::new("fr-FR");
        let commands = vec![
            find("feats").expect("feats"),
            find("spells").expect("spells"),
            find("monsters").expect("monsters"),
        ];

        let mut context = CommandContext {
            export: &export,
            lists: &lists,
            log: &mut log,
            output_dir: temp.path(),
        };
        let error = run_commands(&commands, &mut context, &mut sets).expect_err("no index");
        assert!(error.to_string().contains("liste des sorts"));

        assert!(log.contains(LogLevel::Information, "Exécution commande feats"));
        assert!(log.contains(LogLevel::Information, "Exécution commande spells"));
        assert!(!log.contains(LogLevel::Information, "Exécution commande monsters"));
        assert!(sets.is_empty());
    }
}
