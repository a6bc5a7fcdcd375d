use anyhow::Result;

use super::{Command, CommandContext, add_by_source};
use crate::dataset::DataSetCollection;
use crate::feats::read_feats;

pub struct FeatsCommand;

impl Command for FeatsCommand {
    fn alias(&self) -> &'static str {
        "feats"
    }

    fn help(&self) -> &'static str {
        "Exporte les données sur les dons contenus dans le wiki."
    }

    fn execute(
        &self,
        context: &mut CommandContext<'_>,
        data_sets: &mut DataSetCollection,
    ) -> Result<usize> {
        let feats = read_feats(context.export, context.lists, context.log);
        let count = feats.len();
        add_by_source(
            data_sets,
            feats,
            |feat| feat.source.id.as_str(),
            |set| &mut set.feats,
        );
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::FeatsCommand;
    use crate::commands::{Command, CommandContext};
    use crate::dataset::DataSetCollection;
    use crate::lists::ParserLists;
    use crate::log::{LogLevel, RunLog};
    use crate::model::source_ids;
    use crate::wiki::tests::page;
    use crate::wiki::{WikiExport, WikiName};

    #[test]
    fn feats_are_grouped_by_source() {
        let mut export = WikiExport::new("Pathfinder-RPG");
        for (full_name, raw) in [
            (
                "Pathfinder-RPG.Esquive",
                "''Vous êtes agile.''\n\n'''Catégorie.''' Combat\n\n'''Avantage.''' +1 à la CA.",
            ),
            (
                "Pathfinder-RPG.Tir rapide",
                "{s:APG}''Vous tirez vite.''\n\n'''Avantage.''' Une attaque de plus.",
            ),
            ("Pathfinder-RPG.Brouillon", "Pas de description"),
        ] {
            let mut feat = page(full_name, raw);
            feat.categories = vec![WikiName::parse("Pathfinder-RPG.Don")];
            export.insert(feat);
        }

        let temp = tempdir().expect("tempdir");
        let lists = ParserLists::embedded().expect("lists");
        let mut log = RunLog::new();
        let mut sets = DataSetCollection::new("fr-FR");
        let mut context = CommandContext {
            export: &export,
            lists: &lists,
            log: &mut log,
            output_dir: temp.path(),
        };

        let count = FeatsCommand.execute(&mut context, &mut sets).expect("feats");

        assert_eq!(count, 2);
        assert_eq!(sets.names(), vec!["advanced-players-guide", "pathfinder-rpg"]);
        let core = sets.get(source_ids::PATHFINDER_RPG).expect("core");
        assert_eq!(core.feats[0].name, "Esquive");
        assert!(log.contains(LogLevel::Error, "Brouillon: La première ligne n'est pas en italique"));
    }
}
