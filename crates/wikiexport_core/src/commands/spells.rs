use anyhow::Result;

use super::{Command, CommandContext, add_by_source};
use crate::dataset::DataSetCollection;
use crate::spells::read_spells;

/// Dataset holding every spell regardless of source.
pub const ALL_SPELLS_DATASET: &str = "spells";

pub struct SpellsCommand;

impl Command for SpellsCommand {
    fn alias(&self) -> &'static str {
        "spells"
    }

    fn help(&self) -> &'static str {
        "Exporte les données sur les sorts contenus dans le wiki."
    }

    fn execute(
        &self,
        context: &mut CommandContext<'_>,
        data_sets: &mut DataSetCollection,
    ) -> Result<usize> {
        let spells = read_spells(context.export, context.lists, context.log)?;
        let count = spells.len();

        let all = data_sets.resolve(ALL_SPELLS_DATASET);
        for spell in &spells {
            all.add_source(&spell.source.id);
            all.spells.push(spell.clone());
        }

        add_by_source(
            data_sets,
            spells,
            |spell| spell.source.id.as_str(),
            |set| &mut set.spells,
        );
        Ok(count)
    }
}
