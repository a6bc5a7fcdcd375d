use anyhow::Result;

use super::{Command, CommandContext, add_by_source};
use crate::dataset::DataSetCollection;
use crate::monsters::read_monsters;

pub struct MonstersCommand;

impl Command for MonstersCommand {
    fn alias(&self) -> &'static str {
        "monsters"
    }

    fn help(&self) -> &'static str {
        "(expérimental) Exporte les monstres"
    }

    fn execute(
        &self,
        context: &mut CommandContext<'_>,
        data_sets: &mut DataSetCollection,
    ) -> Result<usize> {
        let mut monsters = read_monsters(context.export, context.lists, context.log)?;
        let count = monsters.len();
        monsters.sort_by(|left, right| left.id.cmp(&right.id));
        add_by_source(
            data_sets,
            monsters,
            |monster| monster.primary_source(),
            |set| &mut set.monsters,
        );
        Ok(count)
    }
}
