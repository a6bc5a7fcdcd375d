use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use super::{DataSetWriter, WriterOptions, dataset_folder};
use crate::dataset::DataSet;
use crate::model::{CastingTime, Feat, Monster, Spell, TimeUnit, list_ids};
use crate::references::{PAIZO_PRD, PATHFINDER_FR_WIKI};

const SPELL_COLUMNS: [&str; 26] = [
    "Id", "Name", "English", "Source", "Descriptor", "School", "Alchemist", "AntiPaladin", "Bard",
    "Cleric", "Druid", "Inquisitor", "Summoner", "Magus", "Oracle", "Paladin", "Ranger", "Witch",
    "Wizard", "Components", "Range", "Target", "CastingTime", "Summary", "FrUrl", "EnUrl",
];

/// Level columns, in header order.
const LEVEL_COLUMNS: [&str; 13] = [
    list_ids::ALCHEMIST,
    list_ids::ANTIPALADIN,
    list_ids::BARD,
    list_ids::CLERIC,
    list_ids::DRUID,
    list_ids::INQUISITOR,
    list_ids::SUMMONER,
    list_ids::MAGUS,
    list_ids::ORACLE,
    list_ids::PALADIN,
    list_ids::RANGER,
    list_ids::WITCH,
    list_ids::SORCERER_WIZARD,
];

const FEAT_COLUMNS: [&str; 4] = ["Id", "Name", "Source", "Types"];

const MONSTER_COLUMNS: [&str; 8] = [
    "Id",
    "Name",
    "Source",
    "Type",
    "Climate",
    "Environment",
    "CR",
    "English",
];

/// Flattened per-kind projection in `<out>/<name>/{spells,feats,monsters}.csv`.
pub struct CsvWriter;

impl DataSetWriter for CsvWriter {
    fn format(&self) -> &'static str {
        "csv"
    }

    fn accept(&self, options: &WriterOptions) -> bool {
        options.csv
    }

    fn write(&self, name: &str, data_set: &DataSet, directory: &Path) -> Result<Vec<PathBuf>> {
        let folder = dataset_folder(directory, name)?;
        let mut written = Vec::new();

        if !data_set.spells.is_empty() {
            let rows = data_set.spells.iter().map(spell_row);
            written.push(write_table(&folder.join("spells.csv"), &SPELL_COLUMNS, rows)?);
        }
        if !data_set.feats.is_empty() {
            let rows = data_set.feats.iter().map(feat_row);
            written.push(write_table(&folder.join("feats.csv"), &FEAT_COLUMNS, rows)?);
        }
        if !data_set.monsters.is_empty() {
            let rows = data_set.monsters.iter().map(monster_row);
            written.push(write_table(&folder.join("monsters.csv"), &MONSTER_COLUMNS, rows)?);
        }

        Ok(written)
    }
}

fn write_table<I>(path: &Path, columns: &[&str], rows: I) -> Result<PathBuf>
where
    I: Iterator<Item = Vec<String>>,
{
    let mut content = String::new();
    push_record(&mut content, columns.iter().copied());
    for row in rows {
        push_record(&mut content, row.iter().map(String::as_str));
    }
    fs::write(path, content).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path.to_path_buf())
}

fn push_record<'a>(content: &mut String, fields: impl Iterator<Item = &'a str>) {
    for (index, field) in fields.enumerate() {
        if index > 0 {
            content.push(',');
        }
        content.push_str(&quote(field));
    }
    content.push_str("\r\n");
}

/// RFC 4180 quoting: fields holding a separator, quote or line break are quoted.
pub fn quote(field: &str) -> String {
    if field.contains([',', '"', '\r', '\n']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn spell_row(spell: &Spell) -> Vec<String> {
    let mut row = vec![
        spell.id.clone(),
        spell.name.clone(),
        spell.english_name().unwrap_or_default().to_string(),
        spell.source.id.clone(),
        spell.descriptor.labels().join(", "),
        spell.school.as_str().to_string(),
    ];
    row.extend(LEVEL_COLUMNS.iter().map(|list| {
        spell
            .level_for(list)
            .map(|level| level.to_string())
            .unwrap_or_default()
    }));
    row.extend([
        spell
            .components
            .as_ref()
            .map(|components| components.kinds.labels().join(", "))
            .unwrap_or_default(),
        spell.range.as_ref().map(|range| range.label()).unwrap_or_default(),
        spell.target.clone().unwrap_or_default(),
        spell.casting_time.as_ref().map(casting_time_label).unwrap_or_default(),
        spell.summary.clone().unwrap_or_default(),
        reference_href(spell, PATHFINDER_FR_WIKI),
        reference_href(spell, PAIZO_PRD),
    ]);
    row
}

fn casting_time_label(casting_time: &CastingTime) -> String {
    match (casting_time.unit, casting_time.text.as_deref()) {
        (TimeUnit::Special, Some(text)) => text.to_string(),
        (unit, _) => format!("{} {}", casting_time.value, unit.as_str()),
    }
}

fn reference_href(spell: &Spell, name: &str) -> String {
    spell
        .reference(name)
        .map(|reference| reference.href.clone())
        .unwrap_or_default()
}

fn feat_row(feat: &Feat) -> Vec<String> {
    vec![
        feat.id.clone(),
        feat.name.clone(),
        feat.source.id.clone(),
        feat.types
            .iter()
            .map(|feat_type| feat_type.as_str())
            .collect::<Vec<_>>()
            .join(", "),
    ]
}

fn monster_row(monster: &Monster) -> Vec<String> {
    vec![
        monster.id.clone(),
        monster.name.clone(),
        monster.primary_source().to_string(),
        monster.creature_type.as_str().to_string(),
        monster.climate.as_str().to_string(),
        monster.environment.as_str().to_string(),
        monster.cr.to_string(),
        monster.english_name().unwrap_or_default().to_string(),
    ]
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::{CsvWriter, quote};
    use crate::model::{ENGLISH, Monster, list_ids};
    use crate::writers::DataSetWriter;
    use crate::writers::tests::sample_data_set;

    #[test]
    fn quote_escapes_only_when_needed() {
        assert_eq!(quote("lumiere"), "lumiere");
        assert_eq!(quote("a, b"), "\"a, b\"");
        assert_eq!(quote("dit \"oui\""), "\"dit \"\"oui\"\"\"");
    }

    #[test]
    fn writes_flat_projections() {
        let temp = tempdir().expect("tempdir");
        let mut data_set = sample_data_set();
        data_set.spells[0].add_level(list_ids::ORACLE, 0);
        let mut monster = Monster {
            id: "gobelin".to_string(),
            name: "Gobelin".to_string(),
            cr: 0.33,
            ..Monster::default()
        };
        monster.localization.set(ENGLISH, "name", "Goblin");
        data_set.monsters.push(monster);

        let written = CsvWriter.write("core", &data_set, temp.path()).expect("write");
        assert_eq!(written.len(), 3);

        let spells = fs::read_to_string(temp.path().join("core").join("spells.csv")).expect("read");
        let mut lines = spells.split("\r\n");
        let header = lines.next().expect("header");
        assert!(header.starts_with("Id,Name,English,Source,Descriptor,School,Alchemist"));
        assert!(header.ends_with("CastingTime,Summary,FrUrl,EnUrl"));
        let row = lines.next().expect("row");
        assert!(row.starts_with("lumiere,Lumière,,pathfinder-rpg,,evocation,,,,0,,,,,0,,,,,"));
        assert!(row.contains("\"Fait briller un objet, \"\"comme\"\" une torche.\""));

        let feats = fs::read_to_string(temp.path().join("core").join("feats.csv")).expect("read");
        assert_eq!(feats, "Id,Name,Source,Types\r\nesquive,Esquive,pathfinder-rpg,combat\r\n");

        let monsters = fs::read_to_string(temp.path().join("core").join("monsters.csv")).expect("read");
        assert!(monsters.contains("gobelin,Gobelin,bestiary,other,other,unknown,0.33,Goblin\r\n"));
    }
}
