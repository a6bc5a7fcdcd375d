//! The monster glossary table: English names matched to parsed monsters.

use crate::ids;
use crate::log::RunLog;
use crate::model::{ENGLISH, Monster};
use crate::wiki::WikiPage;

const LEFT_ALIGN_PREFIX: &str = "| class=\"gauche\" |";
const COLUMN_COUNT: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ruleset {
    Pathfinder,
    Dd3,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GlossaryEntry {
    pub english_name: String,
    pub french_name: String,
    pub french_link: Option<String>,
    pub ruleset: Option<Ruleset>,
    pub source_book: Option<String>,
    pub cr: Option<f64>,
}

/// Row reader position inside the wiki table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RowState {
    /// Caption and header lines before the first `|-`.
    Header,
    BetweenEntries,
    Column(usize),
}

/// Reads the table rows; each `|-` or `|}` closes the current entry.
pub fn read_entries(raw: &str, log: &mut RunLog) -> Vec<GlossaryEntry> {
    let mut entries = Vec::new();
    let mut entry: Option<GlossaryEntry> = None;
    let mut state = RowState::Header;

    for (index, line) in raw.lines().enumerate() {
        let line = line.trim();

        if line == "|}" || line == "|-" {
            entries.extend(entry.take());
            state = RowState::BetweenEntries;
            continue;
        }
        if state == RowState::Header || !line.starts_with('|') {
            continue;
        }

        let value = cell_value(line);
        let column = match state {
            RowState::Column(column) => column + 1,
            _ => 0,
        };
        state = RowState::Column(column);
        let current = entry.get_or_insert_with(GlossaryEntry::default);

        match column {
            0 => current.english_name = second_part(value).to_string(),
            1 => read_french(second_part(value), current),
            2 => current.ruleset = ruleset(value, log),
            3 => {
                current.source_book = value
                    .split('/')
                    .map(str::trim)
                    .next()
                    .map(str::to_string)
            }
            4 => current.cr = glossary_cr(value),
            _ => log.warning(format!(
                "Plus de {} colonnes de contenu sur la ligne {}",
                COLUMN_COUNT - 1,
                index + 1
            )),
        }
    }

    entries
}

fn cell_value(line: &str) -> &str {
    let value = if line.to_lowercase().starts_with(LEFT_ALIGN_PREFIX) {
        &line[LEFT_ALIGN_PREFIX.len()..]
    } else {
        &line[1..]
    };
    let value = value.trim();
    if value.eq_ignore_ascii_case("&nbsp;") {
        ""
    } else {
        value
    }
}

/// Cells written `sorted key, display` keep the display part.
fn second_part(value: &str) -> &str {
    match value.split(',').nth(1) {
        Some(part) => part.trim(),
        None => value,
    }
}

fn read_french(value: &str, entry: &mut GlossaryEntry) {
    let Some(inner) = value
        .strip_prefix("[[")
        .and_then(|value| value.strip_suffix("]]"))
    else {
        entry.french_name = value.to_string();
        entry.french_link = None;
        return;
    };

    match inner.split_once('|') {
        Some((link, name)) => {
            entry.french_link = Some(link.to_string());
            entry.french_name = name.to_string();
        }
        None => {
            entry.french_link = Some(inner.to_string());
            entry.french_name = inner.to_string();
        }
    }
}

fn ruleset(value: &str, log: &mut RunLog) -> Option<Ruleset> {
    match value.to_lowercase().as_str() {
        "path" => Some(Ruleset::Pathfinder),
        "3e" => Some(Ruleset::Dd3),
        _ => {
            log.warning(format!("Règles {value} non supportées"));
            None
        }
    }
}

fn glossary_cr(value: &str) -> Option<f64> {
    let value = match value {
        "0,5" => "0.5",
        "0,3" => "0.3",
        other => other,
    };
    if value.is_empty() || !value.chars().all(|ch| ch.is_ascii_digit() || ch == '.') {
        return None;
    }
    value.parse().ok()
}

/// Matches each entry by French name, then by normalized link target, and
/// attaches the English name. Unmatched entries never create monsters.
pub fn apply_glossary(page: &WikiPage, monsters: &mut [Monster], log: &mut RunLog) {
    for entry in read_entries(&page.raw, log) {
        let by_name = (!entry.french_name.is_empty())
            .then(|| monsters.iter().position(|monster| monster.name == entry.french_name))
            .flatten();
        let by_link = || {
            let link = entry.french_link.as_deref().filter(|link| !link.is_empty())?;
            let id = ids::normalize(link);
            monsters.iter().position(|monster| monster.id == id)
        };

        match by_name.or_else(by_link) {
            Some(index) if !entry.english_name.is_empty() => {
                let localization = &mut monsters[index].localization;
                localization.set(ENGLISH, "id", ids::normalize(&entry.english_name));
                localization.set(ENGLISH, "name", entry.english_name.as_str());
            }
            Some(_) => {}
            None => match entry.french_link.as_deref().filter(|link| !link.is_empty()) {
                Some(link) => log.warning(format!(
                    "Impossible de trouver le monstre nommé \"{}\" alors qu'il existe un lien vers la page wiki [[{link}]]",
                    entry.french_name
                )),
                None if !entry.french_name.is_empty() => log.information(format!(
                    "Nouveau monstre à ajouter depuis le glossaire : \"{}\"",
                    entry.french_name
                )),
                None => {}
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{GlossaryEntry, Ruleset, apply_glossary, read_entries};
    use crate::log::{LogLevel, RunLog};
    use crate::model::{ENGLISH, Monster};
    use crate::wiki::tests::page;

    const TABLE: &str = "{| CLASS=\"tablo sortable\"\n|+ Glossaire des monstres\n! Anglais !! Français !! Règles !! Livre !! FP\n|-\n| CLASS=\"gauche\" | Dragon, red (young)\n| CLASS=\"gauche\" | Dragon, [[Dragon rouge|rouge (jeune)]]\n| path\n| Bestiaire / Bestiary\n| 10\n|-\n| Kraken\n| [[Kraken]]\n| 4e\n| B1\n| 0,5\n| surplus\n|-\n| Wolf\n| Loup des steppes\n| path\n| &nbsp;\n| 1\n|}";

    #[test]
    fn reads_rows_as_a_state_machine() {
        let mut log = RunLog::new();
        let entries = read_entries(TABLE, &mut log);

        assert_eq!(entries.len(), 3);
        assert_eq!(
            entries[0],
            GlossaryEntry {
                english_name: "red (young)".to_string(),
                french_name: "rouge (jeune)".to_string(),
                french_link: Some("Dragon rouge".to_string()),
                ruleset: Some(Ruleset::Pathfinder),
                source_book: Some("Bestiaire".to_string()),
                cr: Some(10.0),
            }
        );
        assert_eq!(entries[1].cr, Some(0.5));
        assert_eq!(entries[1].ruleset, None);
        assert_eq!(entries[2].french_link, None);
        assert_eq!(entries[2].source_book.as_deref(), Some(""));
        assert!(log.contains(LogLevel::Warning, "Règles 4e non supportées"));
        assert!(log.contains(LogLevel::Warning, "Plus de 4 colonnes de contenu sur la ligne 16"));
    }

    #[test]
    fn unmatched_entries_are_logged_not_created() {
        let mut monsters = vec![Monster {
            id: "dragon-rouge".to_string(),
            name: "Jeune dragon rouge".to_string(),
            ..Monster::default()
        }];
        let mut log = RunLog::new();

        apply_glossary(
            &page("Pathfinder-RPG.Glossaire des monstres", TABLE),
            &mut monsters,
            &mut log,
        );

        assert_eq!(monsters.len(), 1);
        assert_eq!(monsters[0].localization.get(ENGLISH, "name"), Some("red (young)"));
        assert_eq!(monsters[0].localization.get(ENGLISH, "id"), Some("red-young"));
        assert!(log.contains(
            LogLevel::Warning,
            "Impossible de trouver le monstre nommé \"Kraken\" alors qu'il existe un lien vers la page wiki [[Kraken]]"
        ));
        assert!(log.contains(
            LogLevel::Information,
            "Nouveau monstre à ajouter depuis le glossaire : \"Loup des steppes\""
        ));
    }
}
