use std::sync::LazyLock;

use regex::Regex;

use crate::lists::ParserLists;
use crate::log::RunLog;
use crate::model::{Spell, list_ids};
use crate::wiki::{WikiExport, WikiName, WikiPage};

static LEVEL_HEADER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(niveau (?<level>\d+)|(?<ordinal>\d+)(<sup>er</sup>|<sup>ème</sup>|er|e) niveau)")
        .expect("valid level header regex")
});

static SPELL_LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\* '''''\[\[?(?<name>[^\]]+)\]\]?( \([MFX](, [MFX])*\))?( \(APG\))?[\.]?'''''\s*(\([MFX](, [MFX])*\))?('''\(APG\)''')?\.?",
    )
    .expect("valid spell line regex")
});

/// Reads one class spell list page and assigns levels to known spells.
pub struct SpellListReader<'a> {
    export: &'a WikiExport,
    list_id: &'a str,
    current_level: Option<u8>,
}

impl<'a> SpellListReader<'a> {
    pub fn new(export: &'a WikiExport, list_id: &'a str) -> Self {
        Self {
            export,
            list_id,
            current_level: None,
        }
    }

    pub fn read(&mut self, page: &WikiPage, spells: &mut [Spell], log: &mut RunLog) {
        log.information(format!("Début de l'analyse de la page \"{}\"", page.title));
        self.current_level = None;
        for line in page.raw.split(['\r', '\n']).filter(|line| !line.is_empty()) {
            self.read_line(line, spells, log);
        }
    }

    fn read_line(&mut self, line: &str, spells: &mut [Spell], log: &mut RunLog) {
        if line.starts_with("===") && !line.starts_with("====") {
            let level = LEVEL_HEADER_RE.captures(line).and_then(|captures| {
                captures
                    .name("level")
                    .or_else(|| captures.name("ordinal"))
                    .and_then(|value| value.as_str().parse::<u8>().ok())
            });
            match level {
                Some(level) => self.current_level = Some(level),
                None => log.warning(format!("Niveau indétectable dans l'entête \"{line}\"")),
            }
            return;
        }

        if !line.starts_with('*') {
            return;
        }
        let Some(captures) = SPELL_LINE_RE.captures(line) else {
            log.warning(format!("Sort introuvable sur la ligne \"{line}\""));
            return;
        };

        let name = &captures["name"];
        let wiki_name = WikiName::from_link(name).with_default_namespace(self.export.default_namespace());
        let spell_id = wiki_name.id();

        let Some(spell) = spells.iter_mut().find(|spell| spell.id == spell_id) else {
            if self.export.find_page(&wiki_name).is_none() {
                log.error(format!(
                    "Le sort \"{name}\" pour l'id {spell_id} ne désigne pas une page existante"
                ));
            } else {
                log.warning(format!(
                    "La page \"{name}\" pour l'id {spell_id} n'est pas répertoriée comme un sort"
                ));
            }
            return;
        };

        let Some(level) = self.current_level else {
            log.warning(format!(
                "Sort \"{name}\" rencontré avant tout entête de niveau"
            ));
            return;
        };
        assign_level(spell, self.list_id, level, log);
    }
}

/// Adds the level unless the list already has one; a cleric level also
/// fills an absent oracle level.
pub fn assign_level(spell: &mut Spell, list_id: &str, level: u8, log: &mut RunLog) {
    let existing = spell.level_for(list_id);

    if list_id == list_ids::CLERIC {
        spell.add_level(list_ids::ORACLE, level);
    }

    match existing {
        None => {
            spell.add_level(list_id, level);
        }
        Some(existing) if existing != level => log.error(format!(
            "Erreur de niveau pour le sort \"{}\" (liste niv. {level} et description niv. {existing})",
            spell.name
        )),
        Some(_) => {}
    }
}

/// Runs every configured class list page, in file order; absent pages are skipped.
pub fn apply_spell_lists(
    export: &WikiExport,
    lists: &ParserLists,
    spells: &mut [Spell],
    log: &mut RunLog,
) {
    for entry in &lists.spell_lists {
        let Some(page) = export.page(&WikiName::parse(&entry.page)) else {
            continue;
        };
        SpellListReader::new(export, &entry.list_id).read(page, spells, log);
    }
}
