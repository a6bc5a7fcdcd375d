use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::log::RunLog;
use crate::markup::plain_apostrophes;
use crate::model::{ENGLISH, Spell};
use crate::references;
use crate::wiki::WikiPage;

static ENTRY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"\|\sclass="gauche"\s\|\s(?<en>[^\[\r\n]+)(\s*\[\[(?<prd>[^\r\n\]]+)\]\])?\r?\n\|\sclass="gauche"\s\|\s(?<fr>[^\[\r\n]+)"#,
    )
    .expect("valid spell glossary regex")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlossaryEntry {
    pub english: String,
    pub french: String,
    pub prd_link: Option<String>,
}

/// French/English pairs keyed by lowercase French name; first occurrence wins.
pub fn read_glossary(page: &WikiPage, log: &mut RunLog) -> BTreeMap<String, GlossaryEntry> {
    let mut entries: BTreeMap<String, GlossaryEntry> = BTreeMap::new();
    for captures in ENTRY_RE.captures_iter(&page.raw) {
        let prd_link = captures
            .name("prd")
            .map(|link| link.as_str().trim())
            .map(|link| link.rsplit_once('|').map(|(href, _)| href).unwrap_or(link))
            .filter(|link| !link.is_empty())
            .map(str::to_string);
        let entry = GlossaryEntry {
            english: captures["en"].trim().to_string(),
            french: plain_apostrophes(&captures["fr"]).trim().to_string(),
            prd_link,
        };
        if entry.english == "?" {
            continue;
        }

        let key = entry.french.to_lowercase();
        match entries.get(&key) {
            Some(existing) => log.warning(format!(
                "Le sort {} est présent plusieurs fois dans le glossaire : {} et {}",
                entry.french, existing.english, entry.english
            )),
            None => {
                entries.insert(key, entry);
            }
        }
    }
    entries
}

/// Attaches English names and PRD links, then reports unused glossary entries.
pub fn apply_glossary(page: &WikiPage, spells: &mut [Spell], log: &mut RunLog) {
    let mut entries = read_glossary(page, log);

    for spell in spells.iter_mut() {
        let Some(entry) = entries.remove(&spell.name.to_lowercase()) else {
            log.information(format!(
                "Le sort {} ({} {}) n'est pas présent dans le glossaire anglais/français.",
                spell.name, spell.id, spell.source.id
            ));
            continue;
        };

        spell.localization.set(ENGLISH, "name", entry.english);
        if let Some(link) = entry.prd_link {
            spell.source.references.push(references::from_prd(&link));
        }
    }

    for (key, entry) in entries {
        log.warning(format!(
            "Le sort {} ({key}) du glossaire n'a pas été utilisé",
            entry.french
        ));
    }
}
