use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::lists::ParserLists;
use crate::log::RunLog;
use crate::markup::{plain_apostrophes, remove_markup};
use crate::model::Spell;
use crate::wiki::WikiPage;

static SUMMARY_LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?m)^\* '''''\[\[(?:(?<link>[^|\]]+)\|)?(?<title>[^|\]]+)\]\]'{2,5}\s*(?:('')?\([MF]\)('')?\s*)?(''\((?:APG|AdM|Blog Paizo|UC)\)''\.?\s+)?(?:\(\s*[MF, ]+\)\s*)?\(\s*(\[\[[^\]]+\]\](,?\s*)?)*\s*\)\s*(?:\(\s*[MF, ]+\)\s*)?\. *(?<summary>[^\r\n]*)",
    )
    .expect("valid spell summary regex")
});

/// Summary sentences of the master list pages keyed by lowercase title;
/// the first occurrence wins.
pub fn read_summaries<'p>(pages: impl IntoIterator<Item = &'p WikiPage>) -> BTreeMap<String, String> {
    let mut summaries = BTreeMap::new();
    for page in pages {
        for captures in SUMMARY_LINE_RE.captures_iter(&page.raw) {
            let title = plain_apostrophes(&captures["title"]).to_lowercase();
            summaries
                .entry(title)
                .or_insert_with(|| remove_markup(&captures["summary"]).trim().to_string());
        }
    }
    summaries
}

pub fn apply_descriptions(
    spells: &mut [Spell],
    pages: &[&WikiPage],
    lists: &ParserLists,
    log: &mut RunLog,
) {
    let summaries = read_summaries(pages.iter().copied());
    for spell in spells.iter_mut() {
        let title = plain_apostrophes(&spell.name).to_lowercase();
        match summaries.get(&title) {
            Some(summary) => spell.summary = Some(summary.clone()),
            None if lists.spell_no_description.contains(&spell.id) => {}
            None => log.warning(format!(
                "Impossible de trouver la description du sort {} (id {}) dans les listes de sorts",
                spell.name, spell.id
            )),
        }
    }
}
