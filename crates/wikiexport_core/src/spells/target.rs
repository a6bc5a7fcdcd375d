use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use super::LINE_END;
use crate::lists::ParserLists;
use crate::log::RunLog;
use crate::markup::remove_markup;
use crate::model::Spell;

static TARGET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"'''(?<type>(Cibles?|Effet|Zone d['’]effet|Zone|Cible ou zone d['’]effet|Cibles ou effet|Cible et zone d['’]effet|Cible ou effet|Zone d['’]effet ou cible|Cible, effet ou zone d['’]effet))'''(?<value>.+?){LINE_END}"
    ))
    .expect("valid target regex")
});

/// How often each target label was seen during a run.
#[derive(Debug, Clone, Default)]
pub struct TargetStats {
    counts: BTreeMap<String, usize>,
}

impl TargetStats {
    pub fn record(&mut self, label: &str) {
        *self.counts.entry(label.to_string()).or_default() += 1;
    }

    pub fn count(&self, label: &str) -> usize {
        self.counts.get(label).copied().unwrap_or(0)
    }

    /// Labels by descending count, ties by label.
    pub fn ranked(&self) -> Vec<(&str, usize)> {
        let mut ranked: Vec<_> = self
            .counts
            .iter()
            .map(|(label, count)| (label.as_str(), *count))
            .collect();
        ranked.sort_by(|left, right| right.1.cmp(&left.1).then_with(|| left.0.cmp(right.0)));
        ranked
    }

    pub fn flush(&self, log: &mut RunLog) {
        log.information("[Spells.TargetParser] Statistiques sur les cibles :");
        for (label, count) in self.ranked() {
            log.information(format!(" - {count} {label}"));
        }
    }
}

/// Optional field: a missing target only warns.
pub fn parse_target(
    markup: &str,
    spell: &mut Spell,
    lists: &ParserLists,
    stats: &mut TargetStats,
    log: &mut RunLog,
) {
    let Some(captures) = TARGET_RE.captures(markup) else {
        if !lists.spell_no_target.contains(&spell.id) {
            log.warning(format!(
                "{} : cible introuvable. Si le sort n'a pas de cible, il doit être ajouté dans le fichier contenant les sorts sans cible",
                spell.name
            ));
        }
        return;
    };

    stats.record(&captures["type"]);
    spell.target = Some(remove_markup(captures["value"].trim()).trim().to_string());
}
