use std::sync::LazyLock;

use regex::Regex;

use super::LINE_END;
use crate::error::{ParseError, ParseResult};
use crate::lists::{ParserLists, RangeVariantKind};
use crate::log::RunLog;
use crate::markup::remove_markup;
use crate::model::{RangeUnit, Spell, SpellRange};

static RANGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"'''Portée'''(?<value>.+?){LINE_END}")).expect("valid range regex")
});

pub fn parse_range(
    markup: &str,
    spell: &mut Spell,
    lists: &ParserLists,
    log: &mut RunLog,
) -> ParseResult<()> {
    let Some(captures) = RANGE_RE.captures(markup) else {
        if lists.spell_no_range.contains(&spell.id) {
            return Ok(());
        }
        return Err(ParseError::new(format!(
            "Portée introuvable pour l'id {}",
            spell.id
        )));
    };

    let value = captures["value"].trim();
    spell.range = Some(range_from_text(value, &spell.name, lists, log));
    Ok(())
}

/// Classifies a range literal, falling back to free text with a warning.
pub fn range_from_text(value: &str, spell_name: &str, lists: &ParserLists, log: &mut RunLog) -> SpellRange {
    let Some(variant) = lists.range_variants.lookup(value) else {
        log.warning(format!("{spell_name}: Portée non reconnue \"{value}\""));
        return SpellRange::text(remove_markup(value));
    };

    match variant.kind {
        RangeVariantKind::Personal => SpellRange::of(RangeUnit::Personal),
        RangeVariantKind::Touch => SpellRange::of(RangeUnit::Touch),
        RangeVariantKind::Unlimited => SpellRange::of(RangeUnit::Unlimited),
        RangeVariantKind::Close => SpellRange::of(RangeUnit::Close),
        RangeVariantKind::Medium => SpellRange::of(RangeUnit::Medium),
        RangeVariantKind::Long => SpellRange::of(RangeUnit::Long),
        RangeVariantKind::Squares => SpellRange::squares(variant.value.as_str()),
        RangeVariantKind::Text => SpellRange::text(variant.value.as_str()),
        RangeVariantKind::Keep => SpellRange::text(kept_text(value)),
    }
}

fn kept_text(value: &str) -> String {
    let value = value
        .replace("[[niveau|niveaux]]", "niveaux")
        .replace("{s:c}", "case(s)")
        .replace("{s:C}", "case(s)");
    remove_markup(&value).trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::{parse_range, range_from_text};
    use crate::lists::{ParserLists, RangeVariantKind};
    use crate::log::{LogLevel, RunLog};
    use crate::model::{MagicSchool, RangeUnit, Spell, SpellRange};

    fn lists() -> ParserLists {
        ParserLists::embedded().expect("embedded lists")
    }

    #[test]
    fn reads_range_up_to_line_break() {
        let lists = lists();
        let mut log = RunLog::new();
        let mut spell = Spell::new("x", "X", MagicSchool::Evocation);
        parse_range(
            "'''Portée''' [[contact]]<br/>'''Cible''' créature",
            &mut spell,
            &lists,
            &mut log,
        )
        .expect("range");
        assert_eq!(spell.range, Some(SpellRange::of(RangeUnit::Touch)));

        parse_range("'''Portée''' 9 m (6 {s:c})\n", &mut spell, &lists, &mut log).expect("range");
        assert_eq!(spell.range, Some(SpellRange::squares("6")));
        assert!(log.entries().is_empty());
    }

    #[test]
    fn every_table_literal_is_classified_without_fallback() {
        let lists = lists();
        let mut log = RunLog::new();
        for variant in lists.range_variants.variants() {
            let range = range_from_text(&variant.literal, "X", &lists, &mut log);
            let expected = match variant.kind {
                RangeVariantKind::Personal => Some(RangeUnit::Personal),
                RangeVariantKind::Touch => Some(RangeUnit::Touch),
                RangeVariantKind::Unlimited => Some(RangeUnit::Unlimited),
                RangeVariantKind::Close => Some(RangeUnit::Close),
                RangeVariantKind::Medium => Some(RangeUnit::Medium),
                RangeVariantKind::Long => Some(RangeUnit::Long),
                RangeVariantKind::Squares => Some(RangeUnit::Squares),
                RangeVariantKind::Text | RangeVariantKind::Keep => Some(RangeUnit::Special),
            };
            assert_eq!(Some(range.unit), expected, "literal {}", variant.literal);
        }
        assert_eq!(log.warning_count(), 0);
    }

    #[test]
    fn known_odd_literals_map_to_fixed_values() {
        let lists = lists();
        let mut log = RunLog::new();
        let range = range_from_text("jusqu’à 3 m (2 {s:c})/[[niveau]]", "X", &lists, &mut log);
        assert_eq!(range, SpellRange::text("jusqu'à 2 cases/niveau"));
        let range = range_from_text("15 m (10 {s:c})/[[niveau]]", "X", &lists, &mut log);
        assert_eq!(range, SpellRange::squares("10/level"));
    }

    #[test]
    fn unknown_range_degrades_to_text_with_warning() {
        let lists = lists();
        let mut log = RunLog::new();
        let range = range_from_text("[[au-delà]] du voile", "Voile", &lists, &mut log);
        assert_eq!(range, SpellRange::text("au-delà du voile"));
        assert!(log.contains(LogLevel::Warning, "Voile: Portée non reconnue"));
    }

    #[test]
    fn missing_range_fails_unless_allowed() {
        let lists = lists();
        let mut log = RunLog::new();
        let mut spell = Spell::new("sans-portee", "Sans portée", MagicSchool::Evocation);
        let error = parse_range("'''Cible''' vous", &mut spell, &lists, &mut log).expect_err("missing");
        assert_eq!(error.to_string(), "Portée introuvable pour l'id sans-portee");

        let mut lists = lists;
        lists.spell_no_range = ["sans-portee"].into_iter().collect();
        parse_range("'''Cible''' vous", &mut spell, &lists, &mut log).expect("allowed");
        assert!(spell.range.is_none());
    }
}
