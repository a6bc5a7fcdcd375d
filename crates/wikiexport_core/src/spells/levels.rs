use std::sync::LazyLock;

use regex::Regex;

use crate::error::{ParseError, ParseResult};
use crate::model::{Spell, list_ids};

/// `(list id, pattern)` tried in order; the first level found per list wins.
static CLASS_LEVEL_PATTERNS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    [
        (list_ids::BARD, class_link("barde", "Bard")),
        (
            list_ids::SORCERER_WIZARD,
            r"\[\[ensorceleur\|Ens\]\]/\[\[magicien\|Mag\]\] (?<level>\d+)".to_string(),
        ),
        (list_ids::SORCERER_WIZARD, class_link("magicien", "Mag")),
        (
            list_ids::SORCERER_WIZARD,
            r"\[\[ensorceleur\]\]/\[\[magicien\]\] (?<level>\d+)".to_string(),
        ),
        (list_ids::RANGER, class_link("rôdeur", "Rôd")),
        (list_ids::PALADIN, class_link("paladin", "Pal")),
        (list_ids::DRUID, class_link("druide", "Dru")),
        (list_ids::CLERIC, class_link("prêtre", "Prê")),
        (list_ids::INQUISITOR, class_link("inquisiteur", "Inq")),
        (list_ids::SUMMONER, class_link("(?:invocateur|conjurateur)", "Inv")),
        (list_ids::WITCH, class_link("sorcière", "Sor")),
        (list_ids::ALCHEMIST, class_link("alchimiste", "Alch")),
        (list_ids::ORACLE, class_link("oracle", "Ora")),
        (list_ids::ORACLE, class_link("prêtre", "Prê")),
        (list_ids::MAGUS, class_link("magus", "magus")),
        (list_ids::ANTIPALADIN, class_link("antipaladin", "antipaladin")),
    ]
    .into_iter()
    .map(|(list, pattern)| {
        let regex = Regex::new(&format!("(?i){pattern}")).expect("valid class level regex");
        (list, regex)
    })
    .collect()
});

fn class_link(name: &str, abbreviation: &str) -> String {
    format!(r"\[\[{name}(\|{abbreviation})?\]\] (?<level>\d+)")
}

pub fn parse_levels(markup: &str, spell: &mut Spell) -> ParseResult<()> {
    for (list, pattern) in CLASS_LEVEL_PATTERNS.iter() {
        if spell.level_for(list).is_some() {
            continue;
        }
        let Some(captures) = pattern.captures(markup) else {
            continue;
        };
        let text = &captures["level"];
        let level = text
            .parse::<u8>()
            .map_err(|_| ParseError::new(format!("Niveau de classe invalide : {text}")))?;
        spell.add_level(list, level);
    }

    if spell.levels.is_empty() {
        return Err(ParseError::new("Impossible de détecter les niveaux de classe"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::parse_levels;
    use crate::model::{MagicSchool, Spell, list_ids};

    fn blank_spell() -> Spell {
        Spell::new("x", "X", MagicSchool::Evocation)
    }

    #[test]
    fn cleric_level_also_fills_oracle() {
        let mut spell = blank_spell();
        parse_levels("'''Niveau''' [[prêtre|Prê]] 2", &mut spell).expect("levels");
        assert_eq!(spell.level_for(list_ids::CLERIC), Some(2));
        assert_eq!(spell.level_for(list_ids::ORACLE), Some(2));
    }

    #[test]
    fn explicit_oracle_level_wins_over_cleric() {
        let mut spell = blank_spell();
        parse_levels("[[Oracle|Ora]] 3, [[prêtre|Prê]] 2, [[Barde]] 1", &mut spell).expect("levels");
        assert_eq!(spell.level_for(list_ids::ORACLE), Some(3));
        assert_eq!(spell.level_for(list_ids::CLERIC), Some(2));
        assert_eq!(spell.level_for(list_ids::BARD), Some(1));
    }

    #[test]
    fn sorcerer_wizard_variants_and_summoner_aliases() {
        let mut spell = blank_spell();
        parse_levels(
            "[[ensorceleur|Ens]]/[[magicien|Mag]] 4, [[conjurateur|Inv]] 3",
            &mut spell,
        )
        .expect("levels");
        assert_eq!(spell.level_for(list_ids::SORCERER_WIZARD), Some(4));
        assert_eq!(spell.level_for(list_ids::SUMMONER), Some(3));

        let mut spell = blank_spell();
        parse_levels("[[ensorceleur]]/[[magicien]] 5", &mut spell).expect("levels");
        assert_eq!(spell.level_for(list_ids::SORCERER_WIZARD), Some(5));
    }

    #[test]
    fn missing_levels_fail() {
        let mut spell = blank_spell();
        let error = parse_levels("'''Niveau''' aucun", &mut spell).expect_err("no level");
        assert_eq!(error.to_string(), "Impossible de détecter les niveaux de classe");
    }
}
