use std::sync::LazyLock;

use regex::Regex;

use crate::error::{ParseError, ParseResult};
use crate::markup::remove_markup;
use crate::model::{SavingThrowEffect, SavingThrowTarget, Spell, SpellSavingThrow};

static SAVING_THROW_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"'''Jet de sauvegarde'''(?<value>[^;\r\n]+);").expect("valid saving throw regex")
});

static TARGET_EFFECT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?<type>volonté|réflexes|vigueur|oui|non)(,|\s*pour)?(?<value>[^;]+)$")
        .expect("valid saving throw effect regex")
});

/// Spells whose saving throw line is not parsed at all.
const SKIPPED_SPELLS: [&str; 1] = ["Transmutation de potion en poison"];

const SEE_TEXT_SUFFIXES: [&str; 3] = [", voir texte", ", voir description", ", voir plus bas"];

/// Optional field: a spell without the label keeps no saving throw.
pub fn parse_saving_throw(markup: &str, spell: &mut Spell) -> ParseResult<()> {
    if SKIPPED_SPELLS.contains(&spell.name.as_str()) {
        return Ok(());
    }
    let Some(captures) = SAVING_THROW_RE.captures(markup) else {
        return Ok(());
    };

    let value = remove_markup(captures["value"].trim()).trim().to_string();
    spell.saving_throw = Some(saving_throw_from_text(&value)?);
    Ok(())
}

fn saving_throw_from_text(value: &str) -> ParseResult<SpellSavingThrow> {
    let compare = value.to_lowercase();

    if [" ou ", " et ", " puis "]
        .iter()
        .any(|separator| compare.contains(separator))
    {
        return Ok(SpellSavingThrow {
            target: SavingThrowTarget::Special,
            effect: SavingThrowEffect::Special,
            specific_value: Some(value.to_string()),
            ..SpellSavingThrow::default()
        });
    }

    if let Some(captures) = TARGET_EFFECT_RE.captures(&compare) {
        return target_and_effect(value, &captures["type"], &captures["value"]);
    }

    literal_sentence(value, &compare)
}

fn target_and_effect(value: &str, target: &str, effect: &str) -> ParseResult<SpellSavingThrow> {
    let mut saving_throw = SpellSavingThrow::default();
    let mut copy = false;

    saving_throw.target = match target {
        "volonté" => SavingThrowTarget::Will,
        "réflexes" => SavingThrowTarget::Reflex,
        "vigueur" => SavingThrowTarget::Fortitude,
        "oui" => {
            copy = true;
            SavingThrowTarget::Special
        }
        _ => {
            copy = true;
            SavingThrowTarget::None
        }
    };

    let mut effect = effect.trim();
    for suffix in SEE_TEXT_SUFFIXES {
        if let Some(stripped) = effect.strip_suffix(suffix) {
            effect = stripped.trim_end();
            copy = true;
        }
    }

    while let Some(inner) = effect.strip_suffix(')') {
        let Some(open) = inner.rfind('(') else {
            break;
        };
        let bonus = inner[open + 1..].trim();
        match bonus {
            "inoffensif" => saving_throw.harmless = true,
            "objet" => saving_throw.objects = true,
            "inoffensif, objet" | "objet, inoffensif" => {
                saving_throw.harmless = true;
                saving_throw.objects = true;
            }
            "spécial, voir texte"
            | "spécial, voir plus bas"
            | "voir texte"
            | "voir plus bas"
            | "voir description"
            | "en cas d’interaction"
            | "en cas d'interaction" => copy = true,
            "" => {}
            _ => {
                return Err(ParseError::new(format!(
                    "Détail du jet de sauvegarde non reconnu : \"{bonus}\" dans le texte \"{value}\""
                )));
            }
        }
        effect = inner[..open].trim_end();
    }

    saving_throw.effect = match effect.trim() {
        "annuler" | "annule" => SavingThrowEffect::Negates,
        "1/2 dégâts" | "réduit de moitié" | "réduire de moitié" => SavingThrowEffect::Half,
        "partiel" | "partielle" => SavingThrowEffect::Partial,
        "dévoile" | "dévoiler" | "dévoiler l'illusion" => SavingThrowEffect::Disbelief,
        "" => SavingThrowEffect::None,
        _ if copy => SavingThrowEffect::Special,
        other => {
            return Err(ParseError::new(format!(
                "Impossible de décoder l'effet du jet de sauvegarde \"{other}\""
            )));
        }
    };

    if copy {
        saving_throw.specific_value = Some(value.to_string());
    }
    Ok(saving_throw)
}

fn literal_sentence(value: &str, compare: &str) -> ParseResult<SpellSavingThrow> {
    match compare {
        "aucun" | "non" => Ok(SpellSavingThrow::default()),
        _ if compare.starts_with("aucun") => Ok(SpellSavingThrow {
            specific_value: Some(value.to_string()),
            ..SpellSavingThrow::default()
        }),
        "voir description" | "voir texte" | "spécial, voir plus bas" | "spécial, voir texte" => {
            Ok(SpellSavingThrow {
                effect: SavingThrowEffect::Special,
                specific_value: Some(value.to_string()),
                ..SpellSavingThrow::default()
            })
        }
        _ => Err(ParseError::new(format!(
            "Impossible de décoder le type de jet de sauvegarde dans \"{value}\""
        ))),
    }
}
