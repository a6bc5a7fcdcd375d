use std::sync::LazyLock;

use regex::Regex;

use super::LINE_END;
use crate::error::{ParseError, ParseResult};
use crate::markup::remove_markup;
use crate::model::{MagicResistanceKind, Spell, SpellMagicResistance};

const LABEL: &str = "'''Résistance à la magie'''";

static LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"{LABEL}(?<value>.*?){LINE_END}")).expect("valid magic resistance regex")
});

static HARMLESS_LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[\[présentation des sorts#(jetsdesauvegarde|rm)\|(inoffensif)\]\]")
        .expect("valid harmless link regex")
});

static DETAILED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\[\[rm\|)?(?<value>oui|non)(\]\])?( \((?<words>[^)]+)\))?$")
        .expect("valid detailed magic resistance regex")
});

pub fn parse_magic_resistance(markup: &str, spell: &mut Spell) -> ParseResult<()> {
    let Some(captures) = LINE_RE.captures(markup) else {
        spell.magic_resistance = Some(SpellMagicResistance::default());
        return Ok(());
    };
    let value = captures["value"].trim();
    if value.is_empty() {
        return Err(ParseError::new("Résistance à la magie mal formée"));
    }

    let lower = value.to_lowercase();
    let compare = HARMLESS_LINK_RE.replace_all(&lower, "$2");
    let compare = compare.trim();

    let resistance = match compare {
        "non" => SpellMagicResistance::default(),
        "oui" => SpellMagicResistance {
            resistance: MagicResistanceKind::Yes,
            ..SpellMagicResistance::default()
        },
        _ => match DETAILED_RE.captures(compare) {
            Some(detailed) => detailed_resistance(value, &detailed)?,
            None => SpellMagicResistance {
                resistance: MagicResistanceKind::Special,
                text: Some(remove_markup(value).trim().to_string()),
                ..SpellMagicResistance::default()
            },
        },
    };

    spell.magic_resistance = Some(resistance);
    Ok(())
}

fn detailed_resistance(
    value: &str,
    detailed: &regex::Captures<'_>,
) -> ParseResult<SpellMagicResistance> {
    let mut resistance = SpellMagicResistance {
        resistance: if &detailed["value"] == "oui" {
            MagicResistanceKind::Yes
        } else {
            MagicResistanceKind::No
        },
        ..SpellMagicResistance::default()
    };

    let Some(words) = detailed.name("words") else {
        return Ok(resistance);
    };
    for word in words.as_str().split(", ") {
        match word.trim() {
            "voir description" | "voir texte" | "spécial" => {
                resistance.text = Some(remove_markup(value).trim().to_string());
            }
            "inoffensif" => resistance.harmless = true,
            "objet" | "[[présentation des sorts#jetsdesauvegarde|objet]]" => {
                resistance.objects = true;
            }
            other => {
                return Err(ParseError::new(format!("Détail de RM non reconnu : {other}")));
            }
        }
    }
    Ok(resistance)
}
