use std::sync::LazyLock;

use regex::Regex;

use super::LINE_END;
use crate::error::{ParseError, ParseResult};
use crate::markup::remove_markup;
use crate::model::{CastingTime, Spell, TimeUnit};

static CASTING_TIME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)'''Temps d[’']incantation''' (?<value>.*?){LINE_END}"
    ))
    .expect("valid casting time regex")
});

static QUANTITY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?<quantity>\d+) (\[\[)?(?<unit>[^\]]+)(\]\])?$").expect("valid quantity regex")
});

pub fn parse_casting_time(markup: &str, spell: &mut Spell) -> ParseResult<()> {
    let Some(captures) = CASTING_TIME_RE.captures(markup) else {
        return Err(ParseError::new("Impossible de détecter le temps d'incantation"));
    };
    let value = captures["value"].trim();

    let parsed = match QUANTITY_RE.captures(value) {
        Some(quantity) => {
            let unit = time_unit(&quantity["unit"])?;
            match quantity["quantity"].parse::<u32>() {
                Ok(amount) if unit != TimeUnit::Special => Some((amount, unit)),
                _ => None,
            }
        }
        None => None,
    };

    spell.casting_time = Some(match parsed {
        Some((value, unit)) => CastingTime {
            value,
            unit,
            text: None,
        },
        None => CastingTime {
            value: 0,
            unit: TimeUnit::Special,
            text: Some(remove_markup(value).trim().to_string()),
        },
    });
    Ok(())
}

fn time_unit(text: &str) -> ParseResult<TimeUnit> {
    let unit = text.trim().to_lowercase();
    let unit = match unit.as_str() {
        "action simple" | "action simple|actions simples" => TimeUnit::SimpleAction,
        "action immédiate" => TimeUnit::ImmediateAction,
        "action rapide" => TimeUnit::SwiftAction,
        "action complexe" => TimeUnit::FullRoundAction,
        "round" | "rounds" | "round|rounds" => TimeUnit::Round,
        "minute" | "minutes" => TimeUnit::Minute,
        "heure" | "heures" => TimeUnit::Hour,
        "jour" | "jours" => TimeUnit::Day,
        "minute/500 g" | "minute par page" => TimeUnit::Special,
        other if other.contains("voir description") => TimeUnit::Special,
        other => {
            return Err(ParseError::new(format!("Unité de temps {other} inconnue")));
        }
    };
    Ok(unit)
}
