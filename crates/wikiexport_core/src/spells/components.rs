use std::sync::LazyLock;

use regex::Regex;

use super::LINE_END;
use crate::error::{ParseError, ParseResult};
use crate::lists::ParserLists;
use crate::markup::remove_markup;
use crate::model::{ComponentKinds, Spell, SpellComponents};

static COMPONENTS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)'''Composantes''' \[\[COMPOSANTES\|(?<value>[^\]]+)\]\](?<comment>.+?)?{LINE_END}"
    ))
    .expect("valid components regex")
});

pub fn parse_components(markup: &str, spell: &mut Spell, lists: &ParserLists) -> ParseResult<()> {
    let Some(captures) = COMPONENTS_RE.captures(markup) else {
        if lists.spell_no_range.contains(&spell.id) {
            return Ok(());
        }
        return Err(ParseError::new(format!(
            "Composantes introuvables pour l'id {}",
            spell.id
        )));
    };

    let mut kinds = ComponentKinds::NONE;
    for code in captures["value"].split(',') {
        kinds |= component_kind(&code.trim().to_lowercase())?;
    }

    let description = captures
        .name("comment")
        .map(|comment| strip_parentheses(comment.as_str().trim()))
        .map(|comment| remove_markup(comment).trim().to_string())
        .filter(|comment| !comment.is_empty());

    spell.components = Some(SpellComponents { kinds, description });
    Ok(())
}

fn component_kind(code: &str) -> ParseResult<ComponentKinds> {
    match code {
        "m" => Ok(ComponentKinds::MATERIAL),
        "v" => Ok(ComponentKinds::VERBAL),
        "g" | "s" => Ok(ComponentKinds::SOMATIC),
        "fd" => Ok(ComponentKinds::DIVINE_FOCUS),
        "f" => Ok(ComponentKinds::FOCUS),
        "m/fd" | "fd/m" => Ok(ComponentKinds::MATERIAL_OR_DIVINE_FOCUS),
        "f/fd" | "fd/f" => Ok(ComponentKinds::FOCUS_OR_DIVINE_FOCUS),
        _ => Err(ParseError::new(format!(
            "Formule de composantes inconnue : {code}"
        ))),
    }
}

fn strip_parentheses(comment: &str) -> &str {
    if comment.len() > 1 && comment.starts_with('(') && comment.ends_with(')') {
        &comment[1..comment.len() - 1]
    } else {
        comment
    }
}

#[cfg(test)]
mod tests {
    use super::parse_components;
    use crate::lists::ParserLists;
    use crate::model::{ComponentKinds, MagicSchool, Spell};

    #[test]
    fn combines_codes_and_keeps_comment() {
        let lists = ParserLists::embedded().expect("lists");
        let mut spell = Spell::new("x", "X", MagicSchool::Evocation);
        parse_components(
            "'''Composantes''' [[composantes|V, G, M/FD]] (une pincée de [[soufre]])<br/>",
            &mut spell,
            &lists,
        )
        .expect("components");

        let components = spell.components.expect("components set");
        assert_eq!(
            components.kinds,
            ComponentKinds::VERBAL
                | ComponentKinds::SOMATIC
                | ComponentKinds::MATERIAL_OR_DIVINE_FOCUS
        );
        assert_eq!(components.description.as_deref(), Some("une pincée de soufre"));
    }

    #[test]
    fn unknown_code_and_missing_line_fail() {
        let mut lists = ParserLists::embedded().expect("lists");
        let mut spell = Spell::new("x", "X", MagicSchool::Evocation);
        let error = parse_components("'''Composantes''' [[COMPOSANTES|V, X]]\n", &mut spell, &lists)
            .expect_err("unknown");
        assert_eq!(error.to_string(), "Formule de composantes inconnue : x");

        let error = parse_components("rien", &mut spell, &lists).expect_err("missing");
        assert_eq!(error.to_string(), "Composantes introuvables pour l'id x");

        lists.spell_no_range = ["x"].into_iter().collect();
        parse_components("rien", &mut spell, &lists).expect("allowed");
        assert!(spell.components.is_none());
    }
}
