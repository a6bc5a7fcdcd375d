use std::sync::LazyLock;

use regex::Regex;

use crate::error::{ParseError, ParseResult};
use crate::ids;
use crate::model::{MagicSchool, Spell};

static SCHOOL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"'''[ÉE]cole''' \[\[(?<title>[^\]]+)\]\]( \(\[\[branche [^\]]+\|(?<sub>[^\]]+)\]\]\))?",
    )
    .expect("valid school regex")
});

const UNIVERSAL_SENTENCE: &str = "'''école''' universel";

/// Keys are normalized ids of the link text.
const SCHOOL_TITLES: [(&str, MagicSchool); 11] = [
    ("abjuration", MagicSchool::Abjuration),
    ("divination", MagicSchool::Divination),
    ("ecole-divination-divination", MagicSchool::Divination),
    ("enchantement", MagicSchool::Enchantment),
    ("evocation", MagicSchool::Evocation),
    ("illusion", MagicSchool::Illusion),
    ("invocation", MagicSchool::Conjuration),
    ("necromancie", MagicSchool::Necromancy),
    ("necromancie-ecole-necromancie", MagicSchool::Necromancy),
    ("transmutation", MagicSchool::Transmutation),
    ("universelle", MagicSchool::Universal),
];

pub fn parse_school(markup: &str, spell: &mut Spell) -> ParseResult<()> {
    if let Some(captures) = SCHOOL_RE.captures(markup) {
        spell.school = school_from_title(&captures["title"])?;
        spell.sub_school = captures.name("sub").map(|sub| sub.as_str().trim().to_string());
        return Ok(());
    }

    if markup.to_lowercase().contains(UNIVERSAL_SENTENCE) {
        spell.school = MagicSchool::Universal;
        return Ok(());
    }

    Err(ParseError::new("Impossible de lire l'école de magie"))
}

fn school_from_title(title: &str) -> ParseResult<MagicSchool> {
    let key = ids::normalize(title);
    SCHOOL_TITLES
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, school)| *school)
        .ok_or_else(|| ParseError::new(format!("École {title} non reconnue")))
}
