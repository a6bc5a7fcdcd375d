use std::sync::LazyLock;

use regex::Regex;

use crate::error::{ParseError, ParseResult};
use crate::model::{Spell, SpellDescriptors};

static DESCRIPTOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\(\[\[registre\|(?<title>[^\]]+)\]\]\)").expect("valid descriptor regex")
});

static NOWIKI_DESCRIPTOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<nowiki>\[</nowiki>\[\[registre\|(?<title>[^\]]+)\]\]<nowiki>\]</nowiki>")
        .expect("valid nowiki descriptor regex")
});

const DESCRIPTORS: [(&str, SpellDescriptors); 29] = [
    ("acide", SpellDescriptors::ACID),
    ("air", SpellDescriptors::AIR),
    ("chaos", SpellDescriptors::CHAOTIC),
    ("froid", SpellDescriptors::COLD),
    ("obscurité", SpellDescriptors::DARKNESS),
    ("mort", SpellDescriptors::DEATH),
    ("terre", SpellDescriptors::EARTH),
    ("électricité", SpellDescriptors::ELECTRICITY),
    ("mal", SpellDescriptors::EVIL),
    ("peur", SpellDescriptors::FEAR),
    ("feu", SpellDescriptors::FIRE),
    ("force", SpellDescriptors::FORCE),
    ("bien", SpellDescriptors::GOOD),
    ("guérison", SpellDescriptors::HEALING),
    ("langage", SpellDescriptors::LANGUAGE_DEPENDENT),
    ("loi", SpellDescriptors::LAWFUL),
    ("lumière", SpellDescriptors::LIGHT),
    ("mental", SpellDescriptors::MIND_AFFECTING),
    ("ombre", SpellDescriptors::SHADOW),
    ("son", SpellDescriptors::SONIC),
    ("sonore", SpellDescriptors::SONIC),
    ("téléportation", SpellDescriptors::TELEPORTATION),
    ("eau", SpellDescriptors::WATER),
    ("malédiction", SpellDescriptors::CURSE),
    ("maladie", SpellDescriptors::DISEASE),
    ("émotion", SpellDescriptors::EMOTION),
    ("émotions", SpellDescriptors::EMOTION),
    ("douleur", SpellDescriptors::PAIN),
    ("poison", SpellDescriptors::POISON),
];

/// Descriptor text that stands for "no descriptor".
const NO_DESCRIPTOR: [&str; 2] = ["voir texte", "variable"];

/// Optional: a spell without a descriptor link keeps an empty set.
pub fn parse_descriptor(markup: &str, spell: &mut Spell) -> ParseResult<()> {
    let Some(captures) = DESCRIPTOR_RE
        .captures(markup)
        .or_else(|| NOWIKI_DESCRIPTOR_RE.captures(markup))
    else {
        return Ok(());
    };

    for value in captures["title"].split(',') {
        spell.descriptor |= descriptor_value(&value.trim().to_lowercase())?;
    }
    Ok(())
}

fn descriptor_value(registry: &str) -> ParseResult<SpellDescriptors> {
    if NO_DESCRIPTOR.contains(&registry) {
        return Ok(SpellDescriptors::NONE);
    }
    DESCRIPTORS
        .iter()
        .find(|(name, _)| *name == registry)
        .map(|(_, descriptor)| *descriptor)
        .ok_or_else(|| ParseError::new(format!("Registre inconnu : {registry}")))
}
