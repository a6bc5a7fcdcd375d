use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::ids;
use crate::lists::ParserLists;
use crate::log::RunLog;
use crate::markup::{LINK_ONLY_RE, LINK_PATTERN, link_target, remove_markup};
use crate::model::{FeatPrerequisite, OtherPrerequisite, PrerequisiteItem, PrerequisiteKind};
use crate::wiki::{WikiExport, WikiPage};

fn compile_all(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|pattern| Regex::new(&format!("(?i){pattern}")).expect("valid prerequisite regex"))
        .collect()
}

static ATTRIBUTE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile_all(&[
        r"^\[\[(?:force|dextérité|constitution|intelligence|sagesse|charisme)\|(?<attr>for|dex|con|int|sag|cha)\]\] (?<value>\d+)$",
        r"^(?:\[\[)?(?<attr>for|dex|con|int|sag|cha)(?:\]\])?\s(?<value>\d+)$",
    ])
});

static BBA_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:\[\[)?BBA(?:\|bonus de base à l[’']attaque)?(?:\]\])?\s(?:de\s)?\+(?<value>\d+)$")
        .expect("valid bba regex")
});

static SPELLCASTER_LEVEL_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile_all(&[
        r"^lanceur de sorts (de )?niveau (?<level>\d+)$",
        r"^\[\[Niveau\]\] (?<level>\d+) de \[\[NLS\|lanceur de sorts\]\]$",
        r"^\[\[Niveau\]\] (?<level>\d+) de \[\[Lancer des sorts#NLS\|lanceur de sorts\]\]$",
        r"^\[\[NLS\]\] (?<level>\d+)$",
        r"^capacité de lancer des sorts de (?<level>\d+)<sup>(ème|er)</sup> niveau$",
    ])
});

static SKILL_RANK_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile_all(&[
        r"^(?<ranks>\d+) (?:\[\[)?rangs?(?:\]\])? en \[\[(?<skill>[^\]]+)\]\]",
        r"^\[\[(?<skill>[^\]]+)\]\]\s(?<ranks>\d+)\srangs?$",
        r"^(?<ranks>\d+) (?:\[\[)?rang\|rangs?(?:\]\])? en \[\[(?<skill>[^\]]+)\]\]",
        r"^\[\[(?<skill>[^\]]+)\]\] \((?<speciality>[^)]+)\) (?<ranks>\d+) rangs$",
    ])
});

static CLASS_LEVEL_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile_all(&[
        r"^\[\[(?<class>[^\]]+)\]\]\s(de\s)?(\[\[)?niveau(\]\])?\s(?<level>\d+)$",
        r"^\[\[(?<class>[^\]]+)\]\] (?<level>\d+)$",
    ])
});

static CLASS_POWER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(pouvoir|capacité|aptitude) de classe (de\s)?\[\[([^|]+\|)?(?<power>[^\]]+)\]\]$")
        .expect("valid class power regex")
});

static SPELL_CAST_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!("(?i)^''{LINK_PATTERN}''$")).expect("valid spell cast regex")
});

/// Irregular phrasings recognized verbatim (lowercase).
fn irregular(lower: &str) -> Option<FeatPrerequisite> {
    let class_power = |name: &str| FeatPrerequisite {
        kind: PrerequisiteKind::Other,
        other: Some(OtherPrerequisite::ClassPower),
        value: Some(ids::normalize(name)),
        ..FeatPrerequisite::default()
    };
    let prerequisite = match lower {
        "pouvoir de classe ancrage" => class_power("Ancrage"),
        "pouvoir de classe [[oracle#mystere|mystère]]" => class_power("Mystère"),
        "[[maniement dune arme exotique|maniement d'une arme exotique]] (filet)" => FeatPrerequisite {
            kind: PrerequisiteKind::Other,
            other: Some(OtherPrerequisite::ExoticWeaponProficiency),
            value: Some(ids::normalize("filet")),
            ..FeatPrerequisite::default()
        },
        "[[arme de prédilection]] pour l’arme choisie" => FeatPrerequisite {
            kind: PrerequisiteKind::Feat,
            value: Some(ids::normalize("arme de prédilection")),
            ..FeatPrerequisite::default()
        },
        "[[arme de prédilection]] (bâton)" => FeatPrerequisite {
            kind: PrerequisiteKind::Feat,
            value: Some(ids::normalize("arme de prédilection")),
            sub_value: Some(ids::normalize("bâton")),
            ..FeatPrerequisite::default()
        },
        "aptitude de classe de [[représentation bardique]]" => class_power("représentation bardique"),
        "capacité de classe de [[canalisation|canalisation d’énergie]]"
        | "capacité de classe permettant de [[canalisation|canaliser de l’énergie négative]]"
        | "capacité de [[classe]] à [[canalisation|canaliser de l’énergie]]"
        | "capacité de [[classe]] permettant de [[canalisation|canaliser de l’énergie]]"
        | "capacité de classe permettant de canaliser de l’énergie" => class_power("canalisation"),
        _ => return None,
    };
    Some(prerequisite)
}

fn attribute_code(text: &str) -> &'static str {
    match text {
        "for" => "str",
        "dex" => "dex",
        "con" => "con",
        "int" => "int",
        "sag" => "wis",
        _ => "cha",
    }
}

fn number(captures: &Captures<'_>, group: &str) -> Option<i32> {
    captures.name(group).and_then(|value| value.as_str().parse().ok())
}

/// Classifies the condition clauses of one feat page.
pub struct PrerequisiteParser<'a> {
    export: &'a WikiExport,
    lists: &'a ParserLists,
    page: &'a WikiPage,
}

impl<'a> PrerequisiteParser<'a> {
    pub fn new(export: &'a WikiExport, lists: &'a ParserLists, page: &'a WikiPage) -> Self {
        Self {
            export,
            lists,
            page,
        }
    }

    /// Splits a full condition line and classifies every clause.
    pub fn parse_line(&self, markup: &str, log: &mut RunLog) -> Vec<PrerequisiteItem> {
        let has_semicolons = markup.contains(';');
        let separator = if has_semicolons { ';' } else { ',' };
        markup
            .split(separator)
            .map(str::trim)
            .filter(|clause| !clause.is_empty())
            .map(|clause| self.parse_clause(clause, has_semicolons, log))
            .collect()
    }

    /// A clause with " ou " becomes a choice; with semicolon-separated lines
    /// the alternatives are also split on commas.
    pub fn parse_clause(&self, markup: &str, has_semicolons: bool, log: &mut RunLog) -> PrerequisiteItem {
        let markup = markup.strip_suffix('.').unwrap_or(markup);

        if !markup.contains(" ou ") {
            return PrerequisiteItem::Single(self.described(markup, log));
        }

        let alternatives: Vec<&str> = if has_semicolons {
            markup
                .split(" ou ")
                .flat_map(|part| part.split(','))
                .collect()
        } else {
            markup.split(" ou ").collect()
        };
        let items = alternatives
            .into_iter()
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(|item| self.described(item, log))
            .collect();
        PrerequisiteItem::Choice { items }
    }

    fn described(&self, markup: &str, log: &mut RunLog) -> FeatPrerequisite {
        let mut prerequisite = self.classify(markup, log);
        prerequisite.description = remove_markup(markup);
        prerequisite
    }

    fn classify(&self, markup: &str, log: &mut RunLog) -> FeatPrerequisite {
        let lower = markup.to_lowercase();

        if let Some(captures) = ATTRIBUTE_PATTERNS.iter().find_map(|regex| regex.captures(&lower)) {
            return FeatPrerequisite {
                kind: PrerequisiteKind::Attribute,
                value: Some(attribute_code(&captures["attr"]).to_string()),
                number: number(&captures, "value"),
                ..FeatPrerequisite::default()
            };
        }

        if let Some(captures) = LINK_ONLY_RE.captures(&lower) {
            return self.linked(markup, link_target(&captures).trim(), log);
        }

        if let Some(captures) = BBA_RE.captures(markup) {
            return FeatPrerequisite {
                kind: PrerequisiteKind::Bba,
                number: number(&captures, "value"),
                ..FeatPrerequisite::default()
            };
        }

        if let Some(captures) = SPELLCASTER_LEVEL_PATTERNS
            .iter()
            .find_map(|regex| regex.captures(markup))
        {
            return FeatPrerequisite {
                kind: PrerequisiteKind::SpellcasterLevel,
                number: number(&captures, "level"),
                ..FeatPrerequisite::default()
            };
        }

        if let Some(captures) = SKILL_RANK_PATTERNS.iter().find_map(|regex| regex.captures(markup)) {
            return FeatPrerequisite {
                kind: PrerequisiteKind::SkillRank,
                value: Some(ids::normalize(&captures["skill"])),
                sub_value: captures
                    .name("speciality")
                    .map(|speciality| ids::normalize(speciality.as_str()))
                    .filter(|speciality| !speciality.is_empty()),
                number: number(&captures, "ranks"),
                ..FeatPrerequisite::default()
            };
        }

        if let Some(captures) = CLASS_LEVEL_PATTERNS.iter().find_map(|regex| regex.captures(markup)) {
            return FeatPrerequisite {
                kind: PrerequisiteKind::ClassLevel,
                value: Some(ids::normalize(&captures["class"])),
                number: number(&captures, "level"),
                ..FeatPrerequisite::default()
            };
        }

        if let Some(captures) = CLASS_POWER_RE.captures(markup) {
            return FeatPrerequisite {
                kind: PrerequisiteKind::Other,
                other: Some(OtherPrerequisite::ClassPower),
                value: Some(ids::normalize(&captures["power"])),
                ..FeatPrerequisite::default()
            };
        }

        if let Some(captures) = SPELL_CAST_RE.captures(markup) {
            return FeatPrerequisite {
                kind: PrerequisiteKind::SpellCast,
                value: Some(ids::normalize(link_target(&captures))),
                ..FeatPrerequisite::default()
            };
        }

        if self.lists.feat_prerequisite_other.contains(markup) {
            return FeatPrerequisite::of(PrerequisiteKind::Other);
        }

        if let Some(prerequisite) = irregular(&lower) {
            return prerequisite;
        }

        log.warning(format!(
            "{}: Condition '{markup}' non reconnue",
            self.page.title
        ));
        FeatPrerequisite::of(PrerequisiteKind::Other)
    }

    /// A bare link is classified by the categories of the page it points to.
    fn linked(&self, markup: &str, target: &str, log: &mut RunLog) -> FeatPrerequisite {
        let Some(target_page) = self.export.find_page(&self.export.qualify(target)) else {
            log.warning(format!(
                "{}: Impossible de trouver la page nommée '{target}' désignée par le lien '{markup}'",
                self.page.title
            ));
            return FeatPrerequisite::of(PrerequisiteKind::Other);
        };

        let resolved = target_page
            .categories
            .iter()
            .find_map(|category| match category.name().to_lowercase().as_str() {
                "don" => Some((PrerequisiteKind::Feat, None)),
                "race" => Some((PrerequisiteKind::Race, None)),
                "classe" => Some((PrerequisiteKind::ClassLevel, Some(1))),
                "sort" => Some((PrerequisiteKind::SpellCast, None)),
                "monstre" => Some((PrerequisiteKind::MonsterRace, None)),
                _ => None,
            });

        let Some((kind, number)) = resolved else {
            let categories: Vec<&str> = target_page
                .categories
                .iter()
                .map(|category| category.name())
                .collect();
            log.warning(format!(
                "{}: Impossible de déterminer le type de lien pour la page '{}' désignée par le lien '{markup}' avec les catégories '{}'",
                self.page.title,
                target_page.title,
                categories.join(", ")
            ));
            return FeatPrerequisite::of(PrerequisiteKind::Other);
        };

        FeatPrerequisite {
            kind,
            value: Some(ids::normalize(target)),
            number,
            ..FeatPrerequisite::default()
        }
    }
}
