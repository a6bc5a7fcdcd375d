//! Typed rule records produced by the parsers and consumed by the writers.

use std::collections::BTreeMap;
use std::ops::{BitOr, BitOrAssign};

use serde::{Serialize, Serializer};

pub mod source_ids {
    pub const PATHFINDER_RPG: &str = "pathfinder-rpg";
    pub const ADVANCED_PLAYERS_GUIDE: &str = "advanced-players-guide";
    pub const ULTIMATE_MAGIC: &str = "ultimate-magic";
    pub const ULTIMATE_COMBAT: &str = "ultimate-combat";
    pub const PAIZO_BLOG: &str = "paizo-blog";
    pub const BESTIARY: &str = "bestiary";
    pub const BESTIARY_2: &str = "bestiary-2";
    pub const BESTIARY_3: &str = "bestiary-3";
}

pub mod list_ids {
    pub const ALCHEMIST: &str = "alchemist";
    pub const ANTIPALADIN: &str = "antipaladin";
    pub const BARD: &str = "bard";
    pub const CLERIC: &str = "cleric";
    pub const DRUID: &str = "druid";
    pub const INQUISITOR: &str = "inquisitor";
    pub const MAGUS: &str = "magus";
    pub const ORACLE: &str = "oracle";
    pub const PALADIN: &str = "paladin";
    pub const RANGER: &str = "ranger";
    pub const SORCERER_WIZARD: &str = "sorcerer-wizard";
    pub const SUMMONER: &str = "summoner";
    pub const WITCH: &str = "witch";
}

pub const ENGLISH: &str = "en-US";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ElementReference {
    pub name: String,
    pub href: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ElementSource {
    pub id: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<ElementReference>,
}

impl ElementSource {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            references: Vec::new(),
        }
    }
}

/// language -> field -> value
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Localization {
    entries: BTreeMap<String, BTreeMap<String, String>>,
}

impl Localization {
    pub fn set(&mut self, lang: &str, field: &str, value: impl Into<String>) {
        self.entries
            .entry(lang.to_string())
            .or_default()
            .insert(field.to_string(), value.into());
    }

    pub fn get(&self, lang: &str, field: &str) -> Option<&str> {
        self.entries
            .get(lang)
            .and_then(|fields| fields.get(field))
            .map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `(lang, field, value)` triples in lang then field order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, &str)> {
        self.entries.iter().flat_map(|(lang, fields)| {
            fields
                .iter()
                .map(move |(field, value)| (lang.as_str(), field.as_str(), value.as_str()))
        })
    }
}

macro_rules! flag_set {
    ($name:ident { $($flag:ident = $bit:expr => $label:literal,)+ }) => {
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
        pub struct $name(u32);

        impl $name {
            pub const NONE: Self = Self(0);
            $(pub const $flag: Self = Self(1 << $bit);)+

            const LABELS: &'static [(Self, &'static str)] = &[$((Self::$flag, $label),)+];

            pub fn contains(self, other: Self) -> bool {
                other.0 != 0 && self.0 & other.0 == other.0
            }

            pub fn is_empty(&self) -> bool {
                self.0 == 0
            }

            pub fn labels(self) -> Vec<&'static str> {
                Self::LABELS
                    .iter()
                    .filter(|(flag, _)| self.contains(*flag))
                    .map(|(_, label)| *label)
                    .collect()
            }
        }

        impl BitOr for $name {
            type Output = Self;

            fn bitor(self, rhs: Self) -> Self {
                Self(self.0 | rhs.0)
            }
        }

        impl BitOrAssign for $name {
            fn bitor_assign(&mut self, rhs: Self) {
                self.0 |= rhs.0;
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_seq(self.labels())
            }
        }
    };
}

flag_set!(SpellDescriptors {
    ACID = 0 => "acid",
    AIR = 1 => "air",
    CHAOTIC = 2 => "chaotic",
    COLD = 3 => "cold",
    DARKNESS = 4 => "darkness",
    DEATH = 5 => "death",
    EARTH = 6 => "earth",
    ELECTRICITY = 7 => "electricity",
    EVIL = 8 => "evil",
    FEAR = 9 => "fear",
    FIRE = 10 => "fire",
    FORCE = 11 => "force",
    GOOD = 12 => "good",
    HEALING = 13 => "healing",
    LANGUAGE_DEPENDENT = 14 => "language-dependent",
    LAWFUL = 15 => "lawful",
    LIGHT = 16 => "light",
    MIND_AFFECTING = 17 => "mind-affecting",
    SHADOW = 18 => "shadow",
    SONIC = 19 => "sonic",
    TELEPORTATION = 20 => "teleportation",
    WATER = 21 => "water",
    CURSE = 22 => "curse",
    DISEASE = 23 => "disease",
    EMOTION = 24 => "emotion",
    PAIN = 25 => "pain",
    POISON = 26 => "poison",
});

flag_set!(ComponentKinds {
    VERBAL = 0 => "verbal",
    SOMATIC = 1 => "somatic",
    MATERIAL = 2 => "material",
    FOCUS = 3 => "focus",
    DIVINE_FOCUS = 4 => "divine-focus",
    MATERIAL_OR_DIVINE_FOCUS = 5 => "material-or-divine-focus",
    FOCUS_OR_DIVINE_FOCUS = 6 => "focus-or-divine-focus",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MagicSchool {
    Abjuration,
    Conjuration,
    Divination,
    Enchantment,
    Evocation,
    Illusion,
    Necromancy,
    Transmutation,
    Universal,
}

impl MagicSchool {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Abjuration => "abjuration",
            Self::Conjuration => "conjuration",
            Self::Divination => "divination",
            Self::Enchantment => "enchantment",
            Self::Evocation => "evocation",
            Self::Illusion => "illusion",
            Self::Necromancy => "necromancy",
            Self::Transmutation => "transmutation",
            Self::Universal => "universal",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpellLevel {
    pub list: String,
    pub level: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TimeUnit {
    SimpleAction,
    ImmediateAction,
    SwiftAction,
    FullRoundAction,
    Round,
    Minute,
    Hour,
    Day,
    Special,
}

impl TimeUnit {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SimpleAction => "simple-action",
            Self::ImmediateAction => "immediate-action",
            Self::SwiftAction => "swift-action",
            Self::FullRoundAction => "full-round-action",
            Self::Round => "round",
            Self::Minute => "minute",
            Self::Hour => "hour",
            Self::Day => "day",
            Self::Special => "special",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CastingTime {
    pub value: u32,
    pub unit: TimeUnit,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RangeUnit {
    Personal,
    Touch,
    Unlimited,
    Close,
    Medium,
    Long,
    Squares,
    Special,
}

impl RangeUnit {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Personal => "personal",
            Self::Touch => "touch",
            Self::Unlimited => "unlimited",
            Self::Close => "close",
            Self::Medium => "medium",
            Self::Long => "long",
            Self::Squares => "squares",
            Self::Special => "special",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpellRange {
    pub unit: RangeUnit,
    /// Square count for `Squares`, free text for `Special`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specific_value: Option<String>,
}

impl SpellRange {
    pub fn of(unit: RangeUnit) -> Self {
        Self {
            unit,
            specific_value: None,
        }
    }

    pub fn squares(value: impl Into<String>) -> Self {
        Self {
            unit: RangeUnit::Squares,
            specific_value: Some(value.into()),
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self {
            unit: RangeUnit::Special,
            specific_value: Some(text.into()),
        }
    }

    /// Short French label used by the CSV projection.
    pub fn label(&self) -> String {
        let value = self.specific_value.as_deref().unwrap_or_default();
        match self.unit {
            RangeUnit::Personal => "personnelle".to_string(),
            RangeUnit::Touch => "contact".to_string(),
            RangeUnit::Unlimited => "illimitée".to_string(),
            RangeUnit::Close => "courte".to_string(),
            RangeUnit::Medium => "moyenne".to_string(),
            RangeUnit::Long => "longue".to_string(),
            RangeUnit::Squares => format!("{value} c"),
            RangeUnit::Special => value.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SpellComponents {
    pub kinds: ComponentKinds,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SavingThrowTarget {
    #[default]
    None,
    Will,
    Reflex,
    Fortitude,
    Special,
}

impl SavingThrowTarget {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Will => "will",
            Self::Reflex => "reflex",
            Self::Fortitude => "fortitude",
            Self::Special => "special",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SavingThrowEffect {
    #[default]
    None,
    Negates,
    Half,
    Partial,
    Disbelief,
    Special,
}

impl SavingThrowEffect {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Negates => "negates",
            Self::Half => "half",
            Self::Partial => "partial",
            Self::Disbelief => "disbelief",
            Self::Special => "special",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SpellSavingThrow {
    pub target: SavingThrowTarget,
    pub effect: SavingThrowEffect,
    #[serde(skip_serializing_if = "is_false")]
    pub harmless: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub objects: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specific_value: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MagicResistanceKind {
    #[default]
    No,
    Yes,
    Special,
}

impl MagicResistanceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::No => "no",
            Self::Yes => "yes",
            Self::Special => "special",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SpellMagicResistance {
    pub resistance: MagicResistanceKind,
    #[serde(skip_serializing_if = "is_false")]
    pub harmless: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub objects: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Spell {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Localization::is_empty")]
    pub localization: Localization,
    pub source: ElementSource,
    pub school: MagicSchool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_school: Option<String>,
    #[serde(skip_serializing_if = "SpellDescriptors::is_empty")]
    pub descriptor: SpellDescriptors,
    pub levels: Vec<SpellLevel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub casting_time: Option<CastingTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<SpellRange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub components: Option<SpellComponents>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saving_throw: Option<SpellSavingThrow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub magic_resistance: Option<SpellMagicResistance>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

impl Spell {
    pub fn new(id: impl Into<String>, name: impl Into<String>, school: MagicSchool) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            localization: Localization::default(),
            source: ElementSource::default(),
            school,
            sub_school: None,
            descriptor: SpellDescriptors::NONE,
            levels: Vec::new(),
            casting_time: None,
            range: None,
            components: None,
            target: None,
            saving_throw: None,
            magic_resistance: None,
            summary: None,
        }
    }

    pub fn level_for(&self, list: &str) -> Option<u8> {
        self.levels
            .iter()
            .find(|entry| entry.list == list)
            .map(|entry| entry.level)
    }

    /// Appends a level unless the list already has one. Returns whether it was added.
    pub fn add_level(&mut self, list: &str, level: u8) -> bool {
        if self.level_for(list).is_some() {
            return false;
        }
        self.levels.push(SpellLevel {
            list: list.to_string(),
            level,
        });
        true
    }

    pub fn english_name(&self) -> Option<&str> {
        self.localization.get(ENGLISH, "name")
    }

    pub fn reference(&self, name: &str) -> Option<&ElementReference> {
        self.source
            .references
            .iter()
            .find(|reference| reference.name == name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FeatType {
    General,
    Combat,
    Critical,
    Grit,
    ItemCreation,
    Metamagic,
    Monster,
    Performance,
    Style,
    Teamwork,
}

impl FeatType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Combat => "combat",
            Self::Critical => "critical",
            Self::Grit => "grit",
            Self::ItemCreation => "item-creation",
            Self::Metamagic => "metamagic",
            Self::Monster => "monster",
            Self::Performance => "performance",
            Self::Style => "style",
            Self::Teamwork => "teamwork",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PrerequisiteKind {
    Attribute,
    Bba,
    ClassLevel,
    SpellcasterLevel,
    SkillRank,
    SpellCast,
    Feat,
    Race,
    MonsterRace,
    #[default]
    Other,
}

impl PrerequisiteKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Attribute => "attribute",
            Self::Bba => "bba",
            Self::ClassLevel => "class-level",
            Self::SpellcasterLevel => "spellcaster-level",
            Self::SkillRank => "skill-rank",
            Self::SpellCast => "spell-cast",
            Self::Feat => "feat",
            Self::Race => "race",
            Self::MonsterRace => "monster-race",
            Self::Other => "other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum OtherPrerequisite {
    ClassPower,
    ExoticWeaponProficiency,
}

impl OtherPrerequisite {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ClassPower => "class-power",
            Self::ExoticWeaponProficiency => "exotic-weapon-proficiency",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FeatPrerequisite {
    pub kind: PrerequisiteKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub other: Option<OtherPrerequisite>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number: Option<i32>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
}

impl FeatPrerequisite {
    pub fn of(kind: PrerequisiteKind) -> Self {
        Self {
            kind,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum PrerequisiteItem {
    Single(FeatPrerequisite),
    Choice { items: Vec<FeatPrerequisite> },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Feat {
    pub id: String,
    pub name: String,
    pub source: ElementSource,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub benefit: Option<String>,
    pub types: Vec<FeatType>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub prerequisites: Vec<PrerequisiteItem>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CreatureType {
    Aberration,
    Animal,
    Construct,
    Dragon,
    Fey,
    Humanoid,
    MagicalBeast,
    MonstrousHumanoid,
    Ooze,
    Outsider,
    Plant,
    Undead,
    Vermin,
    #[default]
    Other,
}

impl CreatureType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Aberration => "aberration",
            Self::Animal => "animal",
            Self::Construct => "construct",
            Self::Dragon => "dragon",
            Self::Fey => "fey",
            Self::Humanoid => "humanoid",
            Self::MagicalBeast => "magical-beast",
            Self::MonstrousHumanoid => "monstrous-humanoid",
            Self::Ooze => "ooze",
            Self::Outsider => "outsider",
            Self::Plant => "plant",
            Self::Undead => "undead",
            Self::Vermin => "vermin",
            Self::Other => "other",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CreatureEnvironment {
    Aquatic,
    Desert,
    ForestJungle,
    Hills,
    Mountains,
    Plains,
    RuinsDungeons,
    Sky,
    Swamp,
    Underground,
    Urban,
    #[default]
    Unknown,
}

impl CreatureEnvironment {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Aquatic => "aquatic",
            Self::Desert => "desert",
            Self::ForestJungle => "forest-jungle",
            Self::Hills => "hills",
            Self::Mountains => "mountains",
            Self::Plains => "plains",
            Self::RuinsDungeons => "ruins-dungeons",
            Self::Sky => "sky",
            Self::Swamp => "swamp",
            Self::Underground => "underground",
            Self::Urban => "urban",
            Self::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CreatureClimate {
    Cold,
    Planar,
    Temperate,
    Warm,
    #[default]
    Other,
}

impl CreatureClimate {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cold => "cold",
            Self::Planar => "planar",
            Self::Temperate => "temperate",
            Self::Warm => "warm",
            Self::Other => "other",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Monster {
    pub id: String,
    pub name: String,
    pub cr: f64,
    #[serde(rename = "type")]
    pub creature_type: CreatureType,
    pub environment: CreatureEnvironment,
    pub climate: CreatureClimate,
    pub sources: Vec<ElementSource>,
    #[serde(skip_serializing_if = "Localization::is_empty")]
    pub localization: Localization,
}

impl Monster {
    pub fn primary_source(&self) -> &str {
        self.sources
            .first()
            .map(|source| source.id.as_str())
            .unwrap_or(source_ids::BESTIARY)
    }

    pub fn english_name(&self) -> Option<&str> {
        self.localization.get(ENGLISH, "name")
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}

#[cfg(test)]
mod tests {
    use super::{ComponentKinds, MagicSchool, Spell, SpellDescriptors, list_ids};

    #[test]
    fn add_level_keeps_first_entry_per_list() {
        let mut spell = Spell::new("lumiere", "Lumière", MagicSchool::Evocation);
        assert!(spell.add_level(list_ids::CLERIC, 0));
        assert!(!spell.add_level(list_ids::CLERIC, 3));
        assert_eq!(spell.level_for(list_ids::CLERIC), Some(0));
        assert_eq!(spell.levels.len(), 1);
    }

    #[test]
    fn flag_sets_combine_and_serialize_as_labels() {
        let kinds = ComponentKinds::VERBAL | ComponentKinds::SOMATIC;
        assert!(kinds.contains(ComponentKinds::SOMATIC));
        assert!(!kinds.contains(ComponentKinds::MATERIAL));
        assert_eq!(
            serde_json::to_string(&kinds).expect("serialize"),
            r#"["verbal","somatic"]"#
        );

        let mut descriptors = SpellDescriptors::NONE;
        assert!(descriptors.is_empty());
        descriptors |= SpellDescriptors::FIRE;
        assert_eq!(descriptors.labels(), vec!["fire"]);
    }
}
