//! Static allowlists consumed by the parsers, embedded at build time and
//! optionally replaced file by file from a directory.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};

const SPELL_IGNORED_PAGES: &str = "spell_ignored_pages.txt";
const SPELL_NO_RANGE: &str = "spell_no_range.txt";
const SPELL_NO_TARGET: &str = "spell_no_target.txt";
const SPELL_NO_DESCRIPTION: &str = "spell_no_description.txt";
const SPELL_LISTS: &str = "spell_lists.txt";
const FEAT_IGNORED_PAGES: &str = "feat_ignored_pages.txt";
const FEAT_PREREQUISITE_OTHER: &str = "feat_prerequisite_other.txt";
const MONSTER_IGNORED_PAGES: &str = "monster_ignored_pages.txt";
const RANGE_VARIANTS: &str = "range_variants.txt";

const EMBEDDED_LISTS: [(&str, &str); 9] = [
    (
        SPELL_IGNORED_PAGES,
        include_str!("../../../config/lists/spell_ignored_pages.txt"),
    ),
    (
        SPELL_NO_RANGE,
        include_str!("../../../config/lists/spell_no_range.txt"),
    ),
    (
        SPELL_NO_TARGET,
        include_str!("../../../config/lists/spell_no_target.txt"),
    ),
    (
        SPELL_NO_DESCRIPTION,
        include_str!("../../../config/lists/spell_no_description.txt"),
    ),
    (
        SPELL_LISTS,
        include_str!("../../../config/lists/spell_lists.txt"),
    ),
    (
        FEAT_IGNORED_PAGES,
        include_str!("../../../config/lists/feat_ignored_pages.txt"),
    ),
    (
        FEAT_PREREQUISITE_OTHER,
        include_str!("../../../config/lists/feat_prerequisite_other.txt"),
    ),
    (
        MONSTER_IGNORED_PAGES,
        include_str!("../../../config/lists/monster_ignored_pages.txt"),
    ),
    (
        RANGE_VARIANTS,
        include_str!("../../../config/lists/range_variants.txt"),
    ),
];

/// Case-insensitive set of names.
#[derive(Debug, Clone, Default)]
pub struct NameSet {
    entries: HashSet<String>,
}

impl NameSet {
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains(&name.trim().to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> FromIterator<&'a str> for NameSet {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|name| name.trim().to_lowercase())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpellListPage {
    pub page: String,
    pub list_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeVariantKind {
    Personal,
    Touch,
    Unlimited,
    Close,
    Medium,
    Long,
    Squares,
    Text,
    Keep,
}

impl RangeVariantKind {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "personal" => Some(Self::Personal),
            "touch" => Some(Self::Touch),
            "unlimited" => Some(Self::Unlimited),
            "close" => Some(Self::Close),
            "medium" => Some(Self::Medium),
            "long" => Some(Self::Long),
            "squares" => Some(Self::Squares),
            "text" => Some(Self::Text),
            "keep" => Some(Self::Keep),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeVariant {
    pub kind: RangeVariantKind,
    pub value: String,
    pub literal: String,
}

/// Fixed range literals keyed by their lowercase form.
#[derive(Debug, Clone, Default)]
pub struct RangeTable {
    variants: Vec<RangeVariant>,
    by_literal: HashMap<String, usize>,
}

impl RangeTable {
    pub fn lookup(&self, literal: &str) -> Option<&RangeVariant> {
        self.by_literal
            .get(&literal.to_lowercase())
            .map(|index| &self.variants[*index])
    }

    pub fn variants(&self) -> &[RangeVariant] {
        &self.variants
    }

    fn push(&mut self, variant: RangeVariant) {
        let key = variant.literal.to_lowercase();
        if self.by_literal.contains_key(&key) {
            return;
        }
        self.by_literal.insert(key, self.variants.len());
        self.variants.push(variant);
    }
}

#[derive(Debug, Clone, Default)]
pub struct ParserLists {
    pub spell_ignored_pages: NameSet,
    pub spell_no_range: NameSet,
    pub spell_no_target: NameSet,
    pub spell_no_description: NameSet,
    pub spell_lists: Vec<SpellListPage>,
    pub feat_ignored_pages: NameSet,
    pub feat_prerequisite_other: NameSet,
    pub monster_ignored_pages: NameSet,
    pub range_variants: RangeTable,
}

impl ParserLists {
    pub fn embedded() -> Result<Self> {
        Self::load(None)
    }

    /// Embedded lists, each replaced by a same-named file from `override_dir` when present.
    pub fn load(override_dir: Option<&Path>) -> Result<Self> {
        let mut sources = HashMap::new();
        for (file_name, embedded) in EMBEDDED_LISTS {
            let content = match override_dir.map(|dir| dir.join(file_name)) {
                Some(path) if path.is_file() => fs::read_to_string(&path)
                    .with_context(|| format!("failed to read {}", path.display()))?,
                _ => embedded.to_string(),
            };
            sources.insert(file_name, content);
        }
        let text = |name: &str| sources.get(name).map(String::as_str).unwrap_or("");

        Ok(Self {
            spell_ignored_pages: entries(text(SPELL_IGNORED_PAGES)).collect(),
            spell_no_range: entries(text(SPELL_NO_RANGE)).collect(),
            spell_no_target: entries(text(SPELL_NO_TARGET)).collect(),
            spell_no_description: entries(text(SPELL_NO_DESCRIPTION)).collect(),
            spell_lists: parse_spell_lists(text(SPELL_LISTS))?,
            feat_ignored_pages: entries(text(FEAT_IGNORED_PAGES)).collect(),
            feat_prerequisite_other: entries(text(FEAT_PREREQUISITE_OTHER)).collect(),
            monster_ignored_pages: entries(text(MONSTER_IGNORED_PAGES)).collect(),
            range_variants: parse_range_variants(text(RANGE_VARIANTS))?,
        })
    }
}

/// Non-empty, non-comment lines.
fn entries(content: &str) -> impl Iterator<Item = &str> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
}

fn parse_spell_lists(content: &str) -> Result<Vec<SpellListPage>> {
    let mut pages = Vec::new();
    for line in entries(content) {
        let Some((page, list_id)) = line.split_once('\t') else {
            bail!("{SPELL_LISTS}: expected page<TAB>list-id in \"{line}\"");
        };
        pages.push(SpellListPage {
            page: page.trim().to_string(),
            list_id: list_id.trim().to_string(),
        });
    }
    Ok(pages)
}

fn parse_range_variants(content: &str) -> Result<RangeTable> {
    let mut table = RangeTable::default();
    for line in entries(content) {
        let mut parts = line.splitn(3, '\t');
        let (Some(kind), Some(value), Some(literal)) = (parts.next(), parts.next(), parts.next())
        else {
            bail!("{RANGE_VARIANTS}: expected kind<TAB>value<TAB>literal in \"{line}\"");
        };
        let Some(kind) = RangeVariantKind::parse(kind.trim()) else {
            bail!("{RANGE_VARIANTS}: unknown range kind \"{kind}\"");
        };
        if kind == RangeVariantKind::Squares && value.trim().is_empty() {
            bail!("{RANGE_VARIANTS}: squares row without a value in \"{line}\"");
        }
        table.push(RangeVariant {
            kind,
            value: value.trim().to_string(),
            literal: literal.trim().to_string(),
        });
    }
    Ok(table)
}
