//! French/English spell glossary rendered as a sortable wiki table.

use std::fmt::Write as _;
use std::fs;

use anyhow::{Context, Result};

use super::{Command, CommandContext};
use crate::dataset::DataSetCollection;
use crate::model::{MagicSchool, Spell, list_ids, source_ids};
use crate::references::{self, PAIZO_PRD, PATHFINDER_FR_WIKI};
use crate::runtime::normalize_for_display;
use crate::spells::read_spells;
use crate::wiki::page_name_from_url;

pub const GLOSSARY_FILE: &str = "SpellGlossary.txt";

const UNKNOWN_ENGLISH_NAME: &str = "?";

const HEADER: &str = "{s:SortTable}{s:MenuGlossaires}


''Cliquez sur un titre de colonnes pour trier le tableau. Pour faire un tri par catégorie puis, à l'intérieur de chaque catégorie, selon un autre critère, triez d'abord selon cet autre critère (par ordre alphabétique par exemple) puis cliquez sur le titre de la colonne des catégories.

En cliquant sur un des noms anglais, vous serez redirigés vers le PRD officiel en anglais, sur le site de Paizo.''

{| CLASS=\"tablo sortable\" ID=\"tabsort\"
|+ Glossaire des sorts
! Anglais !! Français !! École !! Mag !! Prê !! Dru !! Rôd !! Bar !! Pal !! Alc !! Con !! Sor !! Inq !! Ora !! Apal !! Source
";

/// Level columns, in header order.
const LEVEL_COLUMNS: [&str; 12] = [
    list_ids::SORCERER_WIZARD,
    list_ids::CLERIC,
    list_ids::DRUID,
    list_ids::RANGER,
    list_ids::BARD,
    list_ids::PALADIN,
    list_ids::ALCHEMIST,
    list_ids::SUMMONER,
    list_ids::WITCH,
    list_ids::INQUISITOR,
    list_ids::ORACLE,
    list_ids::ANTIPALADIN,
];

pub struct SpellGlossaryCommand;

impl Command for SpellGlossaryCommand {
    fn alias(&self) -> &'static str {
        "spellglossary"
    }

    fn help(&self) -> &'static str {
        "Génère le contenu de la page du wiki du glossaire des sorts français/anglais dans un fichier SpellGlossary.txt"
    }

    fn execute(
        &self,
        context: &mut CommandContext<'_>,
        _data_sets: &mut DataSetCollection,
    ) -> Result<usize> {
        let spells = read_spells(context.export, context.lists, context.log)?;

        fs::create_dir_all(context.output_dir).with_context(|| {
            format!("failed to create {}", context.output_dir.display())
        })?;
        let path = context.output_dir.join(GLOSSARY_FILE);
        fs::write(&path, render(&spells))
            .with_context(|| format!("failed to write {}", path.display()))?;
        context.log.information(format!(
            "Glossaire des sorts écrit dans {}",
            normalize_for_display(&path)
        ));

        Ok(spells.len())
    }
}

pub fn render(spells: &[Spell]) -> String {
    let mut ordered: Vec<&Spell> = spells.iter().collect();
    ordered.sort_by(|left, right| {
        source_order(&left.source.id)
            .cmp(&source_order(&right.source.id))
            .then_with(|| left.name.cmp(&right.name))
    });

    let mut out = String::from(HEADER);
    for spell in ordered {
        write_row(&mut out, spell);
    }
    out.push_str("|}\n");
    out
}

fn write_row(out: &mut String, spell: &Spell) {
    let english = spell.english_name().unwrap_or(UNKNOWN_ENGLISH_NAME);
    out.push_str("|-\n");
    out.push_str("| class=\"gauche\" | ");
    out.push_str(english);
    if let Some(prd) = spell.reference(PAIZO_PRD) {
        let _ = write!(
            out,
            " [[{}|PRD]]",
            prd.href.replace("ultimageMagic", "ultimateMagic")
        );
    } else if english != UNKNOWN_ENGLISH_NAME {
        let _ = write!(
            out,
            " [[{}|PRD]]",
            references::spell_prd_url(english, &spell.source.id)
        );
    }
    out.push('\n');

    let wiki_page = spell
        .reference(PATHFINDER_FR_WIKI)
        .map(|reference| page_name_from_url(&reference.href))
        .unwrap_or(spell.name.as_str());
    let _ = writeln!(out, "| class=\"gauche\" | {} [[{wiki_page}|(lien)]]", spell.name);
    let _ = writeln!(out, "| {}", school_label(spell.school));

    for list in LEVEL_COLUMNS {
        let level = spell
            .level_for(list)
            .map(|level| level.to_string())
            .unwrap_or_default();
        let _ = write!(out, "| {level} |");
    }
    let _ = writeln!(out, "| {}", source_label(&spell.source.id));
}

fn source_order(source_id: &str) -> u8 {
    match source_id {
        source_ids::ULTIMATE_COMBAT => 4,
        source_ids::ULTIMATE_MAGIC => 3,
        source_ids::ADVANCED_PLAYERS_GUIDE => 2,
        source_ids::PAIZO_BLOG => 99,
        _ => 1,
    }
}

fn source_label(source_id: &str) -> &'static str {
    match source_id {
        source_ids::PATHFINDER_RPG => "PHB",
        source_ids::ADVANCED_PLAYERS_GUIDE => "APG",
        source_ids::ULTIMATE_MAGIC => "UM",
        source_ids::ULTIMATE_COMBAT => "UC",
        _ => "",
    }
}

fn school_label(school: MagicSchool) -> &'static str {
    match school {
        MagicSchool::Abjuration => "Abj",
        MagicSchool::Conjuration => "Inv",
        MagicSchool::Divination => "Div",
        MagicSchool::Enchantment => "Enc",
        MagicSchool::Evocation => "Évo",
        MagicSchool::Illusion => "Ill",
        MagicSchool::Necromancy => "Nec",
        MagicSchool::Transmutation => "Tra",
        MagicSchool::Universal => "Uni",
    }
}
