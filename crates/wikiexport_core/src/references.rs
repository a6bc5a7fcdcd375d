use std::sync::LazyLock;

use regex::Regex;

use crate::ids;
use crate::model::{ENGLISH, ElementReference, source_ids};

pub const PATHFINDER_FR_WIKI: &str = "Wiki Pathfinder-fr.org";
pub const PAIZO_PRD: &str = "Paizo PRD";
pub const BBE_DRP: &str = "DRP Black-Book-Éditions";

const PRD_ROOT: &str = "http://paizo.com/pathfinderRPG";

static ROMAN_SUFFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(" [IXV]+$").expect("valid roman suffix regex"));

pub fn from_wiki(url: &str) -> ElementReference {
    ElementReference {
        name: PATHFINDER_FR_WIKI.to_string(),
        href: url.to_string(),
        lang: None,
    }
}

pub fn from_drp(page_id: &str) -> ElementReference {
    ElementReference {
        name: BBE_DRP.to_string(),
        href: format!(
            "http://www.regles-pathfinder.fr/{}.html",
            ids::title_case_page_name(page_id)
        ),
        lang: None,
    }
}

pub fn from_prd(href: &str) -> ElementReference {
    ElementReference {
        name: PAIZO_PRD.to_string(),
        href: href.to_string(),
        lang: Some(ENGLISH.to_string()),
    }
}

pub fn book_name(source_id: &str) -> Option<&'static str> {
    match source_id {
        source_ids::BESTIARY => Some("Bestiaire"),
        source_ids::BESTIARY_2 => Some("Bestiaire 2"),
        source_ids::BESTIARY_3 => Some("Bestiaire 3"),
        _ => None,
    }
}

fn book_isbn(source_id: &str) -> Option<&'static str> {
    match source_id {
        source_ids::BESTIARY => Some("978-2-915847-88-8"),
        source_ids::BESTIARY_2 => Some("978-2-36328-103-6"),
        source_ids::BESTIARY_3 => Some("978-2-36328-001-5"),
        _ => None,
    }
}

/// Printed book page reference; only the bestiaries carry an ISBN.
pub fn from_book_page(source_id: &str, page: u32) -> Option<ElementReference> {
    let name = book_name(source_id)?;
    let isbn = book_isbn(source_id)?;
    Some(ElementReference {
        name: format!("{name} p.{page}"),
        href: format!("book:/isbn:{isbn}/page/{page}"),
        lang: None,
    })
}

/// Guesses the PRD page of a spell from its English name.
pub fn spell_prd_url(english_name: &str, source_id: &str) -> String {
    let base = english_name
        .split_once(',')
        .map(|(head, _)| head.trim())
        .unwrap_or(english_name);
    let base = ROMAN_SUFFIX_RE.replace(base, "");

    let mut page = String::with_capacity(base.len());
    let mut word_start = true;
    for ch in base.to_lowercase().chars() {
        if ch == ' ' {
            word_start = true;
            continue;
        }
        if ch == '\'' {
            continue;
        }
        if word_start && page.is_empty() {
            page.push(ch);
        } else if word_start {
            page.extend(ch.to_uppercase());
        } else {
            page.push(ch);
        }
        word_start = false;
    }

    let anchor = english_name.to_lowercase().replace([' ', '\''], "-");

    let section = match source_id {
        source_ids::ADVANCED_PLAYERS_GUIDE => "prd/advanced/spells",
        source_ids::ULTIMATE_MAGIC => "prd/ultimateMagic/spells",
        source_ids::ULTIMATE_COMBAT => "prd/ultimateCombat/spells",
        _ => "prd/spells",
    };

    format!("{PRD_ROOT}/{section}/{page}.html#_{anchor}")
}

#[cfg(test)]
mod tests {
    use super::{from_book_page, from_drp, spell_prd_url};
    use crate::model::source_ids;

    #[test]
    fn drp_reference_title_cases_each_word() {
        let reference = from_drp("boule-de-feu");
        assert_eq!(reference.href, "http://www.regles-pathfinder.fr/Boule-De-Feu.html");
    }

    #[test]
    fn book_reference_only_exists_for_bestiaries() {
        let reference = from_book_page(source_ids::BESTIARY_2, 42).expect("bestiary 2");
        assert_eq!(reference.name, "Bestiaire 2 p.42");
        assert_eq!(reference.href, "book:/isbn:978-2-36328-103-6/page/42");
        assert!(from_book_page(source_ids::ULTIMATE_MAGIC, 3).is_none());
    }

    #[test]
    fn spell_prd_url_matches_paizo_layout() {
        assert_eq!(
            spell_prd_url("Summon Monster III", source_ids::PATHFINDER_RPG),
            "http://paizo.com/pathfinderRPG/prd/spells/summonMonster.html#_summon-monster-iii"
        );
        assert_eq!(
            spell_prd_url("Cure Light Wounds, Mass", source_ids::ADVANCED_PLAYERS_GUIDE),
            "http://paizo.com/pathfinderRPG/prd/advanced/spells/cureLightWounds.html#_cure-light-wounds,-mass"
        );
        assert_eq!(
            spell_prd_url("Mage's Disjunction", source_ids::ULTIMATE_MAGIC),
            "http://paizo.com/pathfinderRPG/prd/ultimateMagic/spells/magesDisjunction.html#_mage-s-disjunction"
        );
    }
}
