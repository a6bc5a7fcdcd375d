//! Spell pages: field parsers, the entity parser and the cross-reference passes.

pub mod casting_time;
pub mod components;
pub mod description;
pub mod descriptor;
pub mod glossary;
pub mod levels;
pub mod magic_resistance;
pub mod range;
pub mod saving_throw;
pub mod school;
pub mod spell_list;
pub mod target;

use std::collections::BTreeSet;

use anyhow::{Result, bail};

use crate::error::{ParseError, ParseResult};
use crate::lists::ParserLists;
use crate::log::RunLog;
use crate::markup;
use crate::model::{ElementReference, MagicSchool, Spell, source_ids};
use crate::references;
use crate::wiki::{WikiExport, WikiName, WikiPage};

pub use target::TargetStats;

/// End of a markup line: an html break or a newline.
pub(crate) const LINE_END: &str = r"(?:</?br ?/?>|\r?\n|$)";

/// Index pages whose out-links are the spell candidates.
pub const MASTER_LIST_PAGES: [&str; 3] = [
    "Pathfinder-RPG.liste des sorts",
    "Pathfinder-RPG.liste des sorts (suite)",
    "Pathfinder-RPG.liste des sorts (fin)",
];

pub const GLOSSARY_PAGE: &str = "Glossaire des sorts";

const BLOG_SPELLS: [&str; 6] = ["Brise", "Choc", "Détremper", "Pénombre", "Racine", "Scoop"];

const BLOG_REFERENCES: [(&str, &str); 4] = [
    (
        "Page téléchargement BBE",
        "http://www.black-book-editions.fr/index.php?site_id=59&download_id=138",
    ),
    (
        "Téléchargement Pathfinder-fr.org",
        "http://www.pathfinder-fr.org/Wiki/GetFile.aspx?File=%2fADJ%2fPathfinder-RPG%2fUMToursDeMagie.pdf",
    ),
    (
        "Annonce BBE",
        "http://www.black-book-editions.fr/index.php?site_id=59&actu_id=398",
    ),
    (
        "Annonce Pathfinder-fr.org",
        "http://www.pathfinder-fr.org/Blog/post/Un-coup-de-baguette-magique.aspx",
    ),
];

/// Builds spells from pages, collecting target statistics across the run.
pub struct SpellParser<'a> {
    lists: &'a ParserLists,
    target_stats: TargetStats,
}

impl<'a> SpellParser<'a> {
    pub fn new(lists: &'a ParserLists) -> Self {
        Self {
            lists,
            target_stats: TargetStats::default(),
        }
    }

    pub fn target_stats(&self) -> &TargetStats {
        &self.target_stats
    }

    pub fn parse(&mut self, page: &WikiPage, log: &mut RunLog) -> ParseResult<Spell> {
        let markup = page.raw.as_str();
        if !markup.contains("'''École'''") && !markup.contains("'''Ecole'''") {
            return Err(ParseError::new("École de magie introuvable"));
        }

        let mut spell = Spell::new(page.id(), page.title.clone(), MagicSchool::Universal);
        spell.source.references.push(references::from_wiki(&page.url()));
        spell.source.references.push(references::from_drp(&spell.id));

        school::parse_school(markup, &mut spell)?;
        descriptor::parse_descriptor(markup, &mut spell)?;
        levels::parse_levels(markup, &mut spell)?;
        range::parse_range(markup, &mut spell, self.lists, log)?;
        target::parse_target(markup, &mut spell, self.lists, &mut self.target_stats, log);
        components::parse_components(markup, &mut spell, self.lists)?;
        casting_time::parse_casting_time(markup, &mut spell)?;
        saving_throw::parse_saving_throw(markup, &mut spell)?;
        magic_resistance::parse_magic_resistance(markup, &mut spell)?;
        apply_source(markup, &mut spell);

        Ok(spell)
    }

    /// Logs the failure against the page title instead of returning it.
    pub fn try_parse(&mut self, page: &WikiPage, log: &mut RunLog) -> Option<Spell> {
        match self.parse(page, log) {
            Ok(spell) => Some(spell),
            Err(error) => {
                log.error(format!("{}: {error}", page.title));
                None
            }
        }
    }
}

fn apply_source(markup: &str, spell: &mut Spell) {
    if let Some(source) = markup::detect_source_snippet(markup) {
        spell.source.id = source.to_string();
        return;
    }

    let is_blog_spell = BLOG_SPELLS
        .iter()
        .any(|name| name.to_lowercase() == spell.name.to_lowercase());
    if is_blog_spell {
        spell.source.id = source_ids::PAIZO_BLOG.to_string();
        spell.source
            .references
            .extend(BLOG_REFERENCES.iter().map(|(name, href)| ElementReference {
                name: name.to_string(),
                href: href.to_string(),
                lang: None,
            }));
        return;
    }

    spell.source.id = source_ids::PATHFINDER_RPG.to_string();
}

/// Required master list pages, in processing order.
pub fn master_list_pages(export: &WikiExport) -> Result<Vec<&WikiPage>> {
    let mut pages = Vec::with_capacity(MASTER_LIST_PAGES.len());
    for full_name in MASTER_LIST_PAGES {
        let Some(page) = export.page(&WikiName::parse(full_name)) else {
            bail!("missing spell index page {full_name}");
        };
        pages.push(page);
    }
    Ok(pages)
}

/// Parses every spell page reachable from the master lists, then runs the
/// description, class list and glossary passes.
pub fn read_spells(export: &WikiExport, lists: &ParserLists, log: &mut RunLog) -> Result<Vec<Spell>> {
    let masters = master_list_pages(export)?;

    let mut seen = BTreeSet::new();
    let candidates: Vec<&WikiPage> = masters
        .iter()
        .flat_map(|master| export.out_link_pages(master))
        .filter(|page| seen.insert(page.name.clone()))
        .filter(|page| !lists.spell_ignored_pages.contains(page.name.name()))
        .collect();

    let mut parser = SpellParser::new(lists);
    let mut spells: Vec<Spell> = candidates
        .into_iter()
        .filter_map(|page| parser.try_parse(page, log))
        .collect();

    description::apply_descriptions(&mut spells, &masters, lists, log);

    let (errors, warnings) = (log.error_count(), log.warning_count());
    log.information(format!(
        "Génération terminée. Nombre d'erreur : {errors}. Nombre d'avertissements : {warnings}"
    ));
    log.information(format!("Nombre de sorts lus : {}", spells.len()));
    parser.target_stats().flush(log);

    spell_list::apply_spell_lists(export, lists, &mut spells, log);

    match export.page_by_local_name(GLOSSARY_PAGE) {
        Some(page) => glossary::apply_glossary(page, &mut spells, log),
        None => log.error("Page de glossaire des sorts introuvable"),
    }

    Ok(spells)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::{SpellParser, read_spells};
    use crate::lists::ParserLists;
    use crate::log::{LogLevel, RunLog};
    use crate::model::{
        ComponentKinds, MagicSchool, RangeUnit, SpellLevel, TimeUnit, list_ids, source_ids,
    };
    use crate::references;
    use crate::wiki::tests::page;
    use crate::wiki::{WikiExport, WikiName};

    pub(crate) const PRIERE_RAW: &str = "'''École''' [[Évocation]]<br/>'''Niveau''' [[prêtre|Prê]] 2<br/>'''Temps d'incantation''' 1 action simple<br/>'''Composantes''' [[COMPOSANTES|V, G]]<br/>'''Portée''' contact<br/>'''Cible''' créature touchée<br/>'''Jet de sauvegarde''' Volonté, annule (inoffensif) ; '''Résistance à la magie''' oui (inoffensif)<br/>";

    #[test]
    fn parses_complete_spell_page() {
        let lists = ParserLists::embedded().expect("lists");
        let mut parser = SpellParser::new(&lists);
        let mut log = RunLog::new();

        let spell = parser
            .parse(&page("Pathfinder-RPG.Prière ardente", PRIERE_RAW), &mut log)
            .expect("spell");

        assert_eq!(spell.id, "priere-ardente");
        assert_eq!(spell.name, "Prière ardente");
        assert_eq!(spell.school, MagicSchool::Evocation);
        assert_eq!(spell.range.as_ref().map(|range| range.unit), Some(RangeUnit::Touch));
        let components = spell.components.as_ref().expect("components");
        assert_eq!(components.kinds, ComponentKinds::VERBAL | ComponentKinds::SOMATIC);
        let time = spell.casting_time.as_ref().expect("casting time");
        assert_eq!((time.value, time.unit), (1, TimeUnit::SimpleAction));
        assert_eq!(
            spell.levels,
            vec![
                SpellLevel {
                    list: list_ids::CLERIC.to_string(),
                    level: 2
                },
                SpellLevel {
                    list: list_ids::ORACLE.to_string(),
                    level: 2
                },
            ]
        );
        assert_eq!(spell.target.as_deref(), Some("créature touchée"));
        assert!(spell.saving_throw.as_ref().is_some_and(|save| save.harmless));
        assert!(spell.magic_resistance.as_ref().is_some_and(|mr| mr.harmless));
        assert_eq!(spell.source.id, source_ids::PATHFINDER_RPG);
        assert!(spell.reference(references::PATHFINDER_FR_WIKI).is_some());
        assert_eq!(
            spell.reference(references::BBE_DRP).map(|reference| reference.href.as_str()),
            Some("http://www.regles-pathfinder.fr/Priere-Ardente.html")
        );
        assert_eq!(parser.target_stats().count("Cible"), 1);
        assert!(log.entries().is_empty());
    }

    #[test]
    fn source_snippet_and_blog_spells() {
        let lists = ParserLists::embedded().expect("lists");
        let mut parser = SpellParser::new(&lists);
        let mut log = RunLog::new();

        let raw = format!("{{s:UM}}\n{PRIERE_RAW}");
        let spell = parser
            .parse(&page("Pathfinder-RPG.Prière ardente", &raw), &mut log)
            .expect("spell");
        assert_eq!(spell.source.id, source_ids::ULTIMATE_MAGIC);

        let spell = parser
            .parse(&page("Pathfinder-RPG.Choc", PRIERE_RAW), &mut log)
            .expect("spell");
        assert_eq!(spell.source.id, source_ids::PAIZO_BLOG);
        assert_eq!(spell.source.references.len(), 6);
    }

    #[test]
    fn try_parse_logs_failures_with_the_page_title() {
        let lists = ParserLists::embedded().expect("lists");
        let mut parser = SpellParser::new(&lists);
        let mut log = RunLog::new();

        assert!(parser
            .try_parse(&page("Pathfinder-RPG.Épée", "Une arme."), &mut log)
            .is_none());
        assert!(log.contains(LogLevel::Error, "Épée: École de magie introuvable"));

        let raw = PRIERE_RAW.replace("[[Évocation]]", "[[Chronomancie]]");
        assert!(parser
            .try_parse(&page("Pathfinder-RPG.Temps", &raw), &mut log)
            .is_none());
        assert!(log.contains(LogLevel::Error, "Temps: École Chronomancie non reconnue"));
    }

    #[test]
    fn read_spells_runs_every_pass() {
        let mut export = WikiExport::new("Pathfinder-RPG");
        let mut master = page(
            "Pathfinder-RPG.liste des sorts",
            "* '''''[[Prière ardente]]''''' ([[Prê]]). Une prière qui brûle.",
        );
        master.out_links = vec![
            WikiName::parse("Pathfinder-RPG.Prière ardente"),
            WikiName::parse("Pathfinder-RPG.liste des sorts de prêtres"),
        ];
        export.insert(master);
        export.insert(page("Pathfinder-RPG.liste des sorts (suite)", ""));
        export.insert(page("Pathfinder-RPG.liste des sorts (fin)", ""));
        export.insert(page("Pathfinder-RPG.Prière ardente", PRIERE_RAW));
        export.insert(page(
            "Pathfinder-RPG.liste des sorts de prêtres",
            "=== Sorts de niveau 2 ===\n* '''''[[Prière ardente]]'''''",
        ));
        export.insert(page(
            "Pathfinder-RPG.Glossaire des sorts",
            "| class=\"gauche\" | Fervent Prayer\n| class=\"gauche\" | Prière ardente\n",
        ));

        let lists = ParserLists::embedded().expect("lists");
        let mut log = RunLog::new();
        let spells = read_spells(&export, &lists, &mut log).expect("spells");

        assert_eq!(spells.len(), 1);
        let spell = &spells[0];
        assert_eq!(spell.summary.as_deref(), Some("Une prière qui brûle."));
        assert_eq!(spell.english_name(), Some("Fervent Prayer"));
        assert_eq!(spell.level_for(list_ids::CLERIC), Some(2));
        assert!(log.contains(LogLevel::Information, "Nombre de sorts lus : 1"));
        assert!(log.contains(LogLevel::Information, " - 1 Cible"));
    }

    #[test]
    fn read_spells_requires_master_pages() {
        let export = WikiExport::new("Pathfinder-RPG");
        let lists = ParserLists::embedded().expect("lists");
        let mut log = RunLog::new();
        let error = read_spells(&export, &lists, &mut log).expect_err("missing index");
        assert!(error.to_string().contains("liste des sorts"));
    }
}
