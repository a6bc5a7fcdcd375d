//! Monster pages: `BD` stat blocks, their sources and the monster glossary.

pub mod glossary;

use std::collections::BTreeSet;
use std::fmt::Display;
use std::sync::LazyLock;

use anyhow::{Result, bail};
use regex::Regex;

use crate::error::{ParseError, ParseResult};
use crate::lists::ParserLists;
use crate::log::RunLog;
use crate::model::{
    CreatureClimate, CreatureEnvironment, CreatureType, ElementSource, Monster, source_ids,
};
use crate::references;
use crate::wiki::{WikiExport, WikiName, WikiPage};

pub const INDEX_PAGE: &str = "Pathfinder-RPG.Monstres";
pub const GLOSSARY_PAGE: &str = "Pathfinder-RPG.Glossaire des monstres";

static BLOCK_START_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?mi)^<div class="BD">[ \t\r]*$"#).expect("valid block start regex")
});

static BLOCK_END_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?mi)^</div>").expect("valid block end regex"));

static TITLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\{s:BDTitre\|(?<name>[^|}]+)\|?(?<cr>[^|}]*)\}").expect("valid title regex")
});

static PUCEM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\{s:pucem\|(?<type>[^|}]*)\|(?<environment>[^|}]*)\|(?<climate>[^|}]*)\}")
        .expect("valid pucem regex")
});

static MAGIC_ITEM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\{s:BDTexte\||\* )'''NLS''' \d+ ; '''Prix''' [\d ]+ p[poeac]\}?")
        .expect("valid magic item regex")
});

static SOURCE_LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?mi)^(\{s:BDTexte\||\* )''Source(?<plural>s)? : (?<value>[^}\r\n]+)\}?\r?$")
        .expect("valid source line regex")
});

static SOURCE_PAGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?<name>[^,]+)[,\s]+(p[\. ]{0,2}|pages? )(?<page>\d+)$")
        .expect("valid source page regex")
});

/// Reads the stat blocks of one page; a block without a source line reuses
/// the last sources read on the page.
struct MonsterPageParser<'a> {
    page: &'a WikiPage,
    sources: Option<Vec<ElementSource>>,
}

impl<'a> MonsterPageParser<'a> {
    fn new(page: &'a WikiPage) -> Self {
        Self { page, sources: None }
    }

    fn warning(&self, log: &mut RunLog, message: impl Display) {
        log.warning(format!(
            "Page \"{}\" (id {}): {message}",
            self.page.title,
            self.page.id()
        ));
    }

    fn parse_all(&mut self, log: &mut RunLog) -> ParseResult<Vec<Monster>> {
        let raw = self.page.raw.as_str();
        let mut monsters = Vec::new();
        let mut position = 0;

        while let Some(start) = BLOCK_START_RE.find_at(raw, position) {
            let end = BLOCK_END_RE
                .find_at(raw, start.start())
                .ok_or_else(|| ParseError::new("Impossible de détecter le bloc de fin du bloc BD"))?;
            let block = &raw[start.start()..end.start()];

            let monster = self.parse_block(block, log).map_err(|error| {
                error.context(format!("Impossible de décoder le bloc {}", monsters.len() + 1))
            })?;
            monsters.extend(monster);
            position = end.end();
        }

        Ok(monsters)
    }

    fn parse_block(&mut self, block: &str, log: &mut RunLog) -> ParseResult<Option<Monster>> {
        let sources = match self.block_sources(block, log) {
            Some(sources) => {
                self.sources = Some(sources.clone());
                sources
            }
            None => self.sources.clone().unwrap_or_default(),
        };

        let Some((name, cr)) = name_and_cr(block)? else {
            return Ok(None);
        };

        let mut monster = Monster {
            id: self.page.id(),
            name,
            cr,
            sources,
            ..Monster::default()
        };
        self.parse_pucem(block, &mut monster, log);

        Ok(Some(monster))
    }

    fn parse_pucem(&self, block: &str, monster: &mut Monster, log: &mut RunLog) {
        let Some(captures) = PUCEM_RE.captures(block) else {
            self.warning(log, "Impossible de détecter la balise pucem");
            return;
        };
        let value = |group: &str| captures.name(group).map_or("", |value| value.as_str());

        monster.creature_type = creature_type(value("type")).unwrap_or_else(|| {
            self.warning(log, format!("Valeur puce type inconnue : '{}'", value("type")));
            CreatureType::Other
        });
        monster.environment = creature_environment(value("environment")).unwrap_or_else(|| {
            self.warning(
                log,
                format!("Valeur puce environnement inconnue : '{}'", value("environment")),
            );
            CreatureEnvironment::Unknown
        });
        monster.climate = creature_climate(value("climate")).unwrap_or_else(|| {
            self.warning(log, format!("Valeur puce climat inconnue : '{}'", value("climate")));
            CreatureClimate::Other
        });
    }

    fn block_sources(&self, block: &str, log: &mut RunLog) -> Option<Vec<ElementSource>> {
        let captures = SOURCE_LINE_RE.captures(block)?;
        let value = captures.name("value").map_or("", |value| value.as_str());

        if captures.name("plural").is_none() {
            return self.parse_source(value, log).map(|source| vec![source]);
        }

        let separator = if value.contains(';') { ';' } else { ',' };
        Some(
            value
                .split(separator)
                .filter(|part| !part.trim().is_empty())
                .filter_map(|part| self.parse_source(part, log))
                .collect(),
        )
    }

    /// `Name, p. N` or a bare book name.
    fn parse_source(&self, value: &str, log: &mut RunLog) -> Option<ElementSource> {
        let value = value.replace("''", "");
        let value = value.trim();
        if value.is_empty() {
            return None;
        }

        if let Some(captures) = SOURCE_PAGE_RE.captures(value) {
            let name = captures.name("name").map_or("", |name| name.as_str().trim());
            let Some(id) = source_id(name) else {
                self.warning(log, format!("Source inconnue : {name}"));
                return None;
            };
            let mut source = ElementSource::new(id);
            let page = captures
                .name("page")
                .and_then(|page| page.as_str().parse::<u32>().ok());
            if let Some(reference) = page.and_then(|page| references::from_book_page(id, page)) {
                source.references.push(reference);
            }
            return Some(source);
        }

        match source_id(value) {
            Some(id) => Some(ElementSource::new(id)),
            None => {
                self.warning(log, format!("Impossible de lire la source \"{value}\""));
                None
            }
        }
    }
}

fn source_id(name: &str) -> Option<&'static str> {
    match name.trim().to_lowercase().as_str() {
        "bestiaire" => Some(source_ids::BESTIARY),
        "bestiaire 2" => Some(source_ids::BESTIARY_2),
        "bestiaire 3" => Some(source_ids::BESTIARY_3),
        "art de la magie" => Some(source_ids::ULTIMATE_MAGIC),
        _ => None,
    }
}

/// Name and challenge rating of the `BDTitre` snippet; `None` when the block
/// is not a creature (magic item, missing name or rating).
fn name_and_cr(block: &str) -> ParseResult<Option<(String, f64)>> {
    let Some(captures) = TITLE_RE.captures(block) else {
        if MAGIC_ITEM_RE.is_match(block) {
            return Ok(None);
        }
        return Err(ParseError::new("Impossible de détecter la balise titre"));
    };

    let name = captures.name("name").map_or("", |name| name.as_str());
    let name = match name.find('(') {
        Some(index) => name[..index].trim(),
        None => name.trim(),
    };
    if name.is_empty() {
        return Ok(None);
    }

    let cr_text = captures.name("cr").map_or("", |cr| cr.as_str().trim());
    let Some(rating) = cr_text
        .get(..2)
        .filter(|prefix| prefix.eq_ignore_ascii_case("fp"))
        .map(|_| cr_text[2..].trim())
    else {
        return Ok(None);
    };

    Ok(Some((name.to_string(), challenge_rating(rating)?)))
}

fn challenge_rating(text: &str) -> ParseResult<f64> {
    let value = match text {
        "1/2" => "0.5",
        "1/4" => "0.25",
        "1/3" => "0.33",
        "1/8" => "0.125",
        "1/6" => "0.16",
        other => other,
    };
    let is_decimal = !value.is_empty() && value.chars().all(|ch| ch.is_ascii_digit() || ch == '.');
    is_decimal
        .then(|| value.parse::<f64>().ok())
        .flatten()
        .ok_or_else(|| ParseError::new(format!("Impossible de lire le FP {value}")))
}

fn creature_type(value: &str) -> Option<CreatureType> {
    let creature_type = match value.to_lowercase().as_str() {
        "aberration" => CreatureType::Aberration,
        "animal" => CreatureType::Animal,
        "créature artificielle" => CreatureType::Construct,
        "créature magique" => CreatureType::MagicalBeast,
        "dragon" => CreatureType::Dragon,
        "extérieur" => CreatureType::Outsider,
        "fée" => CreatureType::Fey,
        "humanoïde" => CreatureType::Humanoid,
        "humanoïde monstrueux" => CreatureType::MonstrousHumanoid,
        "mort-vivant" => CreatureType::Undead,
        "plante" => CreatureType::Plant,
        "vase" => CreatureType::Ooze,
        "vermine" => CreatureType::Vermin,
        "" => CreatureType::Other,
        _ => return None,
    };
    Some(creature_type)
}

fn creature_environment(value: &str) -> Option<CreatureEnvironment> {
    let environment = match value.to_lowercase().as_str() {
        "aquatique" => CreatureEnvironment::Aquatic,
        "ciel" => CreatureEnvironment::Sky,
        "collines" => CreatureEnvironment::Hills,
        "désert" => CreatureEnvironment::Desert,
        "forêt-jungle" => CreatureEnvironment::ForestJungle,
        "marais" => CreatureEnvironment::Swamp,
        "montagnes" => CreatureEnvironment::Mountains,
        "plaines" => CreatureEnvironment::Plains,
        "ruines-donjons" => CreatureEnvironment::RuinsDungeons,
        "souterrain" => CreatureEnvironment::Underground,
        "ville" => CreatureEnvironment::Urban,
        "" => CreatureEnvironment::Unknown,
        _ => return None,
    };
    Some(environment)
}

fn creature_climate(value: &str) -> Option<CreatureClimate> {
    let climate = match value.to_lowercase().as_str() {
        "extraplanaire" => CreatureClimate::Planar,
        "froid" => CreatureClimate::Cold,
        "tempéré" => CreatureClimate::Temperate,
        "tropical" => CreatureClimate::Warm,
        "" => CreatureClimate::Other,
        _ => return None,
    };
    Some(climate)
}

/// Every creature of one page, after following its redirections.
pub fn parse_page(export: &WikiExport, page: &WikiPage, log: &mut RunLog) -> ParseResult<Vec<Monster>> {
    let page = export.resolve_redirections(page)?;
    let monsters = MonsterPageParser::new(page).parse_all(log)?;
    if monsters.is_empty() {
        return Err(ParseError::new("Aucun bloc BD détecté"));
    }
    Ok(monsters)
}

fn index_page<'a>(export: &'a WikiExport, full_name: &str) -> Result<&'a WikiPage> {
    match export.page(&WikiName::parse(full_name)) {
        Some(page) => Ok(page),
        None => bail!("missing monster index page {full_name}"),
    }
}

/// Parses the pages linked from the monster index and glossary, then
/// attaches the glossary English names.
pub fn read_monsters(
    export: &WikiExport,
    lists: &ParserLists,
    log: &mut RunLog,
) -> Result<Vec<Monster>> {
    let index = index_page(export, INDEX_PAGE)?;
    let glossary_page = index_page(export, GLOSSARY_PAGE)?;

    let is_candidate = |page: &&WikiPage| {
        let name = page.name.name();
        !lists.monster_ignored_pages.contains(name) && !name.to_lowercase().ends_with("archétype")
    };

    let mut seen = BTreeSet::new();
    let mut candidates: Vec<&WikiPage> = export
        .out_link_pages(index)
        .into_iter()
        .filter(is_candidate)
        .filter(|page| seen.insert(page.name.clone()))
        .collect();
    log.information(format!("{} pages chargées depuis l'index", candidates.len()));

    let glossary_candidates: Vec<&WikiPage> = export
        .out_link_pages(glossary_page)
        .into_iter()
        .filter(is_candidate)
        .collect();
    log.information(format!(
        "{} pages chargées depuis le glossaire",
        glossary_candidates.len()
    ));

    let indexed = candidates.len();
    candidates.extend(
        glossary_candidates
            .into_iter()
            .filter(|page| seen.insert(page.name.clone())),
    );
    log.information(format!(
        "{} monstres ajoutés depuis le glossaire",
        candidates.len() - indexed
    ));

    let mut monsters = Vec::with_capacity(candidates.len());
    for page in candidates {
        match parse_page(export, page, log) {
            Ok(found) => monsters.extend(found),
            Err(ParseError::RedirectLoop) => {
                bail!("redirect loop while resolving monster page {}", page.full_name)
            }
            Err(error) => log.error(format!(
                "Page \"{}\" (id '{}') : {error}",
                page.title,
                page.id()
            )),
        }
    }
    log.information(format!("Nombre total de monstres lus : {}", monsters.len()));

    log.information("Chargement du glossaire des monstres...");
    glossary::apply_glossary(glossary_page, &mut monsters, log);

    Ok(monsters)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::{parse_page, read_monsters};
    use crate::lists::ParserLists;
    use crate::log::{LogLevel, RunLog};
    use crate::model::{
        CreatureClimate, CreatureEnvironment, CreatureType, ENGLISH, source_ids,
    };
    use crate::wiki::tests::page;
    use crate::wiki::{WikiExport, WikiName};

    pub(crate) const GOBELIN_RAW: &str = "Intro\n<div class=\"BD\">\n{s:BDTitre|Gobelin|FP 1/3}\n{s:BDTexte|''Source : Bestiaire, p. 156''}\n{s:pucem|Humanoïde|Collines|Tempéré}\n</div>\nSuite";

    const LOUPS_RAW: &str = "<div class=\"BD\">\r\n{s:BDTitre|Loup (jeune)|FP 1}\r\n* ''Source : Bestiaire 2''\r\n{s:pucem|Animal|Forêt-jungle|Froid}\r\n</div>\r\n<div class=\"BD\">\r\n{s:BDTitre|Loup sanguinaire|FP 3}\r\n{s:pucem|Animal|Inconnu|Froid}\r\n</div>\r\n";

    #[test]
    fn parses_title_rating_and_pucem() {
        let export = WikiExport::new("Pathfinder-RPG");
        let mut log = RunLog::new();
        let monsters = parse_page(&export, &page("Pathfinder-RPG.Gobelin", GOBELIN_RAW), &mut log)
            .expect("monsters");

        assert_eq!(monsters.len(), 1);
        let gobelin = &monsters[0];
        assert_eq!(gobelin.id, "gobelin");
        assert_eq!(gobelin.name, "Gobelin");
        assert!((gobelin.cr - 0.33).abs() < 1e-9);
        assert_eq!(gobelin.creature_type, CreatureType::Humanoid);
        assert_eq!(gobelin.environment, CreatureEnvironment::Hills);
        assert_eq!(gobelin.climate, CreatureClimate::Temperate);
        assert_eq!(gobelin.primary_source(), source_ids::BESTIARY);
        assert_eq!(gobelin.sources[0].references[0].name, "Bestiaire p.156");
        assert!(log.entries().is_empty());
    }

    #[test]
    fn later_blocks_inherit_the_page_source() {
        let export = WikiExport::new("Pathfinder-RPG");
        let mut log = RunLog::new();
        let monsters = parse_page(&export, &page("Pathfinder-RPG.Loup", LOUPS_RAW), &mut log)
            .expect("monsters");

        assert_eq!(monsters.len(), 2);
        assert_eq!(monsters[0].name, "Loup");
        assert_eq!(monsters[0].cr, 1.0);
        assert_eq!(monsters[0].environment, CreatureEnvironment::ForestJungle);
        assert_eq!(monsters[1].name, "Loup sanguinaire");
        assert_eq!(monsters[1].primary_source(), source_ids::BESTIARY_2);
        assert_eq!(monsters[1].environment, CreatureEnvironment::Unknown);
        assert!(log.contains(
            LogLevel::Warning,
            "Page \"Loup\" (id loup): Valeur puce environnement inconnue : 'Inconnu'"
        ));
    }

    #[test]
    fn block_failures_abort_the_page() {
        let export = WikiExport::new("Pathfinder-RPG");
        let mut log = RunLog::new();
        let cases = [
            ("Pathfinder-RPG.Vide", "Aucun bloc", "Aucun bloc BD détecté"),
            (
                "Pathfinder-RPG.Sans titre",
                "<div class=\"BD\">\n{s:pucem|Animal||}\n</div>",
                "Impossible de décoder le bloc 1 : Impossible de détecter la balise titre",
            ),
            (
                "Pathfinder-RPG.FP",
                "<div class=\"BD\">\n{s:BDTitre|Bête|FP x}\n</div>",
                "Impossible de décoder le bloc 1 : Impossible de lire le FP x",
            ),
            (
                "Pathfinder-RPG.Ouvert",
                "<div class=\"BD\">\n{s:BDTitre|Bête|FP 2}\n",
                "Impossible de détecter le bloc de fin du bloc BD",
            ),
            (
                "Pathfinder-RPG.Objet",
                "<div class=\"BD\">\n{s:BDTexte|'''NLS''' 5 ; '''Prix''' 2 000 po}\n</div>",
                "Aucun bloc BD détecté",
            ),
        ];

        for (name, raw, message) in cases {
            let error = parse_page(&export, &page(name, raw), &mut log).expect_err(name);
            assert_eq!(error.to_string(), message);
        }
    }

    pub(crate) fn monster_export(glossary_raw: &str) -> WikiExport {
        let mut export = WikiExport::new("Pathfinder-RPG");

        let mut index = page("Pathfinder-RPG.Monstres", "index");
        index.out_links = vec![
            WikiName::parse("Pathfinder-RPG.Gobelin"),
            WikiName::parse("Pathfinder-RPG.Gobelin archétype"),
            WikiName::parse("Pathfinder-RPG.Monstres par FP"),
        ];
        export.insert(index);

        let mut glossary = page("Pathfinder-RPG.Glossaire des monstres", glossary_raw);
        glossary.out_links = vec![
            WikiName::parse("Pathfinder-RPG.Gobelin"),
            WikiName::parse("Pathfinder-RPG.Orque"),
        ];
        export.insert(glossary);

        export.insert(page("Pathfinder-RPG.Gobelin", GOBELIN_RAW));
        export.insert(page("Pathfinder-RPG.Gobelin archétype", GOBELIN_RAW));
        export.insert(page("Pathfinder-RPG.Monstres par FP", "liste"));
        export.insert(page("Pathfinder-RPG.Orque", ">>> Pathfinder-RPG.Orque (créature)"));
        export.insert(page(
            "Pathfinder-RPG.Orque (créature)",
            "<div class=\"BD\">\n{s:BDTitre|Guerrier orque|FP 1/2}\n{s:pucem|Humanoïde|Montagnes|Tempéré}\n</div>",
        ));
        export
    }

    pub(crate) const GLOSSARY_RAW: &str = "{| CLASS=\"tablo\"\n|+ Glossaire des monstres\n! Anglais !! Français !! Règles !! Livre !! FP\n|-\n| CLASS=\"gauche\" | Goblin\n| CLASS=\"gauche\" | [[Gobelin]]\n| path\n| Bestiaire / p.156\n| 0,3\n|-\n| Orc\n| [[Orque (créature)|Orque]]\n| 3e\n| Bestiary\n| 1\n|}";

    #[test]
    fn reads_indexes_redirects_and_glossary() {
        let export = monster_export(GLOSSARY_RAW);
        let lists = ParserLists::embedded().expect("lists");
        let mut log = RunLog::new();

        let monsters = read_monsters(&export, &lists, &mut log).expect("monsters");

        assert_eq!(monsters.len(), 2);
        assert_eq!(monsters[0].id, "gobelin");
        assert_eq!(monsters[0].english_name(), Some("Goblin"));
        assert_eq!(monsters[1].id, "orque-creature");
        assert_eq!(monsters[1].name, "Guerrier orque");
        assert_eq!(monsters[1].cr, 0.5);
        assert_eq!(monsters[1].localization.get(ENGLISH, "id"), Some("orc"));
        assert!(log.contains(LogLevel::Information, "1 pages chargées depuis l'index"));
        assert!(log.contains(LogLevel::Information, "2 pages chargées depuis le glossaire"));
        assert!(log.contains(LogLevel::Information, "1 monstres ajoutés depuis le glossaire"));
        assert_eq!(log.error_count(), 0);
    }

    #[test]
    fn missing_index_and_redirect_loops_are_fatal() {
        let lists = ParserLists::embedded().expect("lists");
        let mut log = RunLog::new();

        let error = read_monsters(&WikiExport::new("Pathfinder-RPG"), &lists, &mut log)
            .expect_err("missing index");
        assert!(error.to_string().contains("missing monster index page Pathfinder-RPG.Monstres"));

        let mut export = monster_export(GLOSSARY_RAW);
        export.insert(page("Pathfinder-RPG.Orque", ">>> Pathfinder-RPG.Orc"));
        export.insert(page("Pathfinder-RPG.Orc", ">>> Pathfinder-RPG.Orque"));
        let error = read_monsters(&export, &lists, &mut log).expect_err("loop");
        assert!(error.to_string().contains("redirect loop"));
    }
}
