//! Feat pages: source, description, categories, prerequisites and benefit.

pub mod prerequisite;

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{ParseError, ParseResult};
use crate::lists::ParserLists;
use crate::log::RunLog;
use crate::markup::{detect_source_snippet, remove_markup};
use crate::model::{ElementSource, Feat, FeatType, source_ids};
use crate::references;
use crate::wiki::{WikiExport, WikiPage};

use prerequisite::PrerequisiteParser;

pub const FEAT_CATEGORY: &str = "Don";

static CATEGORY_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"'''Catégorie[\.]?''' (: )?").expect("valid feat category regex"));

const CONDITION_LABELS: [&str; 2] = ["'''conditions.'''", "'''condition.'''"];
const BENEFIT_LABELS: [&str; 2] = ["'''avantage.'''", "'''avantages.'''"];

pub struct FeatParser<'a> {
    export: &'a WikiExport,
    lists: &'a ParserLists,
}

impl<'a> FeatParser<'a> {
    pub fn new(export: &'a WikiExport, lists: &'a ParserLists) -> Self {
        Self { export, lists }
    }

    pub fn parse(&self, page: &WikiPage, log: &mut RunLog) -> ParseResult<Feat> {
        let lines: Vec<&str> = page.raw.trim().split('\n').map(str::trim).collect();
        if lines.iter().all(|line| line.is_empty()) {
            return Err(ParseError::new("Aucune ligne de texte détectées"));
        }

        let mut feat = Feat {
            id: page.id(),
            name: page.title.clone(),
            source: ElementSource::new(feat_source(page, lines[0])),
            ..Feat::default()
        };
        feat.source.references.push(references::from_wiki(&page.url()));

        feat.description = description(&lines)?;
        feat.types = feat_types(&lines)?;

        if let Some(conditions) = condition_markup(&lines) {
            let parser = PrerequisiteParser::new(self.export, self.lists, page);
            feat.prerequisites = parser.parse_line(conditions, log);
        }

        feat.benefit = paragraph(&lines, &BENEFIT_LABELS);
        if feat.benefit.is_none() {
            log.warning(format!("{}: Avantage introuvable", page.title));
        }

        Ok(feat)
    }

    pub fn try_parse(&self, page: &WikiPage, log: &mut RunLog) -> Option<Feat> {
        match self.parse(page, log) {
            Ok(feat) => Some(feat),
            Err(error) => {
                log.error(format!("{}: {error}", page.title));
                None
            }
        }
    }
}

fn feat_source(page: &WikiPage, first_line: &str) -> &'static str {
    if let Some(source) = detect_source_snippet(first_line) {
        return source;
    }
    let in_category = |name: &str| page.categories.iter().any(|category| category.name() == name);
    if in_category("Bestiaire") {
        source_ids::BESTIARY
    } else if in_category("Bestiaire 2") {
        source_ids::BESTIARY_2
    } else {
        source_ids::PATHFINDER_RPG
    }
}

/// First non-empty line once leading `{...}` snippets are removed; it must be italic.
fn description(lines: &[&str]) -> ParseResult<String> {
    let line = lines
        .iter()
        .map(|line| strip_leading_snippet(line))
        .find(|line| !line.is_empty())
        .ok_or_else(|| ParseError::new("Aucune ligne de texte détectées"))?;

    match line.strip_prefix("''").and_then(|line| line.strip_suffix("''")) {
        Some(inner) => Ok(inner.to_string()),
        None => Err(ParseError::new("La première ligne n'est pas en italique")),
    }
}

fn strip_leading_snippet(line: &str) -> &str {
    if !line.starts_with('{') {
        return line;
    }
    if line.ends_with('}') {
        return "";
    }
    match line.find('}') {
        Some(end) => line[end + 1..].trim(),
        None => line,
    }
}

/// Text after the second `'''` of a labelled line.
fn after_label(line: &str) -> Option<&str> {
    let first = line.find("'''")?;
    let second = first + 3 + line[first + 3..].find("'''")?;
    Some(line[second + 3..].trim())
}

fn feat_types(lines: &[&str]) -> ParseResult<Vec<FeatType>> {
    let Some(line) = lines.iter().find(|line| CATEGORY_LINE_RE.is_match(line)) else {
        return Ok(vec![FeatType::General]);
    };
    let markup = after_label(line).unwrap_or_default();
    let markup = markup.strip_prefix(':').map(str::trim).unwrap_or(markup);

    markup
        .split(',')
        .map(|category| feat_type(&category.trim().to_lowercase()))
        .collect()
}

fn feat_type(category: &str) -> ParseResult<FeatType> {
    let feat_type = match category {
        "[[dons#audace|audace]]" | "[[dons#donaudace|audace]]" => FeatType::Grit,
        "[[dons#doncombat|combat]]" | "[[dons#combat|combat]]" => FeatType::Combat,
        "[[dons#ecole|école]]" | "[[dons#donecole|école]]" => FeatType::Style,
        "[[dons#equipe|équipe]]" | "[[dons#donequipe|équipe]]" => FeatType::Teamwork,
        "[[dons#metamagie|métamagie]]" | "[[dons#donmetamagie|métamagie]]" => FeatType::Metamagic,
        "[[dons#doncreation|création d'objets]]"
        | "[[dons#creation|création d'objets]]"
        | "[[dons#creation|création]]"
        | "[[dons#creation|création d’objets]]" => FeatType::ItemCreation,
        "[[dons#doncritique|critique]]" => FeatType::Critical,
        "monstre" => FeatType::Monster,
        "[[dons#donspectacle|spectacle]]" => FeatType::Performance,
        _ => {
            return Err(ParseError::new(format!(
                "Type de don \"{category}\" non reconnu"
            )));
        }
    };
    Ok(feat_type)
}

fn starts_with_label(line: &str, labels: &[&str]) -> bool {
    let lower = line.to_lowercase();
    labels.iter().any(|label| lower.starts_with(label))
}

fn condition_markup<'l>(lines: &[&'l str]) -> Option<&'l str> {
    let line = lines
        .iter()
        .find(|line| starts_with_label(line, &CONDITION_LABELS))?;
    let markup = after_label(line)?;
    Some(markup.strip_prefix('.').map(str::trim).unwrap_or(markup))
}

/// Paragraph from a labelled line up to the next line opening with `'''`.
fn paragraph(lines: &[&str], labels: &[&str]) -> Option<String> {
    let first = lines.iter().position(|line| starts_with_label(line, labels))?;
    let end = lines[first + 1..]
        .iter()
        .position(|line| line.starts_with("'''"))
        .map(|offset| first + 1 + offset)
        .unwrap_or(lines.len());

    let markup = lines[first..end]
        .iter()
        .filter(|line| !line.trim().is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join("\n");
    let text = after_label(&markup).unwrap_or_default();
    Some(remove_markup(text))
}

/// Parses every page of the feat category that is not ignored.
pub fn read_feats(export: &WikiExport, lists: &ParserLists, log: &mut RunLog) -> Vec<Feat> {
    let pages: Vec<&WikiPage> = export
        .pages_in_category(FEAT_CATEGORY)
        .into_iter()
        .filter(|page| !lists.feat_ignored_pages.contains(&page.title))
        .collect();
    log.information(format!("Nombre de dons détectés : {}", pages.len()));

    let parser = FeatParser::new(export, lists);
    pages
        .into_iter()
        .filter_map(|page| parser.try_parse(page, log))
        .collect()
}
