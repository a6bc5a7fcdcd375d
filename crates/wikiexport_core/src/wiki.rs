//! In-memory page graph loaded from a wiki export directory.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::fs;
use std::hash::{Hash, Hasher};
use std::path::Path;

use anyhow::{Context, Result, bail};
use chrono::{DateTime, NaiveDateTime, Utc};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use walkdir::WalkDir;

use crate::error::{ParseError, ParseResult};
use crate::ids;
use crate::log::RunLog;

pub const DEFAULT_NAMESPACE: &str = "Pathfinder-RPG";
pub const MAX_REDIRECTS: usize = 10;
const REDIRECT_MARKER: &str = ">>> ";
const WIKI_URL_PREFIX: &str = "http://www.pathfinder-fr.org/Wiki/Pathfinder-RPG.";
const LAST_MODIFIED_FORMAT: &str = "%Y-%m-%d %H:%M:%SZ";

/// Qualified page name; comparisons ignore case.
#[derive(Debug, Clone)]
pub struct WikiName {
    namespace: String,
    name: String,
    key: (String, String),
}

impl WikiName {
    pub fn new(namespace: &str, name: &str) -> Self {
        Self {
            namespace: namespace.to_string(),
            name: name.to_string(),
            key: (namespace.to_lowercase(), name.to_lowercase()),
        }
    }

    /// Splits `Namespace.Name` on the first dot.
    pub fn parse(full_name: &str) -> Self {
        match full_name.split_once('.') {
            Some((namespace, name)) => Self::new(namespace, name),
            None => Self::new("", full_name),
        }
    }

    pub fn from_link(text: &str) -> Self {
        let target = text.split_once('|').map(|(name, _)| name).unwrap_or(text);
        Self::parse(target)
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn id(&self) -> String {
        ids::normalize(&self.name)
    }

    pub fn with_default_namespace(self, namespace: &str) -> Self {
        if self.namespace.is_empty() {
            Self::new(namespace, &self.name)
        } else {
            self
        }
    }
}

impl PartialEq for WikiName {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for WikiName {}

impl Hash for WikiName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl PartialOrd for WikiName {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for WikiName {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key.cmp(&other.key)
    }
}

impl fmt::Display for WikiName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace.is_empty() {
            f.write_str(&self.name)
        } else {
            write!(f, "{}.{}", self.namespace, self.name)
        }
    }
}

#[derive(Debug, Clone)]
pub struct WikiPage {
    pub name: WikiName,
    pub title: String,
    pub full_name: String,
    pub categories: Vec<WikiName>,
    pub last_modified: Option<DateTime<Utc>>,
    pub version: u32,
    pub in_links: Vec<WikiName>,
    pub out_links: Vec<WikiName>,
    pub raw: String,
    pub body: String,
}

impl WikiPage {
    pub fn id(&self) -> String {
        self.name.id()
    }

    pub fn url(&self) -> String {
        format!("{WIKI_URL_PREFIX}{}.ashx", self.name.name())
    }

    pub fn redirection(&self) -> Option<WikiName> {
        let target = self.raw.trim().strip_prefix(REDIRECT_MARKER)?;
        Some(WikiName::parse(target.trim()).with_default_namespace(self.name.namespace()))
    }

    pub fn in_category(&self, category: &str) -> bool {
        let category = category.to_lowercase();
        self.categories
            .iter()
            .any(|name| name.name().to_lowercase() == category)
    }
}

/// Strips the wiki url decoration, leaving the page name.
pub fn page_name_from_url(url: &str) -> &str {
    let name = url.strip_prefix(WIKI_URL_PREFIX).unwrap_or(url);
    name.strip_suffix(".ashx").unwrap_or(name)
}

#[derive(Debug, Default)]
pub struct WikiExport {
    pages: BTreeMap<WikiName, WikiPage>,
    categories: BTreeSet<WikiName>,
    links: HashMap<WikiName, BTreeSet<WikiName>>,
    default_namespace: String,
}

impl WikiExport {
    pub fn new(default_namespace: &str) -> Self {
        Self {
            default_namespace: default_namespace.to_string(),
            ..Self::default()
        }
    }

    /// Reads every `*.xml` page of every namespace folder under `dir`.
    pub fn load(dir: &Path, default_namespace: &str, log: &mut RunLog) -> Result<Self> {
        if !dir.is_dir() {
            bail!("export directory does not exist: {}", dir.display());
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(dir)
            .min_depth(2)
            .max_depth(2)
            .follow_links(false)
        {
            let entry = entry.with_context(|| format!("failed to walk {}", dir.display()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let is_xml = entry
                .path()
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("xml"));
            if is_xml {
                files.push(entry.into_path());
            }
        }
        files.sort();

        let mut export = Self::new(default_namespace);
        for path in files {
            let page = read_page_file(&path, log)
                .with_context(|| format!("failed to load wiki page {}", path.display()))?;
            export.insert(page);
        }
        Ok(export)
    }

    pub fn insert(&mut self, page: WikiPage) {
        for category in &page.categories {
            self.categories.insert(category.clone());
        }

        for source in &page.in_links {
            self.links
                .entry(source.clone())
                .or_default()
                .insert(page.name.clone());
        }
        let targets = self.links.entry(page.name.clone()).or_default();
        for target in &page.out_links {
            targets.insert(target.clone());
        }

        self.pages.insert(page.name.clone(), page);
    }

    pub fn default_namespace(&self) -> &str {
        &self.default_namespace
    }

    /// Name in the default namespace.
    pub fn qualify(&self, name: &str) -> WikiName {
        WikiName::new(&self.default_namespace, name)
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn pages(&self) -> impl Iterator<Item = &WikiPage> {
        self.pages.values()
    }

    pub fn categories(&self) -> impl Iterator<Item = &WikiName> {
        self.categories.iter()
    }

    pub fn page(&self, name: &WikiName) -> Option<&WikiPage> {
        self.pages.get(name)
    }

    pub fn page_by_local_name(&self, name: &str) -> Option<&WikiPage> {
        let lower = name.to_lowercase();
        self.pages
            .values()
            .find(|page| page.name.name().to_lowercase() == lower)
    }

    pub fn pages_in_category(&self, category: &str) -> Vec<&WikiPage> {
        self.pages
            .values()
            .filter(|page| page.in_category(category))
            .collect()
    }

    /// Existing out-link pages of `page`, deduplicated, in link order.
    pub fn out_link_pages(&self, page: &WikiPage) -> Vec<&WikiPage> {
        let mut seen = BTreeSet::new();
        page.out_links
            .iter()
            .filter_map(|name| self.pages.get(name))
            .filter(|target| seen.insert(target.name.clone()))
            .collect()
    }

    /// Direct lookup, then redirections and single-target link entries, bounded.
    pub fn find_page(&self, name: &WikiName) -> Option<&WikiPage> {
        let mut current = name.clone();
        for _ in 0..MAX_REDIRECTS {
            let next = match self.pages.get(&current) {
                Some(page) => match page.redirection() {
                    Some(target) => target,
                    None => return Some(page),
                },
                None => {
                    let targets = self.links.get(&current)?;
                    if targets.len() != 1 {
                        return None;
                    }
                    targets.iter().next()?.clone()
                }
            };
            if next == current {
                return None;
            }
            current = next;
        }
        None
    }

    /// Follows the `>>> ` redirections of an existing page, one hop at a time.
    pub fn resolve_redirections<'a>(&'a self, page: &'a WikiPage) -> ParseResult<&'a WikiPage> {
        let mut current = page;
        for _ in 0..=MAX_REDIRECTS {
            let Some(target) = current.redirection() else {
                return Ok(current);
            };
            current = self
                .page(&target)
                .or_else(|| self.find_page(&target))
                .ok_or_else(|| {
                    ParseError::new(format!("Redirection vers une page introuvable : {target}"))
                })?;
        }
        Err(ParseError::RedirectLoop)
    }
}

#[derive(Default)]
struct XmlPageFields {
    title: Option<String>,
    full_name: Option<String>,
    categories: Vec<String>,
    last_modified: Option<String>,
    version: u32,
    in_links: Vec<String>,
    out_links: Vec<String>,
    raw: String,
    body: String,
}

fn read_page_file(path: &Path, log: &mut RunLog) -> Result<WikiPage> {
    let content =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let fields = parse_page_xml(&content)?;

    let full_name = match fields.full_name {
        Some(full_name) if !full_name.trim().is_empty() => full_name.trim().to_string(),
        _ => bail!(
            "La page du fichier {} ne contient pas de nom complet",
            path.display()
        ),
    };

    let last_modified = match fields.last_modified.as_deref().map(str::trim) {
        Some(text) if !text.is_empty() => match NaiveDateTime::parse_from_str(text, LAST_MODIFIED_FORMAT) {
            Ok(value) => Some(value.and_utc()),
            Err(_) => {
                log.warning(format!("{full_name}: date de modification illisible \"{text}\""));
                None
            }
        },
        _ => {
            log.warning(format!("{full_name}: date de modification absente"));
            None
        }
    };

    let name = WikiName::parse(&full_name);
    let title = fields
        .title
        .filter(|title| !title.is_empty())
        .unwrap_or_else(|| name.name().to_string());

    Ok(WikiPage {
        title,
        categories: fields.categories.iter().map(|value| WikiName::parse(value)).collect(),
        last_modified,
        version: fields.version,
        in_links: fields.in_links.iter().map(|value| WikiName::parse(value)).collect(),
        out_links: fields.out_links.iter().map(|value| WikiName::parse(value)).collect(),
        raw: fields.raw,
        body: fields.body,
        name,
        full_name,
    })
}

fn parse_page_xml(content: &str) -> Result<XmlPageFields> {
    let mut reader = Reader::from_str(content);
    let mut fields = XmlPageFields::default();
    let mut stack: Vec<String> = Vec::new();
    let mut text = String::new();

    loop {
        match reader.read_event().context("malformed page xml")? {
            Event::Start(element) => {
                let name = element_name(&element);
                if name == "wikiPage" {
                    fields.version = read_version(&element)?;
                }
                stack.push(name);
                text.clear();
            }
            Event::Empty(element) => {
                if element_name(&element) == "wikiPage" {
                    fields.version = read_version(&element)?;
                }
            }
            Event::Text(value) => {
                text.push_str(&value.unescape().context("invalid text in page xml")?);
            }
            Event::CData(value) => {
                text.push_str(&String::from_utf8_lossy(&value.into_inner()));
            }
            Event::End(_) => {
                let Some(name) = stack.pop() else {
                    bail!("unbalanced page xml");
                };
                let parent = stack.last().map(String::as_str).unwrap_or("");
                let value = std::mem::take(&mut text);
                match (parent, name.as_str()) {
                    ("wikiPage", "title") => fields.title = Some(value.trim().to_string()),
                    ("wikiPage", "fullName") => fields.full_name = Some(value),
                    ("wikiPage", "lastModified") => fields.last_modified = Some(value),
                    ("wikiPage", "raw") => fields.raw = value,
                    ("wikiPage", "body") => fields.body = value,
                    ("categories", "category") => fields.categories.push(value.trim().to_string()),
                    ("inLinks", "link") => fields.in_links.push(value.trim().to_string()),
                    ("outLinks", "link") => fields.out_links.push(value.trim().to_string()),
                    _ => {}
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(fields)
}

fn element_name(element: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(element.name().as_ref()).into_owned()
}

fn read_version(element: &BytesStart<'_>) -> Result<u32> {
    let Some(attribute) = element
        .try_get_attribute("version")
        .context("invalid wikiPage attributes")?
    else {
        return Ok(0);
    };
    let value = attribute
        .unescape_value()
        .context("invalid wikiPage version")?;
    value
        .trim()
        .parse::<u32>()
        .with_context(|| format!("invalid wikiPage version {value}"))
}

#[cfg(test)]
pub(crate) mod tests {
    use std::fs;
    use std::path::Path;

    use super::{WikiExport, WikiName, WikiPage, page_name_from_url};
    use crate::error::ParseError;
    use crate::log::RunLog;

    pub(crate) fn page(full_name: &str, raw: &str) -> WikiPage {
        let name = WikiName::parse(full_name);
        WikiPage {
            title: name.name().to_string(),
            full_name: full_name.to_string(),
            categories: Vec::new(),
            last_modified: None,
            version: 1,
            in_links: Vec::new(),
            out_links: Vec::new(),
            raw: raw.to_string(),
            body: String::new(),
            name,
        }
    }

    pub(crate) fn write_file(path: &Path, content: &str) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent");
        }
        fs::write(path, content).expect("write file");
    }

    pub(crate) fn page_xml(full_name: &str, categories: &[&str], out_links: &[&str], raw: &str) -> String {
        let categories = categories
            .iter()
            .map(|value| format!("<category>{value}</category>"))
            .collect::<String>();
        let links = out_links
            .iter()
            .map(|value| format!("<link>{value}</link>"))
            .collect::<String>();
        format!(
            r#"<?xml version="1.0" encoding="utf-8"?>
<wikiPage version="3">
  <title>{title}</title>
  <fullName>{full_name}</fullName>
  <categories>{categories}</categories>
  <lastModified>2013-02-11 18:04:10Z</lastModified>
  <inLinks />
  <outLinks>{links}</outLinks>
  <body>&lt;b&gt;x&lt;/b&gt;&lt;br /&gt;y</body>
  <raw>{raw}</raw>
</wikiPage>"#,
            title = full_name.split_once('.').map(|(_, name)| name).unwrap_or(full_name),
        )
    }

    #[test]
    fn load_reads_pages_links_and_categories() {
        let temp = tempfile::tempdir().expect("tempdir");
        write_file(
            &temp.path().join("Pathfinder-RPG/Boule de feu.xml"),
            &page_xml(
                "Pathfinder-RPG.Boule de feu",
                &["Sort"],
                &["Pathfinder-RPG.Évocation"],
                "'''École''' [[évocation]] [[registre|feu]]",
            ),
        );
        write_file(
            &temp.path().join("Pathfinder-RPG/Evocation.XML"),
            &page_xml("Pathfinder-RPG.Évocation", &[], &[], "texte"),
        );
        write_file(&temp.path().join("Pathfinder-RPG/notes.txt"), "ignored");

        let mut log = RunLog::new();
        let export =
            WikiExport::load(temp.path(), "Pathfinder-RPG", &mut log).expect("load export");

        assert_eq!(export.len(), 2);
        let page = export
            .page(&WikiName::parse("pathfinder-rpg.BOULE DE FEU"))
            .expect("case-insensitive lookup");
        assert_eq!(page.version, 3);
        assert_eq!(page.id(), "boule-de-feu");
        assert!(page.in_category("sort"));
        assert_eq!(page.body, "<b>x</b><br />y");
        assert!(page.last_modified.is_some());
        assert_eq!(
            page.url(),
            "http://www.pathfinder-fr.org/Wiki/Pathfinder-RPG.Boule de feu.ashx"
        );
        assert_eq!(export.pages_in_category("Sort").len(), 1);
        assert_eq!(export.out_link_pages(page).len(), 1);
        assert_eq!(log.warning_count(), 0);
    }

    #[test]
    fn load_rejects_page_without_full_name() {
        let temp = tempfile::tempdir().expect("tempdir");
        write_file(
            &temp.path().join("ns/broken.xml"),
            "<wikiPage version=\"1\"><title>x</title><raw>y</raw></wikiPage>",
        );

        let mut log = RunLog::new();
        let error = WikiExport::load(temp.path(), "Pathfinder-RPG", &mut log)
            .expect_err("missing full name");
        assert!(format!("{error:#}").contains("ne contient pas de nom complet"));
    }

    #[test]
    fn find_page_follows_redirects_and_single_links() {
        let mut export = WikiExport::new("Pathfinder-RPG");
        export.insert(page("Pathfinder-RPG.Alias", ">>> Pathfinder-RPG.Cible"));
        let mut linked = page("Pathfinder-RPG.Cible", "contenu");
        linked.in_links.push(WikiName::parse("Pathfinder-RPG.Ancien nom"));
        export.insert(linked);

        let found = export
            .find_page(&WikiName::parse("Pathfinder-RPG.Alias"))
            .expect("redirect");
        assert_eq!(found.name.name(), "Cible");
        let found = export
            .find_page(&WikiName::parse("Pathfinder-RPG.ancien nom"))
            .expect("single link");
        assert_eq!(found.name.name(), "Cible");
        assert!(export.find_page(&WikiName::parse("Pathfinder-RPG.Inconnue")).is_none());
    }

    #[test]
    fn find_page_gives_up_on_redirect_loops() {
        let mut export = WikiExport::new("Pathfinder-RPG");
        export.insert(page("Pathfinder-RPG.A", ">>> Pathfinder-RPG.B"));
        export.insert(page("Pathfinder-RPG.B", ">>> Pathfinder-RPG.A"));
        export.insert(page("Pathfinder-RPG.C", ">>> Pathfinder-RPG.C"));

        assert!(export.find_page(&WikiName::parse("Pathfinder-RPG.A")).is_none());
        assert!(export.find_page(&WikiName::parse("Pathfinder-RPG.C")).is_none());
        let looping = export
            .page(&WikiName::parse("Pathfinder-RPG.A"))
            .expect("page");
        assert_eq!(
            export.resolve_redirections(looping).expect_err("loop"),
            ParseError::RedirectLoop
        );
    }

    #[test]
    fn find_page_ignores_ambiguous_link_entries() {
        let mut export = WikiExport::new("Pathfinder-RPG");
        let mut first = page("Pathfinder-RPG.Un", "x");
        first.in_links.push(WikiName::parse("Pathfinder-RPG.Carrefour"));
        let mut second = page("Pathfinder-RPG.Deux", "x");
        second.in_links.push(WikiName::parse("Pathfinder-RPG.Carrefour"));
        export.insert(first);
        export.insert(second);

        assert!(export.find_page(&WikiName::parse("Pathfinder-RPG.Carrefour")).is_none());
    }

    #[test]
    fn page_name_from_url_strips_wiki_decoration() {
        assert_eq!(
            page_name_from_url("http://www.pathfinder-fr.org/Wiki/Pathfinder-RPG.Boule de feu.ashx"),
            "Boule de feu"
        );
    }
}
