use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use super::{DataSetView, DataSetWriter, WriterOptions, dataset_folder, parts};
use crate::dataset::DataSet;
use crate::model::{
    ElementSource, Feat, FeatPrerequisite, Localization, Monster, PrerequisiteItem, Spell,
};

/// `<out>/<name>/{header,spells,feats,monsters}.xml`.
pub struct XmlWriter;

impl DataSetWriter for XmlWriter {
    fn format(&self) -> &'static str {
        "xml"
    }

    fn accept(&self, _options: &WriterOptions) -> bool {
        true
    }

    fn write(&self, name: &str, data_set: &DataSet, directory: &Path) -> Result<Vec<PathBuf>> {
        let folder = dataset_folder(directory, name)?;
        let mut written = Vec::new();
        for (stem, view) in parts(data_set) {
            let path = folder.join(format!("{stem}.xml"));
            write_file(&path, &view)?;
            written.push(path);
        }
        Ok(written)
    }
}

/// The whole dataset in `<out>/<name>.xml`.
pub struct XmlSingleWriter;

impl DataSetWriter for XmlSingleWriter {
    fn format(&self) -> &'static str {
        "xml-single"
    }

    fn accept(&self, options: &WriterOptions) -> bool {
        options.single_file
    }

    fn write(&self, name: &str, data_set: &DataSet, directory: &Path) -> Result<Vec<PathBuf>> {
        let path = directory.join(format!("{name}.xml"));
        write_file(&path, &DataSetView::full(data_set))?;
        Ok(vec![path])
    }
}

fn write_file(path: &Path, view: &DataSetView<'_>) -> Result<()> {
    let file = File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    write_data_set(&mut writer, view).with_context(|| format!("failed to write {}", path.display()))?;
    writer
        .flush()
        .with_context(|| format!("failed to write {}", path.display()))
}

/// Serializes a dataset view as an indented XML document.
pub fn write_data_set<W: Write>(inner: W, view: &DataSetView<'_>) -> Result<()> {
    let mut xml = XmlDocument::new(inner);
    xml.declaration()?;

    let lang: Vec<(&str, &str)> = view.lang.map(|lang| ("lang", lang)).into_iter().collect();
    xml.start("dataSet", &lang)?;

    if let Some(header) = view.header {
        xml.start("header", &[("name", header.name.as_str())])?;
        if let Some(description) = header.description.as_deref() {
            xml.text_element("description", &[], description)?;
        }
        xml.end("header")?;
    }

    xml.start("sources", &[])?;
    for source in view.sources {
        xml.empty("source", &[("id", source.id.as_str())])?;
    }
    xml.end("sources")?;

    if !view.spells.is_empty() {
        xml.start("spells", &[])?;
        for spell in view.spells {
            write_spell(&mut xml, spell)?;
        }
        xml.end("spells")?;
    }
    if !view.feats.is_empty() {
        xml.start("feats", &[])?;
        for feat in view.feats {
            write_feat(&mut xml, feat)?;
        }
        xml.end("feats")?;
    }
    if !view.monsters.is_empty() {
        xml.start("monsters", &[])?;
        for monster in view.monsters {
            write_monster(&mut xml, monster)?;
        }
        xml.end("monsters")?;
    }

    xml.end("dataSet")?;
    xml.finish()
}

fn write_spell<W: Write>(xml: &mut XmlDocument<W>, spell: &Spell) -> Result<()> {
    xml.start("spell", &[("id", spell.id.as_str()), ("name", spell.name.as_str())])?;
    write_source(xml, &spell.source)?;
    write_localization(xml, &spell.localization)?;

    let mut school = vec![("name", spell.school.as_str())];
    if let Some(sub_school) = spell.sub_school.as_deref() {
        school.push(("subSchool", sub_school));
    }
    xml.empty("school", &school)?;

    if !spell.descriptor.is_empty() {
        xml.text_element("descriptor", &[], &spell.descriptor.labels().join(" "))?;
    }

    if !spell.levels.is_empty() {
        xml.start("levels", &[])?;
        for level in &spell.levels {
            let value = level.level.to_string();
            xml.empty("level", &[("list", level.list.as_str()), ("level", value.as_str())])?;
        }
        xml.end("levels")?;
    }

    if let Some(casting_time) = &spell.casting_time {
        let value = casting_time.value.to_string();
        let mut attributes = vec![("value", value.as_str()), ("unit", casting_time.unit.as_str())];
        if let Some(text) = casting_time.text.as_deref() {
            attributes.push(("text", text));
        }
        xml.empty("castingTime", &attributes)?;
    }

    if let Some(range) = &spell.range {
        let mut attributes = vec![("unit", range.unit.as_str())];
        if let Some(value) = range.specific_value.as_deref() {
            attributes.push(("value", value));
        }
        xml.empty("range", &attributes)?;
    }

    if let Some(components) = &spell.components {
        let kinds = components.kinds.labels().join(" ");
        let mut attributes = vec![("kinds", kinds.as_str())];
        if let Some(description) = components.description.as_deref() {
            attributes.push(("description", description));
        }
        xml.empty("components", &attributes)?;
    }

    if let Some(target) = spell.target.as_deref() {
        xml.text_element("target", &[], target)?;
    }

    if let Some(saving_throw) = &spell.saving_throw {
        let mut attributes = vec![
            ("target", saving_throw.target.as_str()),
            ("effect", saving_throw.effect.as_str()),
        ];
        push_flag(&mut attributes, "harmless", saving_throw.harmless);
        push_flag(&mut attributes, "objects", saving_throw.objects);
        if let Some(value) = saving_throw.specific_value.as_deref() {
            attributes.push(("value", value));
        }
        xml.empty("savingThrow", &attributes)?;
    }

    if let Some(resistance) = &spell.magic_resistance {
        let mut attributes = vec![("resistance", resistance.resistance.as_str())];
        push_flag(&mut attributes, "harmless", resistance.harmless);
        push_flag(&mut attributes, "objects", resistance.objects);
        if let Some(text) = resistance.text.as_deref() {
            attributes.push(("text", text));
        }
        xml.empty("magicResistance", &attributes)?;
    }

    if let Some(summary) = spell.summary.as_deref() {
        xml.text_element("summary", &[], summary)?;
    }

    xml.end("spell")
}

fn write_feat<W: Write>(xml: &mut XmlDocument<W>, feat: &Feat) -> Result<()> {
    xml.start("feat", &[("id", feat.id.as_str()), ("name", feat.name.as_str())])?;
    write_source(xml, &feat.source)?;
    xml.text_element("description", &[], &feat.description)?;
    if let Some(benefit) = feat.benefit.as_deref() {
        xml.text_element("benefit", &[], benefit)?;
    }

    xml.start("types", &[])?;
    for feat_type in &feat.types {
        xml.text_element("type", &[], feat_type.as_str())?;
    }
    xml.end("types")?;

    if !feat.prerequisites.is_empty() {
        xml.start("prerequisites", &[])?;
        for item in &feat.prerequisites {
            match item {
                PrerequisiteItem::Single(prerequisite) => write_prerequisite(xml, prerequisite)?,
                PrerequisiteItem::Choice { items } => {
                    xml.start("choice", &[])?;
                    for prerequisite in items {
                        write_prerequisite(xml, prerequisite)?;
                    }
                    xml.end("choice")?;
                }
            }
        }
        xml.end("prerequisites")?;
    }

    xml.end("feat")
}

fn write_prerequisite<W: Write>(xml: &mut XmlDocument<W>, prerequisite: &FeatPrerequisite) -> Result<()> {
    let number = prerequisite.number.map(|number| number.to_string());
    let mut attributes = vec![("kind", prerequisite.kind.as_str())];
    if let Some(other) = prerequisite.other {
        attributes.push(("other", other.as_str()));
    }
    if let Some(value) = prerequisite.value.as_deref() {
        attributes.push(("value", value));
    }
    if let Some(sub_value) = prerequisite.sub_value.as_deref() {
        attributes.push(("subValue", sub_value));
    }
    if let Some(number) = number.as_deref() {
        attributes.push(("number", number));
    }
    xml.text_element("prerequisite", &attributes, &prerequisite.description)
}

fn write_monster<W: Write>(xml: &mut XmlDocument<W>, monster: &Monster) -> Result<()> {
    let cr = monster.cr.to_string();
    xml.start(
        "monster",
        &[
            ("id", monster.id.as_str()),
            ("name", monster.name.as_str()),
            ("cr", cr.as_str()),
            ("type", monster.creature_type.as_str()),
            ("environment", monster.environment.as_str()),
            ("climate", monster.climate.as_str()),
        ],
    )?;
    for source in &monster.sources {
        write_source(xml, source)?;
    }
    write_localization(xml, &monster.localization)?;
    xml.end("monster")
}

fn write_source<W: Write>(xml: &mut XmlDocument<W>, source: &ElementSource) -> Result<()> {
    if source.references.is_empty() {
        return xml.empty("source", &[("id", source.id.as_str())]);
    }
    xml.start("source", &[("id", source.id.as_str())])?;
    for reference in &source.references {
        let mut attributes = vec![
            ("name", reference.name.as_str()),
            ("href", reference.href.as_str()),
        ];
        if let Some(lang) = reference.lang.as_deref() {
            attributes.push(("lang", lang));
        }
        xml.empty("reference", &attributes)?;
    }
    xml.end("source")
}

fn write_localization<W: Write>(xml: &mut XmlDocument<W>, localization: &Localization) -> Result<()> {
    if localization.is_empty() {
        return Ok(());
    }
    xml.start("localization", &[])?;
    for (lang, field, value) in localization.iter() {
        xml.text_element("entry", &[("lang", lang), ("field", field)], value)?;
    }
    xml.end("localization")
}

fn push_flag<'a>(attributes: &mut Vec<(&'a str, &'a str)>, name: &'a str, value: bool) {
    if value {
        attributes.push((name, "true"));
    }
}

struct XmlDocument<W: Write> {
    writer: Writer<W>,
}

impl<W: Write> XmlDocument<W> {
    fn new(inner: W) -> Self {
        Self {
            writer: Writer::new_with_indent(inner, b' ', 2),
        }
    }

    fn declaration(&mut self) -> Result<()> {
        self.writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;
        Ok(())
    }

    fn start(&mut self, name: &str, attributes: &[(&str, &str)]) -> Result<()> {
        let element = BytesStart::new(name).with_attributes(attributes.iter().copied());
        self.writer.write_event(Event::Start(element))?;
        Ok(())
    }

    fn end(&mut self, name: &str) -> Result<()> {
        self.writer.write_event(Event::End(BytesEnd::new(name)))?;
        Ok(())
    }

    fn empty(&mut self, name: &str, attributes: &[(&str, &str)]) -> Result<()> {
        let element = BytesStart::new(name).with_attributes(attributes.iter().copied());
        self.writer.write_event(Event::Empty(element))?;
        Ok(())
    }

    fn text_element(&mut self, name: &str, attributes: &[(&str, &str)], text: &str) -> Result<()> {
        if text.is_empty() {
            return self.empty(name, attributes);
        }
        self.start(name, attributes)?;
        self.writer.write_event(Event::Text(BytesText::new(text)))?;
        self.end(name)
    }

    fn finish(mut self) -> Result<()> {
        self.writer.get_mut().write_all(b"\n")?;
        Ok(())
    }
}
