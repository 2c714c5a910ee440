//! `.resx` resource store.
//!
//! Only string `<data>` nodes become entries. Typed or binary nodes (anything
//! carrying a non-string `type` or a `mimetype`), `<metadata>` and `<assembly>`
//! are carried through a save untouched, so editing strings never drops an
//! embedded icon or a type reference.

use super::{FileFormat, FormatError, ResourceStore};
use crate::backup::write_atomically;
use crate::resources::ResourceEntry;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::fs;
use std::path::Path;

const RESHEADERS: &[(&str, &str)] = &[
    ("resmimetype", "text/microsoft-resx"),
    ("version", "2.0"),
    (
        "reader",
        "System.Resources.ResXResourceReader, System.Windows.Forms, Version=4.0.0.0, Culture=neutral, PublicKeyToken=b77a5c561934e089",
    ),
    (
        "writer",
        "System.Resources.ResXResourceWriter, System.Windows.Forms, Version=4.0.0.0, Culture=neutral, PublicKeyToken=b77a5c561934e089",
    ),
];

/// Parsed content of a `.resx` document.
#[derive(Debug, Default)]
pub struct ResxDocument {
    pub entries: Vec<ResourceEntry>,
    /// Owned event runs of the nodes that are not string entries.
    pub preserved: Vec<Vec<Event<'static>>>,
}

#[derive(Debug, Default)]
pub struct ResxStore {
    keep_backups: bool,
}

impl ResxStore {
    pub fn new(keep_backups: bool) -> Self {
        Self { keep_backups }
    }

    pub fn parse(&self, content: &str) -> Result<ResxDocument, FormatError> {
        let content = content.trim_start_matches('\u{feff}');
        let mut reader = Reader::from_str(content);
        let mut document = ResxDocument::default();

        loop {
            match reader.read_event()? {
                Event::Start(e) => match element_name(&e).as_str() {
                    "data" => {
                        let attrs = DataAttributes::read(&e)?;
                        if attrs.is_string() {
                            let entry = read_data(&mut reader, attrs.name)?;
                            document.entries.push(entry);
                        } else {
                            document.preserved.push(capture_element(&mut reader, e)?);
                        }
                    }
                    "metadata" | "assembly" => {
                        document.preserved.push(capture_element(&mut reader, e)?);
                    }
                    _ => {}
                },
                Event::Empty(e) => match element_name(&e).as_str() {
                    "data" => {
                        let attrs = DataAttributes::read(&e)?;
                        if attrs.is_string() {
                            document
                                .entries
                                .push(ResourceEntry::new(attrs.name, None, None));
                        } else {
                            document.preserved.push(vec![Event::Empty(e.into_owned())]);
                        }
                    }
                    "metadata" | "assembly" => {
                        document.preserved.push(vec![Event::Empty(e.into_owned())]);
                    }
                    _ => {}
                },
                Event::Eof => break,
                _ => {}
            }
        }

        Ok(document)
    }

    pub fn render(
        &self,
        entries: &[ResourceEntry],
        preserved: &[Vec<Event<'static>>],
    ) -> Result<String, FormatError> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;
        writer.write_event(Event::Start(BytesStart::new("root")))?;

        for (name, value) in RESHEADERS {
            let mut header = BytesStart::new("resheader");
            header.push_attribute(("name", *name));
            writer.write_event(Event::Start(header))?;
            write_text_element(&mut writer, "value", value)?;
            writer.write_event(Event::End(BytesEnd::new("resheader")))?;
        }

        for run in preserved {
            for event in run {
                writer.write_event(event.borrow())?;
            }
        }

        for entry in entries {
            let mut data = BytesStart::new("data");
            data.push_attribute(("name", entry.key.as_str()));
            data.push_attribute(("xml:space", "preserve"));
            if entry.value.is_none() && entry.comment.is_none() {
                writer.write_event(Event::Empty(data))?;
                continue;
            }
            writer.write_event(Event::Start(data))?;
            if let Some(value) = &entry.value {
                write_text_element(&mut writer, "value", value)?;
            }
            if let Some(comment) = &entry.comment {
                write_text_element(&mut writer, "comment", comment)?;
            }
            writer.write_event(Event::End(BytesEnd::new("data")))?;
        }

        writer.write_event(Event::End(BytesEnd::new("root")))?;
        let mut out = String::from_utf8(writer.into_inner())
            .map_err(|err| FormatError::Parse(err.to_string()))?;
        out.push('\n');
        Ok(out)
    }
}

impl ResourceStore for ResxStore {
    fn load(&self, path: &Path) -> Result<Vec<ResourceEntry>, FormatError> {
        let content = fs::read_to_string(path)?;
        Ok(self.parse(&content)?.entries)
    }

    fn save(&self, path: &Path, entries: &[ResourceEntry]) -> Result<(), FormatError> {
        let preserved = if path.exists() {
            self.parse(&fs::read_to_string(path)?)?.preserved
        } else {
            Vec::new()
        };
        let content = self.render(entries, &preserved)?;
        write_atomically(path, content.as_bytes(), self.keep_backups)?;
        Ok(())
    }

    fn format(&self) -> FileFormat {
        FileFormat::Resx
    }
}

fn element_name(start: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(start.name().as_ref()).into_owned()
}

struct DataAttributes {
    name: String,
    type_name: Option<String>,
    mime_type: Option<String>,
}

impl DataAttributes {
    fn read(start: &BytesStart<'_>) -> Result<Self, FormatError> {
        let mut name = None;
        let mut type_name = None;
        let mut mime_type = None;
        for attr in start.attributes() {
            let attr = attr.map_err(quick_xml::Error::from)?;
            match attr.key.as_ref() {
                b"name" => name = Some(attr.unescape_value()?.into_owned()),
                b"type" => type_name = Some(attr.unescape_value()?.into_owned()),
                b"mimetype" => mime_type = Some(attr.unescape_value()?.into_owned()),
                _ => {}
            }
        }
        let name = name
            .filter(|name| !name.is_empty())
            .ok_or_else(|| FormatError::Parse("<data> element without a name".into()))?;
        Ok(Self {
            name,
            type_name,
            mime_type,
        })
    }

    fn is_string(&self) -> bool {
        self.mime_type.is_none()
            && self
                .type_name
                .as_deref()
                .map_or(true, |ty| ty.starts_with("System.String"))
    }
}

fn read_data(reader: &mut Reader<&[u8]>, key: String) -> Result<ResourceEntry, FormatError> {
    let mut value = None;
    let mut comment = None;
    loop {
        match reader.read_event()? {
            Event::Start(e) if e.name().as_ref() == b"value" => {
                value = Some(read_text(reader, b"value")?);
            }
            Event::Start(e) if e.name().as_ref() == b"comment" => {
                comment = Some(read_text(reader, b"comment")?);
            }
            Event::Empty(e) if e.name().as_ref() == b"value" => value = Some(String::new()),
            Event::Empty(e) if e.name().as_ref() == b"comment" => comment = Some(String::new()),
            Event::End(e) if e.name().as_ref() == b"data" => break,
            Event::Eof => {
                return Err(FormatError::Parse(format!(
                    "unexpected end of file inside <data name=\"{key}\">"
                )))
            }
            _ => {}
        }
    }
    Ok(ResourceEntry::new(key, value, comment))
}

fn read_text(reader: &mut Reader<&[u8]>, end: &[u8]) -> Result<String, FormatError> {
    let mut text = String::new();
    loop {
        match reader.read_event()? {
            Event::Text(t) => text.push_str(&t.unescape()?),
            Event::CData(c) => text.push_str(&String::from_utf8_lossy(&c)),
            Event::End(e) if e.name().as_ref() == end => break,
            Event::Eof => return Err(FormatError::Parse("unexpected end of file".into())),
            _ => {}
        }
    }
    Ok(text)
}

fn capture_element(
    reader: &mut Reader<&[u8]>,
    start: BytesStart<'_>,
) -> Result<Vec<Event<'static>>, FormatError> {
    let mut events = vec![Event::Start(start.into_owned())];
    let mut depth = 1usize;
    while depth > 0 {
        let event = reader.read_event()?;
        match &event {
            Event::Start(_) => depth += 1,
            Event::End(_) => depth -= 1,
            Event::Eof => {
                return Err(FormatError::Parse(
                    "unexpected end of file inside preserved node".into(),
                ))
            }
            Event::Text(t) if t.iter().all(u8::is_ascii_whitespace) => continue,
            _ => {}
        }
        events.push(event.into_owned());
    }
    Ok(events)
}

fn write_text_element(
    writer: &mut Writer<Vec<u8>>,
    name: &str,
    text: &str,
) -> Result<(), FormatError> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}
