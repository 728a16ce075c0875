//! PICS XML annotation.
//!
//! The document is streamed through quick-xml's event reader and writer, so
//! comments, attribute order and whitespace are written back unchanged. Each
//! `picsItem` is buffered, inspected and, when it matches, has its `support`
//! text set to `true`. Nothing is ever set back to `false` or removed.

use matter_model::{PicsCode, PicsSide};
use quick_xml::events::{BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::error::PicsError;
use crate::resolver::TemplateResolver;

/// Codes collected for one cluster side, to be marked as supported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationRequest {
    pub cluster_name: String,
    pub pics_prefix: String,
    pub side: PicsSide,
    pub features: BTreeSet<String>,
    pub attributes: BTreeSet<String>,
    pub accepted_commands: BTreeSet<String>,
    pub generated_commands: BTreeSet<String>,
}

impl AnnotationRequest {
    pub fn new(cluster_name: impl Into<String>, pics_prefix: impl Into<String>, side: PicsSide) -> Self {
        Self {
            cluster_name: cluster_name.into(),
            pics_prefix: pics_prefix.into(),
            side,
            features: BTreeSet::new(),
            attributes: BTreeSet::new(),
            accepted_commands: BTreeSet::new(),
            generated_commands: BTreeSet::new(),
        }
    }

    pub fn server(cluster_name: impl Into<String>, pics_prefix: impl Into<String>) -> Self {
        Self::new(cluster_name, pics_prefix, PicsSide::Server)
    }

    pub fn client(cluster_name: impl Into<String>, pics_prefix: impl Into<String>) -> Self {
        Self::new(cluster_name, pics_prefix, PicsSide::Client)
    }

    /// `<prefix>.S` or `<prefix>.C`.
    pub fn usage_code(&self) -> String {
        PicsCode::usage(&self.pics_prefix, self.side).to_string()
    }

    pub fn with_features<I, S>(mut self, codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.features.extend(codes.into_iter().map(Into::into));
        self
    }

    pub fn with_attributes<I, S>(mut self, codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attributes.extend(codes.into_iter().map(Into::into));
        self
    }

    pub fn with_accepted_commands<I, S>(mut self, codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.accepted_commands.extend(codes.into_iter().map(Into::into));
        self
    }

    pub fn with_generated_commands<I, S>(mut self, codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.generated_commands.extend(codes.into_iter().map(Into::into));
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Usage,
    Features,
    Attributes,
    CommandsReceived,
    CommandsGenerated,
    Events,
}

impl Section {
    fn from_container(name: &[u8]) -> Option<Self> {
        match name {
            b"features" => Some(Section::Features),
            b"attributes" => Some(Section::Attributes),
            b"commandsReceived" => Some(Section::CommandsReceived),
            b"commandsGenerated" => Some(Section::CommandsGenerated),
            b"events" | b"Events" => Some(Section::Events),
            _ => None,
        }
    }
}

/// Request with every code lowercased; item numbers are compared ignoring case.
struct Matcher {
    usage: String,
    side_type: &'static str,
    features: BTreeSet<String>,
    attributes: BTreeSet<String>,
    accepted: BTreeSet<String>,
    generated: BTreeSet<String>,
}

fn lowered(codes: &BTreeSet<String>) -> BTreeSet<String> {
    codes.iter().map(|c| c.trim().to_ascii_lowercase()).collect()
}

impl Matcher {
    fn new(request: &AnnotationRequest) -> Self {
        Self {
            usage: request.usage_code().to_ascii_lowercase(),
            side_type: match request.side {
                PicsSide::Server => "Server",
                PicsSide::Client => "Client",
            },
            features: lowered(&request.features),
            attributes: lowered(&request.attributes),
            accepted: lowered(&request.accepted_commands),
            generated: lowered(&request.generated_commands),
        }
    }

    fn should_mark(&self, section: Section, item: &ItemFields) -> bool {
        let code = item.item_number.trim().to_ascii_lowercase();
        match section {
            Section::Usage => code == self.usage,
            Section::Features => self.features.contains(&code),
            Section::Attributes => self.attributes.contains(&code),
            Section::CommandsReceived => self.accepted.contains(&code),
            Section::CommandsGenerated => self.generated.contains(&code),
            Section::Events => {
                if item.status.trim() != "M" {
                    return false;
                }
                let cond = item.cond.trim().to_ascii_lowercase();
                cond.is_empty() || cond == self.usage || self.features.contains(&cond)
            }
        }
    }
}

#[derive(Debug, Default)]
struct ItemFields {
    item_number: String,
    status: String,
    cond: String,
}

/// Result of annotating one document.
#[derive(Debug, Clone)]
pub struct AnnotatedDocument {
    pub xml: String,
    /// Item numbers whose support was set to `true`, in document order.
    pub marked: Vec<String>,
}

/// Annotate PICS XML text. The header (everything before `<clusterPICS`) is
/// kept byte for byte.
pub fn annotate_document(text: &str, request: &AnnotationRequest) -> Result<AnnotatedDocument, PicsError> {
    let root = text
        .find("<clusterPICS")
        .ok_or_else(|| PicsError::MissingRoot(request.cluster_name.clone()))?;
    let (header, body) = text.split_at(root);

    let matcher = Matcher::new(request);
    let mut reader = Reader::from_str(body);
    reader.config_mut().trim_text(false);
    let mut writer = Writer::new(Vec::with_capacity(body.len() + 64));

    let mut stack: Vec<Vec<u8>> = Vec::new();
    let mut in_matching_side = false;
    let mut usage_marked = false;
    let mut marked = Vec::new();

    loop {
        let event = reader.read_event()?;
        if matches!(event, Event::Eof) {
            break;
        }

        let is_item = matches!(&event, Event::Start(e) if e.local_name().as_ref() == b"picsItem");
        if is_item {
            let section = current_section(&stack, in_matching_side);
            let mut item = vec![event.into_owned()];
            collect_item(&mut reader, &mut item)?;

            let item = match section {
                Some(Section::Usage) if usage_marked => item,
                Some(section) => {
                    let fields = item_fields(&item)?;
                    if matcher.should_mark(section, &fields) {
                        usage_marked |= section == Section::Usage;
                        log::debug!("Marking {} as supported", fields.item_number.trim());
                        marked.push(fields.item_number.trim().to_string());
                        set_support_true(item, fields.item_number.trim())
                    } else {
                        item
                    }
                }
                None => item,
            };
            for ev in item {
                writer.write_event(ev).map_err(|e| PicsError::Write(e.to_string()))?;
            }
            continue;
        }

        match &event {
            Event::Start(e) => {
                if e.local_name().as_ref() == b"clusterSide" {
                    in_matching_side =
                        attribute(e, "type")?.is_some_and(|t| t.trim().eq_ignore_ascii_case(matcher.side_type));
                }
                stack.push(e.local_name().as_ref().to_vec());
            }
            Event::End(e) => {
                if e.local_name().as_ref() == b"clusterSide" {
                    in_matching_side = false;
                }
                stack.pop();
            }
            _ => {}
        }
        writer.write_event(event).map_err(|e| PicsError::Write(e.to_string()))?;
    }

    let body = String::from_utf8(writer.into_inner()).map_err(|e| PicsError::Malformed(e.to_string()))?;
    Ok(AnnotatedDocument {
        xml: format!("{header}{body}"),
        marked,
    })
}

fn current_section(stack: &[Vec<u8>], in_matching_side: bool) -> Option<Section> {
    let parent = stack.last()?;
    if parent.as_slice() == b"usage" {
        return Some(Section::Usage);
    }
    if in_matching_side {
        Section::from_container(parent)
    } else {
        None
    }
}

/// Read events up to and including the `picsItem` end tag.
fn collect_item(reader: &mut Reader<&[u8]>, item: &mut Vec<Event<'static>>) -> Result<(), PicsError> {
    let mut depth = 1usize;
    loop {
        let event = reader.read_event()?;
        match &event {
            Event::Start(_) => depth += 1,
            Event::End(_) => depth -= 1,
            Event::Eof => return Err(PicsError::Malformed("document ends inside picsItem".into())),
            _ => {}
        }
        item.push(event.into_owned());
        if depth == 0 {
            return Ok(());
        }
    }
}

fn attribute(e: &BytesStart<'_>, name: &str) -> Result<Option<String>, PicsError> {
    let attr = e.try_get_attribute(name).map_err(quick_xml::Error::from)?;
    Ok(attr.map(|a| String::from_utf8_lossy(&a.value).into_owned()))
}

fn item_fields(item: &[Event<'static>]) -> Result<ItemFields, PicsError> {
    let mut fields = ItemFields::default();
    let mut current: Option<Vec<u8>> = None;
    for event in item {
        match event {
            Event::Start(e) => {
                let name = e.local_name().as_ref().to_vec();
                if name == b"status" {
                    fields.cond = attribute(e, "cond")?.unwrap_or_default();
                }
                current = Some(name);
            }
            Event::End(_) => current = None,
            Event::Text(t) => {
                let text = t.unescape()?;
                match current.as_deref() {
                    Some(b"itemNumber") => fields.item_number.push_str(&text),
                    Some(b"status") => fields.status.push_str(&text),
                    _ => {}
                }
            }
            Event::CData(c) => {
                let text = String::from_utf8_lossy(c);
                match current.as_deref() {
                    Some(b"itemNumber") => fields.item_number.push_str(&text),
                    Some(b"status") => fields.status.push_str(&text),
                    _ => {}
                }
            }
            _ => {}
        }
    }
    Ok(fields)
}

/// Replace the text of the item's `support` element with `true`.
fn set_support_true(item: Vec<Event<'static>>, item_number: &str) -> Vec<Event<'static>> {
    let mut out = Vec::with_capacity(item.len() + 2);
    let mut in_support = false;
    let mut wrote_value = false;
    let mut found = false;

    for event in item {
        match event {
            Event::Empty(e) if e.local_name().as_ref() == b"support" => {
                found = true;
                let end = e.to_end().into_owned();
                out.push(Event::Start(e));
                out.push(Event::Text(BytesText::new("true")));
                out.push(Event::End(end));
            }
            Event::Start(e) if e.local_name().as_ref() == b"support" => {
                found = true;
                in_support = true;
                wrote_value = false;
                out.push(Event::Start(e));
            }
            Event::Text(_) | Event::CData(_) if in_support => {
                if !wrote_value {
                    out.push(Event::Text(BytesText::new("true")));
                    wrote_value = true;
                }
            }
            Event::End(e) if in_support && e.local_name().as_ref() == b"support" => {
                if !wrote_value {
                    out.push(Event::Text(BytesText::new("true")));
                }
                in_support = false;
                out.push(Event::End(e));
            }
            other => out.push(other),
        }
    }

    if !found {
        log::warn!("picsItem {item_number} has no <support> element; left unchanged");
    }
    out
}

/// Resolves templates and writes annotated documents.
#[derive(Debug, Clone)]
pub struct PicsAnnotator {
    resolver: TemplateResolver,
}

impl PicsAnnotator {
    pub fn new(resolver: TemplateResolver) -> Self {
        Self { resolver }
    }

    pub fn resolver(&self) -> &TemplateResolver {
        &self.resolver
    }

    /// Annotate the document for `request.cluster_name` and write it to
    /// `output_dir`. An output written earlier in the run is used as the base.
    ///
    /// Returns the path written.
    pub fn annotate(&self, request: &AnnotationRequest, output_dir: &Path) -> Result<PathBuf, PicsError> {
        let template = self.resolver.resolve(&request.cluster_name, output_dir)?;
        log::info!(
            "Annotating {} ({}) from {}",
            request.cluster_name,
            request.usage_code(),
            template.path.display()
        );

        let text = std::fs::read_to_string(&template.path).map_err(|e| PicsError::io(&template.path, e))?;
        let doc = annotate_document(&text, request)?;

        let out_path = output_dir.join(&template.file_name);
        std::fs::write(&out_path, doc.xml).map_err(|e| PicsError::io(&out_path, e))?;
        log::debug!("{} items marked in {}", doc.marked.len(), out_path.display());
        Ok(out_path)
    }
}
