use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use rust_decimal::{Decimal, RoundingStrategy};
use std::io::Cursor;

use crate::core::GnreError;

pub type XmlResult = Result<String, GnreError>;

fn xml_io(e: std::io::Error) -> GnreError {
    GnreError::Build(format!("XML write error: {e}"))
}

/// Compact XML writer. GNRE payloads travel inside SOAP bodies, so no
/// declaration and no indentation are emitted.
pub struct XmlWriter {
    writer: Writer<Cursor<Vec<u8>>>,
}

impl XmlWriter {
    pub fn new() -> Self {
        Self {
            writer: Writer::new(Cursor::new(Vec::new())),
        }
    }

    /// Writer that starts with an `<?xml ...?>` declaration.
    pub fn with_declaration() -> Result<Self, GnreError> {
        let mut w = Self::new();
        w.writer
            .write_event(Event::Decl(quick_xml::events::BytesDecl::new(
                "1.0",
                Some("UTF-8"),
                None,
            )))
            .map_err(xml_io)?;
        Ok(w)
    }

    pub fn into_string(self) -> XmlResult {
        let buf = self.writer.into_inner().into_inner();
        String::from_utf8(buf).map_err(|e| GnreError::Build(format!("XML UTF-8 error: {e}")))
    }

    pub fn start_element(&mut self, name: &str) -> Result<&mut Self, GnreError> {
        self.writer
            .write_event(Event::Start(BytesStart::new(name)))
            .map_err(xml_io)?;
        Ok(self)
    }

    pub fn start_element_with_attrs(
        &mut self,
        name: &str,
        attrs: &[(&str, &str)],
    ) -> Result<&mut Self, GnreError> {
        let mut elem = BytesStart::new(name);
        for (k, v) in attrs {
            elem.push_attribute((*k, *v));
        }
        self.writer
            .write_event(Event::Start(elem))
            .map_err(xml_io)?;
        Ok(self)
    }

    pub fn end_element(&mut self, name: &str) -> Result<&mut Self, GnreError> {
        self.writer
            .write_event(Event::End(BytesEnd::new(name)))
            .map_err(xml_io)?;
        Ok(self)
    }

    pub fn text_element(&mut self, name: &str, text: &str) -> Result<&mut Self, GnreError> {
        self.start_element(name)?;
        self.writer
            .write_event(Event::Text(BytesText::new(text)))
            .map_err(xml_io)?;
        self.end_element(name)
    }

    pub fn text_element_with_attrs(
        &mut self,
        name: &str,
        text: &str,
        attrs: &[(&str, &str)],
    ) -> Result<&mut Self, GnreError> {
        self.start_element_with_attrs(name, attrs)?;
        self.writer
            .write_event(Event::Text(BytesText::new(text)))
            .map_err(xml_io)?;
        self.end_element(name)
    }

    /// Write `text_element` only when `text` is present.
    pub fn opt_text_element(
        &mut self,
        name: &str,
        text: Option<&str>,
    ) -> Result<&mut Self, GnreError> {
        if let Some(text) = text {
            self.text_element(name, text)?;
        }
        Ok(self)
    }

    /// Write an already-serialized XML fragment verbatim.
    pub fn raw(&mut self, xml: &str) -> Result<&mut Self, GnreError> {
        self.writer
            .write_event(Event::Text(BytesText::from_escaped(xml)))
            .map_err(xml_io)?;
        Ok(self)
    }
}

impl Default for XmlWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Format a monetary value with exactly two decimals (half away from zero).
pub fn format_valor(d: Decimal) -> String {
    let mut v = d.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    v.rescale(2);
    v.to_string()
}

/// Keep only ASCII digits.
pub fn digits(s: &str) -> String {
    s.chars().filter(|c| c.is_ascii_digit()).collect()
}

fn local(name: &[u8]) -> String {
    let s = std::str::from_utf8(name).unwrap_or("");
    match s.rsplit_once(':') {
        Some((_, local)) => local.to_string(),
        None => s.to_string(),
    }
}

/// Walk `xml` and report every text node together with the stack of local
/// element names enclosing it. Attributes are reported through `on_start`.
///
/// Text is always reported as text, even when it looks like markup.
pub fn scan<S, T>(xml: &str, on_start: &mut S, on_text: &mut T) -> Result<(), GnreError>
where
    S: FnMut(&[String], &[(String, String)]),
    T: FnMut(&[String], &str),
{
    let mut path: Vec<String> = Vec::new();
    scan_into(xml, &mut path, &|_: &[String]| false, on_start, on_text)
}

/// Like [`scan`], but a text or CDATA node that looks like an XML document
/// is walked recursively (outer path as prefix) when `descend(path)` is true
/// for the element holding it. Services that return their payload escaped
/// inside a SOAP element need this.
pub fn scan_nested<D, S, T>(
    xml: &str,
    descend: D,
    on_start: &mut S,
    on_text: &mut T,
) -> Result<(), GnreError>
where
    D: Fn(&[String]) -> bool,
    S: FnMut(&[String], &[(String, String)]),
    T: FnMut(&[String], &str),
{
    let mut path: Vec<String> = Vec::new();
    scan_into(xml, &mut path, &descend, on_start, on_text)
}

fn looks_like_markup(text: &str) -> bool {
    text.starts_with('<') && text.ends_with('>')
}

fn scan_into<S, T>(
    xml: &str,
    path: &mut Vec<String>,
    descend: &dyn Fn(&[String]) -> bool,
    on_start: &mut S,
    on_text: &mut T,
) -> Result<(), GnreError>
where
    S: FnMut(&[String], &[(String, String)]),
    T: FnMut(&[String], &str),
{
    let base = path.len();
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                path.push(local(e.name().as_ref()));
                let attrs = attributes(e);
                on_start(path, &attrs);
            }
            Ok(Event::Empty(ref e)) => {
                path.push(local(e.name().as_ref()));
                let attrs = attributes(e);
                on_start(path, &attrs);
                path.pop();
            }
            Ok(Event::Text(ref e)) => {
                let text = e
                    .unescape()
                    .map_err(|err| GnreError::Parse(format!("XML parse error: {err}")))?;
                let text = text.trim();
                if looks_like_markup(text) && descend(path) {
                    scan_into(text, path, descend, on_start, on_text)?;
                } else if !text.is_empty() {
                    on_text(path, text);
                }
            }
            Ok(Event::CData(ref e)) => {
                let text = String::from_utf8_lossy(e).to_string();
                let text = text.trim();
                if looks_like_markup(text) && descend(path) {
                    scan_into(text, path, descend, on_start, on_text)?;
                } else if !text.is_empty() {
                    on_text(path, text);
                }
            }
            Ok(Event::End(_)) => {
                if path.len() <= base {
                    return Err(GnreError::Parse("XML parse error: unbalanced end tag".into()));
                }
                path.pop();
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(GnreError::Parse(format!("XML parse error: {e}"))),
            _ => {}
        }
    }

    if path.len() != base {
        return Err(GnreError::Parse(format!(
            "XML parse error: unclosed element '{}'",
            path.last().map(String::as_str).unwrap_or("")
        )));
    }
    Ok(())
}

fn attributes(e: &BytesStart<'_>) -> Vec<(String, String)> {
    e.attributes()
        .flatten()
        .map(|attr| {
            let key = local(attr.key.as_ref());
            let val = attr
                .unescape_value()
                .map(|v| v.to_string())
                .unwrap_or_default();
            (key, val)
        })
        .collect()
}
