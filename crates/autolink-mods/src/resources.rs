//! Android resource XML (`res/values/*.xml`) documents.
//!
//! Supports what value resource files contain in practice: `<style>` groups of
//! `<item>`s and simple value elements (`<color>`, `<string>`, `<dimen>`,
//! arrays of `<item>`s). The XML declaration, comments and CDATA sections are
//! accepted on input; comments are not preserved.

use std::fmt::Write as _;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message} at byte {offset}")]
pub struct XmlError {
    pub message: String,
    pub offset: usize,
}

/// `<item name="...">value</item>` inside a style
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleItem {
    pub name: String,
    pub value: String,
    /// Every attribute other than `name`, in source order (e.g. `tools:targetApi`)
    pub attributes: Vec<(String, String)>,
}

impl StyleItem {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        StyleItem {
            name: name.into(),
            value: value.into(),
            attributes: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleGroup {
    pub name: String,
    pub parent: Option<String>,
    pub items: Vec<StyleItem>,
}

/// Child `<item>` of an array or plurals element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueItem {
    pub attributes: Vec<(String, String)>,
    pub text: String,
}

/// Any non-style resource element, e.g. `<color name="primary">#fff</color>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueElement {
    pub tag: String,
    pub attributes: Vec<(String, String)>,
    pub text: String,
    pub items: Vec<ValueItem>,
}

impl ValueElement {
    pub fn name(&self) -> Option<&str> {
        attribute(&self.attributes, "name")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resource {
    Style(StyleGroup),
    Value(ValueElement),
}

/// A `<resources>` document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceXml {
    /// Attributes of the root element (namespace declarations)
    pub attributes: Vec<(String, String)>,
    pub resources: Vec<Resource>,
}

impl ResourceXml {
    pub fn parse(source: &str) -> Result<Self, XmlError> {
        let mut parser = Parser { src: source, pos: 0 };
        parser.skip_misc()?;
        if parser.at_end() {
            return Ok(ResourceXml::default());
        }
        let root = parser.parse_element()?;
        parser.skip_misc()?;
        if !parser.at_end() {
            return Err(parser.error("unexpected content after the root element"));
        }
        if root.name != "resources" {
            return Err(XmlError {
                message: format!("expected <resources> root, found <{}>", root.name),
                offset: 0,
            });
        }

        let mut resources = Vec::with_capacity(root.children.len());
        for child in root.children {
            resources.push(to_resource(child)?);
        }
        Ok(ResourceXml {
            attributes: root.attributes,
            resources,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    pub fn styles(&self) -> impl Iterator<Item = &StyleGroup> {
        self.resources.iter().filter_map(|resource| match resource {
            Resource::Style(group) => Some(group),
            Resource::Value(_) => None,
        })
    }

    pub fn style(&self, name: &str) -> Option<&StyleGroup> {
        self.styles().find(|group| group.name == name)
    }

    pub fn style_mut(&mut self, name: &str) -> Option<&mut StyleGroup> {
        self.resources.iter_mut().find_map(|resource| match resource {
            Resource::Style(group) if group.name == name => Some(group),
            _ => None,
        })
    }

    /// Serialize with two-space indentation and no XML declaration
    pub fn to_xml_string(&self) -> String {
        let mut out = String::from("<resources");
        push_attributes(&mut out, &self.attributes);
        if self.resources.is_empty() {
            out.push_str("/>\n");
            return out;
        }
        out.push_str(">\n");
        for resource in &self.resources {
            match resource {
                Resource::Style(group) => {
                    let _ = write!(out, "  <style name=\"{}\"", escape_attribute(&group.name));
                    if let Some(parent) = &group.parent {
                        let _ = write!(out, " parent=\"{}\"", escape_attribute(parent));
                    }
                    if group.items.is_empty() {
                        out.push_str("/>\n");
                        continue;
                    }
                    out.push_str(">\n");
                    for item in &group.items {
                        let _ = write!(out, "    <item name=\"{}\"", escape_attribute(&item.name));
                        push_attributes(&mut out, &item.attributes);
                        let _ = writeln!(out, ">{}</item>", escape_text(&item.value));
                    }
                    out.push_str("  </style>\n");
                }
                Resource::Value(element) => {
                    let _ = write!(out, "  <{}", element.tag);
                    push_attributes(&mut out, &element.attributes);
                    if element.items.is_empty() {
                        let _ = writeln!(out, ">{}</{}>", escape_text(&element.text), element.tag);
                        continue;
                    }
                    out.push_str(">\n");
                    for item in &element.items {
                        out.push_str("    <item");
                        push_attributes(&mut out, &item.attributes);
                        let _ = writeln!(out, ">{}</item>", escape_text(&item.text));
                    }
                    let _ = writeln!(out, "  </{}>", element.tag);
                }
            }
        }
        out.push_str("</resources>\n");
        out
    }
}

fn attribute<'a>(attributes: &'a [(String, String)], key: &str) -> Option<&'a str> {
    attributes
        .iter()
        .find(|(name, _)| name == key)
        .map(|(_, value)| value.as_str())
}

fn push_attributes(out: &mut String, attributes: &[(String, String)]) {
    for (name, value) in attributes {
        let _ = write!(out, " {}=\"{}\"", name, escape_attribute(value));
    }
}

fn to_resource(element: Element) -> Result<Resource, XmlError> {
    if element.name == "style" {
        let name = attribute(&element.attributes, "name")
            .ok_or_else(|| XmlError {
                message: "<style> without a name".to_string(),
                offset: element.offset,
            })?
            .to_string();
        let parent = attribute(&element.attributes, "parent").map(str::to_string);
        let mut items = Vec::with_capacity(element.children.len());
        for child in element.children {
            let item_name = attribute(&child.attributes, "name").map(str::to_string);
            match (child.name.as_str(), item_name) {
                ("item", Some(item_name)) => items.push(StyleItem {
                    name: item_name,
                    value: child.text,
                    attributes: child
                        .attributes
                        .into_iter()
                        .filter(|(key, _)| key != "name")
                        .collect(),
                }),
                _ => {
                    return Err(XmlError {
                        message: format!("unexpected <{}> in style '{}'", child.name, name),
                        offset: child.offset,
                    })
                }
            }
        }
        return Ok(Resource::Style(StyleGroup {
            name,
            parent,
            items,
        }));
    }

    let mut items = Vec::with_capacity(element.children.len());
    for child in element.children {
        if child.name != "item" || !child.children.is_empty() {
            return Err(XmlError {
                message: format!("nested <{}> in <{}> is not supported", child.name, element.name),
                offset: child.offset,
            });
        }
        items.push(ValueItem {
            attributes: child.attributes,
            text: child.text,
        });
    }
    Ok(Resource::Value(ValueElement {
        tag: element.name,
        attributes: element.attributes,
        text: element.text,
        items,
    }))
}

pub fn escape_text(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

pub fn escape_attribute(value: &str) -> String {
    escape_text(value).replace('"', "&quot;")
}

fn unescape(raw: &str, offset: usize) -> Result<String, XmlError> {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let after = &rest[amp + 1..];
        let Some(semi) = after.find(';') else {
            return Err(XmlError {
                message: "unterminated entity".to_string(),
                offset,
            });
        };
        let entity = &after[..semi];
        let decoded = match entity {
            "amp" => Some('&'),
            "lt" => Some('<'),
            "gt" => Some('>'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            _ => entity
                .strip_prefix("#x")
                .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                .or_else(|| entity.strip_prefix('#').and_then(|dec| dec.parse().ok()))
                .and_then(char::from_u32),
        };
        let Some(ch) = decoded else {
            return Err(XmlError {
                message: format!("unknown entity '&{};'", entity),
                offset,
            });
        };
        out.push(ch);
        rest = &after[semi + 1..];
    }
    out.push_str(rest);
    Ok(out)
}

#[derive(Debug)]
struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<Element>,
    text: String,
    offset: usize,
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

impl Parser<'_> {
    fn rest(&self) -> &str {
        &self.src[self.pos..]
    }

    fn at_end(&self) -> bool {
        self.pos >= self.src.len()
    }

    fn error(&self, message: &str) -> XmlError {
        XmlError {
            message: message.to_string(),
            offset: self.pos,
        }
    }

    fn skip_whitespace(&mut self) {
        let trimmed = self.rest().trim_start();
        self.pos = self.src.len() - trimmed.len();
    }

    fn skip_past(&mut self, terminator: &str, what: &str) -> Result<(), XmlError> {
        match self.rest().find(terminator) {
            Some(index) => {
                self.pos += index + terminator.len();
                Ok(())
            }
            None => Err(self.error(&format!("unterminated {}", what))),
        }
    }

    /// Skip whitespace, comments, declarations and processing instructions
    fn skip_misc(&mut self) -> Result<(), XmlError> {
        loop {
            self.skip_whitespace();
            let rest = self.rest();
            if rest.starts_with("<!--") {
                self.skip_past("-->", "comment")?;
            } else if rest.starts_with("<?") {
                self.skip_past("?>", "declaration")?;
            } else if rest.starts_with("<!DOCTYPE") {
                self.skip_past(">", "doctype")?;
            } else {
                return Ok(());
            }
        }
    }

    fn parse_name(&mut self) -> Result<String, XmlError> {
        let rest = self.rest();
        let len = rest
            .find(|c: char| c.is_whitespace() || matches!(c, '>' | '/' | '='))
            .unwrap_or(rest.len());
        if len == 0 {
            return Err(self.error("expected a name"));
        }
        let name = rest[..len].to_string();
        self.pos += len;
        Ok(name)
    }

    fn parse_element(&mut self) -> Result<Element, XmlError> {
        let offset = self.pos;
        if !self.rest().starts_with('<') {
            return Err(self.error("expected '<'"));
        }
        self.pos += 1;
        let name = self.parse_name()?;

        let mut attributes = Vec::new();
        loop {
            self.skip_whitespace();
            let rest = self.rest();
            if rest.starts_with("/>") {
                self.pos += 2;
                return Ok(Element {
                    name,
                    attributes,
                    children: Vec::new(),
                    text: String::new(),
                    offset,
                });
            }
            if rest.starts_with('>') {
                self.pos += 1;
                break;
            }
            let key = self.parse_name()?;
            self.skip_whitespace();
            if !self.rest().starts_with('=') {
                return Err(self.error("expected '=' after attribute name"));
            }
            self.pos += 1;
            self.skip_whitespace();
            let Some(quote) = self.rest().chars().next().filter(|c| matches!(c, '"' | '\''))
            else {
                return Err(self.error("expected a quoted attribute value"));
            };
            self.pos += 1;
            let Some(end) = self.rest().find(quote) else {
                return Err(self.error("unterminated attribute value"));
            };
            let value = unescape(&self.rest()[..end], self.pos)?;
            self.pos += end + 1;
            attributes.push((key, value));
        }

        let mut children = Vec::new();
        let mut text = String::new();
        loop {
            let rest = self.rest();
            if rest.is_empty() {
                return Err(self.error(&format!("unclosed <{}>", name)));
            }
            if rest.starts_with("</") {
                self.pos += 2;
                let closing = self.parse_name()?;
                if closing != name {
                    return Err(self.error(&format!(
                        "mismatched </{}>, expected </{}>",
                        closing, name
                    )));
                }
                self.skip_whitespace();
                if !self.rest().starts_with('>') {
                    return Err(self.error("expected '>'"));
                }
                self.pos += 1;
                break;
            }
            if rest.starts_with("<!--") {
                self.skip_past("-->", "comment")?;
            } else if let Some(cdata) = rest.strip_prefix("<![CDATA[") {
                let Some(end) = cdata.find("]]>") else {
                    return Err(self.error("unterminated CDATA section"));
                };
                text.push_str(&cdata[..end]);
                self.pos += "<![CDATA[".len() + end + "]]>".len();
            } else if rest.starts_with('<') {
                children.push(self.parse_element()?);
            } else {
                let end = rest.find('<').unwrap_or(rest.len());
                text.push_str(&unescape(&rest[..end], self.pos)?);
                self.pos += end;
            }
        }

        if !children.is_empty() && !text.trim().is_empty() {
            return Err(XmlError {
                message: format!("mixed content in <{}> is not supported", name),
                offset,
            });
        }
        Ok(Element {
            name,
            attributes,
            children,
            text: text.trim().to_string(),
            offset,
        })
    }
}
