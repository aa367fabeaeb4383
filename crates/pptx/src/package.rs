//! The OOXML container: ZIP parts in, ZIP parts out.

use crate::relationships::{numbered_stem, part_number};
use crate::xml::{XmlDocument, XmlElement};
use pptfill_core::{Error, Result};
use std::collections::HashMap;
use std::io::{Cursor, Read, Seek, Write};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Name of the content-types part at the package root.
pub const CONTENT_TYPES_PART: &str = "[Content_Types].xml";

/// ZIP local file header magic (PK\x03\x04).
const ZIP_MAGIC: [u8; 4] = [0x50, 0x4B, 0x03, 0x04];

/// Upper bound on the buffer reserved up front for one part.
const MAX_PART_PREALLOCATION: usize = 16 * 1024 * 1024;

/// Initial buffer size for a part whose header declares `declared` bytes.
/// The declared size is read from the upload as-is.
fn initial_capacity(declared: u64) -> usize {
    usize::try_from(declared)
        .unwrap_or(usize::MAX)
        .min(MAX_PART_PREALLOCATION)
}

/// Whether the bytes start like a ZIP container.
pub fn is_zip(bytes: &[u8]) -> bool {
    bytes.starts_with(&ZIP_MAGIC)
}

/// Every part of a package, in archive order, held in memory.
#[derive(Debug, Clone, Default)]
pub struct PptxPackage {
    parts: Vec<(String, Vec<u8>)>,
    index: HashMap<String, usize>,
}

impl PptxPackage {
    /// Read a package from uploaded bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if !is_zip(bytes) {
            return Err(Error::InvalidPackage(
                "not a ZIP-based OOXML container".to_string(),
            ));
        }
        Self::from_reader(Cursor::new(bytes))
    }

    /// Read a package from any seekable reader.
    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Self> {
        let mut archive = ZipArchive::new(reader)
            .map_err(|e| Error::InvalidPackage(format!("Failed to open ZIP: {}", e)))?;

        let mut package = Self::default();
        for i in 0..archive.len() {
            let mut file = archive
                .by_index(i)
                .map_err(|e| Error::InvalidPackage(format!("Failed to read ZIP entry {}: {}", i, e)))?;
            if file.is_dir() {
                continue;
            }

            let name = file.name().to_string();
            let mut content = Vec::with_capacity(initial_capacity(file.size()));
            file.read_to_end(&mut content)
                .map_err(|e| Error::InvalidPackage(format!("Failed to read '{}': {}", name, e)))?;
            package.set(name, content);
        }

        if !package.contains(CONTENT_TYPES_PART) {
            return Err(Error::InvalidPackage(format!(
                "missing {}",
                CONTENT_TYPES_PART
            )));
        }

        log::debug!("Loaded package with {} parts", package.parts.len());
        Ok(package)
    }

    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.index.get(name).map(|&i| self.parts[i].1.as_slice())
    }

    /// A part that must exist for the package to be usable.
    pub fn require(&self, name: &str) -> Result<&[u8]> {
        self.get(name)
            .ok_or_else(|| Error::InvalidPackage(format!("missing part '{}'", name)))
    }

    /// Parse a required XML part.
    pub fn require_xml(&self, name: &str) -> Result<XmlDocument> {
        XmlDocument::parse(self.require(name)?)
            .map_err(|e| Error::InvalidPackage(format!("part '{}': {}", name, e)))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Insert a new part or replace an existing one in place.
    pub fn set(&mut self, name: impl Into<String>, content: Vec<u8>) {
        let name = name.into();
        match self.index.get(&name) {
            Some(&i) => self.parts[i].1 = content,
            None => {
                self.index.insert(name.clone(), self.parts.len());
                self.parts.push((name, content));
            }
        }
    }

    /// Part names in archive order.
    pub fn part_names(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().map(|(name, _)| name.as_str())
    }

    /// Write the package as a ZIP archive, content types first.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

        let ordered = self
            .parts
            .iter()
            .filter(|(name, _)| name == CONTENT_TYPES_PART)
            .chain(self.parts.iter().filter(|(name, _)| name != CONTENT_TYPES_PART));

        for (name, content) in ordered {
            writer
                .start_file(name.as_str(), options)
                .map_err(|e| Error::Internal(format!("Failed to add '{}' to ZIP: {}", name, e)))?;
            writer
                .write_all(content)
                .map_err(|e| Error::Internal(format!("Failed to write '{}': {}", name, e)))?;
        }

        let cursor = writer
            .finish()
            .map_err(|e| Error::Internal(format!("Failed to finish ZIP: {}", e)))?;
        Ok(cursor.into_inner())
    }
}

/// Pick a part name in the same folder as `like` that is not in `taken`,
/// numbered one above the highest sibling with the same stem and extension.
///
/// `ppt/media/image3.png` with siblings image1..image5 -> `ppt/media/image6.png`
pub fn unused_part_name<'a>(like: &str, taken: impl IntoIterator<Item = &'a str>) -> String {
    let (dir, file) = like.rsplit_once('/').unwrap_or(("", like));
    let (stem, ext) = numbered_stem(file);

    let highest = taken
        .into_iter()
        .filter(|name| {
            let (name_dir, name_file) = name.rsplit_once('/').unwrap_or(("", name));
            name_dir == dir && numbered_stem(name_file) == (stem, ext)
        })
        .map(|name| part_number(name).unwrap_or(0))
        .max()
        .unwrap_or(0);

    let file = if ext.is_empty() {
        format!("{}{}", stem, highest + 1)
    } else {
        format!("{}{}.{}", stem, highest + 1, ext)
    };
    if dir.is_empty() {
        file
    } else {
        format!("{}/{}", dir, file)
    }
}

/// The `[Content_Types].xml` part.
#[derive(Debug, Clone)]
pub struct ContentTypes {
    doc: XmlDocument,
}

impl ContentTypes {
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let doc = XmlDocument::parse(bytes)?;
        if !doc.root.is("Types") {
            return Err(Error::InvalidPackage(format!(
                "{} has unexpected root <{}>",
                CONTENT_TYPES_PART, doc.root.name
            )));
        }
        Ok(Self { doc })
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        self.doc.to_bytes()
    }

    /// Override content type of a part (package path, no leading slash).
    pub fn override_for(&self, part: &str) -> Option<&str> {
        let wanted = format!("/{}", part);
        self.doc
            .root
            .children_named("Override")
            .find(|el| {
                el.attr("PartName")
                    .is_some_and(|name| name.eq_ignore_ascii_case(&wanted))
            })
            .and_then(|el| el.attr("ContentType"))
    }

    /// Default content type registered for a file extension.
    pub fn default_for(&self, extension: &str) -> Option<&str> {
        self.doc
            .root
            .children_named("Default")
            .find(|el| {
                el.attr("Extension")
                    .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
            })
            .and_then(|el| el.attr("ContentType"))
    }

    /// Register or replace the override for a part.
    pub fn set_override(&mut self, part: &str, content_type: &str) {
        let name = format!("/{}", part);
        let existing = self.doc.root.children_named_mut("Override").find(|el| {
            el.attr("PartName")
                .is_some_and(|n| n.eq_ignore_ascii_case(&name))
        });

        match existing {
            Some(el) => el.set_attr("ContentType", content_type),
            None => {
                let prefix = self
                    .doc
                    .root
                    .child("Override")
                    .map(|el| el.name.clone())
                    .unwrap_or_else(|| "Override".to_string());
                self.doc.root.push_child(
                    XmlElement::new(prefix)
                        .with_attr("PartName", name)
                        .with_attr("ContentType", content_type),
                );
            }
        }
    }
}
