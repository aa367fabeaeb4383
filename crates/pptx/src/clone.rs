//! Slide Cloner: structural duplicates of slides with their own private parts.

use crate::presentation::{next_slide_id, Presentation, Slide, SLIDE_CONTENT_TYPE};
use crate::relationships::{
    rels_path_for, resolve_target, with_file_name, Relationship, Relationships, TYPE_SLIDE,
};
use pptfill_core::{Error, Result};
use std::collections::HashMap;

/// Relationship types whose targets belong to the presentation as a whole.
/// A duplicate points at the same part as its source.
const SHARED_TARGET_TYPES: &[&str] = &[
    "slideLayout",
    "slideMaster",
    "notesMaster",
    "handoutMaster",
    "theme",
    "slide",
];

/// Parts copied during one duplication and the names handed out so far.
#[derive(Debug, Default)]
struct PartCopies {
    copied: HashMap<String, String>,
    reserved: Vec<String>,
}

impl Presentation {
    /// Append a copy of the slide at `index` and return the copy's index.
    ///
    /// The copy shares the layout, other slides it links to, and external
    /// links with the source. Every other internal part it references
    /// (images, media, charts, ...) is copied under a fresh name, and so are
    /// the private parts those reference in turn. Notes are not carried over.
    pub fn duplicate_slide(&mut self, index: usize) -> Result<usize> {
        let source = self.slide(index)?.clone();
        let mut copies = PartCopies::default();
        let part_name = self.reserve_part_name(&source.part_name, &mut copies);
        let rels = self.copy_relationships(&source.part_name, &source.rels, &mut copies)?;

        let rel_type = self
            .relationships
            .get(&source.rel_id)
            .map(|r| r.rel_type.clone())
            .unwrap_or_else(|| TYPE_SLIDE.to_string());
        let target = relative_target(self.main_part(), &part_name);
        let rel_id = self.relationships.add(rel_type, target);

        let content_type = self
            .content_types
            .override_for(&source.part_name)
            .unwrap_or(SLIDE_CONTENT_TYPE)
            .to_string();
        self.content_types.set_override(&part_name, &content_type);

        log::info!(
            "Duplicated slide {} ('{}') as '{}' with {} copied part(s)",
            index,
            source.part_name,
            part_name,
            copies.copied.len()
        );

        self.slides.push(Slide {
            part_name,
            rel_id,
            slide_id: next_slide_id(&self.slides),
            xml: source.xml,
            rels,
        });
        Ok(self.slides.len() - 1)
    }

    /// A fresh part name like `like`, kept from being handed out again
    /// during the same duplication.
    fn reserve_part_name(&self, like: &str, copies: &mut PartCopies) -> String {
        let name = self.unused_part_name(like, &copies.reserved);
        copies.reserved.push(name.clone());
        name
    }

    /// Relationships of `source_part` as the copy of that part needs them:
    /// shared and external targets kept, private targets copied.
    fn copy_relationships(
        &mut self,
        source_part: &str,
        rels: &Relationships,
        copies: &mut PartCopies,
    ) -> Result<Relationships> {
        let mut copied_rels = Relationships::new();
        for rel in rels.iter() {
            if rel.is_external() || SHARED_TARGET_TYPES.iter().any(|t| rel.is_type(t)) {
                copied_rels.push(rel.clone());
                continue;
            }
            if rel.is_type("notesSlide") {
                log::debug!("Not copying notes of '{}' to the duplicate", source_part);
                continue;
            }

            let target_part = resolve_target(source_part, &rel.target);
            let Some(new_part) = self.copy_part(&target_part, copies)? else {
                log::warn!(
                    "Relationship '{}' of '{}' points at missing part '{}'; keeping it as is",
                    rel.id,
                    source_part,
                    target_part
                );
                copied_rels.push(rel.clone());
                continue;
            };

            let file_name = new_part.rsplit('/').next().unwrap_or(&new_part);
            copied_rels.push(Relationship {
                target: with_file_name(&rel.target, file_name),
                ..rel.clone()
            });
        }
        Ok(copied_rels)
    }

    /// Copy a package part, its content-type override, and the private parts
    /// it references to fresh names. `None` when the part does not exist.
    fn copy_part(&mut self, part: &str, copies: &mut PartCopies) -> Result<Option<String>> {
        if let Some(existing) = copies.copied.get(part) {
            return Ok(Some(existing.clone()));
        }
        let Some(bytes) = self.package.get(part).map(<[u8]>::to_vec) else {
            return Ok(None);
        };

        let new_part = self.reserve_part_name(part, copies);
        copies.copied.insert(part.to_string(), new_part.clone());
        self.package.set(new_part.clone(), bytes);
        if let Some(content_type) = self.content_types.override_for(part).map(str::to_string) {
            self.content_types.set_override(&new_part, &content_type);
        }

        let nested = match self.package.get(&rels_path_for(part)) {
            Some(bytes) => Some(Relationships::parse(bytes)?),
            None => None,
        };
        if let Some(nested) = nested {
            let rels = self.copy_relationships(part, &nested, copies)?;
            self.package.set(rels_path_for(&new_part), rels.to_bytes()?);
        }

        log::debug!("Copied part '{}' to '{}'", part, new_part);
        Ok(Some(new_part))
    }

    /// Put the slides in the order given by `order`, a permutation of the
    /// current slide indices.
    pub fn reorder_slides(&mut self, order: &[usize]) -> Result<()> {
        let count = self.slides.len();
        let mut seen = vec![false; count];
        for &index in order {
            if index >= count || std::mem::replace(&mut seen[index], true) {
                return Err(Error::Internal(format!(
                    "invalid slide order {:?} for {} slide(s)",
                    order, count
                )));
            }
        }
        if order.len() != count {
            return Err(Error::Internal(format!(
                "slide order lists {} of {} slide(s)",
                order.len(),
                count
            )));
        }

        let mut slots: Vec<Option<Slide>> = self.slides.drain(..).map(Some).collect();
        self.slides = order.iter().filter_map(|&i| slots[i].take()).collect();
        Ok(())
    }
}

/// Target of `part` relative to the folder of `source_part`.
fn relative_target(source_part: &str, part: &str) -> String {
    let dir = source_part.rsplit_once('/').map_or("", |(dir, _)| dir);
    if dir.is_empty() {
        return part.to_string();
    }
    match part.strip_prefix(dir).and_then(|rest| rest.strip_prefix('/')) {
        Some(relative) => relative.to_string(),
        None => format!("/{}", part),
    }
}
