// src/forms/merge.rs

use crate::forms::acroform::inherited;
use crate::forms::PdfFormError;
use lopdf::{Document, Object, ObjectId};
use std::collections::HashMap;

/// Page attributes that may live on an ancestor `/Pages` node.
const INHERITABLE: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Copies objects from one document into another, remapping references.
struct ObjectCopier<'a> {
    source: &'a Document,
    target: &'a mut Document,
    id_map: HashMap<ObjectId, ObjectId>,
}

impl<'a> ObjectCopier<'a> {
    fn new(source: &'a Document, target: &'a mut Document) -> Self {
        Self {
            source,
            target,
            id_map: HashMap::new(),
        }
    }

    fn copy_object(&mut self, source_id: ObjectId) -> Result<ObjectId, lopdf::Error> {
        if let Some(target_id) = self.id_map.get(&source_id) {
            return Ok(*target_id);
        }

        // Reserve the id before recursing so reference cycles terminate.
        let new_id = self.target.add_object(Object::Null);
        self.id_map.insert(source_id, new_id);

        let obj = self.source.get_object(source_id)?.clone();
        let new_obj = self.remap(obj)?;
        self.target.objects.insert(new_id, new_obj);

        Ok(new_id)
    }

    fn remap(&mut self, obj: Object) -> Result<Object, lopdf::Error> {
        match obj {
            Object::Reference(id) => Ok(Object::Reference(self.copy_object(id)?)),
            Object::Array(items) => Ok(Object::Array(
                items
                    .into_iter()
                    .map(|o| self.remap(o))
                    .collect::<Result<Vec<_>, _>>()?,
            )),
            Object::Dictionary(mut dict) => {
                for (_, value) in dict.iter_mut() {
                    *value = self.remap(value.clone())?;
                }
                Ok(Object::Dictionary(dict))
            }
            Object::Stream(mut stream) => {
                for (_, value) in stream.dict.iter_mut() {
                    *value = self.remap(value.clone())?;
                }
                Ok(Object::Stream(stream))
            }
            other => Ok(other),
        }
    }

    /// Copies a page without its `/Parent`, pulling inherited attributes onto it.
    fn copy_page(&mut self, page_id: ObjectId, new_parent: ObjectId) -> Result<ObjectId, lopdf::Error> {
        let source = self.source;
        let page = source.get_dictionary(page_id)?;
        let mut flat = page.clone();
        for key in INHERITABLE {
            if !flat.has(key) {
                if let Some(value) = inherited(source, page, key) {
                    flat.set(key.to_vec(), value.clone());
                }
            }
        }
        flat.remove(b"Parent");
        // Annotations would pull the source form's field tree along.
        flat.remove(b"Annots");

        let remapped = self.remap(Object::Dictionary(flat))?;
        let new_id = self.target.add_object(remapped);
        self.target
            .get_dictionary_mut(new_id)?
            .set("Parent", Object::Reference(new_parent));
        Ok(new_id)
    }
}

/// Concatenates the pages of several documents, in order, into one PDF.
pub fn merge_documents(documents: &[Vec<u8>]) -> Result<Vec<u8>, PdfFormError> {
    let (first, rest) = documents.split_first().ok_or(PdfFormError::NothingToMerge)?;
    let mut target = Document::load_mem(first)?;

    let root_id = target.trailer.get(b"Root")?.as_reference()?;
    let pages_id = target
        .get_dictionary(root_id)?
        .get(b"Pages")?
        .as_reference()?;

    for bytes in rest {
        let source = Document::load_mem(bytes)?;
        let mut copier = ObjectCopier::new(&source, &mut target);

        let mut new_kids = Vec::new();
        for page_id in source.get_pages().into_values() {
            new_kids.push(Object::Reference(copier.copy_page(page_id, pages_id)?));
        }

        let pages = target.get_dictionary_mut(pages_id)?;
        let mut kids = pages.get(b"Kids")?.as_array()?.clone();
        let count = pages.get(b"Count")?.as_i64()?;
        let added = new_kids.len() as i64;
        kids.extend(new_kids);
        pages.set("Kids", Object::Array(kids));
        pages.set("Count", count + added);
    }

    let mut out = Vec::new();
    target.save_to(&mut out)?;
    Ok(out)
}
