// src/forms/acroform.rs

use crate::forms::text::{decode_text_string, encode_text_string};
use crate::forms::PdfFormError;
use lopdf::{Dictionary, Document, Object, ObjectId};
use std::collections::HashSet;

const FF_MULTILINE: i64 = 1 << 12;
const FF_RADIO: i64 = 1 << 15;
const FF_PUSHBUTTON: i64 = 1 << 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    CheckBox,
    Radio,
    PushButton,
    Choice,
    Signature,
    Other,
}

/// A terminal form field and the widget annotations that display it.
#[derive(Debug, Clone)]
pub struct FormField {
    pub id: ObjectId,
    pub name: String,
    pub kind: FieldKind,
    pub flags: i64,
    pub widgets: Vec<ObjectId>,
}

impl FormField {
    pub fn is_multiline(&self) -> bool {
        self.flags & FF_MULTILINE != 0
    }
}

/// Handle to a text field found by [`PdfForm::text_field`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextField {
    id: ObjectId,
}

/// Handle to a checkbox found by [`PdfForm::check_box`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckBox {
    id: ObjectId,
    widgets: Vec<ObjectId>,
}

/// A parsed PDF together with its interactive form.
pub struct PdfForm {
    pub(crate) doc: Document,
    pub(crate) fields: Vec<FormField>,
}

impl PdfForm {
    /// Parses PDF bytes. Fails only if the bytes are not a readable PDF.
    pub fn load(bytes: &[u8]) -> Result<Self, PdfFormError> {
        let doc = Document::load_mem(bytes)?;
        Ok(Self::from_document(doc))
    }

    /// Reads the field tree; a document without a form has no fields.
    pub fn from_document(doc: Document) -> Self {
        let fields = match root_fields(&doc) {
            Some(roots) => {
                let mut fields = Vec::new();
                let mut seen = HashSet::new();
                for id in roots {
                    collect_fields(&doc, id, &Inherited::default(), &mut seen, &mut fields);
                }
                fields
            }
            None => Vec::new(),
        };

        Self { doc, fields }
    }

    pub fn fields(&self) -> &[FormField] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FormField> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Looks up a text field by its fully qualified name.
    pub fn text_field(&self, name: &str) -> Option<TextField> {
        self.field(name)
            .filter(|f| f.kind == FieldKind::Text)
            .map(|f| TextField { id: f.id })
    }

    /// Looks up a checkbox by its fully qualified name.
    pub fn check_box(&self, name: &str) -> Option<CheckBox> {
        self.field(name)
            .filter(|f| f.kind == FieldKind::CheckBox)
            .map(|f| CheckBox {
                id: f.id,
                widgets: f.widgets.clone(),
            })
    }

    pub fn set_text(&mut self, field: TextField, text: &str) -> Result<(), PdfFormError> {
        let dict = self.doc.get_dictionary_mut(field.id)?;
        dict.set("V", encode_text_string(text));
        Ok(())
    }

    pub fn set_checked(&mut self, field: &CheckBox, checked: bool) -> Result<(), PdfFormError> {
        let mut field_state = None;

        for widget in &field.widgets {
            let on = on_state(&self.doc, self.doc.get_dictionary(*widget)?);
            let state = if checked { on } else { b"Off".to_vec() };
            field_state.get_or_insert_with(|| state.clone());
            self.doc
                .get_dictionary_mut(*widget)?
                .set("AS", Object::Name(state));
        }

        let state = field_state.unwrap_or_else(|| {
            if checked {
                b"Yes".to_vec()
            } else {
                b"Off".to_vec()
            }
        });
        self.doc
            .get_dictionary_mut(field.id)?
            .set("V", Object::Name(state));
        Ok(())
    }

    /// Current text value of a field, if it has one.
    pub fn text_value(&self, id: ObjectId) -> Option<String> {
        let dict = self.doc.get_dictionary(id).ok()?;
        let value = inherited(&self.doc, dict, b"V")?;
        match value {
            Object::String(bytes, _) => Some(decode_text_string(bytes)),
            Object::Name(name) => Some(String::from_utf8_lossy(name).into_owned()),
            Object::Array(items) => {
                let parts: Vec<String> = items
                    .iter()
                    .filter_map(|o| o.as_str().ok().map(decode_text_string))
                    .collect();
                Some(parts.join(", "))
            }
            _ => None,
        }
    }

    pub fn save(mut self) -> Result<Vec<u8>, PdfFormError> {
        let mut out = Vec::new();
        self.doc.save_to(&mut out)?;
        Ok(out)
    }
}

/// Name of the "on" appearance state of a checkbox widget.
pub(crate) fn on_state(doc: &Document, widget: &Dictionary) -> Vec<u8> {
    normal_appearance(doc, widget)
        .and_then(|(_, normal)| normal.as_dict().ok())
        .and_then(|states| {
            states
                .iter()
                .map(|(state, _)| state.clone())
                .find(|state| state.as_slice() != b"Off")
        })
        .unwrap_or_else(|| b"Yes".to_vec())
}

/// The widget's `/AP /N` entry, resolved, with the object id it lives under.
pub(crate) fn normal_appearance<'a>(
    doc: &'a Document,
    widget: &'a Dictionary,
) -> Option<(Option<ObjectId>, &'a Object)> {
    let (_, ap) = doc.dereference(widget.get(b"AP").ok()?).ok()?;
    doc.dereference(ap.as_dict().ok()?.get(b"N").ok()?).ok()
}

fn root_fields(doc: &Document) -> Option<Vec<ObjectId>> {
    let root_id = doc.trailer.get(b"Root").ok()?.as_reference().ok()?;
    let catalog = doc.get_dictionary(root_id).ok()?;
    let (_, acroform) = doc.dereference(catalog.get(b"AcroForm").ok()?).ok()?;
    let (_, fields) = doc
        .dereference(acroform.as_dict().ok()?.get(b"Fields").ok()?)
        .ok()?;

    Some(
        fields
            .as_array()
            .ok()?
            .iter()
            .filter_map(|o| o.as_reference().ok())
            .collect(),
    )
}

#[derive(Default, Clone)]
struct Inherited {
    name: Option<String>,
    kind: Option<Vec<u8>>,
    flags: Option<i64>,
}

fn collect_fields(
    doc: &Document,
    id: ObjectId,
    parent: &Inherited,
    seen: &mut HashSet<ObjectId>,
    out: &mut Vec<FormField>,
) {
    if !seen.insert(id) {
        return;
    }
    let Ok(dict) = doc.get_dictionary(id) else {
        return;
    };

    let partial = dict
        .get(b"T")
        .and_then(Object::as_str)
        .ok()
        .map(decode_text_string);
    let name = match (&parent.name, partial) {
        (Some(p), Some(t)) => Some(format!("{p}.{t}")),
        (None, Some(t)) => Some(t),
        (p, None) => p.clone(),
    };

    let here = Inherited {
        name,
        kind: dict
            .get(b"FT")
            .and_then(Object::as_name)
            .ok()
            .map(<[u8]>::to_vec)
            .or_else(|| parent.kind.clone()),
        flags: dict
            .get(b"Ff")
            .and_then(Object::as_i64)
            .ok()
            .or(parent.flags),
    };

    let kids: Vec<ObjectId> = dict
        .get(b"Kids")
        .and_then(Object::as_array)
        .map(|kids| kids.iter().filter_map(|k| k.as_reference().ok()).collect())
        .unwrap_or_default();

    let (child_fields, widgets): (Vec<ObjectId>, Vec<ObjectId>) =
        kids.into_iter().partition(|kid| {
            doc.get_dictionary(*kid)
                .map(|d| d.has(b"T"))
                .unwrap_or(false)
        });

    for child in child_fields {
        collect_fields(doc, child, &here, seen, out);
    }

    let is_widget = dict
        .get(b"Subtype")
        .and_then(Object::as_name)
        .map(|s| s == b"Widget")
        .unwrap_or(false);

    let widgets = if widgets.is_empty() && is_widget {
        vec![id]
    } else {
        widgets
    };

    if widgets.is_empty() {
        return;
    }
    let Some(name) = here.name else {
        return;
    };

    let flags = here.flags.unwrap_or(0);
    out.push(FormField {
        id,
        name,
        kind: field_kind(here.kind.as_deref(), flags),
        flags,
        widgets,
    });
}

fn field_kind(ft: Option<&[u8]>, flags: i64) -> FieldKind {
    match ft {
        Some(b"Tx") => FieldKind::Text,
        Some(b"Btn") if flags & FF_PUSHBUTTON != 0 => FieldKind::PushButton,
        Some(b"Btn") if flags & FF_RADIO != 0 => FieldKind::Radio,
        Some(b"Btn") => FieldKind::CheckBox,
        Some(b"Ch") => FieldKind::Choice,
        Some(b"Sig") => FieldKind::Signature,
        _ => FieldKind::Other,
    }
}

/// Looks up a key on a field dictionary, walking `/Parent` for inherited values.
pub(crate) fn inherited<'a>(doc: &'a Document, dict: &'a Dictionary, key: &[u8]) -> Option<&'a Object> {
    let mut current = dict;
    for _ in 0..32 {
        if let Ok(value) = current.get(key) {
            return doc.dereference(value).ok().map(|(_, v)| v);
        }
        let parent = current.get(b"Parent").and_then(Object::as_reference).ok()?;
        current = doc.get_dictionary(parent).ok()?;
    }
    None
}
