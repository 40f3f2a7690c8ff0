// src/forms/flatten.rs

use crate::forms::acroform::{inherited, normal_appearance, FieldKind, FormField, PdfForm};
use crate::forms::text::to_win_ansi;
use crate::forms::PdfFormError;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream, StringFormat};
use std::collections::{BTreeMap, HashMap, HashSet};

const FONT_RESOURCE: &str = "FlatHelv";
const DEFAULT_FONT_SIZE: f32 = 10.0;
const MIN_FONT_SIZE: f32 = 4.0;
const PADDING: f32 = 2.0;
/// Rough Helvetica advance width, in ems.
const AVG_CHAR_WIDTH: f32 = 0.5;

/// Drawing queued for one page.
#[derive(Default)]
struct PageOverlay {
    operations: Vec<Operation>,
    uses_font: bool,
    xobjects: Vec<(String, ObjectId)>,
}

#[derive(Debug, Clone, Copy)]
struct Rect {
    x: f32,
    y: f32,
    width: f32,
    height: f32,
}

impl PdfForm {
    /// Burns every field value into page content and removes the form.
    pub fn flatten(&mut self) -> Result<(), PdfFormError> {
        let widget_pages = widget_pages(&self.doc);
        let mut overlays: BTreeMap<ObjectId, PageOverlay> = BTreeMap::new();
        let mut widgets: HashSet<ObjectId> = HashSet::new();

        for field in &self.fields {
            let value = self.text_value(field.id);
            for widget in &field.widgets {
                widgets.insert(*widget);
                let Some(page) = widget_pages.get(widget).copied() else {
                    log::debug!("widget {widget:?} of '{}' is not on any page", field.name);
                    continue;
                };
                let overlay = overlays.entry(page).or_default();
                paint_widget(&self.doc, field, *widget, value.as_deref(), overlay);
            }
        }

        for (page_id, overlay) in overlays {
            apply_overlay(&mut self.doc, page_id, overlay)?;
        }

        remove_widget_annotations(&mut self.doc, &widgets)?;

        let root_id = self.doc.trailer.get(b"Root")?.as_reference()?;
        self.doc.get_dictionary_mut(root_id)?.remove(b"AcroForm");
        self.doc.prune_objects();
        self.fields.clear();

        Ok(())
    }
}

/// Widget annotation -> page it is listed on (falling back to `/P`).
fn widget_pages(doc: &Document) -> HashMap<ObjectId, ObjectId> {
    let mut map = HashMap::new();

    for page_id in doc.get_pages().into_values() {
        let Ok(page) = doc.get_dictionary(page_id) else {
            continue;
        };
        let Some(annots) = page
            .get(b"Annots")
            .ok()
            .and_then(|a| doc.dereference(a).ok())
            .and_then(|(_, a)| a.as_array().ok())
        else {
            continue;
        };
        for annot in annots.iter().filter_map(|a| a.as_reference().ok()) {
            map.insert(annot, page_id);
        }
    }

    for (id, object) in &doc.objects {
        if map.contains_key(id) {
            continue;
        }
        if let Ok(page) = object
            .as_dict()
            .and_then(|d| d.get(b"P"))
            .and_then(Object::as_reference)
        {
            map.insert(*id, page);
        }
    }

    map
}

fn paint_widget(
    doc: &Document,
    field: &FormField,
    widget_id: ObjectId,
    value: Option<&str>,
    overlay: &mut PageOverlay,
) {
    let Ok(widget) = doc.get_dictionary(widget_id) else {
        return;
    };
    let Some(rect) = widget_rect(widget) else {
        return;
    };

    match field.kind {
        FieldKind::Text => {
            let Some(text) = value.filter(|v| !v.is_empty()) else {
                return;
            };
            let size = font_size(doc, widget);
            let align = inherited(doc, widget, b"Q")
                .and_then(|q| q.as_i64().ok())
                .unwrap_or(0);
            draw_text(overlay, rect, text, size, align, field.is_multiline());
        }
        FieldKind::CheckBox | FieldKind::Radio => {
            let state = widget
                .get(b"AS")
                .and_then(Object::as_name)
                .ok()
                .map(<[u8]>::to_vec);
            let Some(state) = state.filter(|s| s.as_slice() != b"Off") else {
                return;
            };
            match state_appearance(doc, widget, &state) {
                Some(stream_id) => paint_xobject(doc, overlay, rect, stream_id),
                None => draw_check(overlay, rect),
            }
        }
        _ => match normal_appearance(doc, widget) {
            Some((Some(stream_id), Object::Stream(_))) => {
                paint_xobject(doc, overlay, rect, stream_id)
            }
            _ => {
                if let Some(text) = value.filter(|v| !v.is_empty()) {
                    draw_text(overlay, rect, text, DEFAULT_FONT_SIZE, 0, false);
                }
            }
        },
    }
}

fn widget_rect(widget: &Dictionary) -> Option<Rect> {
    let coords: Vec<f32> = widget
        .get(b"Rect")
        .and_then(Object::as_array)
        .ok()?
        .iter()
        .filter_map(|o| o.as_float().ok())
        .collect();
    if coords.len() != 4 {
        return None;
    }

    let (x1, x2) = (coords[0].min(coords[2]), coords[0].max(coords[2]));
    let (y1, y2) = (coords[1].min(coords[3]), coords[1].max(coords[3]));
    Some(Rect {
        x: x1,
        y: y1,
        width: x2 - x1,
        height: y2 - y1,
    })
}

/// Font size from the `/DA` string (`/Helv 9 Tf 0 g`); 0 means auto.
fn font_size(doc: &Document, widget: &Dictionary) -> f32 {
    let da = inherited(doc, widget, b"DA")
        .and_then(|da| da.as_str().ok())
        .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
        .or_else(|| acroform_default_appearance(doc));

    da.and_then(|da| {
        let tokens: Vec<&str> = da.split_whitespace().collect();
        tokens
            .iter()
            .position(|t| *t == "Tf")
            .filter(|&i| i > 0)
            .and_then(|i| tokens[i - 1].parse::<f32>().ok())
    })
    .unwrap_or(0.0)
}

fn acroform_default_appearance(doc: &Document) -> Option<String> {
    let root_id = doc.trailer.get(b"Root").ok()?.as_reference().ok()?;
    let catalog = doc.get_dictionary(root_id).ok()?;
    let (_, acroform) = doc.dereference(catalog.get(b"AcroForm").ok()?).ok()?;
    let da = acroform.as_dict().ok()?.get(b"DA").ok()?.as_str().ok()?;
    Some(String::from_utf8_lossy(da).into_owned())
}

fn state_appearance(doc: &Document, widget: &Dictionary, state: &[u8]) -> Option<ObjectId> {
    let (_, normal) = normal_appearance(doc, widget)?;
    normal.as_dict().ok()?.get(state).ok()?.as_reference().ok()
}

fn draw_text(overlay: &mut PageOverlay, rect: Rect, text: &str, size: f32, align: i64, multiline: bool) {
    let lines: Vec<&str> = if multiline {
        text.lines().collect()
    } else {
        vec![text.lines().next().unwrap_or("")]
    };
    let longest = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0) as f32;

    let size = if size > 0.0 {
        size
    } else {
        let by_height = if multiline {
            DEFAULT_FONT_SIZE
        } else {
            (rect.height - PADDING) * 0.75
        };
        let by_width = if longest > 0.0 {
            (rect.width - 2.0 * PADDING) / (longest * AVG_CHAR_WIDTH)
        } else {
            by_height
        };
        by_height.min(by_width).min(12.0).max(MIN_FONT_SIZE)
    };
    let leading = size * 1.15;

    overlay.uses_font = true;
    overlay.operations.push(Operation::new("q", vec![]));
    overlay.operations.push(Operation::new(
        "re",
        vec![
            Object::Real(rect.x),
            Object::Real(rect.y),
            Object::Real(rect.width),
            Object::Real(rect.height),
        ],
    ));
    overlay.operations.push(Operation::new("W", vec![]));
    overlay.operations.push(Operation::new("n", vec![]));
    overlay.operations.push(Operation::new("BT", vec![]));
    overlay
        .operations
        .push(Operation::new("Tf", vec![FONT_RESOURCE.into(), Object::Real(size)]));
    overlay.operations.push(Operation::new("g", vec![Object::Real(0.0)]));

    let first_baseline = if multiline {
        rect.y + rect.height - PADDING - size
    } else {
        rect.y + (rect.height - size) / 2.0 + size * 0.22
    };

    for (i, line) in lines.iter().enumerate() {
        let width = line.chars().count() as f32 * size * AVG_CHAR_WIDTH;
        let x = match align {
            1 => rect.x + (rect.width - width) / 2.0,
            2 => rect.x + rect.width - PADDING - width,
            _ => rect.x + PADDING,
        };
        let y = first_baseline - i as f32 * leading;

        overlay.operations.push(Operation::new(
            "Tm",
            vec![
                Object::Real(1.0),
                Object::Real(0.0),
                Object::Real(0.0),
                Object::Real(1.0),
                Object::Real(x.max(rect.x)),
                Object::Real(y),
            ],
        ));
        overlay.operations.push(Operation::new(
            "Tj",
            vec![Object::String(to_win_ansi(line), StringFormat::Literal)],
        ));
    }

    overlay.operations.push(Operation::new("ET", vec![]));
    overlay.operations.push(Operation::new("Q", vec![]));
}

fn draw_check(overlay: &mut PageOverlay, rect: Rect) {
    let w = rect.width;
    let h = rect.height;
    let point = |fx: f32, fy: f32| vec![Object::Real(rect.x + w * fx), Object::Real(rect.y + h * fy)];

    overlay.operations.push(Operation::new("q", vec![]));
    overlay.operations.push(Operation::new("G", vec![Object::Real(0.0)]));
    overlay
        .operations
        .push(Operation::new("w", vec![Object::Real((w.min(h) * 0.1).max(0.5))]));
    overlay.operations.push(Operation::new("m", point(0.2, 0.5)));
    overlay.operations.push(Operation::new("l", point(0.42, 0.25)));
    overlay.operations.push(Operation::new("l", point(0.8, 0.78)));
    overlay.operations.push(Operation::new("S", vec![]));
    overlay.operations.push(Operation::new("Q", vec![]));
}

/// Paints an appearance stream so its `/BBox` lands on the widget rectangle.
fn paint_xobject(doc: &Document, overlay: &mut PageOverlay, rect: Rect, stream_id: ObjectId) {
    let bbox = doc
        .get_object(stream_id)
        .and_then(Object::as_stream)
        .ok()
        .and_then(|s| s.dict.get(b"BBox").and_then(Object::as_array).ok())
        .map(|b| b.iter().filter_map(|o| o.as_float().ok()).collect::<Vec<f32>>())
        .filter(|b| b.len() == 4)
        .unwrap_or_else(|| vec![0.0, 0.0, rect.width, rect.height]);

    let bw = (bbox[2] - bbox[0]).abs().max(f32::EPSILON);
    let bh = (bbox[3] - bbox[1]).abs().max(f32::EPSILON);
    let sx = rect.width / bw;
    let sy = rect.height / bh;

    let name = format!("FlatAp{}", overlay.xobjects.len() + 1);
    overlay.xobjects.push((name.clone(), stream_id));

    overlay.operations.push(Operation::new("q", vec![]));
    overlay.operations.push(Operation::new(
        "cm",
        vec![
            Object::Real(sx),
            Object::Real(0.0),
            Object::Real(0.0),
            Object::Real(sy),
            Object::Real(rect.x - bbox[0].min(bbox[2]) * sx),
            Object::Real(rect.y - bbox[1].min(bbox[3]) * sy),
        ],
    ));
    overlay
        .operations
        .push(Operation::new("Do", vec![Object::Name(name.into_bytes())]));
    overlay.operations.push(Operation::new("Q", vec![]));
}

fn apply_overlay(doc: &mut Document, page_id: ObjectId, overlay: PageOverlay) -> Result<(), PdfFormError> {
    if overlay.operations.is_empty() {
        return Ok(());
    }

    if overlay.uses_font {
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });
        add_resource(doc, page_id, b"Font", FONT_RESOURCE, font_id)?;
    }
    for (name, stream_id) in &overlay.xobjects {
        add_resource(doc, page_id, b"XObject", name, *stream_id)?;
    }

    // Isolate the existing content so its graphics state cannot leak into ours.
    let open_id = doc.add_object(Stream::new(dictionary! {}, b"q\n".to_vec()));
    let mut closing = b"\nQ\n".to_vec();
    closing.extend(Content { operations: overlay.operations }.encode()?);
    let close_id = doc.add_object(Stream::new(dictionary! {}, closing));

    let page = doc.get_dictionary(page_id)?;
    let existing = match page.get(b"Contents") {
        Ok(Object::Array(items)) => items.clone(),
        Ok(other) => vec![other.clone()],
        Err(_) => Vec::new(),
    };

    let mut contents = Vec::with_capacity(existing.len() + 2);
    contents.push(Object::Reference(open_id));
    contents.extend(existing);
    contents.push(Object::Reference(close_id));

    doc.get_dictionary_mut(page_id)?
        .set("Contents", Object::Array(contents));
    Ok(())
}

/// Registers `name -> target` under `/Resources /<category>` of a page,
/// materializing inherited or indirect dictionaries as needed.
fn add_resource(
    doc: &mut Document,
    page_id: ObjectId,
    category: &[u8],
    name: &str,
    target: ObjectId,
) -> Result<(), PdfFormError> {
    // None: missing; Some(None): direct dictionary; Some(Some(id)): indirect.
    let current = doc
        .get_dictionary(page_id)?
        .get(b"Resources")
        .ok()
        .map(|r| r.as_reference().ok());
    let resources_ref = match current {
        Some(found) => found,
        None => {
            let inherited = inherited_resources(doc, page_id).unwrap_or_default();
            doc.get_dictionary_mut(page_id)?
                .set("Resources", Object::Dictionary(inherited));
            None
        }
    };

    let resources = match resources_ref {
        Some(id) => doc.get_dictionary_mut(id)?,
        None => doc
            .get_dictionary_mut(page_id)?
            .get_mut(b"Resources")?
            .as_dict_mut()?,
    };

    let category_ref = match resources.get(category).ok().map(|c| c.as_reference().ok()) {
        Some(found) => found,
        None => {
            resources.set(category.to_vec(), Object::Dictionary(Dictionary::new()));
            None
        }
    };

    match category_ref {
        Some(id) => doc.get_dictionary_mut(id)?.set(name, Object::Reference(target)),
        None => resources
            .get_mut(category)?
            .as_dict_mut()?
            .set(name, Object::Reference(target)),
    }

    Ok(())
}

fn inherited_resources(doc: &Document, page_id: ObjectId) -> Option<Dictionary> {
    let page = doc.get_dictionary(page_id).ok()?;
    let (_, resources) = doc.dereference(inherited(doc, page, b"Resources")?).ok()?;
    resources.as_dict().ok().cloned()
}

fn remove_widget_annotations(doc: &mut Document, widgets: &HashSet<ObjectId>) -> Result<(), PdfFormError> {
    let pages: Vec<ObjectId> = doc.get_pages().into_values().collect();

    for page_id in pages {
        let (annots_ref, annots) = match doc.get_dictionary(page_id)?.get(b"Annots") {
            Ok(Object::Reference(id)) => (Some(*id), doc.get_object(*id)?.as_array()?.clone()),
            Ok(other) => (None, other.as_array()?.clone()),
            Err(_) => continue,
        };

        let kept: Vec<Object> = annots
            .into_iter()
            .filter(|a| !is_widget(doc, a, widgets))
            .collect();

        match annots_ref {
            _ if kept.is_empty() => {
                doc.get_dictionary_mut(page_id)?.remove(b"Annots");
            }
            Some(id) => *doc.get_object_mut(id)? = Object::Array(kept),
            None => doc.get_dictionary_mut(page_id)?.set("Annots", Object::Array(kept)),
        }
    }

    Ok(())
}

// Collected field widgets, plus any stray `/Subtype /Widget` annotation.
fn is_widget(doc: &Document, annot: &Object, widgets: &HashSet<ObjectId>) -> bool {
    if matches!(annot.as_reference(), Ok(id) if widgets.contains(&id)) {
        return true;
    }
    doc.dereference(annot)
        .ok()
        .and_then(|(_, obj)| obj.as_dict().ok())
        .and_then(|dict| dict.get(b"Subtype").ok())
        .and_then(|subtype| subtype.as_name().ok())
        .is_some_and(|name| name == b"Widget")
}
