// src/forms/test_support.rs
//! In-memory AcroForm fixtures for tests.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream, StringFormat};

pub enum FixtureField {
    Text(&'static str),
    CheckBox(&'static str),
    /// Parent name, child name; exposed as `parent.child`.
    Nested(&'static str, &'static str),
}

/// One Letter page with a title line and one widget per field.
pub fn form_pdf(fields: &[FixtureField]) -> Vec<u8> {
    let mut doc = base_document("Hand Receipt");
    let page_id = first_page(&doc);

    let mut annots = Vec::new();
    let mut roots = Vec::new();

    for (i, field) in fields.iter().enumerate() {
        let top = 700 - (i as i64) * 30;
        let rect: Vec<Object> = vec![72.into(), (top - 20).into(), 300.into(), top.into()];

        match field {
            FixtureField::Text(name) => {
                let id = doc.add_object(dictionary! {
                    "Type" => "Annot",
                    "Subtype" => "Widget",
                    "FT" => "Tx",
                    "T" => Object::string_literal(*name),
                    "DA" => Object::string_literal("/Helv 0 Tf 0 g"),
                    "Rect" => rect,
                    "P" => page_id,
                });
                annots.push(Object::Reference(id));
                roots.push(Object::Reference(id));
            }
            FixtureField::CheckBox(name) => {
                let on = doc.add_object(Stream::new(
                    dictionary! { "Type" => "XObject", "Subtype" => "Form", "BBox" => vec![0.into(), 0.into(), 20.into(), 20.into()] },
                    b"0 g 4 4 12 12 re f".to_vec(),
                ));
                let off = doc.add_object(Stream::new(
                    dictionary! { "Type" => "XObject", "Subtype" => "Form", "BBox" => vec![0.into(), 0.into(), 20.into(), 20.into()] },
                    Vec::new(),
                ));
                let id = doc.add_object(dictionary! {
                    "Type" => "Annot",
                    "Subtype" => "Widget",
                    "FT" => "Btn",
                    "T" => Object::string_literal(*name),
                    "V" => "Off",
                    "AS" => "Off",
                    "Rect" => vec![72.into(), (top - 20).into(), 92.into(), top.into()],
                    "AP" => dictionary! { "N" => dictionary! { "On" => on, "Off" => off } },
                    "P" => page_id,
                });
                annots.push(Object::Reference(id));
                roots.push(Object::Reference(id));
            }
            FixtureField::Nested(parent, child) => {
                let parent_id = doc.new_object_id();
                let kid = doc.add_object(dictionary! {
                    "Type" => "Annot",
                    "Subtype" => "Widget",
                    "T" => Object::string_literal(*child),
                    "Parent" => parent_id,
                    "Rect" => rect,
                    "P" => page_id,
                });
                doc.objects.insert(
                    parent_id,
                    Object::Dictionary(dictionary! {
                        "T" => Object::string_literal(*parent),
                        "FT" => "Tx",
                        "DA" => Object::string_literal("/Helv 9 Tf 0 g"),
                        "Kids" => vec![Object::Reference(kid)],
                    }),
                );
                annots.push(Object::Reference(kid));
                roots.push(Object::Reference(parent_id));
            }
        }
    }

    doc.get_dictionary_mut(page_id)
        .unwrap()
        .set("Annots", Object::Array(annots));

    let acroform = doc.add_object(dictionary! {
        "Fields" => roots,
        "DA" => Object::string_literal("/Helv 0 Tf 0 g"),
    });
    let root_id = doc.trailer.get(b"Root").unwrap().as_reference().unwrap();
    doc.get_dictionary_mut(root_id)
        .unwrap()
        .set("AcroForm", Object::Reference(acroform));

    save(doc)
}

/// A one-page PDF with a single line of text and no form.
pub fn plain_pdf(text: &str) -> Vec<u8> {
    save(base_document(text))
}

/// Text of every page, one page per line group.
pub fn extract_all_text(doc: &Document) -> String {
    let mut text = String::new();
    for page_num in doc.get_pages().keys() {
        if let Ok(page_text) = doc.extract_text(&[*page_num]) {
            text.push_str(&page_text);
            text.push('\n');
        }
    }
    text
}

fn base_document(title: &str) -> Document {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let content = Content {
        operations: vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 14.into()]),
            Operation::new("Td", vec![72.into(), 740.into()]),
            Operation::new(
                "Tj",
                vec![Object::String(title.as_bytes().to_vec(), StringFormat::Literal)],
            ),
            Operation::new("ET", vec![]),
        ],
    };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        "Contents" => content_id,
        "Resources" => resources_id,
    });

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![Object::Reference(page_id)],
            "Count" => 1,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc
}

fn first_page(doc: &Document) -> ObjectId {
    *doc.get_pages().get(&1).unwrap()
}

fn save(mut doc: Document) -> Vec<u8> {
    let mut out = Vec::new();
    doc.save_to(&mut out).unwrap();
    out
}
