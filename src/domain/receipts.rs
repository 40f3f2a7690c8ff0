// src/domain/receipts.rs

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const DEFAULT_CHUNK_SIZE: usize = 5;

/// An asset queued for check-out, waiting for its hand receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagedOutRecord {
    pub asset: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub serial: String,
    pub to: String,
}

/// A staged-out record without its destination; one row on a receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandReceiptLine {
    pub asset: String,
    pub model: String,
    pub serial: String,
}

/// All lines going to one destination, split into per-document batches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReceiptGroup {
    pub to: String,
    pub chunks: Vec<Vec<HandReceiptLine>>,
}

/// Groups records by destination (first-seen order) and chunks each group.
///
/// A `chunk_size` of zero falls back to [`DEFAULT_CHUNK_SIZE`].
pub fn group_and_chunk(records: &[StagedOutRecord], chunk_size: usize) -> Vec<ReceiptGroup> {
    let size = if chunk_size == 0 {
        DEFAULT_CHUNK_SIZE
    } else {
        chunk_size
    };

    let mut order: Vec<(String, Vec<HandReceiptLine>)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for record in records {
        let line = HandReceiptLine {
            asset: record.asset.clone(),
            model: record.model.clone(),
            serial: record.serial.clone(),
        };

        match index.get(record.to.as_str()) {
            Some(&i) => order[i].1.push(line),
            None => {
                index.insert(record.to.as_str(), order.len());
                order.push((record.to.clone(), vec![line]));
            }
        }
    }

    order
        .into_iter()
        .map(|(to, lines)| ReceiptGroup {
            to,
            chunks: lines.chunks(size).map(<[_]>::to_vec).collect(),
        })
        .collect()
}

/// Normalizes a chunk size coming off the wire.
///
/// Missing, non-finite and non-positive values fall back to the default;
/// fractional values are floored.
pub fn chunk_size_from_raw(raw: Option<f64>) -> usize {
    match raw {
        Some(n) if n.is_finite() && n >= 1.0 => n.floor() as usize,
        _ => DEFAULT_CHUNK_SIZE,
    }
}
