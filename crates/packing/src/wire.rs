//! Persistence boundary for packing records.
//!
//! Stored documents look like
//!
//! ```json
//! { "boxes": [{ "id": "b1", "pieces": [{ "id": "p1", "quantity": 3.5 }] }],
//!   "loose_pieces": [{ "id": "p2", "quantity": 1 }],
//!   "total_quantity": 4.5,
//!   "piece_count": 12 }
//! ```
//!
//! Older clients wrote the same keys in camelCase. Reading accepts either
//! casing; writing uses [`PackingConfig::casing`]. The engine's own types
//! never see the casing question.

use core::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use loomerp_core::{DomainError, Entity, Quantity};

use crate::config::{FieldCasing, PackingConfig};
use crate::model::{BoxId, PackingBox, PackingMode, PackingRecord, Piece, PieceId};

/// Snake-case key -> camelCase key, for the keys whose spelling differs.
const CAMEL_KEYS: [(&str, &str); 3] = [
    ("loose_pieces", "loosePieces"),
    ("total_quantity", "totalQuantity"),
    ("piece_count", "pieceCount"),
];

#[derive(Debug, Error)]
pub enum WireError {
    #[error("malformed packing document: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("inconsistent packing document: {0}")]
    Shape(String),
}

#[derive(Debug, Serialize, Deserialize)]
struct PieceDoc {
    #[serde(default, deserialize_with = "lenient_id")]
    id: String,
    #[serde(default, deserialize_with = "lenient_quantity")]
    quantity: Quantity,
}

#[derive(Debug, Serialize, Deserialize)]
struct BoxDoc {
    #[serde(default, deserialize_with = "lenient_id")]
    id: String,
    #[serde(default)]
    pieces: Vec<PieceDoc>,
}

#[derive(Debug, Serialize, Deserialize)]
struct PackingDoc {
    #[serde(default)]
    boxes: Vec<BoxDoc>,
    #[serde(default, alias = "loosePieces")]
    loose_pieces: Vec<PieceDoc>,
    #[serde(
        default,
        alias = "totalQuantity",
        deserialize_with = "lenient_optional_quantity",
        skip_serializing_if = "Option::is_none"
    )]
    total_quantity: Option<Quantity>,
    #[serde(
        default,
        alias = "pieceCount",
        deserialize_with = "lenient_piece_count",
        skip_serializing_if = "Option::is_none"
    )]
    piece_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    mode: Option<PackingMode>,
}

/// A record read from storage, with what the reader noticed about it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedPacking {
    pub record: PackingRecord,
    /// Classified as quick from shape alone (no explicit `mode` key).
    pub ambiguous: bool,
    /// Stored total when it disagreed with the pieces.
    pub stored_total_mismatch: Option<Quantity>,
}

/// Encode a record as a persisted document.
pub fn to_json(record: &PackingRecord, config: &PackingConfig) -> Result<Value, WireError> {
    let doc = PackingDoc {
        boxes: record
            .boxes()
            .iter()
            .map(|b| BoxDoc {
                id: b.id().to_string(),
                pieces: b.pieces().iter().map(piece_doc).collect(),
            })
            .collect(),
        loose_pieces: record.loose_pieces().iter().map(piece_doc).collect(),
        total_quantity: Some(record.total_quantity()),
        piece_count: record.piece_count(),
        mode: config.persist_mode_tag.then_some(record.mode()),
    };

    let value = serde_json::to_value(doc)?;
    Ok(apply_casing(value, config.casing))
}

/// Decode a persisted document into a record.
pub fn from_json(value: Value) -> Result<PackingRecord, WireError> {
    decode(value).map(|decoded| decoded.record)
}

/// Decode a persisted document, keeping classification diagnostics.
///
/// Accepts the document itself or a JSON string containing it.
pub fn decode(value: Value) -> Result<DecodedPacking, WireError> {
    let doc: PackingDoc = match value {
        Value::String(text) => serde_json::from_str(&text)?,
        other => serde_json::from_value(other)?,
    };

    let detected = PackingMode::detect(doc.piece_count, doc.boxes.len(), doc.loose_pieces.len());
    let mode = doc.mode.unwrap_or(detected);
    if mode == PackingMode::Quick && detected != PackingMode::Quick {
        return Err(WireError::Shape(
            "quick packing needs a piece count, no boxes and exactly one loose piece".into(),
        ));
    }
    let ambiguous = doc.mode.is_none() && mode == PackingMode::Quick;

    let boxes = doc
        .boxes
        .into_iter()
        .map(|b| -> Result<PackingBox, DomainError> {
            let pieces = b
                .pieces
                .into_iter()
                .map(piece)
                .collect::<Result<Vec<_>, DomainError>>()?;
            Ok(PackingBox::new(box_id(b.id)?, pieces))
        })
        .collect::<Result<Vec<_>, DomainError>>()?;
    let loose_pieces = doc
        .loose_pieces
        .into_iter()
        .map(piece)
        .collect::<Result<Vec<_>, DomainError>>()?;

    let record = PackingRecord::restore(mode, boxes, loose_pieces, doc.piece_count)?;

    let stored_total_mismatch = doc
        .total_quantity
        .filter(|stored| *stored != record.total_quantity());
    if let Some(stored) = stored_total_mismatch {
        warn!(
            stored = %stored,
            derived = %record.total_quantity(),
            "stored packing total disagrees with its pieces; using derived total"
        );
    }

    Ok(DecodedPacking {
        record,
        ambiguous,
        stored_total_mismatch,
    })
}

fn piece_doc(piece: &Piece) -> PieceDoc {
    PieceDoc {
        id: piece.id().to_string(),
        quantity: piece.quantity(),
    }
}

fn piece(doc: PieceDoc) -> Result<Piece, DomainError> {
    let id = if doc.id.trim().is_empty() {
        PieceId::generate()
    } else {
        PieceId::parse(doc.id)?
    };
    Ok(Piece::new(id, doc.quantity))
}

fn box_id(raw: String) -> Result<BoxId, DomainError> {
    if raw.trim().is_empty() {
        Ok(BoxId::generate())
    } else {
        BoxId::parse(raw)
    }
}

fn apply_casing(value: Value, casing: FieldCasing) -> Value {
    match (casing, value) {
        (FieldCasing::Camel, Value::Object(map)) => Value::Object(
            map.into_iter()
                .map(|(key, v)| {
                    let renamed = CAMEL_KEYS
                        .iter()
                        .find(|(snake, _)| *snake == key)
                        .map(|(_, camel)| (*camel).to_string())
                        .unwrap_or(key);
                    (renamed, v)
                })
                .collect(),
        ),
        (_, value) => value,
    }
}

// Legacy documents may hold ids as numbers and quantities as strings.

fn lenient_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    })
}

fn quantity_from_value(value: &Value) -> Option<Quantity> {
    let text = match value {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().to_string(),
        _ => return None,
    };
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .ok()
        .map(Quantity::clamped)
}

fn lenient_quantity<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Quantity, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(quantity_from_value(&value).unwrap_or(Quantity::ZERO))
}

fn lenient_optional_quantity<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Quantity>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(quantity_from_value(&value))
}

/// Whole part of a numeric or string count; anything unreadable is absent.
fn lenient_piece_count<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<u32>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(quantity_from_value(&value).and_then(|q| q.value().trunc().to_u32()))
}
