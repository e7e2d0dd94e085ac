//! Packing data model: pieces, boxes and the saved record.

use core::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use loomerp_core::{DomainError, DomainResult, Entity, Quantity, UnitOfMeasure};

/// Identifier of a piece, unique within its container.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PieceId(String);

/// Identifier of a box, unique within its record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BoxId(String);

// Ids are opaque strings: records written by older clients use millisecond
// timestamps, new ones use UUIDv7 text.
macro_rules! impl_opaque_id {
    ($t:ty, $name:literal) => {
        impl $t {
            /// Fresh, time-ordered identifier.
            pub fn generate() -> Self {
                Self(Uuid::now_v7().to_string())
            }

            pub fn parse(raw: impl Into<String>) -> DomainResult<Self> {
                let raw = raw.into();
                if raw.trim().is_empty() {
                    return Err(DomainError::invalid_id(format!("{}: empty", $name)));
                }
                Ok(Self(raw))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $t {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

impl_opaque_id!(PieceId, "PieceId");
impl_opaque_id!(BoxId, "BoxId");

/// Leaf quantity entry.
///
/// A zero quantity means "not filled in yet": the row stays visible but is
/// excluded from piece counts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Piece {
    id: PieceId,
    quantity: Quantity,
}

impl Piece {
    pub fn new(id: PieceId, quantity: Quantity) -> Self {
        Self { id, quantity }
    }

    /// A fresh zero-quantity row.
    pub fn placeholder() -> Self {
        Self::new(PieceId::generate(), Quantity::ZERO)
    }

    pub fn quantity(&self) -> Quantity {
        self.quantity
    }

    pub fn is_filled(&self) -> bool {
        self.quantity.is_positive()
    }

    pub(crate) fn set_quantity(&mut self, quantity: Quantity) {
        self.quantity = quantity;
    }
}

impl Entity for Piece {
    type Id = PieceId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Ordered container of pieces (insertion order is display order).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackingBox {
    id: BoxId,
    pieces: Vec<Piece>,
}

impl PackingBox {
    pub fn new(id: BoxId, pieces: Vec<Piece>) -> Self {
        Self { id, pieces }
    }

    pub fn empty() -> Self {
        Self::new(BoxId::generate(), Vec::new())
    }

    pub fn pieces(&self) -> &[Piece] {
        &self.pieces
    }

    pub fn piece(&self, piece_id: &PieceId) -> Option<&Piece> {
        self.pieces.iter().find(|p| p.id() == piece_id)
    }

    /// Sum of this box's positive piece quantities.
    pub fn total(&self) -> DomainResult<Quantity> {
        filled_total(&self.pieces)
    }

    pub fn filled_pieces(&self) -> usize {
        self.pieces.iter().filter(|p| p.is_filled()).count()
    }

    pub(crate) fn pieces_mut(&mut self) -> &mut Vec<Piece> {
        &mut self.pieces
    }
}

impl Entity for PackingBox {
    type Id = BoxId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// How the packing was entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackingMode {
    /// Boxes and loose pieces enumerated one by one.
    Detailed,
    /// One aggregate quantity plus an entered piece count.
    Quick,
}

impl PackingMode {
    /// Classify an untagged record by its shape.
    ///
    /// Quick iff a positive piece count is present, there are no boxes and
    /// there is exactly one loose piece. A detailed record that happens to
    /// have that shape is indistinguishable and classifies as quick.
    pub fn detect(piece_count: Option<u32>, box_count: usize, loose_count: usize) -> Self {
        let has_piece_count = piece_count.is_some_and(|n| n > 0);
        if has_piece_count && box_count == 0 && loose_count == 1 {
            PackingMode::Quick
        } else {
            PackingMode::Detailed
        }
    }
}

impl fmt::Display for PackingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PackingMode::Detailed => f.write_str("detailed"),
            PackingMode::Quick => f.write_str("quick"),
        }
    }
}

/// Box / piece / quantity counters shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackingTotals {
    pub boxes: usize,
    pub pieces: u64,
    pub quantity: Quantity,
}

impl PackingTotals {
    /// `"<N> boxes • <M> pieces • <Q> <unit>"`.
    pub fn summary(&self, unit: &UnitOfMeasure) -> String {
        format!(
            "{} boxes • {} pieces • {} {}",
            self.boxes, self.pieces, self.quantity, unit
        )
    }
}

/// Detailed-mode counters over a box/loose-piece hierarchy.
///
/// Boxes count regardless of content; pieces and quantity only count rows
/// with a positive quantity. Fails when the quantity sum leaves the decimal
/// range.
pub fn derive_totals(boxes: &[PackingBox], loose_pieces: &[Piece]) -> DomainResult<PackingTotals> {
    let filled = boxes.iter().map(PackingBox::filled_pieces).sum::<usize>()
        + loose_pieces.iter().filter(|p| p.is_filled()).count();

    let quantity = boxes
        .iter()
        .map(|b| &b.pieces[..])
        .chain(std::iter::once(loose_pieces))
        .try_fold(Quantity::ZERO, |acc, pieces| acc.checked_add(filled_total(pieces)?))?;

    Ok(PackingTotals {
        boxes: boxes.len(),
        pieces: filled as u64,
        quantity,
    })
}

fn filled_total(pieces: &[Piece]) -> DomainResult<Quantity> {
    Quantity::try_sum(
        pieces
            .iter()
            .filter(|p| p.is_filled())
            .map(Piece::quantity),
    )
}

/// The saved result of a packing session, owned by exactly one line item.
///
/// Immutable: a new save replaces the record wholesale. `total_quantity`
/// always equals the sum of positive piece quantities across boxes and loose
/// pieces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackingRecord {
    mode: PackingMode,
    boxes: Vec<PackingBox>,
    loose_pieces: Vec<Piece>,
    derived: PackingTotals,
    piece_count: Option<u32>,
}

impl PackingRecord {
    /// Detailed record; rejected when the derived total is not positive.
    pub fn detailed(boxes: Vec<PackingBox>, loose_pieces: Vec<Piece>) -> DomainResult<Self> {
        let record = Self::restore(PackingMode::Detailed, boxes, loose_pieces, None)?;
        if !record.derived.quantity.is_positive() {
            return Err(DomainError::validation(
                "packing total must be greater than zero",
            ));
        }
        Ok(record)
    }

    /// Quick (lump-sum) record: one synthetic loose piece plus a piece count.
    pub fn quick(quantity: Quantity, piece_count: u32) -> DomainResult<Self> {
        if !quantity.is_positive() {
            return Err(DomainError::validation(
                "lump-sum quantity must be greater than zero",
            ));
        }
        if piece_count < 1 {
            return Err(DomainError::validation("piece count must be at least 1"));
        }
        Self::restore(
            PackingMode::Quick,
            Vec::new(),
            vec![Piece::new(PieceId::generate(), quantity)],
            Some(piece_count),
        )
    }

    /// Rebuild a record from stored parts without save-time validation.
    ///
    /// The total is always re-derived from the pieces; an out-of-range sum is
    /// a validation error. Detailed records carry no piece count.
    pub(crate) fn restore(
        mode: PackingMode,
        boxes: Vec<PackingBox>,
        loose_pieces: Vec<Piece>,
        piece_count: Option<u32>,
    ) -> DomainResult<Self> {
        let derived = derive_totals(&boxes, &loose_pieces)?;
        let piece_count = match mode {
            PackingMode::Quick => piece_count,
            PackingMode::Detailed => None,
        };
        Ok(Self {
            mode,
            boxes,
            loose_pieces,
            derived,
            piece_count,
        })
    }

    pub fn mode(&self) -> PackingMode {
        self.mode
    }

    pub fn boxes(&self) -> &[PackingBox] {
        &self.boxes
    }

    pub fn loose_pieces(&self) -> &[Piece] {
        &self.loose_pieces
    }

    pub fn total_quantity(&self) -> Quantity {
        self.derived.quantity
    }

    /// Entered piece count (quick mode only).
    pub fn piece_count(&self) -> Option<u32> {
        self.piece_count
    }

    pub fn find_box(&self, box_id: &BoxId) -> Option<&PackingBox> {
        self.boxes.iter().find(|b| b.id() == box_id)
    }

    /// Counters as displayed: quick mode reports the entered piece count.
    pub fn totals(&self) -> PackingTotals {
        let mut totals = self.derived;
        if let (PackingMode::Quick, Some(count)) = (self.mode, self.piece_count) {
            totals.pieces = u64::from(count);
        }
        totals
    }

    pub fn summary(&self, unit: &UnitOfMeasure) -> String {
        self.totals().summary(unit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn qty(v: i64, scale: u32) -> Quantity {
        Quantity::clamped(Decimal::new(v, scale))
    }

    fn piece(v: i64, scale: u32) -> Piece {
        Piece::new(PieceId::generate(), qty(v, scale))
    }

    #[test]
    fn detect_requires_all_three_shape_conditions() {
        assert_eq!(PackingMode::detect(Some(40), 0, 1), PackingMode::Quick);
        assert_eq!(PackingMode::detect(None, 0, 1), PackingMode::Detailed);
        assert_eq!(PackingMode::detect(Some(0), 0, 1), PackingMode::Detailed);
        assert_eq!(PackingMode::detect(Some(40), 1, 1), PackingMode::Detailed);
        assert_eq!(PackingMode::detect(Some(40), 0, 2), PackingMode::Detailed);
    }

    #[test]
    fn zero_quantity_pieces_are_excluded_from_counts() {
        let b = PackingBox::new(BoxId::generate(), vec![piece(0, 0), piece(5, 0), piece(0, 0)]);
        assert_eq!(b.filled_pieces(), 1);
        assert_eq!(b.total().unwrap(), qty(5, 0));

        let totals = derive_totals(&[b], &[]).unwrap();
        assert_eq!(totals.boxes, 1);
        assert_eq!(totals.pieces, 1);
        assert_eq!(totals.quantity, qty(5, 0));
    }

    #[test]
    fn empty_hierarchy_has_zero_totals_and_cannot_be_saved() {
        let totals = derive_totals(&[], &[]).unwrap();
        assert_eq!(totals.boxes, 0);
        assert_eq!(totals.pieces, 0);
        assert_eq!(totals.quantity, Quantity::ZERO);

        let err = PackingRecord::detailed(Vec::new(), Vec::new()).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn empty_boxes_still_count_as_boxes() {
        let totals =
            derive_totals(&[PackingBox::empty(), PackingBox::empty()], &[piece(1, 0)]).unwrap();
        assert_eq!(totals.boxes, 2);
        assert_eq!(totals.pieces, 1);
    }

    #[test]
    fn quick_record_has_single_loose_piece_and_piece_count() {
        let record = PackingRecord::quick(qty(120, 0), 40).unwrap();
        assert_eq!(record.mode(), PackingMode::Quick);
        assert!(record.boxes().is_empty());
        assert_eq!(record.loose_pieces().len(), 1);
        assert_eq!(record.loose_pieces()[0].quantity(), qty(120, 0));
        assert_eq!(record.total_quantity(), qty(120, 0));
        assert_eq!(record.piece_count(), Some(40));
        assert_eq!(record.summary(&UnitOfMeasure::meter()), "0 boxes • 40 pieces • 120 Meter");
    }

    #[test]
    fn quick_record_rejects_non_positive_inputs() {
        assert!(PackingRecord::quick(Quantity::ZERO, 3).is_err());
        assert!(PackingRecord::quick(qty(10, 0), 0).is_err());
    }

    #[test]
    fn restore_drops_piece_count_for_detailed_records() {
        let record =
            PackingRecord::restore(PackingMode::Detailed, Vec::new(), vec![piece(2, 0), piece(3, 0)], Some(7))
                .unwrap();
        assert_eq!(record.piece_count(), None);
        assert_eq!(record.total_quantity(), qty(5, 0));
        assert_eq!(record.totals().pieces, 2);
    }

    #[test]
    fn out_of_range_sum_is_a_validation_error() {
        let huge = || Piece::new(PieceId::generate(), Quantity::clamped(Decimal::MAX));
        let boxes = vec![PackingBox::new(BoxId::generate(), vec![huge()])];

        let err = derive_totals(&boxes, &[huge()]).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        assert!(PackingRecord::detailed(boxes, vec![huge()]).is_err());
        assert!(PackingRecord::detailed(Vec::new(), vec![huge()]).is_ok());
    }

    #[test]
    fn box_ids_are_unique() {
        assert_ne!(BoxId::generate(), BoxId::generate());
        assert!(PieceId::parse("  ").is_err());
        assert_eq!(PieceId::parse("1712345678901").unwrap().as_str(), "1712345678901");
    }
}
