//! Piece-level selection of goods coming back against a saved packing.

use std::collections::BTreeSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use loomerp_core::{DomainError, DomainResult, Entity, Quantity, round_for_display};

use crate::model::{BoxId, PackingMode, PackingRecord, Piece, PieceId};

/// Address of one piece inside a packing record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PieceRef {
    Boxed { box_id: BoxId, piece_id: PieceId },
    Loose { piece_id: PieceId },
}

impl PieceRef {
    pub fn boxed(box_id: BoxId, piece_id: PieceId) -> Self {
        PieceRef::Boxed { box_id, piece_id }
    }

    pub fn loose(piece_id: PieceId) -> Self {
        PieceRef::Loose { piece_id }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnedPiece {
    pub piece: PieceRef,
    pub quantity: Quantity,
}

/// What a return selection amounts to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnSummary {
    /// In record order: boxes first, then loose pieces.
    pub returned_pieces: Vec<ReturnedPiece>,
    /// Boxes whose every filled piece is selected.
    pub returned_boxes: usize,
    pub returned_piece_count: usize,
    #[serde(with = "rust_decimal::serde::float")]
    pub returned_total: Decimal,
}

/// Selection state for one return against one saved detailed packing.
#[derive(Debug, Clone)]
pub struct ReturnSelection {
    record: PackingRecord,
    already_returned: BTreeSet<PieceRef>,
    selected: BTreeSet<PieceRef>,
    display_scale: u32,
}

impl ReturnSelection {
    pub fn new(
        record: PackingRecord,
        already_returned: impl IntoIterator<Item = PieceRef>,
    ) -> DomainResult<Self> {
        if record.mode() != PackingMode::Detailed {
            return Err(DomainError::invariant(
                "piece-level returns need a detailed packing",
            ));
        }
        Ok(Self {
            record,
            already_returned: already_returned.into_iter().collect(),
            selected: BTreeSet::new(),
            display_scale: 2,
        })
    }

    pub fn with_display_scale(mut self, scale: u32) -> Self {
        self.display_scale = scale;
        self
    }

    /// Re-select the pieces of an earlier draft of this return.
    pub fn with_previous(mut self, previous: &ReturnSummary) -> DomainResult<Self> {
        for returned in &previous.returned_pieces {
            self.select(&returned.piece)?;
        }
        Ok(self)
    }

    pub fn record(&self) -> &PackingRecord {
        &self.record
    }

    pub fn is_selected(&self, piece: &PieceRef) -> bool {
        self.selected.contains(piece)
    }

    pub fn is_already_returned(&self, piece: &PieceRef) -> bool {
        self.already_returned.contains(piece)
    }

    /// Select a piece. Selecting twice is a no-op.
    pub fn select(&mut self, piece: &PieceRef) -> DomainResult<()> {
        let found = self.lookup(piece)?;
        if self.already_returned.contains(piece) {
            return Err(DomainError::conflict(format!(
                "piece {} was already returned",
                found.id()
            )));
        }
        if !found.is_filled() {
            return Err(DomainError::validation(format!(
                "piece {} has no quantity to return",
                found.id()
            )));
        }
        self.selected.insert(piece.clone());
        Ok(())
    }

    pub fn deselect(&mut self, piece: &PieceRef) {
        self.selected.remove(piece);
    }

    /// Flip a piece's selection; returns whether it is now selected.
    pub fn toggle(&mut self, piece: &PieceRef) -> DomainResult<bool> {
        if self.selected.remove(piece) {
            debug!(?piece, "return piece deselected");
            return Ok(false);
        }
        self.select(piece)?;
        debug!(?piece, "return piece selected");
        Ok(true)
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }

    pub fn summary(&self) -> ReturnSummary {
        let mut returned_pieces = Vec::new();
        let mut returned_boxes = 0;

        for packing_box in self.record.boxes() {
            let mut filled = 0;
            let mut picked = 0;
            for piece in packing_box.pieces().iter().filter(|p| p.is_filled()) {
                filled += 1;
                let piece_ref = PieceRef::boxed(packing_box.id().clone(), piece.id().clone());
                if self.selected.contains(&piece_ref) {
                    picked += 1;
                    returned_pieces.push(ReturnedPiece {
                        piece: piece_ref,
                        quantity: piece.quantity(),
                    });
                }
            }
            if filled > 0 && picked == filled {
                returned_boxes += 1;
            }
        }

        for piece in self.record.loose_pieces() {
            let piece_ref = PieceRef::loose(piece.id().clone());
            if self.selected.contains(&piece_ref) {
                returned_pieces.push(ReturnedPiece {
                    piece: piece_ref,
                    quantity: piece.quantity(),
                });
            }
        }

        // A subset of the record's filled pieces, so bounded by its total.
        let total = Quantity::try_sum(returned_pieces.iter().map(|p| p.quantity))
            .unwrap_or_else(|_| self.record.total_quantity());
        ReturnSummary {
            returned_piece_count: returned_pieces.len(),
            returned_pieces,
            returned_boxes,
            returned_total: round_for_display(total.value(), self.display_scale),
        }
    }

    fn lookup(&self, piece: &PieceRef) -> DomainResult<&Piece> {
        let found = match piece {
            PieceRef::Boxed { box_id, piece_id } => self
                .record
                .find_box(box_id)
                .and_then(|b| b.piece(piece_id)),
            PieceRef::Loose { piece_id } => self
                .record
                .loose_pieces()
                .iter()
                .find(|p| p.id() == piece_id),
        };
        found.ok_or_else(|| DomainError::not_found("packing piece"))
    }
}
