//! In-progress packing edit session.
//!
//! A session is opened from a line item (optionally with its current record),
//! mutated freely, and either saved into a brand-new [`PackingRecord`] or
//! dropped. Nothing reaches the line item before [`PackingSession::save`].

use rust_decimal::Decimal;
use tracing::debug;

use loomerp_core::{DomainError, DomainResult, Entity, Quantity, UnitOfMeasure};

use crate::model::{
    BoxId, PackingBox, PackingMode, PackingRecord, PackingTotals, Piece, PieceId, derive_totals,
};

/// Result of a successful save: the record plus its display summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedPacking {
    pub record: PackingRecord,
    pub summary: String,
}

/// Editing state of the packing dialog for one line item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackingSession {
    unit: UnitOfMeasure,
    product_label: String,
    mode: PackingMode,
    boxes: Vec<PackingBox>,
    loose_pieces: Vec<Piece>,
    // Presentation state: at most one box is expanded.
    expanded_box: Option<BoxId>,
    lump_sum_qty: Quantity,
    lump_sum_pieces: u32,
}

impl PackingSession {
    /// Open a session, pre-filled from an existing record when editing.
    pub fn load(
        existing: Option<&PackingRecord>,
        unit: UnitOfMeasure,
        product_label: impl Into<String>,
    ) -> Self {
        let product_label = product_label.into();

        let session = match existing {
            None => Self {
                unit,
                product_label,
                mode: PackingMode::Detailed,
                boxes: Vec::new(),
                loose_pieces: Vec::new(),
                expanded_box: None,
                lump_sum_qty: Quantity::ZERO,
                lump_sum_pieces: 1,
            },
            Some(record) => {
                let mode = record.mode();
                let (lump_sum_qty, lump_sum_pieces) = match mode {
                    PackingMode::Quick => (
                        record
                            .loose_pieces()
                            .first()
                            .map(Piece::quantity)
                            .unwrap_or(Quantity::ZERO),
                        record.piece_count().unwrap_or(1),
                    ),
                    PackingMode::Detailed => (Quantity::ZERO, 1),
                };
                Self {
                    unit,
                    product_label,
                    mode,
                    boxes: record.boxes().to_vec(),
                    loose_pieces: record.loose_pieces().to_vec(),
                    expanded_box: None,
                    lump_sum_qty,
                    lump_sum_pieces,
                }
            }
        };

        debug!(
            product = %session.product_label,
            mode = %session.mode,
            editing = existing.is_some(),
            "packing session opened"
        );
        session
    }

    pub fn unit(&self) -> &UnitOfMeasure {
        &self.unit
    }

    pub fn product_label(&self) -> &str {
        &self.product_label
    }

    pub fn mode(&self) -> PackingMode {
        self.mode
    }

    /// Switch entry mode. Draft boxes and lump-sum fields are both kept.
    pub fn set_mode(&mut self, mode: PackingMode) {
        self.mode = mode;
    }

    pub fn boxes(&self) -> &[PackingBox] {
        &self.boxes
    }

    pub fn loose_pieces(&self) -> &[Piece] {
        &self.loose_pieces
    }

    pub fn expanded_box(&self) -> Option<&BoxId> {
        self.expanded_box.as_ref()
    }

    pub fn lump_sum_quantity(&self) -> Quantity {
        self.lump_sum_qty
    }

    pub fn lump_sum_pieces(&self) -> u32 {
        self.lump_sum_pieces
    }

    // ---- detailed-mode mutations ----

    /// Append an empty box; it becomes the expanded one.
    pub fn add_box(&mut self) -> DomainResult<BoxId> {
        self.ensure_detailed()?;
        let new_box = PackingBox::empty();
        let id = new_box.id().clone();
        self.boxes.push(new_box);
        self.expanded_box = Some(id.clone());
        Ok(id)
    }

    pub fn remove_box(&mut self, box_id: &BoxId) -> DomainResult<()> {
        self.ensure_detailed()?;
        let index = self.box_index(box_id)?;
        self.boxes.remove(index);
        if self.expanded_box.as_ref() == Some(box_id) {
            self.expanded_box = None;
        }
        Ok(())
    }

    /// Expand a box (collapsing any other) or collapse it if already open.
    pub fn toggle_box(&mut self, box_id: &BoxId) -> DomainResult<()> {
        self.box_index(box_id)?;
        if self.expanded_box.as_ref() == Some(box_id) {
            self.expanded_box = None;
        } else {
            self.expanded_box = Some(box_id.clone());
        }
        Ok(())
    }

    /// Append a zero-quantity piece to a box.
    pub fn add_piece(&mut self, box_id: &BoxId) -> DomainResult<PieceId> {
        self.ensure_detailed()?;
        let piece = Piece::placeholder();
        let id = piece.id().clone();
        self.box_mut(box_id)?.pieces_mut().push(piece);
        Ok(id)
    }

    pub fn remove_piece(&mut self, box_id: &BoxId, piece_id: &PieceId) -> DomainResult<()> {
        self.ensure_detailed()?;
        let pieces = self.box_mut(box_id)?.pieces_mut();
        let index = piece_index(pieces, piece_id)?;
        pieces.remove(index);
        Ok(())
    }

    /// Set a boxed piece's quantity; negative input is stored as zero.
    pub fn update_piece_quantity(
        &mut self,
        box_id: &BoxId,
        piece_id: &PieceId,
        value: Decimal,
    ) -> DomainResult<()> {
        self.set_boxed_piece(box_id, piece_id, Quantity::clamped(value))
    }

    /// Text-input variant: non-numeric input is stored as zero.
    pub fn update_piece_quantity_text(
        &mut self,
        box_id: &BoxId,
        piece_id: &PieceId,
        text: &str,
    ) -> DomainResult<()> {
        self.set_boxed_piece(box_id, piece_id, Quantity::parse_clamped(text))
    }

    pub fn add_loose_piece(&mut self) -> DomainResult<PieceId> {
        self.ensure_detailed()?;
        let piece = Piece::placeholder();
        let id = piece.id().clone();
        self.loose_pieces.push(piece);
        Ok(id)
    }

    pub fn remove_loose_piece(&mut self, piece_id: &PieceId) -> DomainResult<()> {
        self.ensure_detailed()?;
        let index = piece_index(&self.loose_pieces, piece_id)?;
        self.loose_pieces.remove(index);
        Ok(())
    }

    pub fn update_loose_piece_quantity(
        &mut self,
        piece_id: &PieceId,
        value: Decimal,
    ) -> DomainResult<()> {
        self.set_loose_piece(piece_id, Quantity::clamped(value))
    }

    pub fn update_loose_piece_quantity_text(
        &mut self,
        piece_id: &PieceId,
        text: &str,
    ) -> DomainResult<()> {
        self.set_loose_piece(piece_id, Quantity::parse_clamped(text))
    }

    // ---- quick-mode fields ----

    pub fn set_lump_sum_quantity(&mut self, value: Decimal) {
        self.lump_sum_qty = Quantity::clamped(value);
    }

    pub fn set_lump_sum_pieces(&mut self, pieces: u32) {
        self.lump_sum_pieces = pieces;
    }

    // ---- derived values (recomputed on every call) ----

    pub fn total_boxes(&self) -> usize {
        self.boxes.len()
    }

    /// Pieces with a positive quantity, across boxes and loose pieces.
    pub fn total_pieces_detailed(&self) -> u64 {
        self.detailed_totals().pieces
    }

    pub fn total_quantity_detailed(&self) -> Quantity {
        self.detailed_totals().quantity
    }

    /// Counters for the current mode, as shown in the dialog footer.
    pub fn totals(&self) -> PackingTotals {
        match self.mode {
            PackingMode::Detailed => self.detailed_totals(),
            PackingMode::Quick => PackingTotals {
                boxes: 0,
                pieces: u64::from(self.lump_sum_pieces),
                quantity: self.lump_sum_qty,
            },
        }
    }

    /// Whether the save action is enabled.
    pub fn can_save(&self) -> bool {
        match self.mode {
            PackingMode::Detailed => self.total_quantity_detailed().is_positive(),
            PackingMode::Quick => self.lump_sum_qty.is_positive() && self.lump_sum_pieces >= 1,
        }
    }

    /// Build the record for the current mode.
    ///
    /// Fails with a validation error exactly when [`can_save`](Self::can_save)
    /// is false.
    pub fn save(&self) -> DomainResult<SavedPacking> {
        let record = match self.mode {
            PackingMode::Quick => PackingRecord::quick(self.lump_sum_qty, self.lump_sum_pieces)?,
            PackingMode::Detailed => {
                PackingRecord::detailed(self.boxes.clone(), self.loose_pieces.clone())?
            }
        };
        let summary = record.summary(&self.unit);

        debug!(
            product = %self.product_label,
            mode = %record.mode(),
            total = %record.total_quantity(),
            "packing saved"
        );

        Ok(SavedPacking { record, summary })
    }

    fn detailed_totals(&self) -> PackingTotals {
        // Quantity edits that would leave the decimal range are rolled back,
        // so the derivation only fails on a corrupt session.
        derive_totals(&self.boxes, &self.loose_pieces).unwrap_or(PackingTotals {
            boxes: self.boxes.len(),
            pieces: 0,
            quantity: Quantity::ZERO,
        })
    }

    /// Keep a quantity edit only if the detailed total stays in range.
    fn keep_if_in_range(&mut self, revert: impl FnOnce(&mut Self)) -> DomainResult<()> {
        if let Err(err) = derive_totals(&self.boxes, &self.loose_pieces) {
            revert(self);
            return Err(err);
        }
        Ok(())
    }

    fn ensure_detailed(&self) -> DomainResult<()> {
        if self.mode != PackingMode::Detailed {
            return Err(DomainError::invariant(
                "boxes and pieces can only be edited in detailed mode",
            ));
        }
        Ok(())
    }

    fn box_index(&self, box_id: &BoxId) -> DomainResult<usize> {
        self.boxes
            .iter()
            .position(|b| b.id() == box_id)
            .ok_or_else(|| DomainError::not_found(format!("box {box_id}")))
    }

    fn box_mut(&mut self, box_id: &BoxId) -> DomainResult<&mut PackingBox> {
        let index = self.box_index(box_id)?;
        Ok(&mut self.boxes[index])
    }

    fn set_boxed_piece(
        &mut self,
        box_id: &BoxId,
        piece_id: &PieceId,
        quantity: Quantity,
    ) -> DomainResult<()> {
        self.ensure_detailed()?;
        let box_index = self.box_index(box_id)?;
        let pieces = self.boxes[box_index].pieces_mut();
        let index = piece_index(pieces, piece_id)?;
        let previous = pieces[index].quantity();
        pieces[index].set_quantity(quantity);
        self.keep_if_in_range(|session| {
            session.boxes[box_index].pieces_mut()[index].set_quantity(previous);
        })
    }

    fn set_loose_piece(&mut self, piece_id: &PieceId, quantity: Quantity) -> DomainResult<()> {
        self.ensure_detailed()?;
        let index = piece_index(&self.loose_pieces, piece_id)?;
        let previous = self.loose_pieces[index].quantity();
        self.loose_pieces[index].set_quantity(quantity);
        self.keep_if_in_range(|session| session.loose_pieces[index].set_quantity(previous))
    }
}

fn piece_index(pieces: &[Piece], piece_id: &PieceId) -> DomainResult<usize> {
    pieces
        .iter()
        .position(|p| p.id() == piece_id)
        .ok_or_else(|| DomainError::not_found(format!("piece {piece_id}")))
}
