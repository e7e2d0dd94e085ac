//! Packing-aware line item shared by the sale and purchase editors.
//!
//! The line owns a manual `quantity` and a `price`. While it holds a
//! [`PackingRecord`] the manual quantity is locked: the effective quantity is
//! the record's total and every quantity edit is ignored. Price stays
//! editable at all times.

use rust_decimal::Decimal;
use tracing::debug;

use loomerp_core::{DomainError, DomainResult, UnitOfMeasure, round_for_display};

use crate::config::PackingConfig;
use crate::model::PackingRecord;
use crate::session::PackingSession;
use crate::stepping::StepRule;

/// Outcome of a quantity edit that was not rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityEdit {
    Applied,
    /// A packing record holds the quantity; nothing changed.
    Locked,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineItem {
    unit: UnitOfMeasure,
    label: String,
    rule: StepRule,
    display_scale: u32,
    supports_packing: bool,
    quantity: Decimal,
    price: Decimal,
    packing: Option<PackingRecord>,
    packing_opened: bool,
}

impl LineItem {
    /// New line at the unit's minimum quantity.
    pub fn new(
        unit: UnitOfMeasure,
        label: impl Into<String>,
        price: Decimal,
        config: &PackingConfig,
    ) -> DomainResult<Self> {
        ensure_price(price)?;
        let rule = config.step_policy.rule_for(&unit);
        Ok(Self {
            unit,
            label: label.into(),
            rule,
            display_scale: config.display_scale,
            supports_packing: true,
            quantity: rule.minimum,
            price,
            packing: None,
            packing_opened: false,
        })
    }

    pub fn with_packing_support(mut self, supported: bool) -> Self {
        self.supports_packing = supported;
        self
    }

    /// Start from a manual quantity (validated against the unit policy).
    pub fn with_quantity(mut self, quantity: Decimal) -> DomainResult<Self> {
        self.quantity = self.rule.validate(quantity)?;
        Ok(self)
    }

    /// Restore a line that already carries a saved packing record.
    pub fn with_packing(mut self, record: PackingRecord) -> Self {
        self.quantity = record.total_quantity().value();
        self.packing = Some(record);
        self
    }

    pub fn unit(&self) -> &UnitOfMeasure {
        &self.unit
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn step_rule(&self) -> StepRule {
        self.rule
    }

    pub fn price(&self) -> Decimal {
        self.price
    }

    pub fn packing(&self) -> Option<&PackingRecord> {
        self.packing.as_ref()
    }

    pub fn packing_opened(&self) -> bool {
        self.packing_opened
    }

    pub fn is_quantity_locked(&self) -> bool {
        self.packing.is_some()
    }

    /// Quantity used for pricing: the packing total when present.
    pub fn effective_quantity(&self) -> Decimal {
        match &self.packing {
            Some(record) => record.total_quantity().value(),
            None => self.quantity,
        }
    }

    /// Price times effective quantity; a validation error past the decimal
    /// range.
    pub fn line_total(&self) -> DomainResult<Decimal> {
        self.price
            .checked_mul(self.effective_quantity())
            .ok_or_else(|| {
                DomainError::validation(format!("line total for '{}' is out of range", self.label))
            })
    }

    pub fn display_total(&self) -> DomainResult<Decimal> {
        Ok(round_for_display(self.line_total()?, self.display_scale))
    }

    pub fn packing_summary(&self) -> Option<String> {
        self.packing.as_ref().map(|r| r.summary(&self.unit))
    }

    // ---- manual quantity ----

    pub fn increment(&mut self) -> DomainResult<QuantityEdit> {
        if self.ignore_if_locked() {
            return Ok(QuantityEdit::Locked);
        }
        self.quantity = self.rule.increment(self.quantity)?;
        Ok(QuantityEdit::Applied)
    }

    pub fn decrement(&mut self) -> QuantityEdit {
        if self.ignore_if_locked() {
            return QuantityEdit::Locked;
        }
        self.quantity = self.rule.decrement(self.quantity);
        QuantityEdit::Applied
    }

    /// Direct entry. Values violating the unit policy are rejected and leave
    /// the quantity unchanged.
    pub fn set_quantity(&mut self, value: Decimal) -> DomainResult<QuantityEdit> {
        if self.ignore_if_locked() {
            return Ok(QuantityEdit::Locked);
        }
        self.quantity = self.rule.validate(value)?;
        Ok(QuantityEdit::Applied)
    }

    /// Text-field variant: empty input resets to the unit minimum.
    pub fn set_quantity_text(&mut self, text: &str) -> DomainResult<QuantityEdit> {
        if self.ignore_if_locked() {
            return Ok(QuantityEdit::Locked);
        }
        let text = text.trim();
        if text.is_empty() {
            self.quantity = self.rule.minimum;
            return Ok(QuantityEdit::Applied);
        }
        let value: Decimal = text
            .parse()
            .map_err(|_| DomainError::validation(format!("'{text}' is not a number")))?;
        self.set_quantity(value)
    }

    pub fn set_price(&mut self, price: Decimal) -> DomainResult<()> {
        ensure_price(price)?;
        self.price = price;
        Ok(())
    }

    // ---- packing ----

    /// Open the packing dialog, pre-loaded with the current record.
    ///
    /// Marks the line as having an unsaved packing edit until the session is
    /// saved or explicitly cancelled.
    pub fn open_packing(&mut self) -> DomainResult<PackingSession> {
        if !self.supports_packing {
            return Err(DomainError::validation(format!(
                "packing entry is not enabled for '{}'",
                self.label
            )));
        }
        self.packing_opened = true;
        Ok(PackingSession::load(
            self.packing.as_ref(),
            self.unit.clone(),
            self.label.clone(),
        ))
    }

    /// Store the session's record, replacing any previous one. Returns the
    /// summary string.
    pub fn save_packing(&mut self, session: &PackingSession) -> DomainResult<String> {
        let saved = session.save()?;
        self.quantity = saved.record.total_quantity().value();
        self.packing = Some(saved.record);
        self.packing_opened = false;
        Ok(saved.summary)
    }

    /// Close the dialog without saving; the previous record (if any) stays.
    pub fn cancel_packing(&mut self) {
        self.packing_opened = false;
    }

    /// Drop the record and unlock the manual quantity.
    ///
    /// The last packing total becomes the manual quantity, snapped to the
    /// unit's step rule (a 2.5 total on a whole-number unit becomes 3).
    pub fn clear_packing(&mut self) -> Option<PackingRecord> {
        let previous = self.packing.take();
        if let Some(record) = &previous {
            self.quantity = self.rule.snap(record.total_quantity().value());
            debug!(line = %self.label, quantity = %self.quantity, "packing cleared; quantity unlocked");
        }
        previous
    }

    /// Checks run before the enclosing document is submitted.
    pub fn validate_for_submit(&self) -> DomainResult<()> {
        if self.packing_opened {
            return Err(DomainError::validation(format!(
                "packing entry for '{}' was opened but not saved",
                self.label
            )));
        }
        match &self.packing {
            None => {
                self.rule.validate(self.quantity)?;
            }
            Some(record) if record.total_quantity().value() < self.rule.minimum => {
                return Err(DomainError::validation(format!(
                    "quantity for '{}' must be at least {}",
                    self.label,
                    self.rule.minimum.normalize()
                )));
            }
            Some(_) => {}
        }
        if self.price <= Decimal::ZERO {
            return Err(DomainError::validation(format!(
                "price for '{}' must be greater than zero",
                self.label
            )));
        }
        self.line_total()?;
        Ok(())
    }

    fn ignore_if_locked(&self) -> bool {
        if self.packing.is_some() {
            debug!(line = %self.label, "quantity locked by packing; edit ignored");
            return true;
        }
        false
    }
}

fn ensure_price(price: Decimal) -> DomainResult<()> {
    if price < Decimal::ZERO {
        return Err(DomainError::validation("price cannot be negative"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PackingMode;

    fn dec(v: i64, scale: u32) -> Decimal {
        Decimal::new(v, scale)
    }

    fn meter_line() -> LineItem {
        LineItem::new(UnitOfMeasure::meter(), "Cotton Fabric", dec(500, 0), &PackingConfig::default())
            .unwrap()
    }

    fn piece_line() -> LineItem {
        LineItem::new(UnitOfMeasure::piece(), "Silk Dupatta", dec(4000, 0), &PackingConfig::default())
            .unwrap()
    }

    fn packed(line: &mut LineItem, quantities: &[i64]) -> String {
        let mut session = line.open_packing().unwrap();
        let b = session.add_box().unwrap();
        for q in quantities {
            let p = session.add_piece(&b).unwrap();
            session.update_piece_quantity(&b, &p, dec(*q, 0)).unwrap();
        }
        line.save_packing(&session).unwrap()
    }

    #[test]
    fn new_line_starts_at_unit_minimum() {
        assert_eq!(meter_line().effective_quantity(), dec(25, 2));
        assert_eq!(piece_line().effective_quantity(), Decimal::ONE);
    }

    #[test]
    fn stepping_follows_unit() {
        let mut line = meter_line().with_quantity(Decimal::ONE).unwrap();
        assert_eq!(line.increment().unwrap(), QuantityEdit::Applied);
        assert_eq!(line.effective_quantity(), dec(125, 2));

        let mut line = piece_line();
        line.increment().unwrap();
        assert_eq!(line.effective_quantity(), dec(2, 0));
        line.decrement();
        line.decrement();
        assert_eq!(line.effective_quantity(), Decimal::ONE);
    }

    #[test]
    fn direct_entry_rejects_fraction_for_piece_unit() {
        let mut line = piece_line();
        assert!(line.set_quantity(dec(15, 1)).is_err());
        assert_eq!(line.effective_quantity(), Decimal::ONE);
        assert!(line.set_quantity_text("0").is_err());
        assert!(line.set_quantity_text("abc").is_err());
        assert_eq!(line.set_quantity_text("3").unwrap(), QuantityEdit::Applied);
        assert_eq!(line.effective_quantity(), dec(3, 0));
        assert_eq!(line.set_quantity_text("").unwrap(), QuantityEdit::Applied);
        assert_eq!(line.effective_quantity(), Decimal::ONE);
    }

    #[test]
    fn packing_locks_quantity() {
        let mut line = meter_line();
        let summary = packed(&mut line, &[6, 5]);
        assert_eq!(summary, "1 boxes • 2 pieces • 11 Meter");
        assert!(line.is_quantity_locked());
        assert!(!line.packing_opened());

        assert_eq!(line.decrement(), QuantityEdit::Locked);
        assert_eq!(line.increment().unwrap(), QuantityEdit::Locked);
        assert_eq!(line.set_quantity(dec(3, 0)).unwrap(), QuantityEdit::Locked);
        assert_eq!(line.set_quantity_text("7").unwrap(), QuantityEdit::Locked);
        assert_eq!(line.effective_quantity(), dec(11, 0));
    }

    #[test]
    fn price_stays_editable_and_drives_total() {
        let mut line = meter_line();
        packed(&mut line, &[11]);
        line.set_price(dec(12345, 3)).unwrap();
        assert_eq!(line.line_total().unwrap(), dec(135795, 3));
        assert_eq!(line.display_total().unwrap(), dec(13580, 2));
        assert!(line.set_price(dec(-1, 0)).is_err());
    }

    #[test]
    fn clearing_packing_unlocks_quantity() {
        let mut line = meter_line();
        packed(&mut line, &[11]);
        let previous = line.clear_packing();
        assert!(previous.is_some());
        assert!(!line.is_quantity_locked());
        assert_eq!(line.effective_quantity(), dec(11, 0));
        assert_eq!(line.increment().unwrap(), QuantityEdit::Applied);
        assert_eq!(line.effective_quantity(), dec(1125, 2));
    }

    #[test]
    fn clearing_packing_snaps_whole_units_up() {
        let mut line = piece_line();
        let mut session = line.open_packing().unwrap();
        let loose = session.add_loose_piece().unwrap();
        session.update_loose_piece_quantity(&loose, dec(25, 1)).unwrap();
        line.save_packing(&session).unwrap();
        assert_eq!(line.effective_quantity(), dec(25, 1));

        line.clear_packing();
        assert_eq!(line.effective_quantity(), dec(3, 0));
        assert!(line.validate_for_submit().is_ok());

        line.increment().unwrap();
        assert_eq!(line.effective_quantity(), dec(4, 0));
        assert!(line.validate_for_submit().is_ok());
    }

    #[test]
    fn oversized_line_total_is_an_error() {
        let mut line = piece_line().with_quantity(Decimal::MAX).unwrap();
        assert!(matches!(line.line_total(), Err(DomainError::Validation(_))));
        assert!(line.validate_for_submit().is_err());
        assert!(line.increment().is_err());
        assert_eq!(line.effective_quantity(), Decimal::MAX);
    }

    #[test]
    fn abandoned_packing_blocks_submit() {
        let mut line = meter_line();
        let _session = line.open_packing().unwrap();
        assert!(line.packing_opened());
        let err = line.validate_for_submit().unwrap_err();
        assert!(matches!(err, DomainError::Validation(msg) if msg.contains("opened but not saved")));
    }

    #[test]
    fn cancel_keeps_previous_record() {
        let mut line = meter_line();
        packed(&mut line, &[4]);
        let before = line.packing().cloned();

        let mut session = line.open_packing().unwrap();
        let b = session.add_box().unwrap();
        let p = session.add_piece(&b).unwrap();
        session.update_piece_quantity(&b, &p, dec(99, 0)).unwrap();
        line.cancel_packing();

        assert_eq!(line.packing().cloned(), before);
        assert!(line.validate_for_submit().is_ok());
    }

    #[test]
    fn failed_save_keeps_line_unchanged() {
        let mut line = meter_line();
        let session = line.open_packing().unwrap();
        assert!(line.save_packing(&session).is_err());
        assert!(line.packing().is_none());
        assert!(line.packing_opened());
    }

    #[test]
    fn reopening_quick_packing_restores_quick_mode() {
        let mut line = meter_line();
        let mut session = line.open_packing().unwrap();
        session.set_mode(PackingMode::Quick);
        session.set_lump_sum_quantity(dec(120, 0));
        session.set_lump_sum_pieces(40);
        line.save_packing(&session).unwrap();

        let reopened = line.open_packing().unwrap();
        assert_eq!(reopened.mode(), PackingMode::Quick);
        assert_eq!(reopened.lump_sum_pieces(), 40);
    }

    #[test]
    fn products_without_packing_refuse_to_open() {
        let mut line = meter_line().with_packing_support(false);
        assert!(line.open_packing().is_err());
        assert!(!line.packing_opened());
    }

    #[test]
    fn zero_price_blocks_submit() {
        let line = LineItem::new(UnitOfMeasure::piece(), "Free", Decimal::ZERO, &PackingConfig::default())
            .unwrap();
        assert!(line.validate_for_submit().is_err());
    }
}
