//! Sale documents whose lines carry packing-aware quantities.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use loomerp_core::{
    Aggregate, AggregateId, AggregateRoot, DomainError, DomainResult, Event, LineId, TenantId,
    round_for_display,
};
use loomerp_packing::{LineItem, PackingConfig};
use loomerp_products::{PriceTier, Product, ProductId};

/// Sale identifier (tenant-scoped via `tenant_id` fields in events/commands).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SaleId(pub AggregateId);

impl SaleId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for SaleId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaleStatus {
    Draft,
    Final,
}

/// Start a sale line for `product` at the tier's selling price.
pub fn new_line_item(
    product: &Product,
    tier: PriceTier,
    config: &PackingConfig,
) -> Result<LineItem, DomainError> {
    Ok(LineItem::new(
        product.unit().clone(),
        product.name(),
        product.sale_price(tier),
        config,
    )?
    .with_packing_support(product.supports_packing()))
}

/// One item on a sale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaleLine {
    pub line_id: LineId,
    pub product_id: ProductId,
    pub variation: Option<String>,
    pub item: LineItem,
}

impl SaleLine {
    /// Packing total when packed, manual quantity otherwise.
    pub fn quantity(&self) -> Decimal {
        self.item.effective_quantity()
    }

    pub fn unit_price(&self) -> Decimal {
        self.item.price()
    }

    pub fn line_total(&self) -> DomainResult<Decimal> {
        self.item.line_total()
    }
}

/// Aggregate root: Sale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sale {
    id: SaleId,
    tenant_id: Option<TenantId>,
    customer: String,
    status: SaleStatus,
    lines: Vec<SaleLine>,
    version: u64,
    created: bool,
}

impl Sale {
    /// Create an empty, not-yet-created aggregate instance for rehydration.
    pub fn empty(id: SaleId) -> Self {
        Self {
            id,
            tenant_id: None,
            customer: String::new(),
            status: SaleStatus::Draft,
            lines: Vec::new(),
            version: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> SaleId {
        self.id
    }

    pub fn tenant_id(&self) -> Option<TenantId> {
        self.tenant_id
    }

    pub fn customer(&self) -> &str {
        &self.customer
    }

    pub fn status(&self) -> SaleStatus {
        self.status
    }

    pub fn lines(&self) -> &[SaleLine] {
        &self.lines
    }

    pub fn line(&self, line_id: LineId) -> Option<&SaleLine> {
        self.lines.iter().find(|l| l.line_id == line_id)
    }

    pub fn is_modifiable(&self) -> bool {
        matches!(self.status, SaleStatus::Draft)
    }

    /// Sum of line totals; a validation error past the decimal range.
    pub fn total(&self) -> DomainResult<Decimal> {
        self.lines.iter().try_fold(Decimal::ZERO, |acc, line| {
            acc.checked_add(line.line_total()?)
                .ok_or_else(|| DomainError::validation("document total is out of range"))
        })
    }

    /// Total rounded to 2 places.
    pub fn display_total(&self) -> DomainResult<Decimal> {
        Ok(round_for_display(self.total()?, 2))
    }
}

impl AggregateRoot for Sale {
    type Id = SaleId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: CreateSale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateSale {
    pub tenant_id: TenantId,
    pub sale_id: SaleId,
    pub customer: String,
    pub occurred_at: DateTime<Utc>,
}

/// Command: AddItem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddItem {
    pub tenant_id: TenantId,
    pub sale_id: SaleId,
    pub line_id: LineId,
    pub product: Product,
    pub variation: Option<String>,
    pub item: LineItem,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ReplaceItem (edit of an existing line).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplaceItem {
    pub tenant_id: TenantId,
    pub sale_id: SaleId,
    pub line_id: LineId,
    pub product: Product,
    pub variation: Option<String>,
    pub item: LineItem,
    pub occurred_at: DateTime<Utc>,
}

/// Command: RemoveItem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoveItem {
    pub tenant_id: TenantId,
    pub sale_id: SaleId,
    pub line_id: LineId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: FinalizeSale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalizeSale {
    pub tenant_id: TenantId,
    pub sale_id: SaleId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaleCommand {
    CreateSale(CreateSale),
    AddItem(AddItem),
    ReplaceItem(ReplaceItem),
    RemoveItem(RemoveItem),
    FinalizeSale(FinalizeSale),
}

/// Event: SaleCreated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaleCreated {
    pub tenant_id: TenantId,
    pub sale_id: SaleId,
    pub customer: String,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ItemAdded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemAdded {
    pub tenant_id: TenantId,
    pub sale_id: SaleId,
    pub line: SaleLine,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ItemReplaced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemReplaced {
    pub tenant_id: TenantId,
    pub sale_id: SaleId,
    pub line: SaleLine,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ItemRemoved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemRemoved {
    pub tenant_id: TenantId,
    pub sale_id: SaleId,
    pub line_id: LineId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: SaleFinalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaleFinalized {
    pub tenant_id: TenantId,
    pub sale_id: SaleId,
    pub total: Decimal,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaleEvent {
    SaleCreated(SaleCreated),
    ItemAdded(ItemAdded),
    ItemReplaced(ItemReplaced),
    ItemRemoved(ItemRemoved),
    SaleFinalized(SaleFinalized),
}

impl Event for SaleEvent {
    fn event_type(&self) -> &'static str {
        match self {
            SaleEvent::SaleCreated(_) => "sales.sale.created",
            SaleEvent::ItemAdded(_) => "sales.sale.item_added",
            SaleEvent::ItemReplaced(_) => "sales.sale.item_replaced",
            SaleEvent::ItemRemoved(_) => "sales.sale.item_removed",
            SaleEvent::SaleFinalized(_) => "sales.sale.finalized",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            SaleEvent::SaleCreated(e) => e.occurred_at,
            SaleEvent::ItemAdded(e) => e.occurred_at,
            SaleEvent::ItemReplaced(e) => e.occurred_at,
            SaleEvent::ItemRemoved(e) => e.occurred_at,
            SaleEvent::SaleFinalized(e) => e.occurred_at,
        }
    }
}

impl Aggregate for Sale {
    type Command = SaleCommand;
    type Event = SaleEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            SaleEvent::SaleCreated(e) => {
                self.id = e.sale_id;
                self.tenant_id = Some(e.tenant_id);
                self.customer = e.customer.clone();
                self.status = SaleStatus::Draft;
                self.lines.clear();
                self.created = true;
            }
            SaleEvent::ItemAdded(e) => {
                self.lines.push(e.line.clone());
            }
            SaleEvent::ItemReplaced(e) => {
                if let Some(existing) = self.lines.iter_mut().find(|l| l.line_id == e.line.line_id) {
                    *existing = e.line.clone();
                }
            }
            SaleEvent::ItemRemoved(e) => {
                self.lines.retain(|l| l.line_id != e.line_id);
            }
            SaleEvent::SaleFinalized(_) => {
                self.status = SaleStatus::Final;
            }
        }

        // Deterministic version tracking: +1 per applied event.
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            SaleCommand::CreateSale(cmd) => self.handle_create(cmd),
            SaleCommand::AddItem(cmd) => self.handle_add_item(cmd),
            SaleCommand::ReplaceItem(cmd) => self.handle_replace_item(cmd),
            SaleCommand::RemoveItem(cmd) => self.handle_remove_item(cmd),
            SaleCommand::FinalizeSale(cmd) => self.handle_finalize(cmd),
        }
    }
}

impl Sale {
    fn ensure_tenant(&self, tenant_id: TenantId) -> Result<(), DomainError> {
        if !self.created {
            return Ok(());
        }
        if self.tenant_id != Some(tenant_id) {
            return Err(DomainError::invariant("tenant mismatch"));
        }
        Ok(())
    }

    fn ensure_sale_id(&self, sale_id: SaleId) -> Result<(), DomainError> {
        if self.id != sale_id {
            return Err(DomainError::invariant("sale_id mismatch"));
        }
        Ok(())
    }

    fn ensure_editable(&self, tenant_id: TenantId, sale_id: SaleId) -> Result<(), DomainError> {
        if !self.created {
            return Err(DomainError::not_found("sale"));
        }
        self.ensure_tenant(tenant_id)?;
        self.ensure_sale_id(sale_id)?;

        if !self.is_modifiable() {
            return Err(DomainError::invariant("cannot modify a finalized sale"));
        }
        Ok(())
    }

    fn build_line(
        line_id: LineId,
        product: &Product,
        variation: Option<&str>,
        item: &LineItem,
    ) -> Result<SaleLine, DomainError> {
        let variation = product.resolve_variation(variation)?;

        if !item.unit().matches(product.unit().as_str()) {
            return Err(DomainError::validation(format!(
                "line unit '{}' does not match product unit '{}'",
                item.unit(),
                product.unit()
            )));
        }
        if item.packing().is_some() && !product.supports_packing() {
            return Err(DomainError::validation(format!(
                "product '{}' does not take packing entry",
                product.name()
            )));
        }
        item.validate_for_submit()?;

        Ok(SaleLine {
            line_id,
            product_id: product.id_typed(),
            variation,
            item: item.clone(),
        })
    }

    fn handle_create(&self, cmd: &CreateSale) -> Result<Vec<SaleEvent>, DomainError> {
        if self.created {
            return Err(DomainError::conflict("sale already exists"));
        }
        if cmd.customer.trim().is_empty() {
            return Err(DomainError::validation("customer cannot be empty"));
        }

        Ok(vec![SaleEvent::SaleCreated(SaleCreated {
            tenant_id: cmd.tenant_id,
            sale_id: cmd.sale_id,
            customer: cmd.customer.trim().to_string(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_add_item(&self, cmd: &AddItem) -> Result<Vec<SaleEvent>, DomainError> {
        self.ensure_editable(cmd.tenant_id, cmd.sale_id)?;

        if self.line(cmd.line_id).is_some() {
            return Err(DomainError::conflict(format!(
                "line {} already exists",
                cmd.line_id
            )));
        }
        let line = Self::build_line(cmd.line_id, &cmd.product, cmd.variation.as_deref(), &cmd.item)?;

        Ok(vec![SaleEvent::ItemAdded(ItemAdded {
            tenant_id: cmd.tenant_id,
            sale_id: cmd.sale_id,
            line,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_replace_item(&self, cmd: &ReplaceItem) -> Result<Vec<SaleEvent>, DomainError> {
        self.ensure_editable(cmd.tenant_id, cmd.sale_id)?;

        if self.line(cmd.line_id).is_none() {
            return Err(DomainError::not_found("sale line"));
        }
        let line = Self::build_line(cmd.line_id, &cmd.product, cmd.variation.as_deref(), &cmd.item)?;

        Ok(vec![SaleEvent::ItemReplaced(ItemReplaced {
            tenant_id: cmd.tenant_id,
            sale_id: cmd.sale_id,
            line,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_remove_item(&self, cmd: &RemoveItem) -> Result<Vec<SaleEvent>, DomainError> {
        self.ensure_editable(cmd.tenant_id, cmd.sale_id)?;

        if self.line(cmd.line_id).is_none() {
            return Err(DomainError::not_found("sale line"));
        }

        Ok(vec![SaleEvent::ItemRemoved(ItemRemoved {
            tenant_id: cmd.tenant_id,
            sale_id: cmd.sale_id,
            line_id: cmd.line_id,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_finalize(&self, cmd: &FinalizeSale) -> Result<Vec<SaleEvent>, DomainError> {
        self.ensure_editable(cmd.tenant_id, cmd.sale_id)?;

        if self.lines.is_empty() {
            return Err(DomainError::validation("cannot finalize a sale without items"));
        }
        for line in &self.lines {
            line.item.validate_for_submit()?;
        }

        Ok(vec![SaleEvent::SaleFinalized(SaleFinalized {
            tenant_id: cmd.tenant_id,
            sale_id: cmd.sale_id,
            total: self.display_total()?,
            occurred_at: cmd.occurred_at,
        })])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loomerp_core::{Quantity, UnitOfMeasure};
    use loomerp_packing::{PackingRecord, PackingSession, QuantityEdit};
    use loomerp_products::PricingMetadata;
    use proptest::prelude::*;

    fn test_tenant_id() -> TenantId {
        TenantId::new()
    }

    fn test_sale_id() -> SaleId {
        SaleId::new(AggregateId::new())
    }

    fn test_time() -> DateTime<Utc> {
        Utc::now()
    }

    fn fabric() -> Product {
        Product::new(
            ProductId::new(AggregateId::new()),
            "FAB-001",
            "Lawn 3pc",
            UnitOfMeasure::meter(),
            PricingMetadata {
                cost_price: Decimal::from(300),
                retail_price: Decimal::from(450),
                wholesale_price: Decimal::from(400),
            },
        )
        .unwrap()
        .with_variations(["Red", "Blue"])
    }

    fn created_sale(tenant_id: TenantId, sale_id: SaleId) -> Sale {
        let mut sale = Sale::empty(sale_id);
        sale.execute(&SaleCommand::CreateSale(CreateSale {
            tenant_id,
            sale_id,
            customer: "Walk-in Customer".into(),
            occurred_at: test_time(),
        }))
        .unwrap();
        sale
    }

    fn add_item(tenant_id: TenantId, sale_id: SaleId, product: &Product, item: LineItem) -> SaleCommand {
        SaleCommand::AddItem(AddItem {
            tenant_id,
            sale_id,
            line_id: LineId::new(),
            product: product.clone(),
            variation: None,
            item,
            occurred_at: test_time(),
        })
    }

    fn packed_item(product: &Product) -> LineItem {
        let mut item = new_line_item(product, PriceTier::Retail, &PackingConfig::default()).unwrap();
        let mut session = item.open_packing().unwrap();
        let b = session.add_box().unwrap();
        for q in [35, 25] {
            let p = session.add_piece(&b).unwrap();
            session.update_piece_quantity(&b, &p, Decimal::new(q, 1)).unwrap();
        }
        item.save_packing(&session).unwrap();
        item
    }

    #[test]
    fn create_sale_emits_sale_created_event() {
        let sale = Sale::empty(test_sale_id());
        let tenant_id = test_tenant_id();
        let sale_id = test_sale_id();

        let events = sale
            .handle(&SaleCommand::CreateSale(CreateSale {
                tenant_id,
                sale_id,
                customer: "  Ayesha Traders ".into(),
                occurred_at: test_time(),
            }))
            .unwrap();
        assert_eq!(events.len(), 1);

        match &events[0] {
            SaleEvent::SaleCreated(e) => {
                assert_eq!(e.tenant_id, tenant_id);
                assert_eq!(e.sale_id, sale_id);
                assert_eq!(e.customer, "Ayesha Traders");
            }
            _ => panic!("Expected SaleCreated event"),
        }
        assert_eq!(events[0].event_type(), "sales.sale.created");
    }

    #[test]
    fn packed_item_carries_its_record_and_locked_quantity() {
        let tenant_id = test_tenant_id();
        let sale_id = test_sale_id();
        let mut sale = created_sale(tenant_id, sale_id);
        let product = fabric();

        sale.execute(&add_item(tenant_id, sale_id, &product, packed_item(&product)))
            .unwrap();

        let line = &sale.lines()[0];
        assert_eq!(line.variation.as_deref(), Some("Red"));
        assert_eq!(line.quantity(), Decimal::from(6));
        assert!(line.item.packing().is_some());
        assert_eq!(sale.total().unwrap(), Decimal::from(2700));
    }

    #[test]
    fn unsaved_packing_blocks_add() {
        let tenant_id = test_tenant_id();
        let sale_id = test_sale_id();
        let sale = created_sale(tenant_id, sale_id);
        let product = fabric();

        let mut item = new_line_item(&product, PriceTier::Retail, &PackingConfig::default()).unwrap();
        let _abandoned = item.open_packing().unwrap();

        let err = sale
            .handle(&add_item(tenant_id, sale_id, &product, item))
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(msg) if msg.contains("opened but not saved")));
    }

    #[test]
    fn packing_is_refused_for_products_without_packing_support() {
        let tenant_id = test_tenant_id();
        let sale_id = test_sale_id();
        let sale = created_sale(tenant_id, sale_id);
        let packed = fabric();
        let plain = fabric().with_packing_support(false);

        let err = sale
            .handle(&add_item(tenant_id, sale_id, &plain, packed_item(&packed)))
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(msg) if msg.contains("packing")));
    }

    #[test]
    fn zero_price_is_rejected() {
        let tenant_id = test_tenant_id();
        let sale_id = test_sale_id();
        let sale = created_sale(tenant_id, sale_id);
        let product = fabric();

        let mut item = new_line_item(&product, PriceTier::Retail, &PackingConfig::default()).unwrap();
        item.set_price(Decimal::ZERO).unwrap();

        assert!(sale.handle(&add_item(tenant_id, sale_id, &product, item)).is_err());
    }

    #[test]
    fn replace_and_remove_require_existing_line() {
        let tenant_id = test_tenant_id();
        let sale_id = test_sale_id();
        let mut sale = created_sale(tenant_id, sale_id);
        let product = fabric();
        let item = new_line_item(&product, PriceTier::Wholesale, &PackingConfig::default()).unwrap();

        let err = sale
            .handle(&SaleCommand::RemoveItem(RemoveItem {
                tenant_id,
                sale_id,
                line_id: LineId::new(),
                occurred_at: test_time(),
            }))
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));

        sale.execute(&add_item(tenant_id, sale_id, &product, item.clone()))
            .unwrap();
        let line_id = sale.lines()[0].line_id;

        let mut edited = item;
        assert_eq!(edited.increment().unwrap(), QuantityEdit::Applied);
        sale.execute(&SaleCommand::ReplaceItem(ReplaceItem {
            tenant_id,
            sale_id,
            line_id,
            product: product.clone(),
            variation: Some("Blue".into()),
            item: edited,
            occurred_at: test_time(),
        }))
        .unwrap();
        assert_eq!(sale.lines().len(), 1);
        assert_eq!(sale.lines()[0].variation.as_deref(), Some("Blue"));
        assert_eq!(sale.lines()[0].quantity(), Decimal::new(50, 2));

        sale.execute(&SaleCommand::RemoveItem(RemoveItem {
            tenant_id,
            sale_id,
            line_id,
            occurred_at: test_time(),
        }))
        .unwrap();
        assert!(sale.lines().is_empty());
    }

    #[test]
    fn finalize_requires_items_and_freezes_the_sale() {
        let tenant_id = test_tenant_id();
        let sale_id = test_sale_id();
        let mut sale = created_sale(tenant_id, sale_id);
        let finalize = SaleCommand::FinalizeSale(FinalizeSale {
            tenant_id,
            sale_id,
            occurred_at: test_time(),
        });

        assert!(matches!(sale.handle(&finalize), Err(DomainError::Validation(_))));

        let product = fabric();
        sale.execute(&add_item(tenant_id, sale_id, &product, packed_item(&product)))
            .unwrap();
        let events = sale.execute(&finalize).unwrap();
        match &events[0] {
            SaleEvent::SaleFinalized(e) => assert_eq!(e.total, Decimal::from(2700)),
            _ => panic!("Expected SaleFinalized event"),
        }
        assert_eq!(sale.status(), SaleStatus::Final);

        let err = sale
            .handle(&add_item(tenant_id, sale_id, &product, packed_item(&product)))
            .unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
    }

    #[test]
    fn quick_packed_line_uses_lump_sum_total() {
        let tenant_id = test_tenant_id();
        let sale_id = test_sale_id();
        let mut sale = created_sale(tenant_id, sale_id);
        let product = fabric();

        let item = new_line_item(&product, PriceTier::Wholesale, &PackingConfig::default())
            .unwrap()
            .with_packing(PackingRecord::quick(Quantity::clamped(Decimal::from(120)), 40).unwrap());
        sale.execute(&add_item(tenant_id, sale_id, &product, item)).unwrap();

        assert_eq!(sale.lines()[0].quantity(), Decimal::from(120));
        assert_eq!(sale.display_total().unwrap(), Decimal::from(48000));
        let summary = sale.lines()[0].item.packing_summary().unwrap();
        assert_eq!(summary, "0 boxes • 40 pieces • 120 Meter");
    }

    #[test]
    fn version_increments_on_apply() {
        let tenant_id = test_tenant_id();
        let sale_id = test_sale_id();
        let mut sale = created_sale(tenant_id, sale_id);
        assert_eq!(sale.version(), 1);

        let product = fabric();
        let item = new_line_item(&product, PriceTier::Retail, &PackingConfig::default()).unwrap();
        let cmd = add_item(tenant_id, sale_id, &product, item);

        let first = sale.handle(&cmd).unwrap();
        let second = sale.handle(&cmd).unwrap();
        assert_eq!(first, second);
        assert_eq!(sale.version(), 1);

        sale.apply(&first[0]);
        assert_eq!(sale.version(), 2);
    }

    #[test]
    fn abandoned_session_does_not_touch_the_line() {
        let product = fabric();
        let mut item = new_line_item(&product, PriceTier::Retail, &PackingConfig::default()).unwrap();
        let before = item.effective_quantity();

        let mut session: PackingSession = item.open_packing().unwrap();
        let _ = session.add_box().unwrap();
        item.cancel_packing();

        assert_eq!(item.effective_quantity(), before);
        assert!(item.packing().is_none());
        assert!(item.validate_for_submit().is_ok());
    }

    proptest! {
        #![proptest_config(ProptestConfig { cases: 256, .. ProptestConfig::default() })]

        #[test]
        fn total_is_sum_of_line_totals(steps in proptest::collection::vec(0u8..12, 1..8)) {
            let tenant_id = test_tenant_id();
            let sale_id = test_sale_id();
            let mut sale = created_sale(tenant_id, sale_id);
            let product = fabric();

            let mut expected = Decimal::ZERO;
            for n in steps {
                let mut item = new_line_item(&product, PriceTier::Retail, &PackingConfig::default()).unwrap();
                for _ in 0..n {
                    item.increment().unwrap();
                }
                expected += item.line_total().unwrap();
                sale.execute(&add_item(tenant_id, sale_id, &product, item)).unwrap();
            }

            prop_assert_eq!(sale.total().unwrap(), expected);
            prop_assert_eq!(sale.display_total().unwrap(), round_for_display(expected, 2));
        }
    }
}
