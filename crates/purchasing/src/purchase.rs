//! Purchase documents whose lines carry packing-aware quantities.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use loomerp_core::{
    Aggregate, AggregateId, AggregateRoot, DomainError, DomainResult, Event, LineId, TenantId,
    round_for_display,
};
use loomerp_packing::{LineItem, PackingConfig};
use loomerp_products::{Product, ProductId};

/// Purchase identifier (tenant-scoped via `tenant_id` fields in events/commands).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PurchaseId(pub AggregateId);

impl PurchaseId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for PurchaseId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Purchase status lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PurchaseStatus {
    Draft,
    Posted,
}

/// Start a purchase line for `product` at its cost price.
pub fn new_line_item(product: &Product, config: &PackingConfig) -> Result<LineItem, DomainError> {
    Ok(
        LineItem::new(product.unit().clone(), product.name(), product.purchase_price(), config)?
            .with_packing_support(product.supports_packing()),
    )
}

/// Purchase line: product, variation and the packing-aware item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseLine {
    pub line_id: LineId,
    pub product_id: ProductId,
    pub variation: Option<String>,
    pub item: LineItem,
}

impl PurchaseLine {
    pub fn quantity(&self) -> Decimal {
        self.item.effective_quantity()
    }

    pub fn unit_cost(&self) -> Decimal {
        self.item.price()
    }

    pub fn line_total(&self) -> DomainResult<Decimal> {
        self.item.line_total()
    }
}

/// Aggregate root: Purchase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Purchase {
    id: PurchaseId,
    tenant_id: Option<TenantId>,
    supplier: String,
    status: PurchaseStatus,
    lines: Vec<PurchaseLine>,
    version: u64,
    created: bool,
}

impl Purchase {
    /// Create an empty, not-yet-created aggregate instance for rehydration.
    pub fn empty(id: PurchaseId) -> Self {
        Self {
            id,
            tenant_id: None,
            supplier: String::new(),
            status: PurchaseStatus::Draft,
            lines: Vec::new(),
            version: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> PurchaseId {
        self.id
    }

    pub fn tenant_id(&self) -> Option<TenantId> {
        self.tenant_id
    }

    pub fn supplier(&self) -> &str {
        &self.supplier
    }

    pub fn status(&self) -> PurchaseStatus {
        self.status
    }

    pub fn lines(&self) -> &[PurchaseLine] {
        &self.lines
    }

    pub fn line(&self, line_id: LineId) -> Option<&PurchaseLine> {
        self.lines.iter().find(|l| l.line_id == line_id)
    }

    pub fn is_modifiable(&self) -> bool {
        matches!(self.status, PurchaseStatus::Draft)
    }

    /// Sum of line totals; a validation error past the decimal range.
    pub fn total(&self) -> DomainResult<Decimal> {
        self.lines.iter().try_fold(Decimal::ZERO, |acc, line| {
            acc.checked_add(line.line_total()?)
                .ok_or_else(|| DomainError::validation("document total is out of range"))
        })
    }

    pub fn display_total(&self) -> DomainResult<Decimal> {
        Ok(round_for_display(self.total()?, 2))
    }
}

impl AggregateRoot for Purchase {
    type Id = PurchaseId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: CreatePurchase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatePurchase {
    pub tenant_id: TenantId,
    pub purchase_id: PurchaseId,
    pub supplier: String,
    pub occurred_at: DateTime<Utc>,
}

/// Command: AddPurchaseItem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddPurchaseItem {
    pub tenant_id: TenantId,
    pub purchase_id: PurchaseId,
    pub line_id: LineId,
    pub product: Product,
    pub variation: Option<String>,
    pub item: LineItem,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ReplacePurchaseItem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplacePurchaseItem {
    pub tenant_id: TenantId,
    pub purchase_id: PurchaseId,
    pub line_id: LineId,
    pub product: Product,
    pub variation: Option<String>,
    pub item: LineItem,
    pub occurred_at: DateTime<Utc>,
}

/// Command: RemovePurchaseItem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovePurchaseItem {
    pub tenant_id: TenantId,
    pub purchase_id: PurchaseId,
    pub line_id: LineId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: PostPurchase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostPurchase {
    pub tenant_id: TenantId,
    pub purchase_id: PurchaseId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PurchaseCommand {
    CreatePurchase(CreatePurchase),
    AddPurchaseItem(AddPurchaseItem),
    ReplacePurchaseItem(ReplacePurchaseItem),
    RemovePurchaseItem(RemovePurchaseItem),
    PostPurchase(PostPurchase),
}

/// Event: PurchaseCreated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseCreated {
    pub tenant_id: TenantId,
    pub purchase_id: PurchaseId,
    pub supplier: String,
    pub occurred_at: DateTime<Utc>,
}

/// Event: PurchaseItemAdded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseItemAdded {
    pub tenant_id: TenantId,
    pub purchase_id: PurchaseId,
    pub line: PurchaseLine,
    pub occurred_at: DateTime<Utc>,
}

/// Event: PurchaseItemReplaced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseItemReplaced {
    pub tenant_id: TenantId,
    pub purchase_id: PurchaseId,
    pub line: PurchaseLine,
    pub occurred_at: DateTime<Utc>,
}

/// Event: PurchaseItemRemoved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseItemRemoved {
    pub tenant_id: TenantId,
    pub purchase_id: PurchaseId,
    pub line_id: LineId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: PurchasePosted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchasePosted {
    pub tenant_id: TenantId,
    pub purchase_id: PurchaseId,
    pub total: Decimal,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PurchaseEvent {
    PurchaseCreated(PurchaseCreated),
    PurchaseItemAdded(PurchaseItemAdded),
    PurchaseItemReplaced(PurchaseItemReplaced),
    PurchaseItemRemoved(PurchaseItemRemoved),
    PurchasePosted(PurchasePosted),
}

impl Event for PurchaseEvent {
    fn event_type(&self) -> &'static str {
        match self {
            PurchaseEvent::PurchaseCreated(_) => "purchasing.purchase.created",
            PurchaseEvent::PurchaseItemAdded(_) => "purchasing.purchase.item_added",
            PurchaseEvent::PurchaseItemReplaced(_) => "purchasing.purchase.item_replaced",
            PurchaseEvent::PurchaseItemRemoved(_) => "purchasing.purchase.item_removed",
            PurchaseEvent::PurchasePosted(_) => "purchasing.purchase.posted",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            PurchaseEvent::PurchaseCreated(e) => e.occurred_at,
            PurchaseEvent::PurchaseItemAdded(e) => e.occurred_at,
            PurchaseEvent::PurchaseItemReplaced(e) => e.occurred_at,
            PurchaseEvent::PurchaseItemRemoved(e) => e.occurred_at,
            PurchaseEvent::PurchasePosted(e) => e.occurred_at,
        }
    }
}

impl Aggregate for Purchase {
    type Command = PurchaseCommand;
    type Event = PurchaseEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            PurchaseEvent::PurchaseCreated(e) => {
                self.id = e.purchase_id;
                self.tenant_id = Some(e.tenant_id);
                self.supplier = e.supplier.clone();
                self.status = PurchaseStatus::Draft;
                self.lines.clear();
                self.created = true;
            }
            PurchaseEvent::PurchaseItemAdded(e) => {
                self.lines.push(e.line.clone());
            }
            PurchaseEvent::PurchaseItemReplaced(e) => {
                if let Some(existing) = self.lines.iter_mut().find(|l| l.line_id == e.line.line_id) {
                    *existing = e.line.clone();
                }
            }
            PurchaseEvent::PurchaseItemRemoved(e) => {
                self.lines.retain(|l| l.line_id != e.line_id);
            }
            PurchaseEvent::PurchasePosted(_) => {
                self.status = PurchaseStatus::Posted;
            }
        }

        // Deterministic version tracking: +1 per applied event.
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            PurchaseCommand::CreatePurchase(cmd) => self.handle_create(cmd),
            PurchaseCommand::AddPurchaseItem(cmd) => self.handle_add_item(cmd),
            PurchaseCommand::ReplacePurchaseItem(cmd) => self.handle_replace_item(cmd),
            PurchaseCommand::RemovePurchaseItem(cmd) => self.handle_remove_item(cmd),
            PurchaseCommand::PostPurchase(cmd) => self.handle_post(cmd),
        }
    }
}

impl Purchase {
    fn ensure_tenant(&self, tenant_id: TenantId) -> Result<(), DomainError> {
        if !self.created {
            return Ok(());
        }
        if self.tenant_id != Some(tenant_id) {
            return Err(DomainError::invariant("tenant mismatch"));
        }
        Ok(())
    }

    fn ensure_purchase_id(&self, purchase_id: PurchaseId) -> Result<(), DomainError> {
        if self.id != purchase_id {
            return Err(DomainError::invariant("purchase_id mismatch"));
        }
        Ok(())
    }

    fn ensure_draft(&self, tenant_id: TenantId, purchase_id: PurchaseId) -> Result<(), DomainError> {
        if !self.created {
            return Err(DomainError::not_found("purchase"));
        }
        self.ensure_tenant(tenant_id)?;
        self.ensure_purchase_id(purchase_id)?;

        if !self.is_modifiable() {
            return Err(DomainError::invariant("cannot modify a posted purchase"));
        }
        Ok(())
    }

    fn build_line(
        line_id: LineId,
        product: &Product,
        variation: Option<&str>,
        item: &LineItem,
    ) -> Result<PurchaseLine, DomainError> {
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

        Ok(PurchaseLine {
            line_id,
            product_id: product.id_typed(),
            variation,
            item: item.clone(),
        })
    }

    fn handle_create(&self, cmd: &CreatePurchase) -> Result<Vec<PurchaseEvent>, DomainError> {
        if self.created {
            return Err(DomainError::conflict("purchase already exists"));
        }
        if cmd.supplier.trim().is_empty() {
            return Err(DomainError::validation("supplier cannot be empty"));
        }

        Ok(vec![PurchaseEvent::PurchaseCreated(PurchaseCreated {
            tenant_id: cmd.tenant_id,
            purchase_id: cmd.purchase_id,
            supplier: cmd.supplier.trim().to_string(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_add_item(&self, cmd: &AddPurchaseItem) -> Result<Vec<PurchaseEvent>, DomainError> {
        self.ensure_draft(cmd.tenant_id, cmd.purchase_id)?;

        if self.line(cmd.line_id).is_some() {
            return Err(DomainError::conflict(format!(
                "line {} already exists",
                cmd.line_id
            )));
        }
        let line = Self::build_line(cmd.line_id, &cmd.product, cmd.variation.as_deref(), &cmd.item)?;

        Ok(vec![PurchaseEvent::PurchaseItemAdded(PurchaseItemAdded {
            tenant_id: cmd.tenant_id,
            purchase_id: cmd.purchase_id,
            line,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_replace_item(
        &self,
        cmd: &ReplacePurchaseItem,
    ) -> Result<Vec<PurchaseEvent>, DomainError> {
        self.ensure_draft(cmd.tenant_id, cmd.purchase_id)?;

        if self.line(cmd.line_id).is_none() {
            return Err(DomainError::not_found("purchase line"));
        }
        let line = Self::build_line(cmd.line_id, &cmd.product, cmd.variation.as_deref(), &cmd.item)?;

        Ok(vec![PurchaseEvent::PurchaseItemReplaced(PurchaseItemReplaced {
            tenant_id: cmd.tenant_id,
            purchase_id: cmd.purchase_id,
            line,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_remove_item(
        &self,
        cmd: &RemovePurchaseItem,
    ) -> Result<Vec<PurchaseEvent>, DomainError> {
        self.ensure_draft(cmd.tenant_id, cmd.purchase_id)?;

        if self.line(cmd.line_id).is_none() {
            return Err(DomainError::not_found("purchase line"));
        }

        Ok(vec![PurchaseEvent::PurchaseItemRemoved(PurchaseItemRemoved {
            tenant_id: cmd.tenant_id,
            purchase_id: cmd.purchase_id,
            line_id: cmd.line_id,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_post(&self, cmd: &PostPurchase) -> Result<Vec<PurchaseEvent>, DomainError> {
        self.ensure_draft(cmd.tenant_id, cmd.purchase_id)?;

        if self.lines.is_empty() {
            return Err(DomainError::validation("cannot post a purchase without items"));
        }
        for line in &self.lines {
            line.item.validate_for_submit()?;
        }

        Ok(vec![PurchaseEvent::PurchasePosted(PurchasePosted {
            tenant_id: cmd.tenant_id,
            purchase_id: cmd.purchase_id,
            total: self.display_total()?,
            occurred_at: cmd.occurred_at,
        })])
    }
}
