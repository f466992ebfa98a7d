use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use souk_core::{Aggregate, AggregateRoot, DeliveryId, DomainError, Event, OrderId, UserId};

use crate::status::DeliveryStatus;

/// Append-only history entry of a delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryEvent {
    pub previous_status: Option<DeliveryStatus>,
    pub status: DeliveryStatus,
    pub location: Option<String>,
    pub description: String,
    pub occurred_at: DateTime<Utc>,
}

/// Aggregate root: Delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    id: DeliveryId,
    order_id: OrderId,
    customer_id: UserId,
    tracking_code: String,
    carrier: String,
    status: DeliveryStatus,
    estimated_delivery: Option<DateTime<Utc>>,
    actual_delivery: Option<DateTime<Utc>>,
    current_location: Option<String>,
    notes: Option<String>,
    history: Vec<DeliveryEvent>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    version: u64,
    created: bool,
}

impl Delivery {
    pub fn empty(id: DeliveryId) -> Self {
        Self {
            id,
            order_id: OrderId::default(),
            customer_id: UserId::default(),
            tracking_code: String::new(),
            carrier: String::new(),
            status: DeliveryStatus::Pending,
            estimated_delivery: None,
            actual_delivery: None,
            current_location: None,
            notes: None,
            history: Vec::new(),
            created_at: DateTime::<Utc>::UNIX_EPOCH,
            updated_at: DateTime::<Utc>::UNIX_EPOCH,
            version: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> DeliveryId {
        self.id
    }

    pub fn order_id(&self) -> OrderId {
        self.order_id
    }

    /// Owner of the order this delivery ships.
    pub fn customer_id(&self) -> UserId {
        self.customer_id
    }

    pub fn tracking_code(&self) -> &str {
        &self.tracking_code
    }

    pub fn carrier(&self) -> &str {
        &self.carrier
    }

    pub fn status(&self) -> DeliveryStatus {
        self.status
    }

    pub fn estimated_delivery(&self) -> Option<DateTime<Utc>> {
        self.estimated_delivery
    }

    pub fn actual_delivery(&self) -> Option<DateTime<Utc>> {
        self.actual_delivery
    }

    pub fn current_location(&self) -> Option<&str> {
        self.current_location.as_deref()
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    /// Oldest first.
    pub fn history(&self) -> &[DeliveryEvent] {
        &self.history
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

impl AggregateRoot for Delivery {
    type Id = DeliveryId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: CreateDelivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateDelivery {
    pub delivery_id: DeliveryId,
    pub order_id: OrderId,
    pub order_number: String,
    pub customer_id: UserId,
    pub tracking_code: String,
    pub carrier: String,
    pub initial_status: DeliveryStatus,
    pub estimated_delivery: Option<DateTime<Utc>>,
    pub initial_location: Option<String>,
    pub notes: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: UpdateDeliveryStatus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateDeliveryStatus {
    pub delivery_id: DeliveryId,
    pub status: DeliveryStatus,
    pub location: Option<String>,
    pub description: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeliveryCommand {
    CreateDelivery(CreateDelivery),
    UpdateDeliveryStatus(UpdateDeliveryStatus),
}

/// Event: DeliveryCreated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryCreated {
    pub delivery_id: DeliveryId,
    pub order_id: OrderId,
    pub customer_id: UserId,
    pub tracking_code: String,
    pub carrier: String,
    pub estimated_delivery: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub entry: DeliveryEvent,
}

/// Event: DeliveryStatusChanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryStatusChanged {
    pub delivery_id: DeliveryId,
    pub entry: DeliveryEvent,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeliveryChange {
    DeliveryCreated(DeliveryCreated),
    DeliveryStatusChanged(DeliveryStatusChanged),
}

impl DeliveryChange {
    pub fn entry(&self) -> &DeliveryEvent {
        match self {
            DeliveryChange::DeliveryCreated(e) => &e.entry,
            DeliveryChange::DeliveryStatusChanged(e) => &e.entry,
        }
    }
}

impl Event for DeliveryChange {
    fn event_type(&self) -> &'static str {
        match self {
            DeliveryChange::DeliveryCreated(_) => "sales.delivery.created",
            DeliveryChange::DeliveryStatusChanged(_) => "sales.delivery.status_changed",
        }
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        self.entry().occurred_at
    }
}

impl Aggregate for Delivery {
    type Command = DeliveryCommand;
    type Event = DeliveryChange;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            DeliveryChange::DeliveryCreated(e) => {
                self.id = e.delivery_id;
                self.order_id = e.order_id;
                self.customer_id = e.customer_id;
                self.tracking_code = e.tracking_code.clone();
                self.carrier = e.carrier.clone();
                self.estimated_delivery = e.estimated_delivery;
                self.notes = e.notes.clone();
                self.created_at = e.entry.occurred_at;
                self.created = true;
            }
            DeliveryChange::DeliveryStatusChanged(_) => {}
        }

        let entry = event.entry();
        self.status = entry.status;
        if entry.location.is_some() {
            self.current_location = entry.location.clone();
        }
        if entry.status == DeliveryStatus::Delivered && self.actual_delivery.is_none() {
            self.actual_delivery = Some(entry.occurred_at);
        }
        self.history.push(entry.clone());
        self.updated_at = entry.occurred_at;
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            DeliveryCommand::CreateDelivery(cmd) => self.handle_create(cmd),
            DeliveryCommand::UpdateDeliveryStatus(cmd) => self.handle_update(cmd),
        }
    }
}

fn trimmed(text: &Option<String>) -> Option<String> {
    text.as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

impl Delivery {
    fn handle_create(&self, cmd: &CreateDelivery) -> Result<Vec<DeliveryChange>, DomainError> {
        if self.created {
            return Err(DomainError::conflict("delivery already exists"));
        }
        let carrier = cmd.carrier.trim();
        if carrier.is_empty() {
            return Err(DomainError::invalid_request("carrier is required"));
        }

        Ok(vec![DeliveryChange::DeliveryCreated(DeliveryCreated {
            delivery_id: cmd.delivery_id,
            order_id: cmd.order_id,
            customer_id: cmd.customer_id,
            tracking_code: cmd.tracking_code.clone(),
            carrier: carrier.to_string(),
            estimated_delivery: cmd.estimated_delivery,
            notes: trimmed(&cmd.notes),
            entry: DeliveryEvent {
                previous_status: None,
                status: cmd.initial_status,
                location: trimmed(&cmd.initial_location),
                description: format!("Delivery created for order {}", cmd.order_number),
                occurred_at: cmd.occurred_at,
            },
        })])
    }

    fn handle_update(&self, cmd: &UpdateDeliveryStatus) -> Result<Vec<DeliveryChange>, DomainError> {
        if !self.created {
            return Err(DomainError::not_found(format!("delivery {}", cmd.delivery_id)));
        }
        if !self.status.can_transition_to(cmd.status) {
            return Err(DomainError::invalid_status(format!(
                "delivery {} is already delivered and cannot move to {}",
                self.tracking_code, cmd.status
            )));
        }

        let description = trimmed(&cmd.description)
            .unwrap_or_else(|| format!("Status changed from {} to {}", self.status, cmd.status));

        Ok(vec![DeliveryChange::DeliveryStatusChanged(DeliveryStatusChanged {
            delivery_id: self.id,
            entry: DeliveryEvent {
                previous_status: Some(self.status),
                status: cmd.status,
                location: trimmed(&cmd.location),
                description,
                occurred_at: cmd.occurred_at,
            },
        })])
    }
}
