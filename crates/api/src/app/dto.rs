use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use serde_json::{json, Value};

use souk_core::{CategoryId, DomainError, DomainResult, Money, ProductId};
use souk_sales::{
    Delivery, DeliveryStatus, DeliveryUpdate, LineRequest, NewDelivery, Order, OrderQuery, OrderStatus, Page,
    PaymentStatus, PlaceOrderRequest,
};
use souk_search::{SearchPage, SearchRequest};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct OrderLineRequest {
    pub product_id: String,
    pub quantity: i64,
}

#[derive(Debug, Deserialize)]
pub struct PlaceOrderBody {
    #[serde(default)]
    pub items: Vec<OrderLineRequest>,
    #[serde(default)]
    pub shipping_address: String,
    pub payment_method: Option<String>,
    pub notes: Option<String>,
}

impl PlaceOrderBody {
    pub fn into_request(self) -> DomainResult<PlaceOrderRequest> {
        let items = self
            .items
            .into_iter()
            .map(|line| {
                Ok(LineRequest {
                    product_id: line.product_id.parse::<ProductId>()?,
                    quantity: line.quantity,
                })
            })
            .collect::<DomainResult<Vec<_>>>()?;
        Ok(PlaceOrderRequest {
            items,
            shipping_address: self.shipping_address,
            payment_method: self.payment_method,
            notes: self.notes,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ConfirmOrderBody {
    pub shipping_address: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PaymentStatusBody {
    pub status: String,
    pub note: Option<String>,
}

impl PaymentStatusBody {
    pub fn status(&self) -> DomainResult<PaymentStatus> {
        self.status.parse()
    }
}

#[derive(Debug, Deserialize)]
pub struct OrderStatusBody {
    pub status: String,
}

impl OrderStatusBody {
    pub fn status(&self) -> DomainResult<OrderStatus> {
        self.status.parse()
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateDeliveryBody {
    #[serde(default)]
    pub carrier: String,
    pub initial_status: Option<String>,
    pub estimated_delivery: Option<String>,
    pub initial_location: Option<String>,
    pub notes: Option<String>,
}

impl CreateDeliveryBody {
    pub fn into_new_delivery(self) -> DomainResult<NewDelivery> {
        let initial_status = self
            .initial_status
            .as_deref()
            .map(str::parse::<DeliveryStatus>)
            .transpose()?;
        let estimated_delivery = self
            .estimated_delivery
            .as_deref()
            .map(|raw| parse_instant(raw, false))
            .transpose()?;
        Ok(NewDelivery {
            carrier: self.carrier,
            initial_status,
            estimated_delivery,
            initial_location: self.initial_location,
            notes: self.notes,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct DeliveryStatusBody {
    pub status: String,
    pub location: Option<String>,
    pub description: Option<String>,
}

impl DeliveryStatusBody {
    pub fn into_update(self) -> DomainResult<DeliveryUpdate> {
        Ok(DeliveryUpdate {
            status: self.status.parse()?,
            location: self.location,
            description: self.description,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
    pub category_id: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl SearchParams {
    pub fn into_request(self, include_inactive: bool) -> DomainResult<SearchRequest> {
        let category_id = self
            .category_id
            .as_deref()
            .filter(|raw| !raw.trim().is_empty())
            .map(str::parse::<CategoryId>)
            .transpose()?;
        Ok(SearchRequest {
            query: self.q,
            category_id,
            page: self.page,
            per_page: self.per_page,
            include_inactive,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct OrderListParams {
    pub product_name: Option<String>,
    pub created_from: Option<String>,
    pub created_to: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl OrderListParams {
    pub fn into_query(self) -> DomainResult<OrderQuery> {
        Ok(OrderQuery {
            product_name: self.product_name,
            created_from: self.created_from.as_deref().map(|raw| parse_instant(raw, false)).transpose()?,
            created_to: self.created_to.as_deref().map(|raw| parse_instant(raw, true)).transpose()?,
            page: self.page,
            per_page: self.per_page,
        })
    }
}

/// RFC 3339 instant, or a bare `YYYY-MM-DD` date taken as the start (or end) of that UTC day.
pub fn parse_instant(raw: &str, end_of_day: bool) -> DomainResult<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Ok(at.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| DomainError::invalid_request(format!("'{raw}' is not a date or RFC 3339 timestamp")))?;
    let at = if end_of_day {
        date.and_hms_milli_opt(23, 59, 59, 999)
    } else {
        date.and_hms_opt(0, 0, 0)
    };
    at.map(|naive| naive.and_utc())
        .ok_or_else(|| DomainError::invalid_request(format!("'{raw}' is out of range")))
}

// -------------------------
// JSON mapping helpers
// -------------------------

pub fn money(amount: Money) -> String {
    amount.to_string()
}

pub fn order_to_json(order: &Order) -> Value {
    json!({
        "id": order.id_typed().to_string(),
        "order_number": order.order_number(),
        "customer_id": order.customer_id().to_string(),
        "status": order.status().as_str(),
        "payment_status": order.payment_status().as_str(),
        "payment_note": order.payment_note(),
        "payment_method": order.payment_method(),
        "shipping_address": order.shipping_address(),
        "notes": order.notes(),
        "total": money(order.total()),
        "lines": order.lines().iter().map(|l| json!({
            "line_no": l.line_no,
            "product_id": l.product_id.to_string(),
            "product_name": l.product_name,
            "quantity": l.quantity,
            "unit_price": money(l.unit_price),
            "subtotal": money(l.subtotal),
        })).collect::<Vec<_>>(),
        "created_at": order.created_at().to_rfc3339(),
        "updated_at": order.updated_at().to_rfc3339(),
    })
}

pub fn orders_to_json(orders: &[Order]) -> Value {
    Value::Array(orders.iter().map(order_to_json).collect())
}

pub fn order_page_to_json(page: &Page<Order>) -> Value {
    json!({
        "items": orders_to_json(&page.items),
        "total": page.total,
        "page": page.page,
        "per_page": page.per_page,
        "pages": page.pages,
    })
}

pub fn delivery_to_json(delivery: &Delivery) -> Value {
    json!({
        "id": delivery.id_typed().to_string(),
        "order_id": delivery.order_id().to_string(),
        "customer_id": delivery.customer_id().to_string(),
        "tracking_code": delivery.tracking_code(),
        "carrier": delivery.carrier(),
        "status": delivery.status().as_str(),
        "estimated_delivery": delivery.estimated_delivery().map(|d| d.to_rfc3339()),
        "actual_delivery": delivery.actual_delivery().map(|d| d.to_rfc3339()),
        "current_location": delivery.current_location(),
        "notes": delivery.notes(),
        "history": delivery.history().iter().map(|e| json!({
            "previous_status": e.previous_status.map(|s| s.as_str()),
            "status": e.status.as_str(),
            "location": e.location,
            "description": e.description,
            "occurred_at": e.occurred_at.to_rfc3339(),
        })).collect::<Vec<_>>(),
        "created_at": delivery.created_at().to_rfc3339(),
        "updated_at": delivery.updated_at().to_rfc3339(),
    })
}

pub fn deliveries_to_json(deliveries: &[Delivery]) -> Value {
    Value::Array(deliveries.iter().map(delivery_to_json).collect())
}

pub fn search_page_to_json(page: &SearchPage, now: DateTime<Utc>) -> Value {
    let items = page
        .items
        .iter()
        .map(|hit| {
            let p = &hit.view.product;
            json!({
                "id": p.id.to_string(),
                "sku": p.sku,
                "name": p.name,
                "description": p.description,
                "unit_price": money(p.unit_price),
                "discounted_price": hit.view.discounted_price.map(money),
                "stock": p.stock,
                "unit_term": p.unit_term,
                "minimum_order": p.minimum_order,
                "is_active": p.is_active,
                "is_featured": p.is_featured,
                "supplier_name": p.supplier_name,
                "item_location": p.item_location,
                "created_at": p.created_at.to_rfc3339(),
                "category": hit.view.category.as_ref().map(|c| json!({
                    "id": c.id.to_string(),
                    "name": c.name,
                })),
                "offer": hit.view.offer.as_ref().map(|o| json!({
                    "id": o.id.to_string(),
                    "name": o.name,
                    "starts_at": o.starts_at.to_rfc3339(),
                    "ends_at": o.ends_at.to_rfc3339(),
                    "is_running": o.is_running(now),
                })),
                "score": hit.score,
            })
        })
        .collect::<Vec<_>>();

    json!({
        "items": items,
        "total": page.total,
        "page": page.page,
        "per_page": page.per_page,
        "pages": page.pages,
    })
}
