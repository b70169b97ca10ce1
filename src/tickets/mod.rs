pub mod serializer;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use log::info;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::shared::pagination::{ListParams, Pagination};
use crate::shared::response::{
    success, success_message, success_paginated, ApiError, ApiResponse,
};
use crate::shared::schema::{agents, customers, tickets, users};
use crate::shared::state::AppState;

use serializer::{serialize_ticket, TicketPayload};

#[derive(Debug, Clone, Serialize, Deserialize, Queryable)]
pub struct Ticket {
    pub id: i32,
    pub ticket_number: String,
    pub customer_id: i32,
    pub assigned_agent_id: Option<i32>,
    pub category_id: Option<i32>,
    pub assigned_by: Option<i32>,
    pub subject: String,
    pub description: String,
    pub priority: String,
    pub status: String,
    pub source: String,
    pub sla_deadline: Option<DateTime<Utc>>,
    pub sla_status: String,
    pub first_response_at: Option<DateTime<Utc>>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub closed_at: Option<DateTime<Utc>>,
    pub last_reopened_at: Option<DateTime<Utc>>,
    pub is_merged: bool,
    pub reopen_count: i32,
    pub time_spent_minutes: i32,
    pub customer_satisfaction_rating: Option<f64>,
    pub customer_feedback: Option<String>,
    pub tags: Vec<String>,
    pub merged_into_ticket_id: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Queryable)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Queryable)]
pub struct Customer {
    pub id: i32,
    pub company_id: Option<i32>,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Queryable)]
pub struct Agent {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
}

/// A ticket row together with its joined lookups, in left-join order.
pub type TicketWithRelations = (Ticket, Option<User>, Option<Customer>, Option<Agent>);

#[derive(Debug, Insertable)]
#[diesel(table_name = tickets)]
pub struct NewTicket {
    pub ticket_number: String,
    pub customer_id: i32,
    pub assigned_agent_id: Option<i32>,
    pub category_id: Option<i32>,
    pub assigned_by: Option<i32>,
    pub subject: String,
    pub description: String,
    pub priority: String,
    pub status: String,
    pub source: String,
    pub sla_deadline: Option<DateTime<Utc>>,
    pub sla_status: String,
    pub first_response_at: Option<DateTime<Utc>>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub closed_at: Option<DateTime<Utc>>,
    pub last_reopened_at: Option<DateTime<Utc>>,
    pub is_merged: bool,
    pub reopen_count: i32,
    pub time_spent_minutes: i32,
    pub customer_satisfaction_rating: Option<f64>,
    pub customer_feedback: Option<String>,
    pub tags: Vec<String>,
    pub merged_into_ticket_id: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl NewTicket {
    /// Defaults apply only here, at creation. Updates never reintroduce them.
    pub fn from_request(req: CreateTicketRequest, now: DateTime<Utc>) -> Self {
        Self {
            ticket_number: req.ticket_number,
            customer_id: req.customer_id,
            assigned_agent_id: req.assigned_agent_id,
            category_id: req.category_id,
            assigned_by: req.assigned_by,
            subject: req.subject,
            description: req.description,
            priority: req.priority.unwrap_or_else(|| "Medium".to_string()),
            status: req.status.unwrap_or_else(|| "Open".to_string()),
            source: req.source.unwrap_or_else(|| "Email".to_string()),
            sla_deadline: req.sla_deadline,
            sla_status: req.sla_status.unwrap_or_else(|| "Within".to_string()),
            first_response_at: req.first_response_at,
            resolved_at: req.resolved_at,
            closed_at: req.closed_at,
            last_reopened_at: req.last_reopened_at,
            is_merged: req.is_merged.unwrap_or(false),
            reopen_count: req.reopen_count.unwrap_or(0),
            time_spent_minutes: req.time_spent_minutes.unwrap_or(0),
            customer_satisfaction_rating: req.customer_satisfaction_rating,
            customer_feedback: req.customer_feedback,
            tags: req.tags.unwrap_or_default(),
            merged_into_ticket_id: req.merged_into_ticket_id,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateTicketRequest {
    pub ticket_number: String,
    pub customer_id: i32,
    pub subject: String,
    pub description: String,
    pub assigned_agent_id: Option<i32>,
    pub category_id: Option<i32>,
    pub assigned_by: Option<i32>,
    pub priority: Option<String>,
    pub status: Option<String>,
    pub source: Option<String>,
    pub sla_deadline: Option<DateTime<Utc>>,
    pub sla_status: Option<String>,
    pub first_response_at: Option<DateTime<Utc>>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub closed_at: Option<DateTime<Utc>>,
    pub last_reopened_at: Option<DateTime<Utc>>,
    pub is_merged: Option<bool>,
    pub reopen_count: Option<i32>,
    pub time_spent_minutes: Option<i32>,
    pub customer_satisfaction_rating: Option<f64>,
    pub customer_feedback: Option<String>,
    pub tags: Option<Vec<String>>,
    pub merged_into_ticket_id: Option<i32>,
}

/// Partial update. `None` leaves the column untouched; `id`, `created_at` and
/// any unknown fields in the body are ignored.
#[derive(Debug, Default, Deserialize, AsChangeset)]
#[diesel(table_name = tickets)]
pub struct UpdateTicketRequest {
    pub ticket_number: Option<String>,
    pub customer_id: Option<i32>,
    pub assigned_agent_id: Option<i32>,
    pub category_id: Option<i32>,
    pub assigned_by: Option<i32>,
    pub subject: Option<String>,
    pub description: Option<String>,
    pub priority: Option<String>,
    pub status: Option<String>,
    pub source: Option<String>,
    pub sla_deadline: Option<DateTime<Utc>>,
    pub sla_status: Option<String>,
    pub first_response_at: Option<DateTime<Utc>>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub closed_at: Option<DateTime<Utc>>,
    pub last_reopened_at: Option<DateTime<Utc>>,
    pub is_merged: Option<bool>,
    pub reopen_count: Option<i32>,
    pub time_spent_minutes: Option<i32>,
    pub customer_satisfaction_rating: Option<f64>,
    pub customer_feedback: Option<String>,
    pub tags: Option<Vec<String>>,
    pub merged_into_ticket_id: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct DeleteTicketRequest {
    pub id: Option<i32>,
    pub ids: Option<Vec<i32>>,
}

#[derive(Debug, PartialEq, Eq)]
pub enum DeleteTarget {
    Single(i32),
    Many(Vec<i32>),
    Invalid,
}

impl DeleteTicketRequest {
    /// A single `id` wins over `ids`; an absent or empty `ids` collection is
    /// not a valid bulk request.
    pub fn target(&self) -> DeleteTarget {
        if let Some(id) = self.id {
            return DeleteTarget::Single(id);
        }
        match &self.ids {
            Some(ids) if !ids.is_empty() => DeleteTarget::Many(ids.clone()),
            _ => DeleteTarget::Invalid,
        }
    }
}

fn load_ticket(conn: &mut PgConnection, ticket_id: i32) -> QueryResult<Option<TicketWithRelations>> {
    tickets::table
        .left_join(users::table)
        .left_join(customers::table)
        .left_join(agents::table)
        .select((
            tickets::all_columns,
            users::all_columns.nullable(),
            customers::all_columns.nullable(),
            agents::all_columns.nullable(),
        ))
        .filter(tickets::id.eq(ticket_id))
        .first::<TicketWithRelations>(conn)
        .optional()
}

/// Offset pagination over the ticket table: one count query for the metadata,
/// one page query for the rows. The search term matches subject, ticket number
/// or status, case-insensitively, any of the three.
fn paginate_tickets(
    conn: &mut PgConnection,
    search: &str,
    page: i64,
    limit: i64,
) -> QueryResult<(Vec<TicketWithRelations>, Pagination)> {
    let total: i64 = if search.is_empty() {
        tickets::table.count().get_result(conn)?
    } else {
        let pattern = like_pattern(search);
        tickets::table
            .filter(
                tickets::subject
                    .ilike(pattern.clone())
                    .or(tickets::ticket_number.ilike(pattern.clone()))
                    .or(tickets::status.ilike(pattern)),
            )
            .count()
            .get_result(conn)?
    };

    let pagination = Pagination::new(page, limit, total);

    let mut query = tickets::table
        .left_join(users::table)
        .left_join(customers::table)
        .left_join(agents::table)
        .select((
            tickets::all_columns,
            users::all_columns.nullable(),
            customers::all_columns.nullable(),
            agents::all_columns.nullable(),
        ))
        .into_boxed();

    if !search.is_empty() {
        let pattern = like_pattern(search);
        query = query.filter(
            tickets::subject
                .ilike(pattern.clone())
                .or(tickets::ticket_number.ilike(pattern.clone()))
                .or(tickets::status.ilike(pattern)),
        );
    }

    let records = query
        .order(tickets::created_at.desc())
        .limit(limit)
        .offset(pagination.offset())
        .load::<TicketWithRelations>(conn)?;

    Ok((records, pagination))
}

fn like_pattern(search: &str) -> String {
    format!("%{search}%")
}

pub async fn create_ticket(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateTicketRequest>,
) -> Result<(StatusCode, Json<ApiResponse<TicketPayload>>), ApiError> {
    let mut conn = state.conn.get()?;

    let new_ticket = NewTicket::from_request(req, Utc::now());
    let ticket: Ticket = diesel::insert_into(tickets::table)
        .values(&new_ticket)
        .get_result(&mut conn)?;
    info!("Created ticket {} ({})", ticket.id, ticket.ticket_number);

    let record = load_ticket(&mut conn, ticket.id)?
        .ok_or_else(|| ApiError::NotFound("Ticket not found".to_string()))?;

    Ok(success(
        "Ticket created successfully",
        serialize_ticket(&record, true),
        StatusCode::CREATED,
    ))
}

pub async fn get_ticket(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<(StatusCode, Json<ApiResponse<TicketPayload>>), ApiError> {
    let mut conn = state.conn.get()?;

    let record = load_ticket(&mut conn, id)?
        .ok_or_else(|| ApiError::NotFound("Ticket not found".to_string()))?;

    Ok(success(
        "Ticket fetched successfully",
        serialize_ticket(&record, true),
        StatusCode::OK,
    ))
}

pub async fn update_ticket(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Json(req): Json<UpdateTicketRequest>,
) -> Result<(StatusCode, Json<ApiResponse<TicketPayload>>), ApiError> {
    let mut conn = state.conn.get()?;

    let existing: Option<i32> = tickets::table
        .find(id)
        .select(tickets::id)
        .first(&mut conn)
        .optional()?;
    if existing.is_none() {
        return Err(ApiError::NotFound("Ticket not found".to_string()));
    }

    diesel::update(tickets::table.find(id))
        .set((&req, tickets::updated_at.eq(Utc::now())))
        .execute(&mut conn)?;
    info!("Updated ticket {id}");

    let record = load_ticket(&mut conn, id)?
        .ok_or_else(|| ApiError::NotFound("Ticket not found".to_string()))?;

    Ok(success(
        "Ticket updated successfully",
        serialize_ticket(&record, true),
        StatusCode::OK,
    ))
}

pub async fn delete_ticket(
    State(state): State<Arc<AppState>>,
    Json(req): Json<DeleteTicketRequest>,
) -> Result<(StatusCode, Json<ApiResponse<()>>), ApiError> {
    let mut conn = state.conn.get()?;

    match req.target() {
        DeleteTarget::Single(id) => {
            let existing: Option<i32> = tickets::table
                .find(id)
                .select(tickets::id)
                .first(&mut conn)
                .optional()?;
            if existing.is_none() {
                return Err(ApiError::NotFound("Ticket not found".to_string()));
            }

            diesel::delete(tickets::table.find(id)).execute(&mut conn)?;
            info!("Deleted ticket {id}");
            Ok(success_message(format!(
                "Ticket with id {id} deleted successfully"
            )))
        }
        DeleteTarget::Many(ids) => {
            let deleted = diesel::delete(tickets::table.filter(tickets::id.eq_any(&ids)))
                .execute(&mut conn)?;
            if deleted == 0 {
                return Err(ApiError::NotFound(
                    "No matching tickets found for deletion".to_string(),
                ));
            }

            info!("Deleted {deleted} tickets");
            Ok(success_message(format!(
                "{deleted} tickets deleted successfully"
            )))
        }
        DeleteTarget::Invalid => Err(ApiError::BadRequest(
            "Please provide a valid 'id' or 'ids[]' in the request body".to_string(),
        )),
    }
}

pub async fn list_tickets(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListParams>,
) -> Result<(StatusCode, Json<ApiResponse<Vec<TicketPayload>>>), ApiError> {
    let mut conn = state.conn.get()?;

    let page = params.page.max(1);
    let limit = params.limit.max(1);
    let (records, pagination) = paginate_tickets(&mut conn, &params.search, page, limit)?;

    let data: Vec<TicketPayload> = records
        .iter()
        .map(|record| serialize_ticket(record, true))
        .collect();

    Ok(success_paginated(
        "Tickets fetched successfully",
        data,
        pagination,
    ))
}

pub fn configure_ticket_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/tickets",
            get(list_tickets).post(create_ticket).delete(delete_ticket),
        )
        .route("/api/tickets/:id", get(get_ticket).put(update_ticket))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_request(value: serde_json::Value) -> CreateTicketRequest {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_create_defaults_applied_for_omitted_fields() {
        let req = create_request(serde_json::json!({
            "ticket_number": "T-1",
            "customer_id": 1,
            "subject": "s",
            "description": "d"
        }));
        let now = Utc::now();
        let ticket = NewTicket::from_request(req, now);

        assert_eq!(ticket.priority, "Medium");
        assert_eq!(ticket.status, "Open");
        assert_eq!(ticket.source, "Email");
        assert_eq!(ticket.sla_status, "Within");
        assert!(!ticket.is_merged);
        assert_eq!(ticket.reopen_count, 0);
        assert_eq!(ticket.time_spent_minutes, 0);
        assert!(ticket.tags.is_empty());
        assert_eq!(ticket.created_at, now);
        assert_eq!(ticket.updated_at, now);
    }

    #[test]
    fn test_create_null_fields_fall_back_to_defaults() {
        let req = create_request(serde_json::json!({
            "ticket_number": "T-2",
            "customer_id": 1,
            "subject": "s",
            "description": "d",
            "priority": null,
            "status": null,
            "source": null,
            "sla_status": null,
            "is_merged": null,
            "reopen_count": null,
            "time_spent_minutes": null
        }));
        let ticket = NewTicket::from_request(req, Utc::now());

        assert_eq!(ticket.priority, "Medium");
        assert_eq!(ticket.status, "Open");
        assert_eq!(ticket.source, "Email");
        assert_eq!(ticket.sla_status, "Within");
        assert!(!ticket.is_merged);
        assert_eq!(ticket.reopen_count, 0);
        assert_eq!(ticket.time_spent_minutes, 0);
    }

    #[test]
    fn test_create_supplied_fields_kept_verbatim() {
        let req = create_request(serde_json::json!({
            "ticket_number": "T-3",
            "customer_id": 9,
            "subject": "VPN down",
            "description": "Site-to-site tunnel flapping",
            "priority": "Urgent",
            "status": "Pending",
            "source": "Phone",
            "sla_status": "Breached",
            "is_merged": true,
            "reopen_count": 3,
            "time_spent_minutes": 42,
            "tags": ["network", "vip"],
            "assigned_agent_id": 5
        }));
        let ticket = NewTicket::from_request(req, Utc::now());

        assert_eq!(ticket.ticket_number, "T-3");
        assert_eq!(ticket.customer_id, 9);
        assert_eq!(ticket.priority, "Urgent");
        assert_eq!(ticket.status, "Pending");
        assert_eq!(ticket.source, "Phone");
        assert_eq!(ticket.sla_status, "Breached");
        assert!(ticket.is_merged);
        assert_eq!(ticket.reopen_count, 3);
        assert_eq!(ticket.time_spent_minutes, 42);
        assert_eq!(ticket.tags, vec!["network", "vip"]);
        assert_eq!(ticket.assigned_agent_id, Some(5));
    }

    #[test]
    fn test_update_payload_ignores_immutable_fields() {
        let req: UpdateTicketRequest = serde_json::from_value(serde_json::json!({
            "id": 99,
            "created_at": "2024-01-01T00:00:00Z",
            "subject": "renamed"
        }))
        .unwrap();

        assert_eq!(req.subject.as_deref(), Some("renamed"));
        assert!(req.ticket_number.is_none());
    }

    #[test]
    fn test_update_payload_from_empty_body_changes_nothing() {
        let req: UpdateTicketRequest =
            serde_json::from_value(serde_json::json!({})).unwrap();

        assert!(req.subject.is_none());
        assert!(req.status.is_none());
        assert!(req.tags.is_none());
    }

    #[test]
    fn test_delete_target_single_id_takes_precedence() {
        let req: DeleteTicketRequest =
            serde_json::from_value(serde_json::json!({"id": 5, "ids": [1, 2]})).unwrap();
        assert_eq!(req.target(), DeleteTarget::Single(5));
    }

    #[test]
    fn test_delete_target_ids_collection() {
        let req: DeleteTicketRequest =
            serde_json::from_value(serde_json::json!({"ids": [1, 2, 3]})).unwrap();
        assert_eq!(req.target(), DeleteTarget::Many(vec![1, 2, 3]));
    }

    #[test]
    fn test_delete_target_rejects_missing_and_empty_input() {
        let req: DeleteTicketRequest =
            serde_json::from_value(serde_json::json!({})).unwrap();
        assert_eq!(req.target(), DeleteTarget::Invalid);

        let req: DeleteTicketRequest =
            serde_json::from_value(serde_json::json!({"ids": []})).unwrap();
        assert_eq!(req.target(), DeleteTarget::Invalid);
    }
}
