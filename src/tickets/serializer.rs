use chrono::{DateTime, Utc};
use serde::Serialize;

use super::TicketWithRelations;

/// External response shape of a ticket. Core fields are always present;
/// timestamps appear only when requested, nested lookups only when the join
/// row was loaded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TicketPayload {
    pub id: i32,
    pub ticket_number: String,
    pub customer_id: i32,
    pub assigned_agent_id: Option<i32>,
    pub category_id: Option<i32>,
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
    pub assigned_by: Option<i32>,
    pub is_merged: bool,
    pub reopen_count: i32,
    pub time_spent_minutes: i32,
    pub last_reopened_at: Option<DateTime<Utc>>,
    pub customer_satisfaction_rating: Option<f64>,
    pub customer_feedback: Option<String>,
    pub tags: Vec<String>,
    pub merged_into_ticket_id: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub users: Option<UserSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customers: Option<CustomerSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agents: Option<AgentSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserSummary {
    pub username: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerSummary {
    pub id: i32,
    pub company_id: Option<i32>,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentSummary {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
}

pub fn serialize_ticket(record: &TicketWithRelations, include_dates: bool) -> TicketPayload {
    let (ticket, user, customer, agent) = record;

    TicketPayload {
        id: ticket.id,
        ticket_number: ticket.ticket_number.clone(),
        customer_id: ticket.customer_id,
        assigned_agent_id: ticket.assigned_agent_id,
        category_id: ticket.category_id,
        subject: ticket.subject.clone(),
        description: ticket.description.clone(),
        priority: ticket.priority.clone(),
        status: ticket.status.clone(),
        source: ticket.source.clone(),
        sla_deadline: ticket.sla_deadline,
        sla_status: ticket.sla_status.clone(),
        first_response_at: ticket.first_response_at,
        resolved_at: ticket.resolved_at,
        closed_at: ticket.closed_at,
        assigned_by: ticket.assigned_by,
        is_merged: ticket.is_merged,
        reopen_count: ticket.reopen_count,
        time_spent_minutes: ticket.time_spent_minutes,
        last_reopened_at: ticket.last_reopened_at,
        customer_satisfaction_rating: ticket.customer_satisfaction_rating,
        customer_feedback: ticket.customer_feedback.clone(),
        tags: ticket.tags.clone(),
        merged_into_ticket_id: ticket.merged_into_ticket_id,
        created_at: include_dates.then_some(ticket.created_at),
        updated_at: include_dates.then_some(ticket.updated_at),
        users: user.as_ref().map(|u| UserSummary {
            username: u.username.clone(),
            email: u.email.clone(),
        }),
        customers: customer.as_ref().map(|c| CustomerSummary {
            id: c.id,
            company_id: c.company_id,
            first_name: c.first_name.clone(),
            last_name: c.last_name.clone(),
        }),
        agents: agent.as_ref().map(|a| AgentSummary {
            id: a.id,
            first_name: a.first_name.clone(),
            last_name: a.last_name.clone(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::super::{Agent, Customer, Ticket, User};
    use super::*;

    fn sample_ticket() -> Ticket {
        Ticket {
            id: 1,
            ticket_number: "TKT-000001".to_string(),
            customer_id: 7,
            assigned_agent_id: Some(3),
            category_id: None,
            assigned_by: Some(2),
            subject: "Printer jammed".to_string(),
            description: "Tray two, every morning".to_string(),
            priority: "High".to_string(),
            status: "Open".to_string(),
            source: "Email".to_string(),
            sla_deadline: None,
            sla_status: "Within".to_string(),
            first_response_at: None,
            resolved_at: None,
            closed_at: None,
            last_reopened_at: None,
            is_merged: false,
            reopen_count: 0,
            time_spent_minutes: 0,
            customer_satisfaction_rating: None,
            customer_feedback: None,
            tags: vec!["hardware".to_string()],
            merged_into_ticket_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_dates_included_only_when_requested() {
        let record = (sample_ticket(), None, None, None);

        let with_dates = serialize_ticket(&record, true);
        assert!(with_dates.created_at.is_some());
        assert!(with_dates.updated_at.is_some());

        let without_dates = serialize_ticket(&record, false);
        let value = serde_json::to_value(&without_dates).unwrap();
        assert!(value.get("created_at").is_none());
        assert!(value.get("updated_at").is_none());
    }

    #[test]
    fn test_joined_entities_omitted_when_absent() {
        let record = (sample_ticket(), None, None, None);
        let value = serde_json::to_value(serialize_ticket(&record, true)).unwrap();

        assert!(value.get("users").is_none());
        assert!(value.get("customers").is_none());
        assert!(value.get("agents").is_none());
    }

    #[test]
    fn test_joined_entities_present_when_loaded() {
        let record = (
            sample_ticket(),
            Some(User {
                id: 2,
                username: "mira".to_string(),
                email: "mira@example.com".to_string(),
            }),
            Some(Customer {
                id: 7,
                company_id: Some(11),
                first_name: "Ana".to_string(),
                last_name: "Reis".to_string(),
            }),
            Some(Agent {
                id: 3,
                first_name: "Leo".to_string(),
                last_name: "Costa".to_string(),
            }),
        );
        let value = serde_json::to_value(serialize_ticket(&record, true)).unwrap();

        assert_eq!(value["users"]["username"], "mira");
        assert_eq!(value["users"]["email"], "mira@example.com");
        assert_eq!(value["customers"]["id"], 7);
        assert_eq!(value["customers"]["company_id"], 11);
        assert_eq!(value["agents"]["first_name"], "Leo");
        assert_eq!(value["agents"]["last_name"], "Costa");
    }

    #[test]
    fn test_serialization_is_idempotent() {
        let record = (sample_ticket(), None, None, None);

        assert_eq!(
            serialize_ticket(&record, true),
            serialize_ticket(&record, true)
        );
        assert_eq!(
            serialize_ticket(&record, false),
            serialize_ticket(&record, false)
        );
    }

    #[test]
    fn test_core_fields_always_present() {
        let record = (sample_ticket(), None, None, None);
        let value = serde_json::to_value(serialize_ticket(&record, false)).unwrap();

        assert_eq!(value["id"], 1);
        assert_eq!(value["ticket_number"], "TKT-000001");
        assert_eq!(value["priority"], "High");
        assert_eq!(value["status"], "Open");
        assert_eq!(value["tags"][0], "hardware");
        assert_eq!(value["reopen_count"], 0);
    }
}
