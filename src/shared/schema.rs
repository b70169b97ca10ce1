diesel::table! {
    agents (id) {
        id -> Int4,
        first_name -> Varchar,
        last_name -> Varchar,
    }
}

diesel::table! {
    customers (id) {
        id -> Int4,
        company_id -> Nullable<Int4>,
        first_name -> Varchar,
        last_name -> Varchar,
    }
}

diesel::table! {
    ticket_categories (id) {
        id -> Int4,
        name -> Varchar,
    }
}

diesel::table! {
    tickets (id) {
        id -> Int4,
        ticket_number -> Varchar,
        customer_id -> Int4,
        assigned_agent_id -> Nullable<Int4>,
        category_id -> Nullable<Int4>,
        assigned_by -> Nullable<Int4>,
        subject -> Varchar,
        description -> Text,
        priority -> Varchar,
        status -> Varchar,
        source -> Varchar,
        sla_deadline -> Nullable<Timestamptz>,
        sla_status -> Varchar,
        first_response_at -> Nullable<Timestamptz>,
        resolved_at -> Nullable<Timestamptz>,
        closed_at -> Nullable<Timestamptz>,
        last_reopened_at -> Nullable<Timestamptz>,
        is_merged -> Bool,
        reopen_count -> Int4,
        time_spent_minutes -> Int4,
        customer_satisfaction_rating -> Nullable<Float8>,
        customer_feedback -> Nullable<Text>,
        tags -> Array<Text>,
        merged_into_ticket_id -> Nullable<Int4>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    users (id) {
        id -> Int4,
        username -> Varchar,
        email -> Varchar,
    }
}

diesel::joinable!(tickets -> agents (assigned_agent_id));
diesel::joinable!(tickets -> customers (customer_id));
diesel::joinable!(tickets -> ticket_categories (category_id));
diesel::joinable!(tickets -> users (assigned_by));

diesel::allow_tables_to_appear_in_same_query!(agents, customers, ticket_categories, tickets, users,);
