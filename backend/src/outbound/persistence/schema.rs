//! Diesel table definitions.
//!
//! Must match `backend/migrations` exactly; regenerate with
//! `diesel print-schema` after changing a migration.

diesel::table! {
    /// Directory users, one per email.
    users (id) {
        id -> Int4,
        /// Unique.
        email -> Varchar,
        name -> Varchar,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Messages addressed to directory users.
    notifications (id) {
        id -> Int4,
        user_id -> Int4,
        message -> Text,
        #[sql_name = "type"]
        kind -> Varchar,
        is_read -> Bool,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Token ledger entries; `earned_*` credits, `redeemed` debits.
    transactions (id) {
        id -> Int4,
        user_id -> Int4,
        #[sql_name = "type"]
        kind -> Varchar,
        amount -> Int4,
        description -> Nullable<Text>,
        date -> Timestamptz,
    }
}

diesel::table! {
    /// Rewards granted to users.
    rewards (id) {
        id -> Int4,
        user_id -> Int4,
        points -> Int4,
        name -> Varchar,
        is_available -> Bool,
        created_at -> Timestamptz,
    }
}

diesel::joinable!(notifications -> users (user_id));
diesel::joinable!(transactions -> users (user_id));
diesel::joinable!(rewards -> users (user_id));

diesel::allow_tables_to_appear_in_same_query!(users, notifications, transactions, rewards);
