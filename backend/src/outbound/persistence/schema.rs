//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match the database migrations exactly. They are
//! used by Diesel for compile-time query validation and type-safe SQL
//! generation; regenerate with `diesel print-schema` after changing a
//! migration.

diesel::table! {
    /// User accounts table.
    ///
    /// The `id` column is the primary key (UUID v4); `email` carries a
    /// unique index.
    users (id) {
        /// Primary key: UUID v4 identifier.
        id -> Uuid,
        /// Unique login email.
        email -> Varchar,
        /// Argon2id PHC string.
        password_hash -> Varchar,
        first_name -> Nullable<Varchar>,
        last_name -> Nullable<Varchar>,
        username -> Nullable<Varchar>,
        /// Wallet balance in minor currency units; never negative.
        balance -> Numeric,
        is_premium -> Bool,
        /// Latest brain-age estimate; null until a full battery exists.
        brain_age -> Nullable<Float8>,
        /// Record creation timestamp.
        created_at -> Timestamptz,
        /// Last modification timestamp (auto-updated by trigger).
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Cognitive test results; append-only.
    test_results (id) {
        /// Primary key: UUID v4 identifier.
        id -> Uuid,
        /// Owning user.
        user_id -> Uuid,
        /// Test category: reaction_time, sequence_memory, or verbal_memory.
        kind -> Varchar,
        score -> Float8,
        /// Reaction latency in milliseconds; reaction-time rows only.
        reaction_time_ms -> Nullable<Int4>,
        /// Sequence level reached; sequence-memory rows only.
        level -> Nullable<Int4>,
        /// Correct answers; verbal-memory rows only.
        correct_answers -> Nullable<Int4>,
        metadata -> Nullable<Jsonb>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Wallet ledger; rows are retained even for failed payments.
    transactions (id) {
        /// Primary key: UUID v4 identifier.
        id -> Uuid,
        /// Owning user.
        user_id -> Uuid,
        /// Transaction category: deposit, withdraw, premium_purchase, or
        /// test_purchase.
        kind -> Varchar,
        /// Positive amount in minor currency units.
        amount -> Numeric,
        /// pending, completed, failed, or cancelled.
        status -> Varchar,
        /// Identifier assigned by the payment gateway, once known.
        gateway_reference -> Nullable<Varchar>,
        metadata -> Nullable<Jsonb>,
        created_at -> Timestamptz,
    }
}

diesel::joinable!(test_results -> users (user_id));
diesel::joinable!(transactions -> users (user_id));

diesel::allow_tables_to_appear_in_same_query!(users, test_results, transactions);
