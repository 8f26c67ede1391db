//! Schema convention checks, run against the migrated database.
//!
//! Guards the house rules the models rely on: key types, timestamp
//! columns, seeded status lookups, and explicit FK behaviour.

use slotswap_db::models::status::{SlotStatus, SwapRequestStatus};
use sqlx::PgPool;

/// Entity tables key by bigint, lookup tables by smallint.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_primary_key_types(pool: PgPool) {
    let rows: Vec<(String, String)> = sqlx::query_as(
        "SELECT table_name, data_type \
         FROM information_schema.columns \
         WHERE column_name = 'id' \
           AND table_schema = 'public' \
           AND table_name != '_sqlx_migrations' \
         ORDER BY table_name",
    )
    .fetch_all(&pool)
    .await
    .unwrap();

    assert!(!rows.is_empty());
    for (table, data_type) in &rows {
        let expected = if table.ends_with("_statuses") {
            "smallint"
        } else {
            "bigint"
        };
        assert_eq!(
            data_type, expected,
            "{table}.id should be {expected}, got {data_type}"
        );
    }
}

/// Every table carries created_at/updated_at as timestamptz.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_timestamp_columns(pool: PgPool) {
    let tables: Vec<(String,)> = sqlx::query_as(
        "SELECT table_name \
         FROM information_schema.tables \
         WHERE table_schema = 'public' \
           AND table_type = 'BASE TABLE' \
           AND table_name != '_sqlx_migrations' \
         ORDER BY table_name",
    )
    .fetch_all(&pool)
    .await
    .unwrap();

    for (table,) in &tables {
        for col in ["created_at", "updated_at"] {
            let found: Option<(String,)> = sqlx::query_as(
                "SELECT data_type \
                 FROM information_schema.columns \
                 WHERE table_schema = 'public' \
                   AND table_name = $1 \
                   AND column_name = $2",
            )
            .bind(table)
            .bind(col)
            .fetch_optional(&pool)
            .await
            .unwrap();

            let (data_type,) = found.unwrap_or_else(|| panic!("{table} is missing {col}"));
            assert_eq!(data_type, "timestamp with time zone", "{table}.{col}");
        }
    }
}

/// TEXT over VARCHAR everywhere.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_no_varchar_columns(pool: PgPool) {
    let rows: Vec<(String, String)> = sqlx::query_as(
        "SELECT table_name, column_name \
         FROM information_schema.columns \
         WHERE table_schema = 'public' \
           AND data_type = 'character varying' \
           AND table_name != '_sqlx_migrations'",
    )
    .fetch_all(&pool)
    .await
    .unwrap();

    assert!(rows.is_empty(), "found VARCHAR columns: {rows:?}");
}

/// The status lookup seeds must match the Rust enum discriminants.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_status_lookups_match_enums(pool: PgPool) {
    let slot_statuses: Vec<(i16, String)> =
        sqlx::query_as("SELECT id, name FROM slot_statuses ORDER BY id")
            .fetch_all(&pool)
            .await
            .unwrap();
    assert_eq!(
        slot_statuses,
        vec![
            (SlotStatus::Busy.id(), "busy".to_string()),
            (SlotStatus::Swappable.id(), "swappable".to_string()),
            (SlotStatus::SwapPending.id(), "swap_pending".to_string()),
        ]
    );

    let request_statuses: Vec<(i16, String)> =
        sqlx::query_as("SELECT id, name FROM swap_request_statuses ORDER BY id")
            .fetch_all(&pool)
            .await
            .unwrap();
    assert_eq!(
        request_statuses,
        vec![
            (SwapRequestStatus::Pending.id(), "pending".to_string()),
            (SwapRequestStatus::Accepted.id(), "accepted".to_string()),
            (SwapRequestStatus::Rejected.id(), "rejected".to_string()),
        ]
    );
}

/// Every FK column is indexed and every FK carries an explicit rule.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_foreign_keys_indexed_with_explicit_rules(pool: PgPool) {
    let fk_columns: Vec<(String, String)> = sqlx::query_as(
        "SELECT DISTINCT tc.table_name, kcu.column_name \
         FROM information_schema.table_constraints tc \
         JOIN information_schema.key_column_usage kcu \
             ON tc.constraint_name = kcu.constraint_name \
            AND tc.table_schema = kcu.table_schema \
         WHERE tc.constraint_type = 'FOREIGN KEY' \
           AND tc.table_schema = 'public' \
         ORDER BY tc.table_name, kcu.column_name",
    )
    .fetch_all(&pool)
    .await
    .unwrap();

    assert!(!fk_columns.is_empty());
    for (table, column) in &fk_columns {
        let (has_index,): (bool,) = sqlx::query_as(
            "SELECT EXISTS ( \
                SELECT 1 FROM pg_indexes \
                WHERE schemaname = 'public' \
                  AND tablename = $1 \
                  AND indexdef LIKE '%(' || $2 || ')%' \
            )",
        )
        .bind(table)
        .bind(column)
        .fetch_one(&pool)
        .await
        .unwrap();
        assert!(has_index, "FK column {table}.{column} has no index");
    }

    let fk_rules: Vec<(String, String, String)> = sqlx::query_as(
        "SELECT rc.constraint_name, tc.table_name, rc.delete_rule \
         FROM information_schema.referential_constraints rc \
         JOIN information_schema.table_constraints tc \
             ON rc.constraint_name = tc.constraint_name \
            AND rc.constraint_schema = tc.table_schema \
         WHERE rc.constraint_schema = 'public'",
    )
    .fetch_all(&pool)
    .await
    .unwrap();

    for (constraint, table, delete_rule) in &fk_rules {
        assert_ne!(
            delete_rule, "NO ACTION",
            "FK {constraint} on {table} needs an explicit ON DELETE rule"
        );
    }
}
