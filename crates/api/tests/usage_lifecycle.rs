//! Database-backed tests for the session lifecycle guards.
//!
//! Each test runs against its own migrated database via `sqlx::test`. The
//! focus is the conditional writes in `UsageRepo`: checkout, release,
//! takeover, and the warning flags must each resolve a race to exactly one
//! winner.

use sqlx::PgPool;

use lokr_core::escalation::EscalationKind;
use lokr_core::types::DbId;
use lokr_db::repositories::UsageRepo;

/// Insert a user row and return its ID. Accounts are provisioned outside
/// this service, so tests seed them directly.
async fn seed_user(pool: &PgPool, name: &str, email: &str) -> DbId {
    sqlx::query_scalar("INSERT INTO users (name, nim, email) VALUES ($1, $2, $3) RETURNING id")
        .bind(name)
        .bind("2210001")
        .bind(email)
        .fetch_one(pool)
        .await
        .expect("seed user")
}

/// Current status of a locker row.
async fn locker_status(pool: &PgPool, locker_id: DbId) -> String {
    sqlx::query_scalar("SELECT status FROM lockers WHERE id = $1")
        .bind(locker_id)
        .fetch_one(pool)
        .await
        .expect("locker status")
}

// ---------------------------------------------------------------------------
// Test: checkout claims a locker exactly once
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn checkout_claims_a_specific_locker_exactly_once(pool: PgPool) {
    let alice = seed_user(&pool, "Alice", "alice@campus.test").await;
    let bob = seed_user(&pool, "Bob", "bob@campus.test").await;

    let (locker, usage) = UsageRepo::checkout(&pool, alice, None)
        .await
        .expect("checkout query")
        .expect("a seeded locker should be available");
    assert_eq!(locker.status, "occupied");
    assert_eq!(locker.current_user_id, Some(alice));
    assert!(usage.end_time.is_none());

    // The same locker is no longer claimable.
    let second = UsageRepo::checkout(&pool, bob, Some(locker.id))
        .await
        .expect("checkout query");
    assert!(second.is_none(), "occupied locker must not be claimed again");
}

// ---------------------------------------------------------------------------
// Test: takeover is guarded by end_time IS NULL
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn second_takeover_of_the_same_session_loses(pool: PgPool) {
    let user = seed_user(&pool, "Alice", "alice@campus.test").await;
    let (locker, usage) = UsageRepo::checkout(&pool, user, None)
        .await
        .expect("checkout query")
        .expect("available locker");

    let first = UsageRepo::takeover(&pool, usage.id, Some("abandoned bag"))
        .await
        .expect("takeover query")
        .expect("active session should be taken over");
    assert!(first.taken_by_admin);
    assert!(first.end_time.is_some());
    assert!(first.admin_takeover_at.is_some());
    assert_eq!(first.notes.as_deref(), Some("abandoned bag"));
    assert_eq!(locker_status(&pool, locker.id).await, "available");

    let second = UsageRepo::takeover(&pool, usage.id, None)
        .await
        .expect("takeover query");
    assert!(second.is_none(), "a closed session must not be taken over again");
}

// ---------------------------------------------------------------------------
// Test: of release and takeover, exactly one closes the session
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn release_then_takeover_resolves_to_one_winner(pool: PgPool) {
    let user = seed_user(&pool, "Alice", "alice@campus.test").await;
    let (locker, usage) = UsageRepo::checkout(&pool, user, None)
        .await
        .expect("checkout query")
        .expect("available locker");

    let released = UsageRepo::release(&pool, user, locker.id)
        .await
        .expect("release query")
        .expect("owner should release their active session");
    assert!(!released.taken_by_admin);

    let takeover = UsageRepo::takeover(&pool, usage.id, None)
        .await
        .expect("takeover query");
    assert!(takeover.is_none(), "released session must not be taken over");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn takeover_then_release_resolves_to_one_winner(pool: PgPool) {
    let user = seed_user(&pool, "Alice", "alice@campus.test").await;
    let (locker, usage) = UsageRepo::checkout(&pool, user, None)
        .await
        .expect("checkout query")
        .expect("available locker");

    UsageRepo::takeover(&pool, usage.id, None)
        .await
        .expect("takeover query")
        .expect("active session should be taken over");

    let released = UsageRepo::release(&pool, user, locker.id)
        .await
        .expect("release query");
    assert!(released.is_none(), "taken-over session must not be released");
    assert_eq!(locker_status(&pool, locker.id).await, "available");
}

// ---------------------------------------------------------------------------
// Test: a freed locker can be claimed again
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn takeover_frees_the_locker_for_the_next_user(pool: PgPool) {
    let alice = seed_user(&pool, "Alice", "alice@campus.test").await;
    let bob = seed_user(&pool, "Bob", "bob@campus.test").await;

    let (locker, usage) = UsageRepo::checkout(&pool, alice, None)
        .await
        .expect("checkout query")
        .expect("available locker");
    UsageRepo::takeover(&pool, usage.id, None)
        .await
        .expect("takeover query")
        .expect("active session should be taken over");

    let (reclaimed, _) = UsageRepo::checkout(&pool, bob, Some(locker.id))
        .await
        .expect("checkout query")
        .expect("freed locker should be claimable");
    assert_eq!(reclaimed.id, locker.id);
    assert_eq!(reclaimed.current_user_id, Some(bob));
}

// ---------------------------------------------------------------------------
// Test: warning flags flip at most once, and never on a closed session
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn warning_flag_is_claimed_at_most_once(pool: PgPool) {
    let user = seed_user(&pool, "Alice", "alice@campus.test").await;
    let (_locker, usage) = UsageRepo::checkout(&pool, user, None)
        .await
        .expect("checkout query")
        .expect("available locker");

    let won = UsageRepo::try_mark_warning_sent(&pool, usage.id, EscalationKind::DurationWarning)
        .await
        .expect("flag query");
    assert!(won, "first claim of the 13h flag should win");

    let again = UsageRepo::try_mark_warning_sent(&pool, usage.id, EscalationKind::DurationWarning)
        .await
        .expect("flag query");
    assert!(!again, "second claim of the same flag must lose");

    // The 27h flag is independent of the 13h flag.
    let takeover_flag =
        UsageRepo::try_mark_warning_sent(&pool, usage.id, EscalationKind::TakeoverWarning)
            .await
            .expect("flag query");
    assert!(takeover_flag);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn closed_session_accepts_no_warning_flags(pool: PgPool) {
    let user = seed_user(&pool, "Alice", "alice@campus.test").await;
    let (locker, usage) = UsageRepo::checkout(&pool, user, None)
        .await
        .expect("checkout query")
        .expect("available locker");

    UsageRepo::release(&pool, user, locker.id)
        .await
        .expect("release query")
        .expect("owner should release their active session");

    let after_close =
        UsageRepo::try_mark_warning_sent(&pool, usage.id, EscalationKind::DurationWarning)
            .await
            .expect("flag query");
    assert!(!after_close, "closed session must not accept warning flags");
}
