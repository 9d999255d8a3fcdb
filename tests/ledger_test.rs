// Integration tests against a real Postgres. They provision their own
// schema and skip silently when DATABASE_URL is unset or unreachable, so
// the suite still passes on machines without a database.
use std::sync::Arc;

use rewear_points::config::PointsConfig;
use rewear_points::db::itemdb::ItemExt;
use rewear_points::db::pointsdb::PointsLedgerExt;
use rewear_points::db::redemptiondb::RedemptionExt;
use rewear_points::db::referraldb::ReferralExt;
use rewear_points::models::itemmodel::ItemStatus;
use rewear_points::models::pointsmodel::{RedemptionStatus, TransactionType};
use rewear_points::service::notification_service::NotificationService;
use rewear_points::service::points_service::PointsService;
use rewear_points::service::referral_service::generate_referral_code;
use rewear_points::{DBClient, ServiceError};
use sqlx::PgPool;
use uuid::Uuid;

const SCHEMA: &str = r#"
DO $$ BEGIN
    CREATE TYPE user_role AS ENUM ('admin', 'moderator', 'user');
EXCEPTION WHEN duplicate_object THEN NULL; END $$;

DO $$ BEGIN
    CREATE TYPE item_status AS ENUM ('pending', 'approved', 'rejected', 'swapped', 'redeemed');
EXCEPTION WHEN duplicate_object THEN NULL; END $$;

DO $$ BEGIN
    CREATE TYPE point_transaction_type AS ENUM (
        'earned_listing', 'earned_swap', 'earned_referral', 'earned_badge',
        'earned_bonus', 'spent_redemption', 'spent_premium', 'admin_adjustment',
        'expired');
EXCEPTION WHEN duplicate_object THEN NULL; END $$;

DO $$ BEGIN
    CREATE TYPE redemption_status AS ENUM ('pending', 'approved', 'rejected', 'fulfilled');
EXCEPTION WHEN duplicate_object THEN NULL; END $$;

CREATE TABLE IF NOT EXISTS users (
    id UUID PRIMARY KEY,
    name VARCHAR(255) NOT NULL,
    username VARCHAR(255) NOT NULL,
    email VARCHAR(255) NOT NULL UNIQUE,
    role user_role NOT NULL DEFAULT 'user',
    points BIGINT NOT NULL DEFAULT 0 CHECK (points >= 0),
    green_score DOUBLE PRECISION NOT NULL DEFAULT 0,
    items_listed_count INTEGER NOT NULL DEFAULT 0,
    swaps_completed_count INTEGER NOT NULL DEFAULT 0,
    email_notifications BOOLEAN NOT NULL DEFAULT true,
    push_notifications BOOLEAN NOT NULL DEFAULT true,
    mystery_box_enabled BOOLEAN NOT NULL DEFAULT false,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE TABLE IF NOT EXISTS items (
    id UUID PRIMARY KEY,
    owner_id UUID NOT NULL REFERENCES users (id),
    title VARCHAR(255) NOT NULL,
    status item_status NOT NULL DEFAULT 'pending',
    is_available BOOLEAN NOT NULL DEFAULT true,
    points_value BIGINT NOT NULL DEFAULT 0,
    allow_redemption BOOLEAN NOT NULL DEFAULT false,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE TABLE IF NOT EXISTS point_transactions (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    user_id UUID NOT NULL REFERENCES users (id),
    transaction_type point_transaction_type NOT NULL,
    points BIGINT NOT NULL,
    description TEXT NOT NULL,
    related_item_id UUID,
    related_swap_id UUID,
    related_badge_id UUID,
    balance_before BIGINT NOT NULL,
    balance_after BIGINT NOT NULL,
    created_by UUID,
    admin_notes TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE TABLE IF NOT EXISTS points_redemptions (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    user_id UUID NOT NULL REFERENCES users (id),
    item_id UUID NOT NULL REFERENCES items (id),
    points_spent BIGINT NOT NULL,
    status redemption_status NOT NULL DEFAULT 'pending',
    rejection_reason TEXT,
    reviewed_by UUID,
    admin_notes TEXT,
    transaction_id UUID NOT NULL UNIQUE REFERENCES point_transactions (id),
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE TABLE IF NOT EXISTS referral_codes (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    code VARCHAR(16) NOT NULL UNIQUE,
    owner_id UUID NOT NULL REFERENCES users (id),
    uses_count INTEGER NOT NULL DEFAULT 0,
    max_uses INTEGER NOT NULL,
    points_for_referrer BIGINT NOT NULL,
    points_for_referee BIGINT NOT NULL,
    is_active BOOLEAN NOT NULL DEFAULT true,
    expires_at TIMESTAMPTZ,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE TABLE IF NOT EXISTS referral_uses (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    referral_code_id UUID NOT NULL REFERENCES referral_codes (id),
    referred_user_id UUID NOT NULL REFERENCES users (id),
    referrer_transaction_id UUID NOT NULL REFERENCES point_transactions (id),
    referee_transaction_id UUID NOT NULL REFERENCES point_transactions (id),
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    UNIQUE (referral_code_id, referred_user_id)
);
"#;

async fn test_db() -> Option<DBClient> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt().with_test_writer().try_init().ok();

    let url = std::env::var("DATABASE_URL").ok()?;
    let pool = PgPool::connect(&url).await.ok()?;
    sqlx::raw_sql(SCHEMA).execute(&pool).await.ok()?;
    Some(DBClient::new(pool))
}

async fn seed_user(db: &DBClient) -> Uuid {
    let id = Uuid::new_v4();
    sqlx::query("INSERT INTO users (id, name, username, email) VALUES ($1, 'Test User', $2, $3)")
        .bind(id)
        .bind(format!("user_{}", id.simple()))
        .bind(format!("{}@rewear.test", id.simple()))
        .execute(&db.pool)
        .await
        .unwrap();
    id
}

async fn seed_redeemable_item(db: &DBClient, owner_id: Uuid, points_value: i64) -> Uuid {
    let id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO items (id, owner_id, title, status, is_available, points_value, allow_redemption)
        VALUES ($1, $2, 'Denim jacket', 'approved', true, $3, true)
        "#,
    )
    .bind(id)
    .bind(owner_id)
    .bind(points_value)
    .execute(&db.pool)
    .await
    .unwrap();
    id
}

#[tokio::test]
async fn award_spend_and_overspend_track_the_balance() {
    let Some(db) = test_db().await else { return };
    let user_id = seed_user(&db).await;

    let award = db
        .award_points(
            user_id,
            100,
            TransactionType::EarnedBonus,
            "Welcome bonus".to_string(),
            None,
            None,
            None,
            None,
        )
        .await
        .unwrap();
    assert_eq!(award.balance_before, 0);
    assert_eq!(award.balance_after, 100);

    let spend = db
        .spend_points(
            user_id,
            60,
            TransactionType::SpentPremium,
            "Featured listing".to_string(),
            None,
            None,
            None,
        )
        .await
        .unwrap();
    assert_eq!(spend.points, -60);
    assert_eq!(spend.balance_before, 100);
    assert_eq!(spend.balance_after, 40);

    let err = db
        .spend_points(
            user_id,
            50,
            TransactionType::SpentPremium,
            "Featured listing".to_string(),
            None,
            None,
            None,
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::InsufficientBalance {
            required: 50,
            available: 40
        }
    ));

    // Failed spend leaves no trace: balance and ledger sum still agree
    assert_eq!(db.get_user_balance(user_id).await.unwrap(), 40);
    assert_eq!(db.sum_point_entries(user_id).await.unwrap(), 40);
}

#[tokio::test]
async fn concurrent_spends_serialize_on_the_user_row() {
    let Some(db) = test_db().await else { return };
    let user_id = seed_user(&db).await;

    db.award_points(
        user_id,
        100,
        TransactionType::EarnedBonus,
        "Welcome bonus".to_string(),
        None,
        None,
        None,
        None,
    )
    .await
    .unwrap();

    let db_a = db.clone();
    let db_b = db.clone();
    let spend_a = tokio::spawn(async move {
        db_a.spend_points(
            user_id,
            60,
            TransactionType::SpentPremium,
            "First spend".to_string(),
            None,
            None,
            None,
        )
        .await
    });
    let spend_b = tokio::spawn(async move {
        db_b.spend_points(
            user_id,
            60,
            TransactionType::SpentPremium,
            "Second spend".to_string(),
            None,
            None,
            None,
        )
        .await
    });

    let result_a = spend_a.await.unwrap();
    let result_b = spend_b.await.unwrap();

    // The row lock makes exactly one spend win
    assert_eq!(result_a.is_ok() as u32 + result_b.is_ok() as u32, 1);
    let loser = if result_a.is_err() { result_a } else { result_b };
    assert!(matches!(
        loser.unwrap_err(),
        ServiceError::InsufficientBalance { .. }
    ));

    assert_eq!(db.get_user_balance(user_id).await.unwrap(), 40);
    assert_eq!(db.sum_point_entries(user_id).await.unwrap(), 40);
}

#[tokio::test]
async fn rejected_redemption_refunds_the_spend() {
    let Some(db) = test_db().await else { return };
    let user_id = seed_user(&db).await;
    let owner_id = seed_user(&db).await;
    let admin_id = seed_user(&db).await;
    let item_id = seed_redeemable_item(&db, owner_id, 75).await;

    db.award_points(
        user_id,
        100,
        TransactionType::EarnedBonus,
        "Welcome bonus".to_string(),
        None,
        None,
        None,
        None,
    )
    .await
    .unwrap();

    let (redemption, entry) = db.request_redemption(user_id, item_id).await.unwrap();
    assert_eq!(redemption.status, RedemptionStatus::Pending);
    assert_eq!(redemption.points_spent, 75);
    assert_eq!(redemption.transaction_id, entry.id);
    assert_eq!(entry.points, -75);
    assert_eq!(db.get_user_balance(user_id).await.unwrap(), 25);

    let (rejected, refund) = db
        .reject_redemption(admin_id, redemption.id, "Out of stock".to_string())
        .await
        .unwrap();
    assert_eq!(rejected.status, RedemptionStatus::Rejected);
    assert_eq!(rejected.reviewed_by, Some(admin_id));
    assert_eq!(rejected.rejection_reason.as_deref(), Some("Out of stock"));
    assert_eq!(refund.transaction_type, TransactionType::AdminAdjustment);
    assert_eq!(refund.points, 75);

    // Round trip restores the balance exactly, with both movements on record
    assert_eq!(db.get_user_balance(user_id).await.unwrap(), 100);
    assert_eq!(db.sum_point_entries(user_id).await.unwrap(), 100);
}

#[tokio::test]
async fn fulfilled_redemption_retires_the_item() {
    let Some(db) = test_db().await else { return };
    let user_id = seed_user(&db).await;
    let owner_id = seed_user(&db).await;
    let admin_id = seed_user(&db).await;
    let item_id = seed_redeemable_item(&db, owner_id, 75).await;

    db.award_points(
        user_id,
        100,
        TransactionType::EarnedBonus,
        "Welcome bonus".to_string(),
        None,
        None,
        None,
        None,
    )
    .await
    .unwrap();

    let (redemption, _) = db.request_redemption(user_id, item_id).await.unwrap();

    let approved = db
        .approve_redemption(admin_id, redemption.id, None)
        .await
        .unwrap();
    assert_eq!(approved.status, RedemptionStatus::Approved);
    assert_eq!(approved.reviewed_by, Some(admin_id));

    // Approving twice is an illegal transition
    let err = db
        .approve_redemption(admin_id, redemption.id, None)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidStateTransition { .. }));

    let fulfilled = db
        .fulfill_redemption(admin_id, redemption.id)
        .await
        .unwrap();
    assert_eq!(fulfilled.status, RedemptionStatus::Fulfilled);

    let item = db.get_item(item_id).await.unwrap().unwrap();
    assert_eq!(item.status, ItemStatus::Redeemed);
    assert!(!item.is_available);

    // A fulfilled item cannot be redeemed again
    let err = db.request_redemption(user_id, item_id).await.unwrap_err();
    assert!(matches!(err, ServiceError::ItemNotRedeemable(_)));
}

#[tokio::test]
async fn referral_use_pays_both_sides_once() {
    let Some(db) = test_db().await else { return };
    let owner_id = seed_user(&db).await;
    let referred_id = seed_user(&db).await;

    let code = db
        .create_referral_code(owner_id, generate_referral_code(), 10, 50, 25, None)
        .await
        .unwrap();

    let referral_use = db.use_referral_code(&code.code, referred_id).await.unwrap();
    assert_eq!(db.get_user_balance(owner_id).await.unwrap(), 50);
    assert_eq!(db.get_user_balance(referred_id).await.unwrap(), 25);

    let refreshed = db.get_referral_code(&code.code).await.unwrap().unwrap();
    assert_eq!(refreshed.uses_count, 1);

    // Same user again: rejected, with nothing paid out
    let err = db
        .use_referral_code(&code.code, referred_id)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidReferralCode(_)));
    assert_eq!(db.get_user_balance(owner_id).await.unwrap(), 50);
    assert_eq!(db.get_user_balance(referred_id).await.unwrap(), 25);

    let uses = db.get_referral_uses(code.id, 10, 0).await.unwrap();
    assert_eq!(uses.len(), 1);
    assert_eq!(uses[0].id, referral_use.id);

    // Self-referral is rejected too
    let err = db.use_referral_code(&code.code, owner_id).await.unwrap_err();
    assert!(matches!(err, ServiceError::InvalidReferralCode(_)));
}

#[tokio::test]
async fn committed_award_survives_notification_outage() {
    let Some(db) = test_db().await else { return };

    // No notifications table in this schema, so every notification write
    // fails. The award must still succeed and stay on the books.
    sqlx::raw_sql("DROP TABLE IF EXISTS notifications")
        .execute(&db.pool)
        .await
        .unwrap();

    let user_id = seed_user(&db).await;
    let db = Arc::new(db);
    let notifications = Arc::new(NotificationService::new(db.clone()));
    let points = PointsService::new(db.clone(), PointsConfig::default(), notifications);

    let entry = points
        .award_bonus(user_id, 30, "Campaign bonus".to_string())
        .await
        .unwrap();
    assert_eq!(entry.balance_after, 30);
    assert_eq!(db.get_user_balance(user_id).await.unwrap(), 30);
    assert_eq!(db.sum_point_entries(user_id).await.unwrap(), 30);
}
