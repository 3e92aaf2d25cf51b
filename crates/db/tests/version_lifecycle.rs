//! Integration tests for quote versions and the recompute cascade.
//!
//! Exercises the lifecycle service against a real database:
//! - Quote creation with version 1
//! - Deliverable/milestone CRUD with recompute-on-mutation
//! - Milestone roll-ups (billable hours, cost, margin)
//! - Version cloning with relinked milestones
//! - Immutability of superseded versions

use assert_matches::assert_matches;
use sqlx::PgPool;
use quoteflow_db::lifecycle;
use quoteflow_db::models::deliverable::{CreateDeliverable, UpdateDeliverable};
use quoteflow_db::models::milestone::{CreateMilestone, UpdateMilestone};
use quoteflow_db::models::quote::CreateQuote;
use quoteflow_db::models::quote_version::UpdateQuoteVersion;
use quoteflow_db::repositories::{DeliverableRepo, MilestoneRepo, QuoteRepo, QuoteVersionRepo};
use quoteflow_db::ServiceError;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn new_quote(title: &str) -> CreateQuote {
    CreateQuote {
        title: title.to_string(),
        organization_id: None,
        contact_id: None,
        contact_name: Some("Dana Client".to_string()),
        contact_email: Some("dana@example.com".to_string()),
        gst_enabled: None,
        gst_rate: None,
        tax_inclusive: None,
        notes: None,
    }
}

fn fixed(title: &str, price: f64) -> CreateDeliverable {
    CreateDeliverable {
        title: title.to_string(),
        description: None,
        sort_order: None,
        status: None,
        pricing_mode: Some("fixed_price".to_string()),
        fixed_price_ex_gst: Some(price),
        default_client_rate: None,
        default_hours: None,
    }
}

fn hourly(title: &str, rate: f64, hours: f64) -> CreateDeliverable {
    CreateDeliverable {
        title: title.to_string(),
        description: None,
        sort_order: None,
        status: None,
        pricing_mode: Some("rolled_up_hours".to_string()),
        fixed_price_ex_gst: None,
        default_client_rate: Some(rate),
        default_hours: Some(hours),
    }
}

fn milestone(title: &str, hours: f64, billable: bool, cost_rate: f64) -> CreateMilestone {
    CreateMilestone {
        title: title.to_string(),
        description: None,
        sort_order: None,
        status: None,
        hours: Some(hours),
        is_billable: Some(billable),
        client_rate: None,
        cost_rate: Some(cost_rate),
        due_date: None,
    }
}

// ---------------------------------------------------------------------------
// Quotes
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn test_create_quote_starts_draft_with_version_one(pool: PgPool) {
    let (quote, version) = lifecycle::create_quote(&pool, &new_quote("Website"), None)
        .await
        .unwrap();

    assert_eq!(quote.status, "draft");
    assert!(quote.quote_number.starts_with("Q-"));
    assert_eq!(quote.last_version_number, 1);
    assert_eq!(version.version_number, 1);
    assert!(version.gst_enabled);
    assert_eq!(version.gst_rate, 0.10);
    assert_eq!(version.total, 0.0);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_create_quote_rejects_blank_title_and_bad_rate(pool: PgPool) {
    let err = lifecycle::create_quote(&pool, &new_quote("   "), None)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::Validation(_));

    let mut input = new_quote("Website");
    input.gst_rate = Some(1.5);
    let err = lifecycle::create_quote(&pool, &input, None).await.unwrap_err();
    assert_matches!(err, ServiceError::Validation(_));
}

// ---------------------------------------------------------------------------
// Recompute-on-mutation
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn test_deliverable_mutations_recompute_totals(pool: PgPool) {
    let (_, version) = lifecycle::create_quote(&pool, &new_quote("Website"), None)
        .await
        .unwrap();

    let d1 = lifecycle::create_deliverable(&pool, version.id, &fixed("Design", 500.0))
        .await
        .unwrap();
    let d2 = lifecycle::create_deliverable(&pool, version.id, &hourly("Build", 100.0, 10.0))
        .await
        .unwrap();
    assert_eq!(d1.sort_order, 1);
    assert_eq!(d2.sort_order, 2);
    assert_eq!(d2.total_hours, 10.0);
    assert_eq!(d2.client_value, 1000.0);

    let refreshed = QuoteVersionRepo::find_by_id(&pool, version.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(refreshed.subtotal, 1500.0);
    assert_eq!(refreshed.tax_amount, 150.0);
    assert_eq!(refreshed.total, 1650.0);
    assert!(refreshed.totals_computed_at.is_some());

    // Raising the fixed price flows straight into the totals.
    lifecycle::update_deliverable(
        &pool,
        d1.id,
        &UpdateDeliverable {
            fixed_price_ex_gst: Some(750.0),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    let refreshed = QuoteVersionRepo::find_by_id(&pool, version.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(refreshed.subtotal, 1750.0);
    assert_eq!(refreshed.total, 1925.0);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_disabling_gst_zeroes_tax(pool: PgPool) {
    let (_, version) = lifecycle::create_quote(&pool, &new_quote("Website"), None)
        .await
        .unwrap();
    lifecycle::create_deliverable(&pool, version.id, &fixed("Design", 200.0))
        .await
        .unwrap();

    let updated = lifecycle::update_version_settings(
        &pool,
        version.id,
        &UpdateQuoteVersion {
            gst_enabled: Some(false),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(updated.subtotal, 200.0);
    assert_eq!(updated.tax_amount, 0.0);
    assert_eq!(updated.total, 200.0);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_milestones_drive_rollups(pool: PgPool) {
    let (_, version) = lifecycle::create_quote(&pool, &new_quote("Website"), None)
        .await
        .unwrap();
    let d = lifecycle::create_deliverable(&pool, version.id, &hourly("Build", 100.0, 40.0))
        .await
        .unwrap();

    lifecycle::create_milestone(&pool, d.id, &milestone("Backend", 6.0, true, 40.0))
        .await
        .unwrap();
    let internal = lifecycle::create_milestone(&pool, d.id, &milestone("Review", 2.0, false, 40.0))
        .await
        .unwrap();
    assert_eq!(internal.sort_order, 2);

    // Milestones replace default hours; only billable hours are charged,
    // every hour costs.
    let d = DeliverableRepo::find_by_id(&pool, d.id).await.unwrap().unwrap();
    assert_eq!(d.total_hours, 6.0);
    assert_eq!(d.client_value, 600.0);
    assert_eq!(d.total_cost, 320.0);
    assert_eq!(d.margin, 280.0);
    assert_eq!(d.margin_percent, Some(46.67));

    let v = QuoteVersionRepo::find_by_id(&pool, version.id).await.unwrap().unwrap();
    assert_eq!(v.subtotal, 600.0);

    lifecycle::update_milestone(
        &pool,
        internal.id,
        &UpdateMilestone {
            is_billable: Some(true),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    let v = QuoteVersionRepo::find_by_id(&pool, version.id).await.unwrap().unwrap();
    assert_eq!(v.subtotal, 800.0);

    // Removing every milestone falls back to the deliverable's default hours.
    let listed = MilestoneRepo::list_by_deliverable(&pool, d.id).await.unwrap();
    for m in listed {
        lifecycle::delete_milestone(&pool, m.id).await.unwrap();
    }
    let v = QuoteVersionRepo::find_by_id(&pool, version.id).await.unwrap().unwrap();
    assert_eq!(v.subtotal, 4000.0);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_fractional_hours_are_priced_without_early_rounding(pool: PgPool) {
    let (_, version) = lifecycle::create_quote(&pool, &new_quote("Website"), None)
        .await
        .unwrap();
    let d = lifecycle::create_deliverable(&pool, version.id, &hourly("Support", 100.0, 0.125))
        .await
        .unwrap();
    assert_eq!(d.total_hours, 0.125);
    assert_eq!(d.client_value, 12.5);

    for title in ["Call 1", "Call 2", "Call 3"] {
        lifecycle::create_milestone(&pool, d.id, &milestone(title, 0.333, true, 0.0))
            .await
            .unwrap();
    }
    let d = DeliverableRepo::find_by_id(&pool, d.id).await.unwrap().unwrap();
    assert_eq!(d.total_hours, 0.999);
    assert_eq!(d.client_value, 99.9);

    let v = QuoteVersionRepo::find_by_id(&pool, version.id).await.unwrap().unwrap();
    assert_eq!(v.subtotal, 99.9);
    assert_eq!(v.tax_amount, 9.99);
    assert_eq!(v.total, 109.89);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_oversized_amounts_are_rejected_without_partial_writes(pool: PgPool) {
    let (_, version) = lifecycle::create_quote(&pool, &new_quote("Website"), None)
        .await
        .unwrap();

    assert_matches!(
        lifecycle::create_deliverable(&pool, version.id, &fixed("Huge", 1e17)).await,
        Err(ServiceError::Validation(_))
    );

    // Each input is within bounds but their product is not.
    let err = lifecycle::create_deliverable(&pool, version.id, &hourly("Huge", 1e12, 1e12))
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::Validation(msg) if msg.contains("supported range"));

    assert!(DeliverableRepo::list_by_version(&pool, version.id)
        .await
        .unwrap()
        .is_empty());
    let v = QuoteVersionRepo::find_by_id(&pool, version.id).await.unwrap().unwrap();
    assert_eq!(v.subtotal, 0.0);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_delete_deliverable_removes_milestones_and_drops_totals(pool: PgPool) {
    let (_, version) = lifecycle::create_quote(&pool, &new_quote("Website"), None)
        .await
        .unwrap();
    lifecycle::create_deliverable(&pool, version.id, &fixed("Design", 500.0))
        .await
        .unwrap();
    let build = lifecycle::create_deliverable(&pool, version.id, &hourly("Build", 100.0, 0.0))
        .await
        .unwrap();
    lifecycle::create_milestone(&pool, build.id, &milestone("API", 10.0, true, 50.0))
        .await
        .unwrap();

    let v = lifecycle::delete_deliverable(&pool, build.id).await.unwrap();
    assert_eq!(v.subtotal, 500.0);
    assert_eq!(v.total, 550.0);
    assert!(MilestoneRepo::list_by_deliverable(&pool, build.id)
        .await
        .unwrap()
        .is_empty());

    let err = lifecycle::delete_deliverable(&pool, build.id).await.unwrap_err();
    assert_matches!(err, ServiceError::NotFound { entity: "Deliverable", .. });
}

#[sqlx::test(migrations = "./migrations")]
async fn test_invalid_pricing_input_rejected(pool: PgPool) {
    let (_, version) = lifecycle::create_quote(&pool, &new_quote("Website"), None)
        .await
        .unwrap();

    let mut bad_mode = fixed("Design", 500.0);
    bad_mode.pricing_mode = Some("hourly".to_string());
    assert_matches!(
        lifecycle::create_deliverable(&pool, version.id, &bad_mode).await,
        Err(ServiceError::Validation(_))
    );

    assert_matches!(
        lifecycle::create_deliverable(&pool, version.id, &fixed("Design", -1.0)).await,
        Err(ServiceError::Validation(_))
    );
    assert_matches!(
        lifecycle::create_deliverable(&pool, 999_999, &fixed("Design", 1.0)).await,
        Err(ServiceError::NotFound { .. })
    );
}

#[sqlx::test(migrations = "./migrations")]
async fn test_work_status_must_be_known(pool: PgPool) {
    let (_, version) = lifecycle::create_quote(&pool, &new_quote("Website"), None)
        .await
        .unwrap();

    let mut done = fixed("Design", 500.0);
    done.status = Some("done".to_string());
    assert_matches!(
        lifecycle::create_deliverable(&pool, version.id, &done).await,
        Err(ServiceError::Validation(msg)) if msg.starts_with("Invalid status 'done'")
    );

    let d = lifecycle::create_deliverable(&pool, version.id, &fixed("Design", 500.0))
        .await
        .unwrap();
    assert_eq!(d.status, "draft");
    let d = lifecycle::update_deliverable(
        &pool,
        d.id,
        &UpdateDeliverable {
            status: Some("in_progress".to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(d.status, "in_progress");

    let m = lifecycle::create_milestone(&pool, d.id, &milestone("Wireframes", 4.0, true, 40.0))
        .await
        .unwrap();
    assert_matches!(
        lifecycle::update_milestone(
            &pool,
            m.id,
            &UpdateMilestone {
                status: Some("approved".to_string()),
                ..Default::default()
            },
        )
        .await,
        Err(ServiceError::Validation(_))
    );
}

// ---------------------------------------------------------------------------
// Cloning
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn test_clone_copies_tree_with_fresh_ids(pool: PgPool) {
    let (quote, v1) = lifecycle::create_quote(&pool, &new_quote("Website"), None)
        .await
        .unwrap();
    let d1 = lifecycle::create_deliverable(&pool, v1.id, &fixed("Design", 500.0))
        .await
        .unwrap();
    let d2 = lifecycle::create_deliverable(&pool, v1.id, &hourly("Build", 100.0, 10.0))
        .await
        .unwrap();
    lifecycle::create_milestone(&pool, d2.id, &milestone("API", 4.0, true, 30.0))
        .await
        .unwrap();
    lifecycle::create_milestone(&pool, d2.id, &milestone("UI", 6.0, true, 30.0))
        .await
        .unwrap();

    let v2 = lifecycle::clone_version(&pool, quote.id, None).await.unwrap();
    assert_eq!(v2.version_number, 2);
    assert_eq!(v2.cloned_from_id, Some(v1.id));
    assert_eq!(v2.subtotal, 1500.0);
    assert_eq!(v2.total, 1650.0);

    let detail = lifecycle::load_version_detail(&pool, v2.id).await.unwrap();
    assert!(detail.is_current);
    assert_eq!(detail.deliverables.len(), 2);
    let titles: Vec<_> = detail
        .deliverables
        .iter()
        .map(|d| d.deliverable.title.as_str())
        .collect();
    assert_eq!(titles, ["Design", "Build"]);
    assert!(detail
        .deliverables
        .iter()
        .all(|d| d.deliverable.id != d1.id && d.deliverable.id != d2.id));

    let build = &detail.deliverables[1];
    assert_eq!(build.milestones.len(), 2);
    assert!(build
        .milestones
        .iter()
        .all(|m| m.deliverable_id == build.deliverable.id));

    // The source is untouched and now frozen.
    let source = lifecycle::load_version_detail(&pool, v1.id).await.unwrap();
    assert!(!source.is_current);
    assert_eq!(source.deliverables[1].milestones.len(), 2);
    assert_matches!(
        lifecycle::create_deliverable(&pool, v1.id, &fixed("Late", 1.0)).await,
        Err(ServiceError::Conflict(_))
    );

    let quote = QuoteRepo::find_by_id(&pool, quote.id).await.unwrap().unwrap();
    assert_eq!(quote.last_version_number, 2);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_clone_from_older_source_gets_next_number(pool: PgPool) {
    let (quote, v1) = lifecycle::create_quote(&pool, &new_quote("Website"), None)
        .await
        .unwrap();
    lifecycle::create_deliverable(&pool, v1.id, &fixed("Design", 100.0))
        .await
        .unwrap();
    let v2 = lifecycle::clone_version(&pool, quote.id, None).await.unwrap();
    lifecycle::create_deliverable(&pool, v2.id, &fixed("Extra", 50.0))
        .await
        .unwrap();

    let v3 = lifecycle::clone_version(&pool, quote.id, Some(v1.id))
        .await
        .unwrap();
    assert_eq!(v3.version_number, 3);
    assert_eq!(v3.subtotal, 100.0);

    let versions = QuoteVersionRepo::list_by_quote(&pool, quote.id).await.unwrap();
    let numbers: Vec<_> = versions.iter().map(|v| v.version_number).collect();
    assert_eq!(numbers, [1, 2, 3]);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_clone_rejects_foreign_source(pool: PgPool) {
    let (a, _) = lifecycle::create_quote(&pool, &new_quote("A"), None).await.unwrap();
    let (_, b_v1) = lifecycle::create_quote(&pool, &new_quote("B"), None).await.unwrap();

    let err = lifecycle::clone_version(&pool, a.id, Some(b_v1.id))
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::NotFound { entity: "QuoteVersion", .. });

    // Nothing was written and the counter did not move.
    let a = QuoteRepo::find_by_id(&pool, a.id).await.unwrap().unwrap();
    assert_eq!(a.last_version_number, 1);
}
