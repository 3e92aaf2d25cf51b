//! Quote version lifecycle: creation, cloning, and the recompute cascade.
//!
//! Every mutation of a deliverable, milestone, or version pricing setting
//! runs in one transaction together with [`recompute_version_totals`], so a
//! committed change never leaves stale totals behind. Mutations lock the
//! owning quote row first, which also serializes concurrent edits of the
//! same quote.

use std::collections::HashMap;

use sqlx::{PgConnection, PgPool};
use quoteflow_core::pricing::{
    self, compute_totals, rollup_deliverable, DeliverableLine, DEFAULT_GST_RATE,
};
use quoteflow_core::quote_status;
use quoteflow_core::types::DbId;
use quoteflow_core::versioning::{next_sort_order, CloneStage, IdRemap};
use quoteflow_core::work_status;

use crate::error::ServiceError;
use crate::models::deliverable::{CreateDeliverable, Deliverable, UpdateDeliverable};
use crate::models::milestone::{CreateMilestone, Milestone, UpdateMilestone};
use crate::models::quote::{CreateQuote, Quote};
use crate::models::quote_version::{
    DeliverableWithMilestones, NewQuoteVersion, QuoteVersion, UpdateQuoteVersion, VersionDetail,
};
use crate::repositories::{DeliverableRepo, MilestoneRepo, QuoteRepo, QuoteVersionRepo};

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate_title(title: &str) -> Result<(), ServiceError> {
    if title.trim().is_empty() {
        return Err(ServiceError::Validation("title must not be empty".into()));
    }
    Ok(())
}

fn validate_gst(gst_rate: Option<f64>) -> Result<(), ServiceError> {
    if let Some(rate) = gst_rate {
        pricing::validate_gst_rate(rate).map_err(ServiceError::Validation)?;
    }
    Ok(())
}

fn validate_status(status: Option<&str>) -> Result<(), ServiceError> {
    if let Some(status) = status {
        work_status::validate_work_status(status).map_err(ServiceError::Validation)?;
    }
    Ok(())
}

fn validate_deliverable_fields(
    status: Option<&str>,
    pricing_mode: Option<&str>,
    fixed_price_ex_gst: Option<f64>,
    default_client_rate: Option<f64>,
    default_hours: Option<f64>,
) -> Result<(), ServiceError> {
    validate_status(status)?;
    if let Some(mode) = pricing_mode {
        pricing::validate_pricing_mode(mode).map_err(ServiceError::Validation)?;
    }
    for (field, value) in [
        ("fixed_price_ex_gst", fixed_price_ex_gst),
        ("default_client_rate", default_client_rate),
        ("default_hours", default_hours),
    ] {
        pricing::validate_non_negative(field, value).map_err(ServiceError::Validation)?;
    }
    Ok(())
}

fn validate_milestone_fields(
    status: Option<&str>,
    hours: Option<f64>,
    client_rate: Option<f64>,
    cost_rate: Option<f64>,
) -> Result<(), ServiceError> {
    validate_status(status)?;
    for (field, value) in [
        ("hours", hours),
        ("client_rate", client_rate),
        ("cost_rate", cost_rate),
    ] {
        pricing::validate_non_negative(field, value).map_err(ServiceError::Validation)?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Quotes and versions
// ---------------------------------------------------------------------------

/// Create a draft quote together with its version 1.
pub async fn create_quote(
    pool: &PgPool,
    input: &CreateQuote,
    created_by: Option<DbId>,
) -> Result<(Quote, QuoteVersion), ServiceError> {
    validate_title(&input.title)?;
    validate_gst(input.gst_rate)?;

    let mut tx = pool.begin().await?;
    let quote = QuoteRepo::create(&mut *tx, input, created_by).await?;
    let version = QuoteVersionRepo::insert(
        &mut *tx,
        &NewQuoteVersion {
            quote_id: quote.id,
            version_number: quote.last_version_number,
            notes: input.notes.clone(),
            gst_enabled: input.gst_enabled.unwrap_or(true),
            gst_rate: input.gst_rate.unwrap_or(DEFAULT_GST_RATE),
            tax_inclusive: input.tax_inclusive.unwrap_or(false),
            cloned_from_id: None,
        },
    )
    .await?;
    tx.commit().await?;

    tracing::info!(quote_id = quote.id, quote_number = %quote.quote_number, "Quote created");
    Ok((quote, version))
}

/// Load a version with its ordered deliverables and their milestones.
pub async fn load_version_detail(
    pool: &PgPool,
    version_id: DbId,
) -> Result<VersionDetail, ServiceError> {
    let version = QuoteVersionRepo::find_by_id(pool, version_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("QuoteVersion", version_id))?;
    let current = QuoteVersionRepo::find_current_for_quote(pool, version.quote_id).await?;
    let deliverables = DeliverableRepo::list_by_version(pool, version_id).await?;
    let milestones = MilestoneRepo::list_by_version(pool, version_id).await?;

    Ok(VersionDetail {
        is_current: current.is_some_and(|c| c.id == version.id),
        deliverables: attach_milestones(deliverables, milestones),
        version,
    })
}

fn attach_milestones(
    deliverables: Vec<Deliverable>,
    milestones: Vec<Milestone>,
) -> Vec<DeliverableWithMilestones> {
    let mut grouped = group_by_deliverable(milestones);
    deliverables
        .into_iter()
        .map(|deliverable| DeliverableWithMilestones {
            milestones: grouped.remove(&deliverable.id).unwrap_or_default(),
            deliverable,
        })
        .collect()
}

fn group_by_deliverable(milestones: Vec<Milestone>) -> HashMap<DbId, Vec<Milestone>> {
    let mut grouped: HashMap<DbId, Vec<Milestone>> = HashMap::new();
    for milestone in milestones {
        grouped.entry(milestone.deliverable_id).or_default().push(milestone);
    }
    grouped
}

/// Lock the version's quote and check that the version may be edited.
///
/// Only the current version of a quote that has not been decided is
/// editable; superseded versions are immutable.
async fn lock_editable_version(
    conn: &mut PgConnection,
    version_id: DbId,
) -> Result<QuoteVersion, ServiceError> {
    let version = QuoteVersionRepo::find_by_id(&mut *conn, version_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("QuoteVersion", version_id))?;
    let quote = QuoteRepo::find_for_update(&mut *conn, version.quote_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Quote", version.quote_id))?;

    if !quote_status::is_editable(&quote.status) {
        return Err(ServiceError::Conflict(format!(
            "Quote {} is {} and can no longer be edited",
            quote.quote_number, quote.status
        )));
    }
    let current = QuoteVersionRepo::find_current_for_quote(&mut *conn, quote.id).await?;
    if current.map(|c| c.id) != Some(version.id) {
        return Err(ServiceError::Conflict(format!(
            "Version {} of quote {} has been superseded",
            version.version_number, quote.quote_number
        )));
    }
    Ok(version)
}

/// Reload every deliverable and milestone of a version, refresh the
/// deliverable roll-ups, and persist fresh version totals.
pub async fn recompute_version_totals(
    conn: &mut PgConnection,
    version_id: DbId,
) -> Result<QuoteVersion, ServiceError> {
    let version = QuoteVersionRepo::find_by_id(&mut *conn, version_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("QuoteVersion", version_id))?;
    let deliverables = DeliverableRepo::list_by_version(&mut *conn, version_id).await?;
    let mut grouped =
        group_by_deliverable(MilestoneRepo::list_by_version(&mut *conn, version_id).await?);

    let mut lines = Vec::with_capacity(deliverables.len());
    for deliverable in &deliverables {
        let milestone_lines: Vec<_> = grouped
            .remove(&deliverable.id)
            .unwrap_or_default()
            .iter()
            .map(Milestone::line)
            .collect();
        let rollup = rollup_deliverable(deliverable.defaults(), &milestone_lines)
            .map_err(ServiceError::Validation)?;
        DeliverableRepo::update_rollup(&mut *conn, deliverable.id, &rollup).await?;
        lines.push(DeliverableLine {
            total_hours: Some(rollup.total_hours),
            ..deliverable.line()
        });
    }

    let totals =
        compute_totals(version.gst_config(), &lines).map_err(ServiceError::Validation)?;
    let updated = QuoteVersionRepo::update_totals(&mut *conn, version_id, &totals).await?;
    tracing::debug!(
        version_id,
        deliverables = lines.len(),
        subtotal = totals.subtotal,
        total = totals.total,
        "Version totals recomputed",
    );
    Ok(updated)
}

/// Change a version's pricing configuration and recompute its totals.
pub async fn update_version_settings(
    pool: &PgPool,
    version_id: DbId,
    input: &UpdateQuoteVersion,
) -> Result<QuoteVersion, ServiceError> {
    validate_gst(input.gst_rate)?;

    let mut tx = pool.begin().await?;
    lock_editable_version(&mut tx, version_id).await?;
    QuoteVersionRepo::update_settings(&mut *tx, version_id, input)
        .await?
        .ok_or_else(|| ServiceError::not_found("QuoteVersion", version_id))?;
    let version = recompute_version_totals(&mut tx, version_id).await?;
    tx.commit().await?;
    Ok(version)
}

/// Clone a version of a quote into a new current version.
///
/// `source_version_id` defaults to the quote's current version. The copy
/// gets the next version number, fresh ids for every deliverable and
/// milestone, and the same order and pricing fields. The whole walk runs
/// in one transaction; a failure rolls everything back and is reported
/// with the stage reached.
pub async fn clone_version(
    pool: &PgPool,
    quote_id: DbId,
    source_version_id: Option<DbId>,
) -> Result<QuoteVersion, ServiceError> {
    let mut tx = pool.begin().await?;
    let mut stage = CloneStage::LoadedSource;

    match run_clone(&mut tx, quote_id, source_version_id, &mut stage).await {
        Ok(outcome) => {
            tx.commit().await?;
            tracing::info!(
                quote_id,
                source_version_id = outcome.source_version_id,
                version_id = outcome.version.id,
                version_number = outcome.version.version_number,
                deliverables = outcome.deliverables,
                milestones = outcome.milestones,
                "Quote version cloned",
            );
            Ok(outcome.version)
        }
        Err(err) => {
            tracing::warn!(quote_id, %stage, error = %err, "Version clone failed");
            tx.rollback().await?;
            Err(err)
        }
    }
}

struct CloneOutcome {
    source_version_id: DbId,
    deliverables: usize,
    milestones: usize,
    version: QuoteVersion,
}

async fn run_clone(
    conn: &mut PgConnection,
    quote_id: DbId,
    source_version_id: Option<DbId>,
    stage: &mut CloneStage,
) -> Result<CloneOutcome, ServiceError> {
    let quote = QuoteRepo::find_for_update(&mut *conn, quote_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Quote", quote_id))?;
    if quote_status::is_terminal(&quote.status) {
        return Err(ServiceError::Conflict(format!(
            "Quote {} is {} and cannot be revised",
            quote.quote_number, quote.status
        )));
    }

    let source = match source_version_id {
        Some(id) => QuoteVersionRepo::find_by_id(&mut *conn, id)
            .await?
            .filter(|v| v.quote_id == quote_id)
            .ok_or_else(|| ServiceError::not_found("QuoteVersion", id))?,
        None => QuoteVersionRepo::find_current_for_quote(&mut *conn, quote_id)
            .await?
            .ok_or_else(|| {
                ServiceError::Conflict(format!("Quote {} has no versions", quote.quote_number))
            })?,
    };
    let deliverables = DeliverableRepo::list_by_version(&mut *conn, source.id).await?;
    let milestones = MilestoneRepo::list_by_version(&mut *conn, source.id).await?;

    let version_number = QuoteRepo::bump_version_counter(&mut *conn, quote_id).await?;
    let created = QuoteVersionRepo::insert(
        &mut *conn,
        &NewQuoteVersion {
            quote_id,
            version_number,
            notes: source.notes.clone(),
            gst_enabled: source.gst_enabled,
            gst_rate: source.gst_rate,
            tax_inclusive: source.tax_inclusive,
            cloned_from_id: Some(source.id),
        },
    )
    .await?;
    *stage = stage.next();

    let mut remap = IdRemap::new();
    for deliverable in &deliverables {
        let copy = DeliverableRepo::insert_copy(&mut *conn, created.id, deliverable).await?;
        remap
            .insert(deliverable.id, copy.id)
            .map_err(ServiceError::Conflict)?;
    }
    *stage = stage.next();

    for milestone in &milestones {
        let new_parent = remap.get(milestone.deliverable_id).ok_or_else(|| {
            ServiceError::Conflict(format!(
                "Milestone {} references a deliverable outside version {}",
                milestone.id, source.id
            ))
        })?;
        MilestoneRepo::insert_copy(&mut *conn, new_parent, milestone).await?;
    }
    *stage = stage.next();

    let version = recompute_version_totals(conn, created.id).await?;
    *stage = stage.next();

    Ok(CloneOutcome {
        source_version_id: source.id,
        deliverables: remap.len(),
        milestones: milestones.len(),
        version,
    })
}

// ---------------------------------------------------------------------------
// Deliverables
// ---------------------------------------------------------------------------

/// Add a deliverable to a version and recompute.
///
/// Without an explicit `sort_order` the deliverable goes after the last one.
pub async fn create_deliverable(
    pool: &PgPool,
    version_id: DbId,
    input: &CreateDeliverable,
) -> Result<Deliverable, ServiceError> {
    validate_title(&input.title)?;
    validate_deliverable_fields(
        input.status.as_deref(),
        input.pricing_mode.as_deref(),
        input.fixed_price_ex_gst,
        input.default_client_rate,
        input.default_hours,
    )?;

    let mut tx = pool.begin().await?;
    lock_editable_version(&mut tx, version_id).await?;
    let sort_order = match input.sort_order {
        Some(order) => order,
        None => next_sort_order(DeliverableRepo::max_sort_order(&mut *tx, version_id).await?),
    };
    let created = DeliverableRepo::insert(&mut *tx, version_id, sort_order, input).await?;
    recompute_version_totals(&mut tx, version_id).await?;
    let deliverable = reload_deliverable(&mut tx, created.id).await?;
    tx.commit().await?;
    Ok(deliverable)
}

pub async fn update_deliverable(
    pool: &PgPool,
    deliverable_id: DbId,
    input: &UpdateDeliverable,
) -> Result<Deliverable, ServiceError> {
    if let Some(title) = &input.title {
        validate_title(title)?;
    }
    validate_deliverable_fields(
        input.status.as_deref(),
        input.pricing_mode.as_deref(),
        input.fixed_price_ex_gst,
        input.default_client_rate,
        input.default_hours,
    )?;

    let mut tx = pool.begin().await?;
    let existing = reload_deliverable(&mut tx, deliverable_id).await?;
    lock_editable_version(&mut tx, existing.quote_version_id).await?;
    DeliverableRepo::update(&mut *tx, deliverable_id, input)
        .await?
        .ok_or_else(|| ServiceError::not_found("Deliverable", deliverable_id))?;
    recompute_version_totals(&mut tx, existing.quote_version_id).await?;
    let deliverable = reload_deliverable(&mut tx, deliverable_id).await?;
    tx.commit().await?;
    Ok(deliverable)
}

/// Delete a deliverable and its milestones, then recompute.
///
/// Returns the version with its refreshed totals.
pub async fn delete_deliverable(
    pool: &PgPool,
    deliverable_id: DbId,
) -> Result<QuoteVersion, ServiceError> {
    let mut tx = pool.begin().await?;
    let existing = reload_deliverable(&mut tx, deliverable_id).await?;
    lock_editable_version(&mut tx, existing.quote_version_id).await?;
    let removed = MilestoneRepo::delete_by_deliverable(&mut *tx, deliverable_id).await?;
    DeliverableRepo::delete(&mut *tx, deliverable_id).await?;
    let version = recompute_version_totals(&mut tx, existing.quote_version_id).await?;
    tx.commit().await?;

    tracing::info!(deliverable_id, milestones = removed, "Deliverable deleted");
    Ok(version)
}

async fn reload_deliverable(
    conn: &mut PgConnection,
    deliverable_id: DbId,
) -> Result<Deliverable, ServiceError> {
    DeliverableRepo::find_by_id(&mut *conn, deliverable_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Deliverable", deliverable_id))
}

// ---------------------------------------------------------------------------
// Milestones
// ---------------------------------------------------------------------------

pub async fn create_milestone(
    pool: &PgPool,
    deliverable_id: DbId,
    input: &CreateMilestone,
) -> Result<Milestone, ServiceError> {
    validate_title(&input.title)?;
    validate_milestone_fields(
        input.status.as_deref(),
        input.hours,
        input.client_rate,
        input.cost_rate,
    )?;

    let mut tx = pool.begin().await?;
    let parent = reload_deliverable(&mut tx, deliverable_id).await?;
    lock_editable_version(&mut tx, parent.quote_version_id).await?;
    let sort_order = match input.sort_order {
        Some(order) => order,
        None => next_sort_order(MilestoneRepo::max_sort_order(&mut *tx, deliverable_id).await?),
    };
    let milestone = MilestoneRepo::insert(&mut *tx, deliverable_id, sort_order, input).await?;
    recompute_version_totals(&mut tx, parent.quote_version_id).await?;
    tx.commit().await?;
    Ok(milestone)
}

pub async fn update_milestone(
    pool: &PgPool,
    milestone_id: DbId,
    input: &UpdateMilestone,
) -> Result<Milestone, ServiceError> {
    if let Some(title) = &input.title {
        validate_title(title)?;
    }
    validate_milestone_fields(
        input.status.as_deref(),
        input.hours,
        input.client_rate,
        input.cost_rate,
    )?;

    let mut tx = pool.begin().await?;
    let existing = MilestoneRepo::find_by_id(&mut *tx, milestone_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Milestone", milestone_id))?;
    let parent = reload_deliverable(&mut tx, existing.deliverable_id).await?;
    lock_editable_version(&mut tx, parent.quote_version_id).await?;
    let milestone = MilestoneRepo::update(&mut *tx, milestone_id, input)
        .await?
        .ok_or_else(|| ServiceError::not_found("Milestone", milestone_id))?;
    recompute_version_totals(&mut tx, parent.quote_version_id).await?;
    tx.commit().await?;
    Ok(milestone)
}

/// Delete a milestone and recompute. Returns the refreshed version.
pub async fn delete_milestone(
    pool: &PgPool,
    milestone_id: DbId,
) -> Result<QuoteVersion, ServiceError> {
    let mut tx = pool.begin().await?;
    let existing = MilestoneRepo::find_by_id(&mut *tx, milestone_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Milestone", milestone_id))?;
    let parent = reload_deliverable(&mut tx, existing.deliverable_id).await?;
    lock_editable_version(&mut tx, parent.quote_version_id).await?;
    MilestoneRepo::delete(&mut *tx, milestone_id).await?;
    let version = recompute_version_totals(&mut tx, parent.quote_version_id).await?;
    tx.commit().await?;
    Ok(version)
}

/// Load the current version of a quote with its full tree.
pub async fn load_current_version_detail(
    pool: &PgPool,
    quote_id: DbId,
) -> Result<VersionDetail, ServiceError> {
    let current = QuoteVersionRepo::find_current_for_quote(pool, quote_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Quote", quote_id))?;
    load_version_detail(pool, current.id).await
}
