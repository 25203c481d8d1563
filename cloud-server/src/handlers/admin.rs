//! Admin handlers: report verification, threat feeds, community seed

use axum::{extract::State, Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use antiscam_core::logic::external_intel::{FeedSource, FeedSyncResult};

use crate::{AppState, AppError, AppResult};
use crate::middleware::auth::AdminContext;
use crate::models::{
    blocking_severity, review_label, seed_community_lists, BlocklistEntry, Report, TrainingData,
    VerifyReport, WhitelistEntry,
};

// ============================================================================
// POST /admin/verify
// ============================================================================

pub async fn verify(
    State(state): State<AppState>,
    admin: AdminContext,
    Json(req): Json<VerifyReport>,
) -> AppResult<Json<Value>> {
    let label = review_label(&req.label)
        .ok_or_else(|| AppError::ValidationError("Missing reportId or label".to_string()))?;

    let report = Report::mark_verified(&state.pool, req.report_id, &label)
        .await?
        .ok_or_else(|| AppError::NotFound("Report not found".to_string()))?;

    if req.add_to_training {
        TrainingData::create(&state.pool, &report.url, &report.training_text(), &label, "report").await?;
    }

    if let Some(severity) = blocking_severity(&label) {
        BlocklistEntry::upsert(
            &state.pool,
            &report.domain,
            &format!("Verified report: {}", report.reason),
            severity,
            "community",
        )
        .await?;
        state.lists.invalidate(&report.domain);
    }

    tracing::info!("Report {} verified as {} ({:?})", report.id, label, admin);

    Ok(Json(json!({
        "success": true,
        "data": {
            "message": "Report verified successfully",
            "report_id": report.id,
            "label": label,
        }
    })))
}

// ============================================================================
// THREAT FEEDS
// ============================================================================

#[derive(Debug, Serialize)]
pub struct FeedStatus {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub url: &'static str,
    pub requires_api_key: bool,
    pub configured: bool,
}

#[derive(Debug, Serialize)]
pub struct ProviderStatus {
    pub id: &'static str,
    pub name: &'static str,
    pub configured: bool,
}

/// GET /api/v1/admin/threat-feeds
pub async fn threat_feeds(State(state): State<AppState>) -> AppResult<Json<Value>> {
    let feeds: Vec<FeedStatus> = FeedSource::ALL
        .iter()
        .map(|source| FeedStatus {
            id: source.id(),
            name: source.name(),
            description: source.description(),
            url: source.homepage(),
            requires_api_key: source.requires_api_key(),
            configured: state.feeds.is_enabled(*source),
        })
        .collect();

    let config = &state.config;
    let enrichment = vec![
        ProviderStatus { id: "groq", name: "Groq LLM", configured: config.groq_api_key.is_some() },
        ProviderStatus { id: "virustotal", name: "VirusTotal", configured: config.virustotal_api_key.is_some() },
        ProviderStatus {
            id: "google-safe-browsing",
            name: "Google Safe Browsing",
            configured: config.safe_browsing_api_key.is_some(),
        },
        ProviderStatus { id: "abuseipdb", name: "AbuseIPDB", configured: config.abuseipdb_api_key.is_some() },
    ];

    Ok(Json(json!({
        "feeds": feeds,
        "enrichment": enrichment,
        "active_providers": state.pipeline.checker().active_providers(),
        "ai_model": state.pipeline.ai_name(),
    })))
}

#[derive(Debug, Deserialize)]
pub struct SyncFeedRequest {
    pub source: String,
}

#[derive(Debug, Serialize)]
pub struct FeedImport {
    #[serde(flatten)]
    pub result: FeedSyncResult,
    pub imported: u64,
}

/// Which feeds a `source` value selects
pub fn selected_feeds(source: &str) -> Option<Vec<FeedSource>> {
    if source.eq_ignore_ascii_case("all") {
        return Some(FeedSource::ALL.to_vec());
    }
    FeedSource::from_str(source).map(|s| vec![s])
}

/// POST /api/v1/admin/threat-feeds { source }
pub async fn sync_threat_feeds(
    State(state): State<AppState>,
    Json(req): Json<SyncFeedRequest>,
) -> AppResult<Json<Value>> {
    let sources = selected_feeds(req.source.trim())
        .ok_or_else(|| AppError::ValidationError("Invalid source".to_string()))?;

    let results = if sources.len() > 1 {
        state.feeds.fetch_all().await
    } else {
        let mut single = Vec::with_capacity(1);
        for source in sources {
            single.push(state.feeds.sync(source).await);
        }
        single
    };

    let imports = import_results(&state, results).await?;
    // Cached "not blocked" answers may now be stale
    state.lists.clear();

    Ok(Json(json!({
        "success": true,
        "source": req.source,
        "result": imports,
    })))
}

/// Persist downloaded entries; existing blocklist rows are kept
pub async fn import_results(state: &AppState, results: Vec<FeedSyncResult>) -> AppResult<Vec<FeedImport>> {
    let mut imports = Vec::with_capacity(results.len());
    for result in results {
        let imported = if result.success {
            BlocklistEntry::import_feed(&state.pool, &result.entries).await?
        } else {
            0
        };
        tracing::info!(
            "[{}] {} records, {} imported",
            result.source.name(),
            result.total,
            imported
        );
        imports.push(FeedImport { result, imported });
    }
    Ok(imports)
}

// ============================================================================
// COMMUNITY SEED
// ============================================================================

/// GET /api/v1/admin/sync: list sizes
pub async fn data_stats(State(state): State<AppState>) -> AppResult<Json<Value>> {
    let (blocklist, whitelist) = tokio::try_join!(
        BlocklistEntry::count(&state.pool),
        WhitelistEntry::count(&state.pool),
    )?;

    Ok(Json(json!({
        "success": true,
        "data": {
            "blocklist": blocklist,
            "whitelist": whitelist,
            "last_updated": Utc::now(),
        }
    })))
}

/// POST /api/v1/admin/sync: seed community scam / trusted lists
pub async fn sync_community(State(state): State<AppState>) -> AppResult<Json<Value>> {
    let result = seed_community_lists(&state.pool).await?;
    state.lists.clear();
    Ok(Json(json!({ "success": true, "data": result })))
}
