//! Database module - PostgreSQL connection and migrations

use sqlx::{postgres::PgPoolOptions, PgPool};

/// Create database connection pool
pub async fn create_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
}

/// Run database migrations
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    // Multi-statement script: raw_sql skips the prepared statement path
    sqlx::raw_sql(SCHEMA_SQL)
        .execute(pool)
        .await?;

    tracing::info!("Database schema applied successfully");
    Ok(())
}

/// Database schema SQL
const SCHEMA_SQL: &str = r#"
-- Users
CREATE TABLE IF NOT EXISTS users (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    email VARCHAR(255) NOT NULL UNIQUE,
    password_hash VARCHAR(255) NOT NULL,
    name VARCHAR(255),
    role VARCHAR(20) NOT NULL DEFAULT 'USER',
    tier VARCHAR(20) NOT NULL DEFAULT 'FREE',
    daily_scans INT NOT NULL DEFAULT 0,
    daily_image_scans INT NOT NULL DEFAULT 0,
    last_reset_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    total_scans INT NOT NULL DEFAULT 0,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

-- Every scan (global statistics)
CREATE TABLE IF NOT EXISTS scans (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    url TEXT NOT NULL,
    domain TEXT NOT NULL,
    score INT NOT NULL,
    label VARCHAR(20) NOT NULL,
    reasons TEXT[] NOT NULL DEFAULT '{}',
    ai_confidence REAL NOT NULL DEFAULT 0,
    ip_address VARCHAR(64),
    user_agent VARCHAR(500),
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

-- Personal history (authenticated scans)
CREATE TABLE IF NOT EXISTS scan_history (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    url TEXT NOT NULL,
    domain TEXT NOT NULL,
    score INT NOT NULL,
    label VARCHAR(20) NOT NULL,
    reasons TEXT[] NOT NULL DEFAULT '{}',
    ai_confidence REAL NOT NULL DEFAULT 0,
    heuristic_score INT NOT NULL DEFAULT 0,
    ai_score INT NOT NULL DEFAULT 0,
    share_token VARCHAR(32) UNIQUE,
    is_public BOOLEAN NOT NULL DEFAULT true,
    ip_address VARCHAR(64),
    user_agent VARCHAR(500),
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

-- Daily counters (local calendar day)
CREATE TABLE IF NOT EXISTS daily_stats (
    date DATE PRIMARY KEY,
    total_scans INT NOT NULL DEFAULT 0,
    safe_count INT NOT NULL DEFAULT 0,
    caution_count INT NOT NULL DEFAULT 0,
    dangerous_count INT NOT NULL DEFAULT 0,
    reports_count INT NOT NULL DEFAULT 0
);

-- Blocked domains
CREATE TABLE IF NOT EXISTS blocklist (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    domain TEXT NOT NULL UNIQUE,
    reason TEXT NOT NULL,
    severity VARCHAR(20) NOT NULL DEFAULT 'MEDIUM',
    source VARCHAR(50) NOT NULL DEFAULT 'manual',
    metadata JSONB,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

-- Trusted domains
CREATE TABLE IF NOT EXISTS whitelist (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    domain TEXT NOT NULL UNIQUE,
    name VARCHAR(255),
    category VARCHAR(50),
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

-- Community reports
CREATE TABLE IF NOT EXISTS reports (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    url TEXT NOT NULL,
    domain TEXT NOT NULL,
    reason VARCHAR(100) NOT NULL,
    description TEXT,
    screenshot TEXT,
    ip_address VARCHAR(64),
    verified BOOLEAN NOT NULL DEFAULT false,
    label VARCHAR(20),
    verified_at TIMESTAMPTZ,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

-- Labelled samples from verified reports
CREATE TABLE IF NOT EXISTS training_data (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    url TEXT NOT NULL,
    text TEXT NOT NULL,
    label VARCHAR(20) NOT NULL,
    source VARCHAR(50) NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

-- Watchlist (PRO+)
CREATE TABLE IF NOT EXISTS watchlist (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    type VARCHAR(20) NOT NULL,
    value VARCHAR(500) NOT NULL,
    name VARCHAR(255),
    notes TEXT,
    alert_email BOOLEAN NOT NULL DEFAULT true,
    alert_in_app BOOLEAN NOT NULL DEFAULT true,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    UNIQUE (user_id, type, value)
);

CREATE TABLE IF NOT EXISTS watchlist_alerts (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    watchlist_id UUID NOT NULL REFERENCES watchlist(id) ON DELETE CASCADE,
    match_type VARCHAR(20) NOT NULL,
    matched_value TEXT NOT NULL,
    context TEXT,
    is_read BOOLEAN NOT NULL DEFAULT false,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

-- API keys (BUSINESS+), only the SHA-256 is stored
CREATE TABLE IF NOT EXISTS api_keys (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    name VARCHAR(100) NOT NULL,
    key_hash VARCHAR(64) NOT NULL UNIQUE,
    prefix VARCHAR(8) NOT NULL,
    is_active BOOLEAN NOT NULL DEFAULT true,
    last_used_at TIMESTAMPTZ,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

-- Domains are unbounded in older schemas too
ALTER TABLE scans ALTER COLUMN domain TYPE TEXT;
ALTER TABLE scan_history ALTER COLUMN domain TYPE TEXT;
ALTER TABLE blocklist ALTER COLUMN domain TYPE TEXT;
ALTER TABLE whitelist ALTER COLUMN domain TYPE TEXT;
ALTER TABLE reports ALTER COLUMN domain TYPE TEXT;

-- Indexes
CREATE INDEX IF NOT EXISTS idx_scans_domain ON scans(domain);
CREATE INDEX IF NOT EXISTS idx_scans_label ON scans(label);
CREATE INDEX IF NOT EXISTS idx_scans_created ON scans(created_at DESC);
CREATE INDEX IF NOT EXISTS idx_history_user ON scan_history(user_id, created_at DESC);
CREATE INDEX IF NOT EXISTS idx_blocklist_source ON blocklist(source);
CREATE INDEX IF NOT EXISTS idx_reports_verified ON reports(verified, created_at DESC);
CREATE INDEX IF NOT EXISTS idx_watchlist_user ON watchlist(user_id);
CREATE INDEX IF NOT EXISTS idx_alerts_watchlist ON watchlist_alerts(watchlist_id);
CREATE INDEX IF NOT EXISTS idx_api_keys_user ON api_keys(user_id);
"#;
