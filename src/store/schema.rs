/// Ordered migration scripts. Version N is `MIGRATIONS[N - 1]`; applied
/// versions are recorded in `schema_migrations` and never re-run.
/// Migrations run out-of-band via `prestock admin migrate`, never at
/// request time.
pub const MIGRATIONS: &[&str] = &[
    // v1: initial schema
    r#"
-- Accounts own everything; email uniqueness is the authoritative
-- duplicate-signup signal
CREATE TABLE accounts (
    id TEXT PRIMARY KEY,
    email TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    display_name TEXT NOT NULL,
    created_at TEXT DEFAULT (datetime('now'))
);

-- Opaque session tokens; reads filter on expires_at, expired rows are
-- purged out-of-band
CREATE TABLE sessions (
    token TEXT PRIMARY KEY,
    account_id TEXT NOT NULL REFERENCES accounts(id) ON DELETE CASCADE,
    expires_at TEXT NOT NULL,
    created_at TEXT DEFAULT (datetime('now'))
);

-- At most one external store connection per account; reconnecting
-- replaces the row wholesale
CREATE TABLE connections (
    account_id TEXT PRIMARY KEY REFERENCES accounts(id) ON DELETE CASCADE,
    store_url TEXT NOT NULL UNIQUE,
    access_token TEXT NOT NULL,
    webhook_secret TEXT,
    created_at TEXT DEFAULT (datetime('now'))
);

-- Per-variant preorder configuration, scoped by account
CREATE TABLE preorder_settings (
    account_id TEXT NOT NULL REFERENCES accounts(id) ON DELETE CASCADE,
    product_handle TEXT NOT NULL,
    variant_title TEXT NOT NULL DEFAULT 'Default',
    variant_sku TEXT NOT NULL DEFAULT '',
    is_preorder_enabled INTEGER NOT NULL DEFAULT 0,
    preorder_limit INTEGER NOT NULL DEFAULT 0,
    preorder_text TEXT NOT NULL DEFAULT '',
    last_updated TEXT DEFAULT (datetime('now')),
    created_at TEXT DEFAULT (datetime('now')),
    PRIMARY KEY (account_id, product_handle, variant_title)
);

CREATE INDEX idx_sessions_account ON sessions(account_id);
CREATE INDEX idx_sessions_expires ON sessions(expires_at);
CREATE INDEX idx_preorder_settings_account ON preorder_settings(account_id);
CREATE INDEX idx_preorder_settings_handle ON preorder_settings(product_handle);
"#,
];
