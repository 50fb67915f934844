use rusqlite::Connection;

/// Initialize the main database schema.
pub fn init_db(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        -- Merchants (directory: looked up by id and by secret key)
        CREATE TABLE IF NOT EXISTS merchants (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            email TEXT NOT NULL UNIQUE,
            public_key TEXT NOT NULL UNIQUE,
            secret_key TEXT NOT NULL UNIQUE,
            sandbox_mode INTEGER NOT NULL DEFAULT 1,
            created_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_merchants_secret ON merchants(secret_key);

        -- Transactions (payment ledger)
        -- amount is immutable; status transitions are guarded by
        -- compare-and-set updates on the status column.
        CREATE TABLE IF NOT EXISTS transactions (
            id TEXT PRIMARY KEY,
            order_id TEXT NOT NULL UNIQUE,
            merchant_id TEXT NOT NULL REFERENCES merchants(id) ON DELETE CASCADE,
            amount INTEGER NOT NULL CHECK (amount > 0),
            currency TEXT NOT NULL DEFAULT 'INR',
            method TEXT NOT NULL CHECK (method IN ('card', 'upi', 'wallet', 'netbanking')),
            status TEXT NOT NULL DEFAULT 'pending'
                CHECK (status IN ('pending', 'success', 'failed', 'refunded')),
            customer_email TEXT NOT NULL,
            is_test_mode INTEGER NOT NULL DEFAULT 0,
            has_dispute INTEGER NOT NULL DEFAULT 0,
            refunded_amount INTEGER,
            refund_reason TEXT,
            refund_date INTEGER,
            created_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_transactions_merchant_time
            ON transactions(merchant_id, created_at DESC);
        CREATE INDEX IF NOT EXISTS idx_transactions_status ON transactions(status);

        -- Disputes (chargeback ledger)
        -- UNIQUE(transaction_id) backs the one-dispute-per-transaction rule;
        -- the has_dispute flag on transactions is the primary guard.
        -- The legacy 'resolved' status is intentionally absent from the CHECK:
        -- resolution only ever writes won/lost.
        CREATE TABLE IF NOT EXISTS disputes (
            id TEXT PRIMARY KEY,
            transaction_id TEXT NOT NULL UNIQUE REFERENCES transactions(id) ON DELETE CASCADE,
            merchant_id TEXT NOT NULL REFERENCES merchants(id) ON DELETE CASCADE,
            order_id TEXT NOT NULL,
            amount INTEGER NOT NULL,
            reason TEXT NOT NULL CHECK (reason IN (
                'fraudulent', 'unrecognized', 'duplicate', 'product_not_received',
                'product_unacceptable', 'credit_not_processed', 'other')),
            status TEXT NOT NULL DEFAULT 'open'
                CHECK (status IN ('open', 'under_review', 'won', 'lost')),
            customer_email TEXT NOT NULL,
            customer_message TEXT NOT NULL,
            merchant_response TEXT,
            evidence TEXT,
            resolution_decision TEXT
                CHECK (resolution_decision IS NULL OR resolution_decision IN ('merchant', 'customer')),
            resolved_by TEXT,
            resolved_at INTEGER,
            resolution_notes TEXT,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_disputes_merchant_time
            ON disputes(merchant_id, created_at DESC);
        CREATE INDEX IF NOT EXISTS idx_disputes_status ON disputes(status);

        -- Webhook registrations (outbound fan-out targets)
        CREATE TABLE IF NOT EXISTS webhooks (
            id TEXT PRIMARY KEY,
            merchant_id TEXT NOT NULL REFERENCES merchants(id) ON DELETE CASCADE,
            url TEXT NOT NULL,
            secret TEXT NOT NULL,
            events TEXT NOT NULL DEFAULT '[]',
            created_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_webhooks_merchant ON webhooks(merchant_id);
        "#,
    )?;
    Ok(())
}

/// Initialize the audit log database schema (separate DB file)
/// Optimized for append-only workload with WAL mode
pub fn init_audit_db(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA wal_autocheckpoint = 1000;
        PRAGMA journal_size_limit = 67108864;

        CREATE TABLE IF NOT EXISTS audit_logs (
            id TEXT PRIMARY KEY,
            merchant_id TEXT NOT NULL,
            action TEXT NOT NULL,
            details TEXT NOT NULL,
            ip_address TEXT,
            user_agent TEXT,
            created_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_audit_logs_merchant_time
            ON audit_logs(merchant_id, created_at DESC);
        CREATE INDEX IF NOT EXISTS idx_audit_logs_action ON audit_logs(action);
        "#,
    )?;
    Ok(())
}
