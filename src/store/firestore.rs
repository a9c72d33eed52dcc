// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore-backed remote state store.
//!
//! Single-row-per-user semantics over two collections:
//! - `user_data`: the whole `UserData` blob plus its `lastUpdated` column
//! - `user_stats`: one row of individual numeric stat columns

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::models::{Stats, StatsUpdate, UserData};
use crate::store::collections;
use crate::store::remote::{RemoteStore, UserDataRow};

/// Firestore client wrapper.
#[derive(Clone)]
pub struct FirestoreRemote {
    client: Option<firestore::FirestoreDb>,
}

/// Projection for timestamp-only fetches; unknown fields are ignored.
#[derive(Debug, Deserialize)]
struct RowStamp {
    #[serde(rename = "lastUpdated")]
    last_updated: i64,
}

impl FirestoreRemote {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Remote(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Remote(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock client for testing (offline mode).
    ///
    /// All remote operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Remote("Remote store not connected (offline mode)".to_string()))
    }
}

#[async_trait]
impl RemoteStore for FirestoreRemote {
    async fn fetch_last_updated(&self, uid: &str) -> Result<Option<i64>> {
        let stamp: Option<RowStamp> = self
            .get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USER_DATA)
            .obj()
            .one(uid)
            .await
            .map_err(|e| AppError::Remote(e.to_string()))?;

        Ok(stamp.map(|s| s.last_updated))
    }

    async fn fetch_user_data(&self, uid: &str) -> Result<Option<UserDataRow>> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USER_DATA)
            .obj()
            .one(uid)
            .await
            .map_err(|e| AppError::Remote(e.to_string()))
    }

    async fn upsert_user_data(&self, uid: &str, data: &UserData) -> Result<()> {
        let row = UserDataRow {
            uid: uid.to_string(),
            last_updated: data.last_updated,
            data: serde_json::to_value(data)?,
        };

        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::USER_DATA)
            .document_id(uid)
            .object(&row)
            .execute()
            .await
            .map_err(|e| AppError::Remote(e.to_string()))?;
        Ok(())
    }

    async fn fetch_stats(&self, uid: &str) -> Result<Option<Stats>> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USER_STATS)
            .obj()
            .one(uid)
            .await
            .map_err(|e| AppError::Remote(e.to_string()))
    }

    async fn upsert_stats(&self, uid: &str, stats: &Stats) -> Result<()> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::USER_STATS)
            .document_id(uid)
            .object(stats)
            .execute()
            .await
            .map_err(|e| AppError::Remote(e.to_string()))?;
        Ok(())
    }

    /// Partial stats update as a read-modify-write transaction.
    ///
    /// Reading inside the transaction registers the row for conflict
    /// detection; if another writer lands first, Firestore retries with
    /// fresh data, preventing lost updates.
    async fn update_stats(&self, uid: &str, update: &StatsUpdate) -> Result<()> {
        let client = self.get_client()?;

        let mut transaction = client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Remote(format!("Failed to begin transaction: {}", e)))?;

        let current: Option<Stats> = client
            .fluent()
            .select()
            .by_id_in(collections::USER_STATS)
            .obj()
            .one(uid)
            .await
            .map_err(|e| AppError::Remote(format!("Failed to read stats in transaction: {}", e)))?;

        let mut stats = current.unwrap_or_else(|| Stats::new(uid, update.last_updated));
        stats.apply_update(update);

        client
            .fluent()
            .update()
            .in_col(collections::USER_STATS)
            .document_id(uid)
            .object(&stats)
            .add_to_transaction(&mut transaction)
            .map_err(|e| AppError::Remote(format!("Failed to add stats to transaction: {}", e)))?;

        transaction
            .commit()
            .await
            .map_err(|e| AppError::Remote(format!("Transaction commit failed: {}", e)))?;

        Ok(())
    }
}
