// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::Result;
use crate::constants::BACKGROUND_REFRESH_TIMEOUT;
use crate::errors;
use crate::token::{TokenData, TokenSource, TokenState, now};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Caches the token returned by a [TokenSource].
///
/// Tokens that are past their refresh time are returned immediately, and a
/// single background task fetches a replacement. Expired (or missing) tokens
/// are fetched synchronously. At most one fetch is in flight for each cache.
#[derive(Debug)]
pub(crate) struct TokenCache<T> {
    inner: Arc<Inner<T>>,
}

#[derive(Debug)]
struct Inner<T> {
    source: T,
    // The current token. The lock is only held to clone or replace the `Arc`.
    token: Mutex<Option<Arc<TokenData>>>,
    // Serializes fetches, held while the fetch is in progress.
    fetch_lock: tokio::sync::Mutex<()>,
    // Set while a background refresh is scheduled or running.
    refresh_in_progress: AtomicBool,
}

// Implemented manually because `T` need not be `Clone`.
impl<T> Clone for TokenCache<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: TokenSource + 'static> TokenCache<T> {
    pub(crate) fn new(source: T) -> Self {
        Self {
            inner: Arc::new(Inner {
                source,
                token: Mutex::new(None),
                fetch_lock: tokio::sync::Mutex::new(()),
                refresh_in_progress: AtomicBool::new(false),
            }),
        }
    }

    /// Returns a usable access token, fetching a new one if needed.
    pub(crate) async fn token(&self) -> Result<String> {
        match self.inner.current() {
            Some(t) => match t.state(now()) {
                TokenState::Valid => Ok(t.access_token.clone()),
                TokenState::StaleButUsable => {
                    self.start_background_refresh();
                    Ok(t.access_token.clone())
                }
                TokenState::Expired => self.inner.fetch_if_expired().await,
            },
            None => self.inner.fetch_if_expired().await,
        }
    }

    fn start_background_refresh(&self) {
        if self
            .inner
            .refresh_in_progress
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }
        let inner = self.inner.clone();
        tokio::spawn(async move {
            // Cleared even if the task is aborted or the source panics.
            let _reset = ClearOnDrop(&inner.refresh_in_progress);
            let result = tokio::time::timeout(BACKGROUND_REFRESH_TIMEOUT, inner.refresh()).await;
            match result {
                Ok(Ok(())) => {}
                Ok(Err(e)) => tracing::warn!("background token refresh failed: {e}"),
                Err(_) => tracing::warn!(
                    "background token refresh did not complete in {BACKGROUND_REFRESH_TIMEOUT:?}"
                ),
            }
        });
    }
}

struct ClearOnDrop<'a>(&'a AtomicBool);

impl Drop for ClearOnDrop<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<T: TokenSource> Inner<T> {
    fn current(&self) -> Option<Arc<TokenData>> {
        self.token
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn store(&self, token: Arc<TokenData>) {
        *self.token.lock().unwrap_or_else(PoisonError::into_inner) = Some(token);
    }

    async fn fetch_if_expired(&self) -> Result<String> {
        let _guard = self.fetch_lock.lock().await;
        // Another caller may have completed a fetch while this one waited.
        if let Some(t) = self
            .current()
            .filter(|t| t.state(now()) != TokenState::Expired)
        {
            return Ok(t.access_token.clone());
        }
        let token = self.fetch().await?;
        Ok(token.access_token.clone())
    }

    async fn refresh(&self) -> Result<()> {
        let _guard = self.fetch_lock.lock().await;
        if self
            .current()
            .is_some_and(|t| t.state(now()) == TokenState::Valid)
        {
            return Ok(());
        }
        self.fetch().await.map(|_| ())
    }

    // Must be called with `fetch_lock` held.
    async fn fetch(&self) -> Result<Arc<TokenData>> {
        let token = self.source.fetch().await?;
        if token.access_token.is_empty() {
            return Err(errors::non_transient_from_str(
                "the token source returned an empty access token",
            ));
        }
        tracing::debug!(
            expiration = token.expiration,
            refresh_time = token.refresh_time,
            "fetched a new access token"
        );
        let token = Arc::new(token);
        self.store(token.clone());
        Ok(token)
    }
}
