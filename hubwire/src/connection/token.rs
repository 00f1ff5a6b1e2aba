//
// Copyright 2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! Bearer token acquisition.

use async_trait::async_trait;
use std::error::Error;
use std::future::Future;

/// Error type returned by token providers.
pub type TokenError = Box<dyn Error + Send + Sync>;

/// Supplies the bearer token sent with each connection attempt.
///
/// The provider is called once per attempt, including every reconnect, so
/// it may refresh expired tokens. A failure aborts the attempt with
/// [`HubError::TokenProvider`](crate::HubError::TokenProvider).
///
/// Any `Fn() -> impl Future<Output = Result<String, TokenError>>` is a
/// provider:
///
/// ```rust
/// use hubwire::connection::{AccessTokenProvider, TokenError};
///
/// async fn check(provider: impl AccessTokenProvider) {
///     let token = provider.access_token().await.unwrap();
///     assert_eq!(token, "secret");
/// }
///
/// # async fn example() {
/// check(|| async { Ok::<_, TokenError>("secret".to_string()) }).await;
/// # }
/// ```
#[async_trait]
pub trait AccessTokenProvider: Send + Sync {
    /// Returns the token for the next connection attempt.
    async fn access_token(&self) -> Result<String, TokenError>;
}

#[async_trait]
impl<F, Fut> AccessTokenProvider for F
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<String, TokenError>> + Send,
{
    async fn access_token(&self) -> Result<String, TokenError> {
        (self)().await
    }
}

/// A provider that always returns the same token.
#[derive(Clone)]
pub struct StaticToken(String);

impl StaticToken {
    /// Creates a provider for `token`.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

impl std::fmt::Debug for StaticToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("StaticToken(..)")
    }
}

#[async_trait]
impl AccessTokenProvider for StaticToken {
    async fn access_token(&self) -> Result<String, TokenError> {
        Ok(self.0.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn test_closure_provider_called_each_time() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let provider = move || {
            let counter = counter.clone();
            async move {
                let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                Ok::<_, TokenError>(format!("token-{n}"))
            }
        };

        assert_eq!(provider.access_token().await.unwrap(), "token-1");
        assert_eq!(provider.access_token().await.unwrap(), "token-2");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failing_provider() {
        let provider = || async { Err::<String, TokenError>("expired".into()) };
        let error = provider.access_token().await.unwrap_err();
        assert_eq!(error.to_string(), "expired");
    }

    #[tokio::test]
    async fn test_static_token() {
        let provider = StaticToken::new("abc");
        assert_eq!(provider.access_token().await.unwrap(), "abc");
        assert_eq!(format!("{provider:?}"), "StaticToken(..)");
    }
}
