//! Request identity.
//!
//! The storefront sits behind an auth service that verifies credentials and
//! forwards the customer id as a bearer token. Extraction resolves that id
//! against the customer directory; handlers then carry a [`Caller`] and do
//! ownership checks themselves, while [`AdminOnly`] gates the admin surface.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use uuid::Uuid;

use super::AppState;
use crate::domain::Customer;
use crate::error::Error;

/// The authenticated customer behind a request.
#[derive(Clone, Debug)]
pub struct Caller {
    pub customer: Customer,
}

impl Caller {
    pub fn is_admin(&self) -> bool {
        self.customer.is_admin
    }
}

#[axum::async_trait]
impl FromRequestParts<AppState> for Caller {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Error> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| Error::Unauthorized("missing authorization header".into()))?;
        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| Error::Unauthorized("authorization must be a bearer token".into()))?;
        let customer_id = Uuid::parse_str(token.trim())
            .map_err(|_| Error::Unauthorized("malformed bearer token".into()))?;

        let customer = state.store.customer(customer_id).await.map_err(|err| match err {
            Error::NotFound(_) => Error::Unauthorized("unknown customer token".into()),
            other => other,
        })?;
        Ok(Self { customer })
    }
}

/// Admin gate: extraction fails with 403 for non-admin callers.
#[derive(Clone, Debug)]
pub struct AdminOnly(pub Caller);

#[axum::async_trait]
impl FromRequestParts<AppState> for AdminOnly {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Error> {
        let caller = Caller::from_request_parts(parts, state).await?;
        if !caller.is_admin() {
            return Err(Error::Forbidden("admin access required".into()));
        }
        Ok(Self(caller))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::http::Request;

    use super::*;
    use crate::domain::NewCustomer;
    use crate::store::{CustomerDirectory, MemoryStore};

    async fn state_with_customer(is_admin: bool) -> (AppState, Uuid) {
        let store = MemoryStore::new();
        let id = Uuid::new_v4();
        store
            .upsert_customer(NewCustomer {
                id,
                name: "Asha Rao".into(),
                email: format!("{}@example.com", id.simple()),
                is_admin,
            })
            .await
            .unwrap();
        (AppState::new(Arc::new(store)), id)
    }

    fn parts_with_auth(value: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/api/cart");
        if let Some(value) = value {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[tokio::test]
    async fn bearer_token_resolves_the_customer() {
        let (state, id) = state_with_customer(false).await;
        let mut parts = parts_with_auth(Some(&format!("Bearer {id}")));
        let caller = Caller::from_request_parts(&mut parts, &state).await.unwrap();
        assert_eq!(caller.customer.id, id);
        assert!(!caller.is_admin());
    }

    #[tokio::test]
    async fn missing_malformed_and_unknown_tokens_are_unauthorized() {
        let (state, _) = state_with_customer(false).await;
        let unknown = format!("Bearer {}", Uuid::new_v4());
        let cases = [
            None,
            Some("Basic abc"),
            Some("Bearer not-a-uuid"),
            Some(unknown.as_str()),
        ];
        for value in cases {
            let mut parts = parts_with_auth(value);
            let err = Caller::from_request_parts(&mut parts, &state)
                .await
                .unwrap_err();
            assert!(matches!(err, Error::Unauthorized(_)), "{value:?}");
        }
    }

    #[tokio::test]
    async fn admin_gate_rejects_regular_customers() {
        let (state, id) = state_with_customer(false).await;
        let mut parts = parts_with_auth(Some(&format!("Bearer {id}")));
        let err = AdminOnly::from_request_parts(&mut parts, &state)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Forbidden(_)));

        let (state, id) = state_with_customer(true).await;
        let mut parts = parts_with_auth(Some(&format!("Bearer {id}")));
        let AdminOnly(caller) = AdminOnly::from_request_parts(&mut parts, &state)
            .await
            .unwrap();
        assert!(caller.is_admin());
    }
}
