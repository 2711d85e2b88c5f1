//! Pluggable strategies: per-request context and policy, per-entity create hooks.

use crate::config::ResolvedEntity;
use crate::error::AppError;
use crate::store::Record;
use async_trait::async_trait;
use axum::http::{HeaderMap, Method, Uri};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Operation a request is about to perform on a table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Action {
    RetrieveMany,
    RetrieveOne,
    Create,
    Update,
    Delete,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::RetrieveMany => "retrieve_many",
            Action::RetrieveOne => "retrieve_one",
            Action::Create => "create",
            Action::Update => "update",
            Action::Delete => "delete",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-request data handed to the validator. Lives for one request only.
#[derive(Clone, Debug)]
pub struct RequestContext {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
    /// Free-form values set by the [`ContextInitializer`] (caller id, tenant, ...).
    pub attributes: HashMap<String, String>,
}

impl RequestContext {
    pub fn new(method: Method, uri: Uri, headers: HeaderMap) -> Self {
        RequestContext {
            method,
            uri,
            headers,
            attributes: HashMap::new(),
        }
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }
}

/// Populates a fresh [`RequestContext`] before the validator runs.
pub trait ContextInitializer: Send + Sync {
    fn initialize(&self, ctx: &mut RequestContext);
}

/// Policy consulted before every list, get, add, update and delete.
#[async_trait]
pub trait RequestValidator: Send + Sync {
    async fn validate(&self, ctx: &RequestContext, table: &str, action: Action) -> Result<(), AppError>;
}

/// Leaves the context as built from the request.
pub struct NoContext;

impl ContextInitializer for NoContext {
    fn initialize(&self, _ctx: &mut RequestContext) {}
}

/// Lets every request through.
pub struct AllowAll;

#[async_trait]
impl RequestValidator for AllowAll {
    async fn validate(&self, _ctx: &RequestContext, _table: &str, _action: Action) -> Result<(), AppError> {
        Ok(())
    }
}

/// Request-level strategies passed to the router at construction.
#[derive(Clone)]
pub struct Hooks {
    pub validator: Arc<dyn RequestValidator>,
    pub context: Arc<dyn ContextInitializer>,
}

impl Default for Hooks {
    fn default() -> Self {
        Hooks {
            validator: Arc::new(AllowAll),
            context: Arc::new(NoContext),
        }
    }
}

impl Hooks {
    pub fn with_validator(mut self, validator: Arc<dyn RequestValidator>) -> Self {
        self.validator = validator;
        self
    }

    pub fn with_context(mut self, context: Arc<dyn ContextInitializer>) -> Self {
        self.context = context;
        self
    }

    /// Build the request context and run the validator against it.
    pub async fn check(
        &self,
        method: Method,
        uri: Uri,
        headers: HeaderMap,
        table: &str,
        action: Action,
    ) -> Result<RequestContext, AppError> {
        let mut ctx = RequestContext::new(method, uri, headers);
        self.context.initialize(&mut ctx);
        self.validator.validate(&ctx, table, action).await?;
        Ok(ctx)
    }
}

/// Create-time hooks for one table, run in order: `before_save`, `prepare`, `validate`.
pub trait EntityHooks: Send + Sync {
    /// Fallible pre-save step; an error aborts the create.
    fn before_save(&self, _entity: &ResolvedEntity, _record: &mut Record) -> Result<(), AppError> {
        Ok(())
    }

    fn prepare(&self, _entity: &ResolvedEntity, _record: &mut Record) {}

    /// Runs after the column rules have passed.
    fn validate(&self, _entity: &ResolvedEntity, _record: &Record) -> Result<(), AppError> {
        Ok(())
    }
}

pub struct NoHooks;

impl EntityHooks for NoHooks {}

#[cfg(test)]
mod tests {
    use super::*;

    struct Tenant;

    impl ContextInitializer for Tenant {
        fn initialize(&self, ctx: &mut RequestContext) {
            if let Some(v) = ctx.headers.get("x-tenant").and_then(|v| v.to_str().ok()) {
                ctx.attributes.insert("tenant".into(), v.to_string());
            }
        }
    }

    struct TenantRequired;

    #[async_trait]
    impl RequestValidator for TenantRequired {
        async fn validate(&self, ctx: &RequestContext, table: &str, action: Action) -> Result<(), AppError> {
            match ctx.attribute("tenant") {
                Some(_) => Ok(()),
                None => Err(AppError::Forbidden(format!("{} on {} needs a tenant", action, table))),
            }
        }
    }

    #[tokio::test]
    async fn default_hooks_allow_everything() {
        let ctx = Hooks::default()
            .check(Method::GET, Uri::from_static("/users"), HeaderMap::new(), "users", Action::RetrieveMany)
            .await
            .unwrap();
        assert!(ctx.attributes.is_empty());
    }

    #[tokio::test]
    async fn validator_sees_initialized_context() {
        let hooks = Hooks::default()
            .with_context(Arc::new(Tenant))
            .with_validator(Arc::new(TenantRequired));

        let err = hooks
            .check(Method::DELETE, Uri::from_static("/users/1"), HeaderMap::new(), "users", Action::Delete)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "forbidden: delete on users needs a tenant");

        let mut headers = HeaderMap::new();
        headers.insert("x-tenant", "acme".parse().unwrap());
        let ctx = hooks
            .check(Method::DELETE, Uri::from_static("/users/1"), headers, "users", Action::Delete)
            .await
            .unwrap();
        assert_eq!(ctx.attribute("tenant"), Some("acme"));
    }
}
