mod webhook_auth;

pub use webhook_auth::{WebhookAuthMiddlewareFactory, WebhookAuthMiddlewareService};
