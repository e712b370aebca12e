//! Webhook authentication middleware for Actix Web.
//!
//! Razorpay signs each webhook delivery with HMAC-SHA256 over the raw body, keyed with the webhook secret, and sends
//! the hex digest in the `X-Razorpay-Signature` header. This middleware
//! 1. optionally rejects peers that are not on the IP whitelist (403),
//! 2. reads the raw body and verifies the signature over exactly those bytes (400, or 500 if no secret is configured),
//! 3. puts the bytes back into the request so that the handler sees the same body.
//!
//! Wrap every webhook route with this middleware.

use std::{
    future::{ready, Ready},
    net::IpAddr,
    rc::Rc,
};

use actix_http::h1;
use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
    web,
    Error,
};
use futures::future::LocalBoxFuture;
use log::*;
use razorpay_tools::{WebhookVerifier, SIGNATURE_HEADER};

use crate::{
    config::ServerOptions,
    errors::{AuthError, ServerError},
    helpers::get_remote_ip,
};

#[derive(Clone)]
struct WebhookAuthSettings {
    verifier: WebhookVerifier,
    // If false, then the middleware will not check the signature and always allow the call
    enabled: bool,
    whitelist: Option<Vec<IpAddr>>,
    options: ServerOptions,
}

pub struct WebhookAuthMiddlewareFactory {
    settings: Rc<WebhookAuthSettings>,
}

impl WebhookAuthMiddlewareFactory {
    pub fn new(
        verifier: WebhookVerifier,
        enabled: bool,
        whitelist: Option<Vec<IpAddr>>,
        options: ServerOptions,
    ) -> Self {
        let settings = WebhookAuthSettings { verifier, enabled, whitelist, options };
        Self { settings: Rc::new(settings) }
    }
}

impl<S, B> Transform<S, ServiceRequest> for WebhookAuthMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;
    type InitError = ();
    type Response = ServiceResponse<EitherBody<B>>;
    type Transform = WebhookAuthMiddlewareService<S>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(WebhookAuthMiddlewareService { settings: Rc::clone(&self.settings), service: Rc::new(service) }))
    }
}

pub struct WebhookAuthMiddlewareService<S> {
    settings: Rc<WebhookAuthSettings>,
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for WebhookAuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;
    type Response = ServiceResponse<EitherBody<B>>;

    forward_ready!(service);

    fn call(&self, mut req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let settings = Rc::clone(&self.settings);
        Box::pin(async move {
            if let Err(e) = check_peer(&req, &settings) {
                return Ok(req.error_response(e).map_into_right_body());
            }
            if !settings.enabled {
                trace!("🔐️ Signature checks are disabled. Allowing request.");
                return service.call(req).await.map(ServiceResponse::map_into_left_body);
            }
            if !settings.verifier.is_configured() {
                error!("🔐️ Received a webhook, but RAZORPAY_WEBHOOK_SECRET is not set. Rejecting with a server error.");
                let e = ServerError::ConfigurationError("The webhook secret has not been configured".into());
                return Ok(req.error_response(e).map_into_right_body());
            }
            let data = match req.extract::<web::Bytes>().await {
                Ok(data) => data,
                Err(e) => {
                    warn!("🔐️ Failed to extract request data: {e}");
                    let e = ServerError::InvalidRequestBody(e.to_string());
                    return Ok(req.error_response(e).map_into_right_body());
                },
            };
            let signature = req.headers().get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok());
            match settings.verifier.verify(data.as_ref(), signature) {
                Ok(()) => {
                    trace!("🔐️ Signature check for request ✅️");
                    req.set_payload(bytes_to_payload(data));
                    service.call(req).await.map(ServiceResponse::map_into_left_body)
                },
                Err(e) => {
                    warn!("🔐️ Rejecting webhook from {:?}. {e}", req.peer_addr());
                    Ok(req.error_response(ServerError::from(e)).map_into_right_body())
                },
            }
        })
    }
}

fn check_peer(req: &ServiceRequest, settings: &WebhookAuthSettings) -> Result<(), ServerError> {
    let Some(whitelist) = &settings.whitelist else {
        return Ok(());
    };
    let opts = settings.options;
    match get_remote_ip(req.request(), opts.use_x_forwarded_for, opts.use_forwarded) {
        Some(ip) if whitelist.contains(&ip) => {
            trace!("🔐️ Webhook from whitelisted peer {ip}");
            Ok(())
        },
        Some(ip) => {
            warn!("🔐️ Webhook from {ip}, which is not on the whitelist. Denying access.");
            Err(AuthError::ForbiddenPeer.into())
        },
        None => {
            warn!("🔐️ No IP address found for the remote peer. Denying access.");
            Err(AuthError::ForbiddenPeer.into())
        },
    }
}

fn bytes_to_payload(buf: web::Bytes) -> Payload {
    let (_, mut pl) = h1::Payload::create(true);
    pl.unread_data(buf);
    Payload::from(pl)
}
