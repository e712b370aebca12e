//! Request handler definitions
//!
//! Define each route and its handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests. Ledger writes are async for this reason; keep them that way.
use actix_web::{get, web, HttpRequest, HttpResponse, Responder};
use log::*;
use razorpay_tools::WebhookEnvelope;
use topup_engine::{LedgerApi, LedgerStore};

use crate::{data_objects::JsonResponse, errors::ServerError, integrations::razorpay::dispatch_event};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

// ----------------------------------------------   Webhook  ---------------------------------------------------
// Mounted inside the `/webhook` scope, behind the signature middleware. By the time the handler runs, `body` is
// exactly the byte sequence the signature was checked against.
route!(webhook => Post "" impl LedgerStore);
pub async fn webhook<B: LedgerStore>(
    req: HttpRequest,
    body: web::Bytes,
    api: web::Data<LedgerApi<B>>,
) -> Result<HttpResponse, ServerError> {
    trace!("💻️ Received webhook request: {} ({} bytes)", req.uri(), body.len());
    if body.is_empty() {
        return Err(ServerError::InvalidRequestBody("The request body is empty".into()));
    }
    let envelope = WebhookEnvelope::from_slice(&body).map_err(|e| {
        warn!("💻️ Could not decode webhook body. {e}");
        debug!("💻️ Undecodable body: {}", String::from_utf8_lossy(&body));
        ServerError::from(e)
    })?;
    debug!("💻️ Webhook event {} decoded", envelope.event);
    let outcome = dispatch_event(&envelope, api.get_ref()).await?;
    info!("💻️ Webhook {} handled. {outcome}", envelope.event);
    Ok(HttpResponse::Ok().json(JsonResponse::success(outcome)))
}
