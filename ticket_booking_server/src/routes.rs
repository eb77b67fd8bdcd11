//! Request handler definitions
//!
//! Define each route and its handler here. Handlers stay thin: they extract the request, call into the booking
//! engine and turn the result into a response. All business rules live in the engine.
//!
//! Handlers are async and every database or catalog call is awaited, so a slow collaborator never blocks the worker
//! thread that is serving the request.
use actix_web::{get, web, HttpResponse, Responder};
use log::*;
use ticket_booking_engine::{
    booking_api::{BookingRequest, ErrorKind, ReconciliationOutcome, TransitionOutcome},
    db_types::{BookingId, EventId, PaymentNotification},
    AvailabilityApi,
    BookingBackend,
    BookingFlowApi,
    CatalogClient,
    PaymentReconciliationApi,
    ReservationApi,
};

use crate::{
    caller::Caller,
    data_objects::{AvailabilityResponse, JsonResponse},
    errors::ServerError,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro.
// Every bound becomes a type parameter of the route struct, in order, and is forwarded to the handler.
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

//----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Availability  ----------------------------------------------
route!(availability => Get "/events/{event_id}/tickets/available" impl CatalogClient, BookingBackend);
/// Route handler for the ticket availability endpoint
///
/// Lists how many tickets are left for every ticket type of an event that is on sale. The numbers may be slightly
/// stale, since they are served from the availability cache when possible. They are for display only; the booking
/// endpoint always checks the inventory itself.
pub async fn availability<C, B>(
    path: web::Path<i64>,
    api: web::Data<AvailabilityApi<C, B>>,
) -> Result<HttpResponse, ServerError>
where
    C: CatalogClient,
    B: BookingBackend,
{
    let event_id = EventId(path.into_inner());
    debug!("💻️ GET availability for event #{event_id}");
    let data = api.availability(event_id).await?;
    Ok(HttpResponse::Ok().json(AvailabilityResponse { data }))
}

//----------------------------------------------   Bookings  ----------------------------------------------------
route!(create_booking => Post "/bookings" impl CatalogClient, BookingBackend);
/// Route handler for creating a booking
///
/// Reserves every requested ticket or none of them. On success the new booking is returned with a `201` status and
/// stays `pending` until the payment provider reports on it.
pub async fn create_booking<C, B>(
    caller: Caller,
    body: web::Json<BookingRequest>,
    api: web::Data<ReservationApi<C, B>>,
) -> Result<HttpResponse, ServerError>
where
    C: CatalogClient,
    B: BookingBackend,
{
    let request = body.into_inner();
    debug!("💻️ POST booking for {} on event #{}", caller.user_id, request.event_id);
    let booking = api.create_booking(&caller.user_id, request).await?;
    info!("💻️ Booking {} created for {}", booking.id, caller.user_id);
    Ok(HttpResponse::Created().json(booking))
}

route!(my_bookings => Get "/bookings" impl BookingBackend);
pub async fn my_bookings<B: BookingBackend>(
    caller: Caller,
    api: web::Data<BookingFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET bookings for {}", caller.user_id);
    let bookings = api.bookings_for_user(&caller.user_id).await?;
    Ok(HttpResponse::Ok().json(bookings))
}

route!(booking_by_id => Get "/bookings/{booking_id}" impl BookingBackend);
/// Fetches one of the caller's bookings. Bookings belonging to other users are reported as not found.
pub async fn booking_by_id<B: BookingBackend>(
    caller: Caller,
    path: web::Path<String>,
    api: web::Data<BookingFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = BookingId::from(path.into_inner());
    debug!("💻️ GET booking {id} for {}", caller.user_id);
    let booking = api.fetch_booking_for_user(&id, &caller.user_id).await?;
    Ok(HttpResponse::Ok().json(booking))
}

route!(cancel_booking => Post "/bookings/{booking_id}/cancel" impl BookingBackend);
pub async fn cancel_booking<B: BookingBackend>(
    caller: Caller,
    path: web::Path<String>,
    api: web::Data<BookingFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = BookingId::from(path.into_inner());
    debug!("💻️ POST cancel booking {id} for {}", caller.user_id);
    let outcome = api.cancel_booking(&id, &caller.user_id).await?;
    if let TransitionOutcome::Applied { from, inventory_released, .. } = &outcome {
        info!("💻️ {} cancelled booking {id} (was {from}). Tickets released: {inventory_released}", caller.user_id);
    }
    Ok(HttpResponse::Ok().json(outcome.booking()))
}

//----------------------------------------------   Payments  ----------------------------------------------------
route!(payment_webhook => Post "/payments/webhook" impl BookingBackend);
/// Route handler for payment notifications
///
/// The payment provider retries anything that is not acknowledged, so every business outcome (including malformed
/// notifications, unknown bookings and impossible transitions) is answered with `200` and a `success` flag. Only
/// failures of our own backend return `500`, and those are safe to retry since a notification is applied at most once.
pub async fn payment_webhook<B: BookingBackend>(
    body: String,
    api: web::Data<PaymentReconciliationApi<B>>,
) -> HttpResponse {
    trace!("💻️ Received payment notification: {body}");
    let notification = match serde_json::from_str::<PaymentNotification>(&body) {
        Ok(n) => n,
        Err(e) => {
            warn!("💻️ Could not read payment notification. {e}");
            return HttpResponse::Ok().json(JsonResponse::failure(format!("Invalid payment notification. {e}")));
        },
    };
    let id = notification.booking_id.clone();
    match api.process_payment_notification(notification).await {
        Ok(ReconciliationOutcome::Applied { from, to, .. }) => {
            info!("💻️ Payment notification moved booking {id} from {from} to {to}");
            HttpResponse::Ok().json(JsonResponse::success(format!("Booking {id} is now {to}")))
        },
        Ok(ReconciliationOutcome::Unchanged(booking)) => {
            HttpResponse::Ok().json(JsonResponse::success(format!("Booking {id} is already {}", booking.status)))
        },
        Ok(ReconciliationOutcome::Acknowledged(booking)) => HttpResponse::Ok()
            .json(JsonResponse::success(format!("Payment acknowledged. Booking {id} is {}", booking.status))),
        Err(e) => match e.kind() {
            ErrorKind::ExternalService | ErrorKind::Internal => {
                error!("💻️ Could not process payment notification for booking {id}. {e}");
                HttpResponse::InternalServerError().json(JsonResponse::failure("Internal error. Please retry"))
            },
            _ => {
                warn!("💻️ Payment notification for booking {id} was not applied. {e}");
                HttpResponse::Ok().json(JsonResponse::failure(e))
            },
        },
    }
}
