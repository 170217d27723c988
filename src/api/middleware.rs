use actix_web::{Error, body::MessageBody, dev::{ServiceRequest, ServiceResponse}, middleware::Next};
use tracing::debug;

/**
 * Middleware for timing requests.
 */
pub async fn timing_middleware(request: ServiceRequest, next: Next<impl MessageBody>) -> Result<ServiceResponse<impl MessageBody>, Error> {
    let start_time = std::time::Instant::now();
    let path = request.path().to_owned();
    let method = request.method().to_owned();
    let response = next.call(request).await;
    let status = response.as_ref().map_or(500, |service_response| service_response.status().as_u16());
    debug!(target: "performance", "{method} {path} answered {status} in {}ms", start_time.elapsed().as_millis());
    response
}
