use async_trait::async_trait;
use error_common::{report_error, GatewayError};

use crate::context::{RequestContext, ResponseContext};

/// A stage of the gateway request pipeline.
///
/// Every hook defaults to a no-op so an executor implements only the phases
/// it takes part in.
#[async_trait]
pub trait GatewayExecutor: Send + Sync {
    fn name(&self) -> &'static str;

    async fn pre_process_request(&self, _ctx: &mut RequestContext) {}

    async fn post_process_request(&self, _ctx: &mut RequestContext) {}

    async fn pre_process_response(&self, _ctx: &mut ResponseContext) {}

    async fn post_process_response(&self, _ctx: &mut ResponseContext) {}
}

/// Log `error` and attach its record to the request
pub(crate) fn fail_request(executor: &str, ctx: &mut RequestContext, error: &GatewayError) {
    let record = report_error(executor, error);
    ctx.add_error(record);
}
