//! OpenAPI documentation definition.

use nodewatch_core::storage::Observation;
use utoipa::OpenApi;

use crate::handlers::{ErrorBody, ErrorDetail, TruncateResponse};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::handle_index,
        crate::handlers::handle_health,
        crate::handlers::handle_create,
        crate::handlers::handle_list,
        crate::handlers::handle_retrieve,
        crate::handlers::handle_delete,
        crate::handlers::handle_truncate,
    ),
    components(schemas(Observation, ErrorBody, ErrorDetail, TruncateResponse)),
    info(
        title = "nodewatch API",
        version = "1.0",
        description = "Linux host metrics collected on demand and kept as timestamped observations"
    )
)]
pub(crate) struct ApiDoc;
