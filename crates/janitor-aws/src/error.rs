//! SDK error mapping

use janitor_core::Error;

/// Map an SDK failure to a provider error rendering its whole source chain
pub(crate) fn provider_error<E>(operation: &'static str) -> impl FnOnce(E) -> Error
where
    E: std::error::Error,
{
    move |e| {
        Error::provider(
            operation,
            aws_sdk_ecr::error::DisplayErrorContext(e).to_string(),
        )
    }
}
