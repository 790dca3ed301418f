use spotcast_core::SpotcastError;

/// Join a collection of tasks and apply an optional request-level deadline.
///
/// This wraps `futures::future::join_all(tasks)` with `crate::core::with_request_deadline`.
/// On timeout the inner helper returns `SpotcastError::RequestTimeout("request")`;
/// call sites remap it to their own operation label.
pub async fn join_with_deadline<I, F, T>(
    tasks: I,
    deadline: Option<std::time::Duration>,
) -> Result<Vec<T>, SpotcastError>
where
    I: IntoIterator<Item = F>,
    F: core::future::Future<Output = T>,
{
    crate::core::with_request_deadline(deadline, futures::future::join_all(tasks)).await
}

/// Collapse the errors of a fan-out into one `SpotcastError`.
///
/// Rules:
/// - A single error is returned unchanged, so integrity violations keep their variant.
/// - Several errors become `AllSourcesFailed`, flattened.
pub fn collapse_errors(errors: Vec<SpotcastError>) -> SpotcastError {
    let mut flat: Vec<SpotcastError> = errors.into_iter().flat_map(SpotcastError::flatten).collect();
    if flat.len() == 1 {
        return flat.remove(0);
    }
    SpotcastError::AllSourcesFailed(flat)
}

/// Rename a generic request timeout to the operation that hit it.
pub fn relabel_timeout(operation: &str, e: SpotcastError) -> SpotcastError {
    match e {
        SpotcastError::RequestTimeout { .. } => SpotcastError::request_timeout(operation),
        other => other,
    }
}
