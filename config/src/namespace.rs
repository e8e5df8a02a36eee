use std::path::Path;

/// Service account namespace file mounted into every pod.
pub const NAMESPACE_FILE: &str = "/var/run/secrets/kubernetes.io/serviceaccount/namespace";

/// Read the pod namespace, if the service account mount is present.
pub fn read_namespace(path: &Path) -> Option<String> {
    let data = match std::fs::read_to_string(path) {
        Ok(data) => data,
        Err(e) => {
            tracing::warn!(path = %path.display(), "Failed to open namespace file: {e}");
            return None;
        }
    };

    let namespace = data.trim();
    if namespace.is_empty() {
        None
    } else {
        Some(namespace.to_string())
    }
}
