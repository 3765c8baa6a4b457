#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("failed to write notification for {scope}: {source}")]
    Write {
        scope: String,
        #[source]
        source: std::io::Error,
    },
}
