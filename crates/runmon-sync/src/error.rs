use runmon_ui::ReduceError;

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("reducer rejected {action}: {source}")]
    Reducer {
        action: &'static str,
        #[source]
        source: ReduceError,
    },
    #[error("fetch completion channel closed")]
    ChannelClosed,
}
