use serde::Serialize;

/// `added: false` means the pair already existed.
#[derive(Debug, Serialize)]
pub struct AddedResponse {
    pub added: bool,
}

#[derive(Debug, Serialize)]
pub struct RemovedResponse {
    pub removed: bool,
}

#[derive(Debug, Serialize)]
pub struct WatchStatus {
    pub watched: bool,
}
