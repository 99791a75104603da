use crate::domain::services::availability::Slot;
use serde::Serialize;

#[derive(Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}

#[derive(Serialize)]
pub struct SuccessResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> DataResponse<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

impl<T: Serialize> SuccessResponse<T> {
    pub fn with(data: T) -> Self {
        Self { success: true, data: Some(data) }
    }
}

impl SuccessResponse<()> {
    pub fn empty() -> Self {
        Self { success: true, data: None }
    }
}

#[derive(Serialize)]
pub struct SlotsResponse {
    pub date: String,
    pub slots: Vec<Slot>,
}
