use crate::model::GroupId;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RotationError {
    #[error("invalid rotation order for group {0}: empty or missing starting station")]
    InvalidRotationOrder(GroupId),
}
