use crate::id::{NodeId, RelationshipId};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    #[error("no node {0} in the graph model")]
    UnknownNode(NodeId),
    #[error("no relationship {0} in the graph model")]
    UnknownRelationship(RelationshipId),
    #[error("relationship would start and end at {0}")]
    SelfLoop(NodeId),
    #[error("relationship {relationship} references missing node {node}")]
    MissingEndpoint { relationship: String, node: String },
    #[error("{0} ids exhausted")]
    IdsExhausted(&'static str),
}

/// Failure to turn external graph data into a model.
#[derive(Debug, thiserror::Error)]
pub enum DataError {
    #[error("malformed graph data: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Model(#[from] ModelError),
}

pub type Result<T> = std::result::Result<T, ModelError>;
