use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TaggerError {
    #[error("duplicate implementation of tag {0:?}")]
    DuplicateTag(String),
    #[error("tag {tag:?} depends on {dependency:?}, which has no implementation")]
    UnresolvedDependency { tag: String, dependency: String },
    #[error("cyclic dependency detected while resolving tag {0:?}")]
    CyclicDependency(String),
}
