use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NestError {
    #[error("class {class} is not nestable")]
    NotNestable { class: String },
    #[error("dummy is not a committable nest kind")]
    DummyKind,
    #[error("class {class} cannot be nested into {subject}")]
    CannotNest { class: String, subject: String },
}
