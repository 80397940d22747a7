pub mod config;
pub mod evaluation;
pub mod language_model;
pub mod parsing;
pub mod perspective_transformer;
pub mod prompts;
pub mod question_router;

pub use perspective_transformer::{
    transform_to_egocentric, EgocentricCoordinateTable, PerspectiveTransformer, PerspectiveType,
};
pub use question_router::{
    PerspectiveAnswer, PerspectiveQuestionAnswering, QuestionRouter, QuestionRouterCfg,
};
