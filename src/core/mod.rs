pub mod aggregator;
pub mod classifier;
pub mod etl;
pub mod pipeline;
pub mod resolver;
pub mod table;
pub mod title;

pub use crate::domain::model::{SearchDocument, SurveyResult};
pub use crate::domain::ports::{Pipeline, ResultCache, SearchClient, Storage};
pub use crate::utils::error::Result;
