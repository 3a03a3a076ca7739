pub use crate::app::pipelines::survey_pipeline::{PlannedSearch, SurveyPipeline};
