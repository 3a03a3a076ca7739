pub mod survey_pipeline;
