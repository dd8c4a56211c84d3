pub mod claim_rate;
pub mod claim_view;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod loader;
pub mod models;
pub mod normalize;
pub mod pipeline;
pub mod profitability;
pub mod report;
pub mod segmentation;
pub mod table;
pub mod workbook;
