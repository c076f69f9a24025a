pub mod api;
pub mod console;
pub mod dates;
pub mod error;
pub mod fetch;
pub mod filter;
pub mod kpi;
pub mod metadata;
pub mod quality;
pub mod records;
pub mod render;
pub mod report;
pub mod session;
pub mod view;
