// Domain layer - Report, chart and session models
pub mod artifact;
pub mod chart;
pub mod color;
pub mod expansion;
pub mod insight;
pub mod notification;
pub mod report;
pub mod upload;
