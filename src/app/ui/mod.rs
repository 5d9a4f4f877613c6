mod controls;
mod details;
mod metrics;
mod panels;
