//! Daily price history analysis: moving averages, RSI and a terminal report.
//!
//! The pipeline for one cycle is [`provider::MarketData::fetch`] →
//! [`indicator::compute_indicators`] (or a configured
//! [`indicator::IndicatorEngine`]) → [`render::Presenter::present`].

pub mod analysis;
pub mod chart;
pub mod config;
pub mod error;
pub mod indicator;
pub mod model;
pub mod provider;
pub mod render;
pub mod session;
pub mod signal;
pub mod summary;
