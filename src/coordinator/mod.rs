//! Headless view-state coordinators.
//!
//! A coordinator loads its display state through the gateways on entry. After a
//! successful mutation it re-reads instead of trusting the mutation response to
//! describe the whole collection. On failure it records a [`Notice`] and leaves
//! the previously displayed state untouched; nothing is applied optimistically,
//! so there is nothing to roll back.

mod dashboard;
mod races;
mod applications;

pub use dashboard::{DashboardStats, DashboardView};
pub use races::RaceListView;
pub use applications::{ApplicationFormView, ApplicationListView};

use crate::error::AppError;

/// User-visible message produced by a coordinator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Info(String),
    Failure(String),
}

impl Notice {
    pub fn failure(context: &str, err: &AppError) -> Self {
        Notice::Failure(format!("{}: {}", context, err.notice_text()))
    }

    pub fn is_failure(&self) -> bool { matches!(self, Notice::Failure(_)) }

    pub fn text(&self) -> &str {
        match self {
            Notice::Info(s) | Notice::Failure(s) => s.as_str(),
        }
    }
}
