//! Transform layer: org chart, DISC and climate aggregation.
//!
//! Everything here is a pure in-memory function over rows fetched from the
//! backing store.

pub mod climate;
pub mod disc;
pub mod indicators;
pub mod orgchart;
pub mod questionnaire;

pub use climate::{summarize as summarize_climate, ClimateStatus, ClimateSummary};
pub use disc::{average_traits, summarize_team, TeamDiscSummary, TraitAverages};
pub use orgchart::{build_org_chart, OrgChart, OrgNode};
