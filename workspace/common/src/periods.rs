use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Month display names in calendar order, used for the revenue chart and
/// the per-agent yearly breakdown.
pub const MONTH_NAMES: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Date window selectable on the dashboard.
///
/// `All` means unbounded; the month windows cover the first through the last
/// calendar day of the respective month; `Ytd` spans January 1 through
/// December 31 of the current year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DateWindow {
    #[default]
    All,
    ThisMonth,
    LastMonth,
    Ytd,
}
