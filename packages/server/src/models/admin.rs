use serde::{Deserialize, Serialize};

use crate::ledger::{RankingRow, UsageStats};

/// Filters for the admin image listing. All optional; combined with AND.
#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AdminImageQuery {
    /// Page number (1-based). Default: 1.
    pub page: Option<u64>,
    /// Items per page, clamped to 1..=100. Default: 20.
    pub page_size: Option<u64>,
    /// Only images owned by this identity.
    pub user_id: Option<String>,
    /// Only images uploaded from this address.
    pub upload_ip: Option<String>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct UserRanking {
    #[schema(example = "583231")]
    pub user_id: String,
    /// Number of images owned.
    #[schema(example = 42)]
    pub count: i64,
}

impl From<RankingRow> for UserRanking {
    fn from(row: RankingRow) -> Self {
        Self {
            user_id: row.user_id,
            count: row.count,
        }
    }
}

/// Aggregate usage figures. Counts are taken independently and may be
/// slightly out of step with each other under concurrent writes.
#[derive(Serialize, utoipa::ToSchema)]
pub struct StatsResponse {
    #[schema(example = 1280)]
    pub total_images: u64,
    /// Images created since midnight UTC.
    #[schema(example = 17)]
    pub today_images: u64,
    /// Distinct owners.
    #[schema(example = 35)]
    pub user_count: u64,
    /// Top owners by image count, at most 10.
    pub user_rankings: Vec<UserRanking>,
}

impl From<UsageStats> for StatsResponse {
    fn from(stats: UsageStats) -> Self {
        Self {
            total_images: stats.total_images,
            today_images: stats.today_images,
            user_count: stats.user_count,
            user_rankings: stats.user_rankings.into_iter().map(Into::into).collect(),
        }
    }
}
