use crate::db_types::CallRecord;

use serde::Serialize;

/// Everything the dashboard client renders from one analysis request.
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct DashboardData {
    pub stats: CallStats,
    pub volume_data: Vec<VolumePoint>,
    pub recent_calls: Vec<RecentCall>,
    pub type_distribution: Vec<TypeCount>,
    pub customer_data: CustomerData,
    pub security_data: SecurityData,
    pub time_series_data: Vec<TimeSeriesPoint>,
    pub last_updated: String,
}

#[derive(Serialize, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CallStats {
    pub total_calls: u64,
    pub appointments_booked: u64,
    pub average_duration: f64,
    pub average_rating: f64,
    pub conversion_rate: f64,
}

#[derive(Serialize, Debug, PartialEq)]
pub struct VolumePoint {
    pub date: String,
    pub calls: u64,
}

/// A stored record plus the display timestamp the call table shows.
#[derive(Serialize, Debug)]
pub struct RecentCall {
    #[serde(flatten)]
    pub call: CallRecord,
    pub formatted_start_time: String,
}

#[derive(Serialize, Debug, PartialEq)]
pub struct TypeCount {
    pub name: String,
    pub value: u64,
}

#[derive(Serialize, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CustomerData {
    pub satisfaction: f64,
    pub nps: f64,
    pub first_call_resolution: f64,
}

#[derive(Serialize, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SecurityData {
    pub compliance_rate: f64,
    pub security_issues: u64,
    pub data_protection: f64,
}

#[derive(Serialize, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TimeSeriesPoint {
    pub name: String,
    pub calls: u64,
    pub resolution_rate: f64,
    pub satisfaction: f64,
    pub nps: f64,
    pub compliance_rate: f64,
    pub security_issues: u64,
}
