use crate::consts::{
    BUCKET_SECURITY_ISSUE_RATE, COMPLIANCE_RATE, DATA_PROTECTION_SCORE, MAX_RATING,
    NPS_DETRACTOR_MAX, NPS_PROMOTER_MIN, RECENT_CALLS_LIMIT, SECURITY_ISSUE_RATE,
};
use crate::dashboard_types::{
    CallStats, CustomerData, DashboardData, RecentCall, SecurityData, TimeSeriesPoint, TypeCount,
    VolumePoint,
};
use crate::db_types::CallRecord;

use rand::Rng;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, Duration, OffsetDateTime, UtcOffset};

/// Round to two decimals, half away from zero.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn utc_date(t: OffsetDateTime) -> Date {
    t.to_offset(UtcOffset::UTC).date()
}

fn format_date(date: Date) -> String {
    let format = format_description!("[year]-[month]-[day]");
    date.format(&format).unwrap_or_else(|_| date.to_string())
}

fn format_start_time(t: OffsetDateTime) -> String {
    let format = format_description!("[year]-[month]-[day] [hour]:[minute]:[second] UTC");
    t.to_offset(UtcOffset::UTC)
        .format(&format)
        .unwrap_or_else(|_| t.to_string())
}

/// The `days` calendar days ending at `today`, oldest first.  `days <= 0`
/// yields nothing.  Dates beyond the representable calendar range are
/// skipped instead of panicking.
fn bucket_dates(days: i64, today: Date) -> impl Iterator<Item = Date> {
    (0..days.max(0))
        .rev()
        .filter_map(move |i| today.checked_sub(Duration::days(i)))
}

fn average_rating(calls: &[&CallRecord]) -> f64 {
    if calls.is_empty() {
        return 0.0;
    }
    let total: f64 = calls.iter().map(|c| c.rating).sum();
    total / calls.len() as f64
}

/// Promoter/detractor model over ratings: promoters at or above 4.5,
/// detractors below 3.5, the rest passive.
fn nps(calls: &[&CallRecord]) -> f64 {
    if calls.is_empty() {
        return 0.0;
    }
    let promoters = calls.iter().filter(|c| c.rating >= NPS_PROMOTER_MIN).count() as f64;
    let detractors = calls.iter().filter(|c| c.rating < NPS_DETRACTOR_MAX).count() as f64;
    round2(100.0 * (promoters - detractors) / calls.len() as f64)
}

pub fn calculate_stats(calls: &[CallRecord]) -> CallStats {
    let total_calls = calls.len() as u64;
    let appointments_booked = calls.iter().filter(|c| c.appointment_booked).count() as u64;

    if total_calls == 0 {
        return CallStats {
            total_calls: 0,
            appointments_booked: 0,
            average_duration: 0.0,
            average_rating: 0.0,
            conversion_rate: 0.0,
        };
    }

    let total_duration: i64 = calls.iter().map(|c| c.duration).sum();
    let total_rating: f64 = calls.iter().map(|c| c.rating).sum();

    CallStats {
        total_calls,
        appointments_booked,
        average_duration: total_duration as f64 / total_calls as f64,
        average_rating: total_rating / total_calls as f64,
        conversion_rate: round2(100.0 * appointments_booked as f64 / total_calls as f64),
    }
}

/// Daily call counts for the trailing window, bucketed by the UTC calendar
/// date of `start_time`.
pub fn calculate_volume_data(calls: &[CallRecord], days: i64, today: Date) -> Vec<VolumePoint> {
    bucket_dates(days, today)
        .map(|date| VolumePoint {
            calls: calls
                .iter()
                .filter(|c| utc_date(c.start_time) == date)
                .count() as u64,
            date: format_date(date),
        })
        .collect()
}

/// The first ten records in input order; ordering is the fetch's job.
pub fn format_recent_calls(calls: &[CallRecord]) -> Vec<RecentCall> {
    calls
        .iter()
        .take(RECENT_CALLS_LIMIT)
        .map(|call| RecentCall {
            formatted_start_time: format_start_time(call.start_time),
            call: call.clone(),
        })
        .collect()
}

/// Counts per call type, in order of first occurrence.
pub fn calculate_type_distribution(calls: &[CallRecord]) -> Vec<TypeCount> {
    let mut counts: Vec<TypeCount> = Vec::new();
    for call in calls {
        // Ingestion already defaults the type, but stay defensive here.
        let name = if call.call_type.is_empty() {
            "unknown"
        } else {
            call.call_type.as_str()
        };
        match counts.iter_mut().find(|c| c.name == name) {
            Some(entry) => entry.value += 1,
            None => counts.push(TypeCount {
                name: name.to_string(),
                value: 1,
            }),
        }
    }
    counts
}

pub fn calculate_customer_data(calls: &[CallRecord]) -> CustomerData {
    let all: Vec<&CallRecord> = calls.iter().collect();
    let satisfaction = round2(100.0 * average_rating(&all) / MAX_RATING);

    // First-call resolution reuses appointments-booked as a stand-in, so it
    // always equals the conversion rate.
    let first_call_resolution = if calls.is_empty() {
        0.0
    } else {
        let booked = calls.iter().filter(|c| c.appointment_booked).count() as f64;
        round2(100.0 * booked / calls.len() as f64)
    };

    CustomerData {
        satisfaction,
        nps: nps(&all),
        first_call_resolution,
    }
}

/// Placeholder compliance metrics: fixed rates plus a floor-of-count issue
/// tally, not derived from call content.
pub fn calculate_security_data(calls: &[CallRecord]) -> SecurityData {
    SecurityData {
        compliance_rate: COMPLIANCE_RATE,
        security_issues: (calls.len() as f64 * SECURITY_ISSUE_RATE).floor() as u64,
        data_protection: DATA_PROTECTION_SCORE,
    }
}

/// Per-day metric series over the same buckets as the volume data.  The
/// compliance rate is uniformly random in [95, 100) per bucket; callers pass
/// the RNG so tests can seed it.
pub fn calculate_time_series_data(
    calls: &[CallRecord],
    days: i64,
    today: Date,
    rng: &mut impl Rng,
) -> Vec<TimeSeriesPoint> {
    bucket_dates(days, today)
        .map(|date| {
            let bucket: Vec<&CallRecord> = calls
                .iter()
                .filter(|c| utc_date(c.start_time) == date)
                .collect();
            let count = bucket.len();
            let booked = bucket.iter().filter(|c| c.appointment_booked).count();
            let resolution_rate = if count == 0 {
                0.0
            } else {
                round2(100.0 * booked as f64 / count as f64)
            };

            TimeSeriesPoint {
                name: format_date(date),
                calls: count as u64,
                resolution_rate,
                satisfaction: round2(100.0 * average_rating(&bucket) / MAX_RATING),
                nps: nps(&bucket),
                compliance_rate: round2(rng.gen_range(95.0..100.0)),
                security_issues: (count as f64 * BUCKET_SECURITY_ISSUE_RATE).floor() as u64,
            }
        })
        .collect()
}

/// Assemble every dashboard view for one request.  All sub-views read the
/// same slice and none of them can fail on empty input.
pub fn dashboard_data(
    calls: &[CallRecord],
    days: i64,
    now: OffsetDateTime,
    rng: &mut impl Rng,
) -> DashboardData {
    let today = utc_date(now);
    DashboardData {
        stats: calculate_stats(calls),
        volume_data: calculate_volume_data(calls, days, today),
        recent_calls: format_recent_calls(calls),
        type_distribution: calculate_type_distribution(calls),
        customer_data: calculate_customer_data(calls),
        security_data: calculate_security_data(calls),
        time_series_data: calculate_time_series_data(calls, days, today, rng),
        last_updated: now.format(&Rfc3339).unwrap_or_else(|_| now.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use time::macros::datetime;
    use uuid::Uuid;

    const NOW: OffsetDateTime = datetime!(2025-03-04 18:00:00 UTC);

    fn record(
        start: OffsetDateTime,
        call_type: &str,
        rating: f64,
        booked: bool,
        duration: i64,
    ) -> CallRecord {
        CallRecord {
            id: Uuid::new_v4(),
            call_id: "call_1".to_string(),
            call_type: call_type.to_string(),
            from_number: "unknown".to_string(),
            to_number: "unknown".to_string(),
            duration,
            rating,
            appointment_booked: booked,
            summary: String::new(),
            start_time: start,
            end_time: start,
            sentiment: "neutral".to_string(),
            created_at: start,
        }
    }

    #[test]
    fn round2_is_half_away_from_zero() {
        // 0.125 is exact in binary, so this pins the tie-breaking rule.
        assert_eq!(round2(0.125), 0.13);
        assert_eq!(round2(-0.125), -0.13);
        assert_eq!(round2(100.0 / 3.0), 33.33);
    }

    #[test]
    fn stats_on_empty_input_are_all_zero() {
        let stats = calculate_stats(&[]);
        assert_eq!(
            stats,
            CallStats {
                total_calls: 0,
                appointments_booked: 0,
                average_duration: 0.0,
                average_rating: 0.0,
                conversion_rate: 0.0,
            }
        );
    }

    #[test]
    fn stats_average_and_convert() {
        let calls = vec![
            record(NOW, "sales", 3.0, true, 30),
            record(NOW, "sales", 4.0, false, 60),
            record(NOW, "support", 5.0, false, 90),
        ];
        let stats = calculate_stats(&calls);
        assert_eq!(stats.total_calls, 3);
        assert_eq!(stats.appointments_booked, 1);
        assert_eq!(stats.average_duration, 60.0);
        assert_eq!(stats.average_rating, 4.0);
        assert_eq!(stats.conversion_rate, 33.33);
    }

    #[test]
    fn volume_series_has_one_bucket_per_day_ending_today() {
        let calls = vec![
            record(datetime!(2025-03-04 00:30:00 UTC), "sales", 0.0, false, 0),
            record(datetime!(2025-03-04 23:30:00 UTC), "sales", 0.0, false, 0),
            record(datetime!(2025-03-03 12:00:00 UTC), "sales", 0.0, false, 0),
            // Before the oldest bucket; must not appear anywhere.
            record(datetime!(2025-03-01 12:00:00 UTC), "sales", 0.0, false, 0),
        ];
        let series = calculate_volume_data(&calls, 3, utc_date(NOW));
        assert_eq!(
            series,
            vec![
                VolumePoint {
                    date: "2025-03-02".to_string(),
                    calls: 0,
                },
                VolumePoint {
                    date: "2025-03-03".to_string(),
                    calls: 1,
                },
                VolumePoint {
                    date: "2025-03-04".to_string(),
                    calls: 2,
                },
            ]
        );
    }

    #[test]
    fn volume_series_for_zero_days_is_empty() {
        let calls = vec![record(NOW, "sales", 0.0, false, 0)];
        assert!(calculate_volume_data(&calls, 0, utc_date(NOW)).is_empty());
    }

    #[test]
    fn bucketing_uses_calendar_dates_not_rolling_windows() {
        // 00:30 today is more than 17 hours before `NOW`, but it is the same
        // calendar date, so a 1-day series still counts it.
        let calls = vec![record(datetime!(2025-03-04 00:30:00 UTC), "sales", 0.0, false, 0)];
        let series = calculate_volume_data(&calls, 1, utc_date(NOW));
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].calls, 1);
    }

    #[test]
    fn recent_calls_keep_input_order_and_cap_at_ten() {
        let calls: Vec<CallRecord> = (0..12)
            .map(|i| {
                let mut c = record(NOW - Duration::minutes(i), "sales", 0.0, false, 0);
                c.call_id = format!("call_{i}");
                c
            })
            .collect();
        let recent = format_recent_calls(&calls);
        assert_eq!(recent.len(), 10);
        assert_eq!(recent[0].call.call_id, "call_0");
        assert_eq!(recent[9].call.call_id, "call_9");
        assert_eq!(recent[0].formatted_start_time, "2025-03-04 18:00:00 UTC");
    }

    #[test]
    fn type_distribution_counts_in_first_seen_order() {
        let calls = vec![
            record(NOW, "sales", 0.0, false, 0),
            record(NOW, "support", 0.0, false, 0),
            record(NOW, "sales", 0.0, false, 0),
        ];
        assert_eq!(
            calculate_type_distribution(&calls),
            vec![
                TypeCount {
                    name: "sales".to_string(),
                    value: 2,
                },
                TypeCount {
                    name: "support".to_string(),
                    value: 1,
                },
            ]
        );
    }

    #[test]
    fn type_distribution_defaults_empty_types() {
        let calls = vec![record(NOW, "", 0.0, false, 0)];
        assert_eq!(calculate_type_distribution(&calls)[0].name, "unknown");
    }

    #[test]
    fn customer_data_scores() {
        let calls = vec![
            record(NOW, "sales", 5.0, true, 0),
            record(NOW, "sales", 5.0, false, 0),
            record(NOW, "sales", 4.0, false, 0),
            record(NOW, "sales", 1.0, false, 0),
        ];
        let data = calculate_customer_data(&calls);
        // Average rating 3.75 of 5.
        assert_eq!(data.satisfaction, 75.0);
        // Two promoters (5.0), one passive (4.0), one detractor (1.0).
        assert_eq!(data.nps, 25.0);
        assert_eq!(data.first_call_resolution, 25.0);
    }

    #[test]
    fn customer_data_on_empty_input_is_zero() {
        let data = calculate_customer_data(&[]);
        assert_eq!(
            data,
            CustomerData {
                satisfaction: 0.0,
                nps: 0.0,
                first_call_resolution: 0.0,
            }
        );
    }

    #[test]
    fn first_call_resolution_equals_conversion_rate() {
        let calls = vec![
            record(NOW, "sales", 2.0, true, 10),
            record(NOW, "sales", 4.0, false, 20),
            record(NOW, "support", 5.0, true, 30),
        ];
        let stats = calculate_stats(&calls);
        let customer = calculate_customer_data(&calls);
        assert_eq!(customer.first_call_resolution, stats.conversion_rate);
    }

    #[test]
    fn nps_stays_within_bounds() {
        let all_promoters: Vec<CallRecord> =
            (0..5).map(|_| record(NOW, "sales", 5.0, false, 0)).collect();
        let all_detractors: Vec<CallRecord> =
            (0..5).map(|_| record(NOW, "sales", 1.0, false, 0)).collect();
        assert_eq!(calculate_customer_data(&all_promoters).nps, 100.0);
        assert_eq!(calculate_customer_data(&all_detractors).nps, -100.0);
    }

    #[test]
    fn security_data_is_synthetic() {
        let calls: Vec<CallRecord> = (0..100).map(|_| record(NOW, "sales", 0.0, false, 0)).collect();
        let data = calculate_security_data(&calls);
        assert_eq!(data.compliance_rate, 98.5);
        assert_eq!(data.data_protection, 9.2);
        assert_eq!(data.security_issues, 2);

        // Floor, not rounding: 49 calls * 0.02 = 0.98 issues.
        let few: Vec<CallRecord> = (0..49).map(|_| record(NOW, "sales", 0.0, false, 0)).collect();
        assert_eq!(calculate_security_data(&few).security_issues, 0);
    }

    #[test]
    fn time_series_metrics_per_bucket() {
        let calls = vec![
            record(datetime!(2025-03-04 09:00:00 UTC), "sales", 5.0, true, 60),
            record(datetime!(2025-03-03 09:00:00 UTC), "sales", 2.0, false, 60),
        ];
        let mut rng = StdRng::seed_from_u64(7);
        let series = calculate_time_series_data(&calls, 2, utc_date(NOW), &mut rng);
        assert_eq!(series.len(), 2);

        let yesterday = &series[0];
        assert_eq!(yesterday.name, "2025-03-03");
        assert_eq!(yesterday.calls, 1);
        assert_eq!(yesterday.resolution_rate, 0.0);
        assert_eq!(yesterday.satisfaction, 40.0);
        assert_eq!(yesterday.nps, -100.0);

        let today = &series[1];
        assert_eq!(today.name, "2025-03-04");
        assert_eq!(today.calls, 1);
        assert_eq!(today.resolution_rate, 100.0);
        assert_eq!(today.satisfaction, 100.0);
        assert_eq!(today.nps, 100.0);
    }

    #[test]
    fn time_series_compliance_is_bounded_and_seed_reproducible() {
        let calls = vec![record(NOW, "sales", 3.0, false, 0)];
        let mut rng = StdRng::seed_from_u64(42);
        let series = calculate_time_series_data(&calls, 14, utc_date(NOW), &mut rng);
        assert_eq!(series.len(), 14);
        for point in &series {
            assert!(point.compliance_rate >= 95.0 && point.compliance_rate <= 100.0);
        }

        let mut rng_again = StdRng::seed_from_u64(42);
        let replay = calculate_time_series_data(&calls, 14, utc_date(NOW), &mut rng_again);
        let rates: Vec<f64> = series.iter().map(|p| p.compliance_rate).collect();
        let replayed: Vec<f64> = replay.iter().map(|p| p.compliance_rate).collect();
        assert_eq!(rates, replayed);
    }

    #[test]
    fn dashboard_data_assembles_every_view() {
        let calls = vec![record(NOW, "sales", 4.0, true, 120)];
        let mut rng = StdRng::seed_from_u64(1);
        let data = dashboard_data(&calls, 7, NOW, &mut rng);
        assert_eq!(data.stats.total_calls, 1);
        assert_eq!(data.volume_data.len(), 7);
        assert_eq!(data.time_series_data.len(), 7);
        assert_eq!(data.recent_calls.len(), 1);
        assert_eq!(data.type_distribution.len(), 1);
        assert_eq!(data.last_updated, "2025-03-04T18:00:00Z");
    }
}
