use crate::models::{FilterSpec, StockMetricsRecord, Threshold};

/// 判断记录是否满足全部筛选条件
///
/// 估值/风险类指标要求不高于阈值，其余指标要求不低于阈值
pub fn matches(record: &StockMetricsRecord, spec: &FilterSpec) -> bool {
    spec.criteria().all(|(field, threshold)| {
        let Threshold::Value(limit) = threshold else {
            return false;
        };
        let value = record.metric(field);
        if !value.is_finite() {
            return false;
        }
        if field.is_lower_bound() {
            value <= limit
        } else {
            value >= limit
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Exchange, Listing, MetricField};
    use serde_json::json;

    fn record(pe: f64, roe: f64) -> StockMetricsRecord {
        let mut record = StockMetricsRecord::fallback(&Listing::new("TCS", Exchange::Nse));
        record.pe = pe;
        record.roe = roe;
        record
    }

    #[test]
    fn test_lower_and_upper_bounds() {
        let spec = FilterSpec::new()
            .with(MetricField::Pe, 20.0)
            .with(MetricField::Roe, 15.0);

        assert!(matches(&record(18.0, 20.0), &spec));
        assert!(!matches(&record(25.0, 20.0), &spec));
        assert!(!matches(&record(18.0, 10.0), &spec));
        // 边界值包含在内
        assert!(matches(&record(20.0, 15.0), &spec));
    }

    #[test]
    fn test_empty_spec_matches_everything() {
        assert!(matches(&record(999.0, -5.0), &FilterSpec::new()));
        let zeros = FilterSpec::from_json(json!({"pe": 0, "roe": ""}).as_object().unwrap());
        assert!(matches(&record(999.0, -5.0), &zeros));
    }

    #[test]
    fn test_invalid_threshold_excludes() {
        let spec = FilterSpec::from_json(json!({"roe": "high"}).as_object().unwrap());
        assert!(!matches(&record(18.0, 20.0), &spec));
    }

    #[test]
    fn test_non_finite_value_excludes() {
        let spec = FilterSpec::new().with(MetricField::Pe, 20.0);
        assert!(!matches(&record(f64::NAN, 20.0), &spec));
        assert!(!matches(&record(f64::NEG_INFINITY, 20.0), &spec));
    }

    #[test]
    fn test_every_lower_bound_metric() {
        for field in MetricField::ALL {
            let spec = FilterSpec::new().with(field, 10.0);
            let mut low = record(0.0, 0.0);
            low.set_metric(field, 5.0);
            assert_eq!(matches(&low, &spec), field.is_lower_bound(), "{}", field.key());
        }
    }
}
