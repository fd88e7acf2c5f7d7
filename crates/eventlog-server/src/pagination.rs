use eventlog_core::events::EventFilter;
use eventlog_core::timestamp;
use eventlog_core::CoreError;
use serde::Deserialize;

use crate::error::ApiError;

/// Raw query parameters for `GET /events`.
///
/// `skip`/`limit` are signed so that negative values reach validation and
/// get a descriptive 400 instead of a generic deserialization failure. The
/// remaining fields narrow the listing; empty values are ignored.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct PageParams {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
    pub severity: Option<String>,
    #[serde(alias = "eventType")]
    pub event_type: Option<String>,
    pub source: Option<String>,
    #[serde(alias = "startDate")]
    pub start_date: Option<String>,
    #[serde(alias = "endDate")]
    pub end_date: Option<String>,
}

impl PageParams {
    /// Build the store filter. A bare `endDate` day is included whole.
    pub fn filter(&self) -> Result<EventFilter, ApiError> {
        Ok(EventFilter {
            severity: non_empty(&self.severity),
            event_type: non_empty(&self.event_type),
            source: non_empty(&self.source),
            start: parse_bound("startDate", &self.start_date, timestamp::parse_timestamp)?,
            end: parse_bound("endDate", &self.end_date, timestamp::parse_upper_bound)?,
        })
    }
}

fn parse_bound<T>(
    name: &str,
    raw: &Option<String>,
    parse: impl Fn(&str) -> Result<T, CoreError>,
) -> Result<Option<T>, ApiError> {
    non_empty(raw)
        .map(|text| parse(&text).map_err(|e| ApiError::BadRequest(format!("{name}: {e}"))))
        .transpose()
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_ref().filter(|v| !v.is_empty()).cloned()
}

/// A validated page request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Page {
    pub offset: u32,
    pub limit: u32,
}

/// Server-side pagination bounds.
#[derive(Clone, Copy, Debug)]
pub struct PageLimits {
    pub default_limit: u32,
    pub max_limit: u32,
}

impl Default for PageLimits {
    fn default() -> Self {
        Self {
            default_limit: 100,
            max_limit: 1000,
        }
    }
}

impl PageLimits {
    /// Validate raw params. `skip` must be non-negative, `limit` positive;
    /// a `limit` above `max_limit` is clamped rather than rejected.
    pub fn resolve(&self, params: &PageParams) -> Result<Page, ApiError> {
        let offset = match params.skip {
            None => 0,
            Some(skip) if skip < 0 => {
                return Err(ApiError::BadRequest(format!(
                    "skip must be non-negative, got {skip}"
                )))
            }
            Some(skip) => u32::try_from(skip)
                .map_err(|_| ApiError::BadRequest(format!("skip is too large: {skip}")))?,
        };

        let limit = match params.limit {
            None => self.default_limit,
            Some(limit) if limit < 1 => {
                return Err(ApiError::BadRequest(format!(
                    "limit must be at least 1, got {limit}"
                )))
            }
            Some(limit) => u32::try_from(limit)
                .unwrap_or(u32::MAX)
                .min(self.max_limit),
        };

        Ok(Page { offset, limit })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(skip: Option<i64>, limit: Option<i64>) -> PageParams {
        PageParams {
            skip,
            limit,
            ..Default::default()
        }
    }

    #[test]
    fn defaults_when_omitted() {
        let page = PageLimits::default().resolve(&PageParams::default()).unwrap();
        assert_eq!(page, Page { offset: 0, limit: 100 });
    }

    #[test]
    fn explicit_values_pass_through() {
        let page = PageLimits::default().resolve(&params(Some(20), Some(5))).unwrap();
        assert_eq!(page, Page { offset: 20, limit: 5 });
    }

    #[test]
    fn negative_skip_is_rejected() {
        let err = PageLimits::default().resolve(&params(Some(-1), None)).unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(ref m) if m.contains("skip")));
    }

    #[test]
    fn huge_skip_is_rejected() {
        let err = PageLimits::default()
            .resolve(&params(Some(i64::MAX), None))
            .unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }

    #[test]
    fn zero_and_negative_limit_are_rejected() {
        let limits = PageLimits::default();
        assert!(limits.resolve(&params(None, Some(0))).is_err());
        assert!(limits.resolve(&params(None, Some(-10))).is_err());
    }

    #[test]
    fn oversized_limit_is_clamped() {
        let limits = PageLimits {
            default_limit: 10,
            max_limit: 50,
        };
        assert_eq!(limits.resolve(&params(None, Some(51))).unwrap().limit, 50);
        assert_eq!(limits.resolve(&params(None, Some(i64::MAX))).unwrap().limit, 50);
    }

    #[test]
    fn no_filter_params_is_empty_filter() {
        assert!(PageParams::default().filter().unwrap().is_empty());
    }

    #[test]
    fn empty_filter_values_are_ignored() {
        let params = PageParams {
            severity: Some(String::new()),
            start_date: Some(String::new()),
            ..Default::default()
        };
        assert!(params.filter().unwrap().is_empty());
    }

    #[test]
    fn date_bounds_are_parsed() {
        let params = PageParams {
            event_type: Some("Login".into()),
            start_date: Some("2025-09-01".into()),
            end_date: Some("2025-09-07".into()),
            ..Default::default()
        };
        let filter = params.filter().unwrap();
        assert_eq!(filter.event_type.as_deref(), Some("Login"));
        assert_eq!(
            filter.start.map(|t| timestamp::format_timestamp(&t)).as_deref(),
            Some("2025-09-01T00:00:00")
        );
        assert_eq!(
            filter.end.map(|t| timestamp::format_timestamp(&t)).as_deref(),
            Some("2025-09-07T23:59:59.999999")
        );
    }

    #[test]
    fn bad_date_bound_is_bad_request() {
        let params = PageParams {
            end_date: Some("someday".into()),
            ..Default::default()
        };
        let err = params.filter().unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(ref m) if m.starts_with("endDate")));
    }
}
