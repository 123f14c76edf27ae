use axum::http::{HeaderMap, HeaderValue};

use clipsight_core::quota::decision::{
    QuotaStatus, HEADER_LIMIT, HEADER_REMAINING, HEADER_RESET,
};

/// Attach the three rate-limit headers to a response.
///
/// Fail-open statuses carry no limit and get no headers: the caller must not
/// be able to tell that a counter backend was down.
pub fn apply_quota_headers(headers: &mut HeaderMap, status: &QuotaStatus) {
    let Some(limit) = status.limit else {
        return;
    };

    headers.insert(HEADER_LIMIT, number(limit));
    headers.insert(HEADER_REMAINING, number(status.remaining()));
    headers.insert(HEADER_RESET, number(status.resets_at.timestamp() as u64));
}

fn number(value: u64) -> HeaderValue {
    HeaderValue::from_str(&value.to_string()).expect("digits are a valid header value")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use clipsight_core::quota::tier::Tier;

    #[test]
    fn headers_carry_limit_remaining_and_reset() {
        let status = QuotaStatus {
            limit: Some(100),
            used: 42,
            resets_at: Utc.with_ymd_and_hms(2024, 3, 15, 0, 0, 0).unwrap(),
            tier: Some(Tier::Starter),
        };

        let mut headers = HeaderMap::new();
        apply_quota_headers(&mut headers, &status);

        assert_eq!(headers.get(HEADER_LIMIT).unwrap(), "100");
        assert_eq!(headers.get(HEADER_REMAINING).unwrap(), "58");
        assert_eq!(
            headers.get(HEADER_RESET).unwrap(),
            &status.resets_at.timestamp().to_string()
        );
    }

    #[test]
    fn fail_open_status_adds_no_headers() {
        let status = QuotaStatus::unlimited(Utc::now(), None);
        let mut headers = HeaderMap::new();
        apply_quota_headers(&mut headers, &status);
        assert!(headers.is_empty());
    }
}
