//! Query strings for performance, event and info records
//!
//! Field order is fixed: leading fields, then `u`, then each detail pair.

use contracts::{Details, EventRecord, InformationRecord, PerformanceRecord};

/// `t=<ms>&m=<method>[&u=<user>][&k=v...]`
pub fn encode_performance(record: &PerformanceRecord) -> String {
    let mut query = QueryBuilder::default();
    query.raw("t", &record.milliseconds.to_string());
    query.pair("m", &record.method);
    query.finish(record.user_id.as_deref(), &record.details)
}

/// `n=<name>[&u=<user>][&k=v...]`
pub fn encode_event(record: &EventRecord) -> String {
    let mut query = QueryBuilder::default();
    query.pair("n", &record.name);
    query.finish(record.user_id.as_deref(), &record.details)
}

/// `m=<method>&d=<detail>[&u=<user>][&k=v...]`
pub fn encode_information(record: &InformationRecord) -> String {
    let mut query = QueryBuilder::default();
    query.pair("m", &record.method);
    query.pair("d", &record.detail);
    query.finish(record.user_id.as_deref(), &record.details)
}

#[derive(Default)]
struct QueryBuilder {
    out: String,
}

impl QueryBuilder {
    fn raw(&mut self, key: &str, value: &str) {
        if !self.out.is_empty() {
            self.out.push('&');
        }
        self.out.push_str(key);
        self.out.push('=');
        self.out.push_str(value);
    }

    fn pair(&mut self, key: &str, value: &str) {
        self.raw(&urlencoding::encode(key), &urlencoding::encode(value));
    }

    fn finish(mut self, user_id: Option<&str>, details: &Details) -> String {
        if let Some(user) = user_id.filter(|u| !u.is_empty()) {
            self.pair("u", user);
        }
        for (key, value) in details {
            self.pair(key, value);
        }
        self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_performance_order() {
        let mut details = Details::new();
        details.insert("region".into(), "eu west".into());
        let record = PerformanceRecord {
            milliseconds: 250,
            method: "GetOrders".into(),
            user_id: Some("alice@example.com".into()),
            details,
        };

        assert_eq!(
            encode_performance(&record),
            "t=250&m=GetOrders&u=alice%40example.com&region=eu%20west"
        );
    }

    #[test]
    fn test_empty_user_is_omitted() {
        let record = EventRecord {
            name: "a&b".into(),
            user_id: Some(String::new()),
            details: Details::new(),
        };
        assert_eq!(encode_event(&record), "n=a%26b");
    }

    #[test]
    fn test_information_fields() {
        let record = InformationRecord {
            method: "sync".into(),
            detail: "done=yes".into(),
            ..InformationRecord::default()
        };
        assert_eq!(encode_information(&record), "m=sync&d=done%3Dyes");
    }

    #[test]
    fn test_detail_keys_are_encoded() {
        let mut details = Details::new();
        details.insert("a b".into(), "1".into());
        let record = EventRecord {
            name: "x".into(),
            user_id: None,
            details,
        };
        assert_eq!(encode_event(&record), "n=x&a%20b=1");
    }
}
