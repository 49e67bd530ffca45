//! Client-side TXT export.
//!
//! json/csv payloads come rendered from the remote store; the plain
//! text format is composed here, one importable line per record.

use urlencoding::encode;

use crate::models::proxies::ProxyRecord;

/// `protocol://user:@host:port?label=name`, credentials and label
/// percent-encoded. Passwords are not exported.
pub fn format_record_line(record: &ProxyRecord) -> String {
    let credentials = record
        .username
        .as_deref()
        .map(|u| format!("{}:@", encode(u)))
        .unwrap_or_default();
    let label = record
        .label
        .as_deref()
        .map(|l| format!("?label={}", encode(l)))
        .unwrap_or_default();
    format!("{}://{}{}{}", record.protocol, credentials, record.address, label)
}

pub fn render_txt(records: &[ProxyRecord]) -> String {
    records
        .iter()
        .map(format_record_line)
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::proxies::{Protocol, ProxyStatus};
    use crate::parse::parse_line;

    fn record(address: &str, username: Option<&str>, label: Option<&str>) -> ProxyRecord {
        ProxyRecord {
            id: 1,
            address: address.into(),
            protocol: Protocol::Socks5,
            username: username.map(Into::into),
            label: label.map(Into::into),
            status: ProxyStatus::Active,
            requests: 0,
            success_rate: 0.0,
            avg_response_time: 0,
            last_check: None,
        }
    }

    #[test]
    fn test_plain_record() {
        let r = record("1.2.3.4:1080", None, None);
        assert_eq!(format_record_line(&r), "socks5://1.2.3.4:1080");
    }

    #[test]
    fn test_credentials_and_label_are_encoded() {
        let r = record("1.2.3.4:1080", Some("us er"), Some("us east"));
        assert_eq!(
            format_record_line(&r),
            "socks5://us%20er:@1.2.3.4:1080?label=us%20east"
        );
    }

    #[test]
    fn test_exported_line_reimports() {
        let r = record("1.2.3.4:1080", None, Some("dc1"));
        let spec = parse_line(&format_record_line(&r)).unwrap();
        assert_eq!(spec.address, "1.2.3.4:1080");
        assert_eq!(spec.protocol, Protocol::Socks5);
        assert_eq!(spec.label.as_deref(), Some("dc1"));
    }

    #[test]
    fn test_render_joins_lines() {
        let rows = vec![record("1.1.1.1:80", None, None), record("2.2.2.2:81", None, None)];
        assert_eq!(render_txt(&rows), "socks5://1.1.1.1:80\nsocks5://2.2.2.2:81");
    }
}
