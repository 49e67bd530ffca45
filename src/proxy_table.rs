use std::fmt::Display;

use proxydeck_core::models::proxies::ProxyRecord;
use tabled::builder;

pub struct ProxyTable<'a>(pub &'a [ProxyRecord]);

impl Display for ProxyTable<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut builder = builder::Builder::new();
        builder.push_record([
            "id",
            "address",
            "protocol",
            "label",
            "status",
            "requests",
            "success %",
            "avg ms",
            "last check",
        ]);
        for record in self.0 {
            builder.push_record([
                record.id.to_string(),
                record.address.clone(),
                record.protocol.to_string(),
                record.label.clone().unwrap_or_else(|| "-".into()),
                record.status.to_string(),
                record.requests.to_string(),
                format!("{:.1}", record.success_rate),
                record.avg_response_time.to_string(),
                record.last_check.clone().unwrap_or_else(|| "-".into()),
            ]);
        }

        let table = builder.build().to_string();
        write!(f, "{}", table)
    }
}
