//! HttpLineSink - line-protocol writes to an InfluxDB-compatible endpoint.
//!
//! Points are encoded as `measurement,tag=v field=1 timestamp` lines and
//! POSTed in batches to `{url}/write?db={database}&precision=ns`.

use std::collections::HashMap;
use std::fmt::Write as _;

use contracts::{ContractError, TelemetryPoint, TelemetrySink};
use tracing::{debug, instrument};

/// Configuration for HttpLineSink
#[derive(Debug, Clone)]
pub struct HttpLineSinkConfig {
    /// Endpoint base URL (e.g. "http://localhost:8086")
    pub url: String,
    /// Target database
    pub database: String,
    /// Optional auth token sent as `Authorization: Token ...`
    pub token: Option<String>,
}

impl HttpLineSinkConfig {
    /// Create config from params map
    pub fn from_params(params: &HashMap<String, String>) -> Result<Self, String> {
        let url = params
            .get("url")
            .ok_or_else(|| "missing 'url' parameter".to_string())?
            .trim_end_matches('/')
            .to_string();

        let database = params
            .get("database")
            .cloned()
            .unwrap_or_else(|| "bowsense".to_string());

        let token = params.get("token").cloned();

        Ok(Self {
            url,
            database,
            token,
        })
    }
}

/// Sink that POSTs line-protocol batches over HTTP
pub struct HttpLineSink {
    name: String,
    config: HttpLineSinkConfig,
    client: reqwest::Client,
}

impl HttpLineSink {
    /// Create from configuration params
    pub fn from_params(name: &str, params: &HashMap<String, String>) -> Result<Self, String> {
        let config = HttpLineSinkConfig::from_params(params)?;
        Ok(Self {
            name: name.to_string(),
            config,
            client: reqwest::Client::new(),
        })
    }

    fn write_url(&self) -> String {
        format!(
            "{}/write?db={}&precision=ns",
            self.config.url, self.config.database
        )
    }
}

impl TelemetrySink for HttpLineSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "http_sink_write",
        skip(self, points),
        fields(sink = %self.name, points = points.len())
    )]
    async fn write(&mut self, points: &[TelemetryPoint]) -> Result<(), ContractError> {
        let body = points
            .iter()
            .map(encode_line_protocol)
            .collect::<Vec<_>>()
            .join("\n");

        let mut request = self.client.post(self.write_url()).body(body);
        if let Some(token) = &self.config.token {
            request = request.header("Authorization", format!("Token {token}"));
        }

        let response = request
            .send()
            .await
            .map_err(|e| ContractError::sink_write(&self.name, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ContractError::sink_write(
                &self.name,
                format!("endpoint returned {status}"),
            ));
        }

        debug!(sink = %self.name, points = points.len(), "batch written");
        Ok(())
    }

    #[instrument(name = "http_sink_flush", skip(self))]
    async fn flush(&mut self) -> Result<(), ContractError> {
        // Writes are unbuffered
        Ok(())
    }

    #[instrument(name = "http_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        Ok(())
    }
}

/// Encode one point as an InfluxDB line-protocol line.
///
/// `measurement,tag=value field=1.5 1000000000`
pub fn encode_line_protocol(point: &TelemetryPoint) -> String {
    let mut line = escape_measurement(&point.measurement);

    for (key, value) in &point.tags {
        let _ = write!(line, ",{}={}", escape_tag(key), escape_tag(value));
    }

    line.push(' ');
    for (i, (key, value)) in point.fields.iter().enumerate() {
        if i > 0 {
            line.push(',');
        }
        let _ = write!(line, "{}={}", escape_tag(key), value);
    }

    let _ = write!(line, " {}", point.timestamp_ns);
    line
}

fn escape_measurement(s: &str) -> String {
    s.replace(',', "\\,").replace(' ', "\\ ")
}

fn escape_tag(s: &str) -> String {
    s.replace(',', "\\,")
        .replace('=', "\\=")
        .replace(' ', "\\ ")
}
