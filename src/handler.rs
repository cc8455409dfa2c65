use crate::csp::{self, CspReport};
use crate::error::ValidationError;
use crate::filter;
use crate::metadata::Metadata;
use crate::normalize::truncate_query_string_fragment;
use crate::sink::{LogRecord, ReportSink};
use axum::http::{Method, StatusCode, Uri};
use std::sync::Arc;
use tracing::debug;
use url::Url;

/// Settings fixed at startup and shared read-only by every request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerConfig {
    /// Noise prefixes; a blocked URI starting with any of them is dropped.
    pub blocked_uris: Vec<String>,
    /// Strip query string and fragment from the logged URIs.
    pub truncate_query_string_fragment: bool,
    /// Log every query parameter instead of only the first one.
    pub metadata_object: bool,
}

impl Default for HandlerConfig {
    fn default() -> Self {
        HandlerConfig {
            blocked_uris: filter::default_ignored_blocked_uris(),
            truncate_query_string_fragment: false,
            metadata_object: false,
        }
    }
}

#[derive(Clone)]
pub struct ViolationReportHandler {
    config: Arc<HandlerConfig>,
    sink: Arc<dyn ReportSink>,
}

impl ViolationReportHandler {
    pub fn new(config: HandlerConfig, sink: Arc<dyn ReportSink>) -> ViolationReportHandler {
        ViolationReportHandler {
            config: Arc::new(config),
            sink,
        }
    }

    pub fn config(&self) -> &HandlerConfig {
        &self.config
    }

    /// Runs one report request through the method gate, decoding, validation
    /// and logging, returning the status to answer with.
    pub fn handle(&self, method: &Method, uri: &Uri, body: &[u8]) -> StatusCode {
        if *method != Method::POST {
            return StatusCode::METHOD_NOT_ALLOWED;
        }

        let report = match csp::decode(body) {
            Ok(report) => report,
            Err(e) => {
                debug!(path = uri.path(), error = %e, "dropping undecodable report");
                return StatusCode::BAD_REQUEST;
            }
        };

        // Browsers can't act on the answer, so rejected reports still get a 200.
        if let Err(e) = self.validate_violation(&report) {
            debug!(path = uri.path(), error = %e, "dropping report");
            return StatusCode::OK;
        }

        let metadata = Metadata::from_query(uri.query(), self.config.metadata_object);
        self.sink.emit(&self.log_record(uri.path(), metadata, report));

        StatusCode::OK
    }

    pub fn validate_violation(&self, report: &CspReport) -> Result<(), ValidationError> {
        let body = &report.body;

        if filter::is_ignored(&self.config.blocked_uris, &body.blocked_uri) {
            return Err(ValidationError::InvalidResource {
                uri: body.blocked_uri.clone(),
            });
        }

        if !body.document_uri.is_empty() && !is_http_uri(&body.document_uri) {
            return Err(ValidationError::InvalidDocumentUri {
                uri: body.document_uri.clone(),
            });
        }

        Ok(())
    }

    fn log_record(&self, path: &str, metadata: Metadata, report: CspReport) -> LogRecord {
        let body = report.body;
        let truncate = |uri: String| {
            if self.config.truncate_query_string_fragment {
                truncate_query_string_fragment(&uri).to_string()
            } else {
                uri
            }
        };

        LogRecord {
            path: path.to_string(),
            metadata,
            document_uri: truncate(body.document_uri),
            referrer: truncate(body.referrer),
            blocked_uri: truncate(body.blocked_uri),
            violated_directive: body.violated_directive,
            effective_directive: body.effective_directive,
            original_policy: body.original_policy,
            disposition: body.disposition,
            script_sample: body.script_sample,
            source_file: body.source_file,
            status_code: body.status_code,
            line_number: body.line_number,
            column_number: body.column_number,
        }
    }
}

fn is_http_uri(uri: &str) -> bool {
    Url::parse(uri)
        .map(|url| matches!(url.scheme(), "http" | "https"))
        .unwrap_or(false)
}
