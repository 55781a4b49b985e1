//! Client for the PLATE-VS protein-ligand affinity web services.
//!
//! Every method is a blocking request/response cycle against the fixed
//! API surface under `{base_url}/api`; side effects are limited to
//! outbound GETs and file writes into the configured output directory.

use std::fs;
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

use reqwest::blocking::{Client, Response};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::datatable::DataTable;
use crate::error::{ClientError, Result};

/// Precomputed query-coverage levels the similarity matrix is published at
pub const QCOV_LEVELS: [u32; 4] = [50, 70, 95, 100];

/// Server-side threshold used when `search_by_smiles` runs in similarity mode
const SIMILARITY_SEARCH_THRESHOLD: f64 = 0.7;

/// Result cap forwarded on SMILES searches
const SEARCH_LIMIT: u32 = 100;

/// Courtesy delay between items of a bulk download
const BATCH_PAUSE: Duration = Duration::from_secs(1);

/// Maximum length of the query portion of a derived filename
const MAX_FILENAME_QUERY_LEN: usize = 50;

/// Which filter a download query is keyed on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryType {
    Uniprot,
    Smiles,
}

impl QueryType {
    /// Query-string parameter name on the download endpoint
    fn param(&self) -> &'static str {
        match self {
            QueryType::Uniprot => "protein_id",
            QueryType::Smiles => "smiles",
        }
    }

    /// Tag used in derived filenames
    fn tag(&self) -> &'static str {
        match self {
            QueryType::Uniprot => "uniprot",
            QueryType::Smiles => "smiles",
        }
    }
}

/// Paginated search result. Records are opaque JSON rows; their shape is
/// owned by the service, not this client.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub data: Vec<Value>,
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub limit: Option<u32>,
}

impl SearchResponse {
    /// Flatten the JSON records into a [`DataTable`]
    pub fn to_table(&self, name: impl Into<String>) -> DataTable {
        DataTable::from_records(&self.data, name)
    }
}

/// Reachability of a single probed endpoint
#[derive(Debug, Clone)]
pub struct EndpointStatus {
    pub reachable: bool,
    pub latency: Option<Duration>,
    pub detail: Option<String>,
}

/// Outcome of [`PlateVsClient::check_service_status`]
#[derive(Debug, Clone)]
pub struct ServiceStatus {
    /// The main website
    pub site: EndpointStatus,
    /// The API health endpoint
    pub api: EndpointStatus,
}

impl ServiceStatus {
    pub fn all_reachable(&self) -> bool {
        self.site.reachable && self.api.reachable
    }
}

/// Per-threshold record of a bulk similarity download
#[derive(Debug)]
pub struct SimilarityBatchItem {
    pub threshold: f64,
    pub outcome: Result<PathBuf>,
}

#[derive(Debug, Deserialize)]
struct SignedUrlResponse {
    url: String,
}

/// Blocking client for the PLATE-VS API
pub struct PlateVsClient {
    config: ClientConfig,
    http: Client,
}

impl PlateVsClient {
    /// Create a client with the default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(ClientConfig::default())
    }

    /// Create a client from an explicit configuration. The output
    /// directory is created here so every later write can assume it
    /// exists.
    pub fn with_config(config: ClientConfig) -> Result<Self> {
        fs::create_dir_all(&config.output_dir).map_err(|e| ClientError::Io {
            path: config.output_dir.clone(),
            source: e,
        })?;

        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/json, text/csv, */*"),
        );

        let http = Client::builder()
            .timeout(config.timeout())
            .user_agent(concat!("platevs-client/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .build()
            .map_err(ClientError::Init)?;

        Ok(Self { config, http })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/api{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// Issue a GET and map transport failures and non-2xx statuses
    fn get(&self, url: &str, params: &[(&str, String)]) -> Result<Response> {
        debug!("GET {url} params={params:?}");
        let response = self
            .http
            .get(url)
            .query(params)
            .send()
            .map_err(|e| ClientError::Request {
                url: url.to_string(),
                source: e,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response)
    }

    fn get_plain(&self, url: &str) -> Result<Response> {
        self.get(url, &[])
    }

    /// Download the successful response body into the output directory
    fn fetch_to_file(
        &self,
        url: &str,
        params: &[(&str, String)],
        filename: &str,
    ) -> Result<PathBuf> {
        let response = self.get(url, params)?;
        let bytes = response.bytes().map_err(|e| ClientError::Request {
            url: url.to_string(),
            source: e,
        })?;

        let path = self.config.output_dir.join(filename);
        fs::write(&path, &bytes).map_err(|e| ClientError::Io {
            path: path.clone(),
            source: e,
        })?;

        info!("Downloaded {} ({} bytes)", path.display(), bytes.len());
        Ok(path)
    }

    fn parse_search(url: &str, response: Response) -> Result<SearchResponse> {
        let body: Value = response.json().map_err(|e| ClientError::Malformed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        match body {
            // Some endpoints return a bare record list instead of the
            // paginated envelope
            Value::Array(data) => Ok(SearchResponse {
                data,
                total: None,
                page: None,
                limit: None,
            }),
            other => serde_json::from_value(other).map_err(|e| ClientError::Malformed {
                url: url.to_string(),
                reason: e.to_string(),
            }),
        }
    }

    // =====================================================================
    // Service status
    // =====================================================================

    /// Probe the main site and the API health endpoint.
    ///
    /// This is a diagnostic convenience: network errors are folded into
    /// `reachable: false` instead of propagating.
    pub fn check_service_status(&self) -> ServiceStatus {
        let base = self.config.base_url.trim_end_matches('/');
        let status = ServiceStatus {
            site: self.probe(base),
            api: self.probe(&format!("{base}/api/health")),
        };
        debug!(
            "Service status: site={} api={}",
            status.site.reachable, status.api.reachable
        );
        status
    }

    fn probe(&self, url: &str) -> EndpointStatus {
        let started = Instant::now();
        match self.http.get(url).send() {
            Ok(response) => {
                let status = response.status();
                EndpointStatus {
                    reachable: status.is_success(),
                    latency: Some(started.elapsed()),
                    detail: if status.is_success() {
                        None
                    } else {
                        Some(format!("HTTP {}", status.as_u16()))
                    },
                }
            }
            Err(e) => EndpointStatus {
                reachable: false,
                latency: None,
                detail: Some(e.to_string()),
            },
        }
    }

    // =====================================================================
    // Affinity searches
    // =====================================================================

    /// Search affinity records by UniProt accession. Pagination
    /// parameters are forwarded unchanged.
    pub fn search_by_uniprot(
        &self,
        uniprot_id: &str,
        page: u32,
        limit: u32,
    ) -> Result<SearchResponse> {
        let url = self.api_url("/molecules");
        let params = [
            ("protein_id", uniprot_id.to_string()),
            ("page", page.to_string()),
            ("limit", limit.to_string()),
        ];

        let response = self.get(&url, &params)?;
        Self::parse_search(&url, response)
    }

    /// Fetch every ligand (with affinity values) recorded for a protein,
    /// as a table parsed from the CSV export endpoint.
    pub fn get_protein_ligands(&self, uniprot_id: &str) -> Result<DataTable> {
        let url = self.api_url("/molecules/download");
        let params = [("protein_id", uniprot_id.to_string())];

        let response = self.get(&url, &params)?;
        let body = response.text().map_err(|e| ClientError::Request {
            url: url.clone(),
            source: e,
        })?;

        if body.trim().is_empty() {
            return Err(ClientError::Malformed {
                url,
                reason: "empty CSV export".to_string(),
            });
        }

        DataTable::from_csv(body.as_bytes(), uniprot_id).map_err(|e| ClientError::Malformed {
            url,
            reason: e.to_string(),
        })
    }

    /// Search affinity records by compound structure. With
    /// `exact_match: false` the server runs its similarity search; the
    /// similarity semantics are entirely server-side.
    pub fn search_by_smiles(&self, smiles: &str, exact_match: bool) -> Result<SearchResponse> {
        let (url, params) = if exact_match {
            (
                self.api_url("/molecules"),
                vec![
                    ("smiles", smiles.to_string()),
                    ("limit", SEARCH_LIMIT.to_string()),
                ],
            )
        } else {
            (
                self.api_url("/search/ligand"),
                vec![
                    ("smiles", smiles.to_string()),
                    ("threshold", SIMILARITY_SEARCH_THRESHOLD.to_string()),
                    ("limit", SEARCH_LIMIT.to_string()),
                ],
            )
        };

        let response = self.get(&url, &params)?;
        Self::parse_search(&url, response)
    }

    // =====================================================================
    // Downloads
    // =====================================================================

    /// Download affinity data for a UniProt ID or SMILES query as CSV.
    /// Returns the path of the written file.
    pub fn download_affinity_data(&self, query: &str, query_type: QueryType) -> Result<PathBuf> {
        let url = self.api_url("/molecules/download");
        let params = [(query_type.param(), query.to_string())];
        self.fetch_to_file(&url, &params, &affinity_filename(query_type, query))
    }

    /// Download the similarity matrix CSV for one threshold and coverage
    /// level. Thresholds outside (0, 1] are rejected before any network
    /// call.
    pub fn download_similarity_matrix_csv(
        &self,
        threshold: f64,
        qcov_level: u32,
    ) -> Result<PathBuf> {
        validate_threshold(threshold)?;
        if !QCOV_LEVELS.contains(&qcov_level) {
            warn!("qcov_level {qcov_level} not in standard levels {QCOV_LEVELS:?}");
        }

        let url = self.api_url("/similarity-matrix/download-uniprot");
        let params = [
            ("threshold", threshold.to_string()),
            ("qcov_level", qcov_level.to_string()),
        ];
        self.fetch_to_file(&url, &params, &matrix_filename(threshold, qcov_level))
    }

    /// Download the SDF archive for one threshold.
    ///
    /// Two sequential round-trips: the endpoint answers with a signed
    /// object-storage URL, and the archive bytes are fetched from there.
    pub fn download_similarity_sdf(&self, threshold: f64) -> Result<PathBuf> {
        validate_threshold(threshold)?;

        let url = self.api_url("/similarity-matrix/download-sdf");
        let params = [("threshold", threshold.to_string())];
        let response = self.get(&url, &params)?;

        let signed: SignedUrlResponse =
            response.json().map_err(|e| ClientError::Malformed {
                url: url.clone(),
                reason: e.to_string(),
            })?;
        debug!("Resolved signed URL for threshold {threshold}");

        let response = self.get_plain(&signed.url)?;
        let bytes = response.bytes().map_err(|e| ClientError::Request {
            url: signed.url.clone(),
            source: e,
        })?;

        let path = self.config.output_dir.join(sdf_filename(threshold));
        fs::write(&path, &bytes).map_err(|e| ClientError::Io {
            path: path.clone(),
            source: e,
        })?;

        info!("Downloaded SDF archive {} ({} bytes)", path.display(), bytes.len());
        Ok(path)
    }

    /// Download the similarity matrix for each threshold in turn, with a
    /// fixed pause between consecutive attempts. One threshold's failure
    /// is recorded and does not abort the batch; the result always has
    /// one entry per input threshold.
    pub fn download_all_similarity_data(
        &self,
        thresholds: &[f64],
        qcov_level: u32,
    ) -> Vec<SimilarityBatchItem> {
        let mut results = Vec::with_capacity(thresholds.len());

        for (i, &threshold) in thresholds.iter().enumerate() {
            info!("Downloading similarity data for threshold {threshold}");
            let outcome = self.download_similarity_matrix_csv(threshold, qcov_level);
            if let Err(ref e) = outcome {
                warn!("Download for threshold {threshold} failed: {e}");
            }
            results.push(SimilarityBatchItem { threshold, outcome });

            // Be respectful of the server
            if i + 1 < thresholds.len() {
                thread::sleep(BATCH_PAUSE);
            }
        }

        results
    }
}

fn validate_threshold(threshold: f64) -> Result<()> {
    if !(threshold > 0.0 && threshold <= 1.0) {
        return Err(ClientError::validation(
            "threshold",
            format!("{threshold} is outside (0, 1]"),
        ));
    }
    Ok(())
}

/// Replace anything that would not survive as a filename and cap the
/// query portion's length.
fn sanitize_for_filename(query: &str) -> String {
    let mut safe: String = query
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    safe.truncate(MAX_FILENAME_QUERY_LEN);
    safe
}

fn affinity_filename(query_type: QueryType, query: &str) -> String {
    format!(
        "affinity_{}_{}.csv",
        query_type.tag(),
        sanitize_for_filename(query)
    )
}

fn matrix_filename(threshold: f64, qcov_level: u32) -> String {
    format!("similarity_matrix_qcov{qcov_level}_threshold_{threshold}.csv")
}

fn sdf_filename(threshold: f64) -> String {
    format!("similarity_sdf_threshold_{threshold}.tar.gz")
}
