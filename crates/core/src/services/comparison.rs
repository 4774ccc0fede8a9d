use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::aggregate::aggregate_parsed;
use crate::cache::{CacheStats, CachedResult, ResultCache, SweepHandle};
use crate::compare::{compare, CompareOptions, CompareResult};
use crate::config::AnalysisConfig;
use crate::diff::{diff_versions, DiffOptions, DiffResult};
use crate::error::{CacheError, OptionsError};
use crate::model::ParsedResult;
use crate::parser::MapFileParser;

/// Request to compare a baseline map against a candidate map.
#[derive(Debug, Clone)]
pub struct CompareRequest<'a> {
    pub base: &'a str,
    pub target: &'a str,
    /// Collapse subsections before comparing.
    pub aggregate: bool,
    /// Falls back to the service config when `None`.
    pub options: Option<CompareOptions>,
}

/// Request to diff two versions of the same firmware.
#[derive(Debug, Clone)]
pub struct DiffRequest<'a> {
    pub v1: &'a str,
    pub v2: &'a str,
    pub aggregate: bool,
    pub options: Option<DiffOptions>,
}

/// Compare result plus the id it was cached under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompareResponse {
    pub compare_id: String,
    #[serde(flatten)]
    pub result: CompareResult,
}

/// Diff result plus the id it was cached under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffResponse {
    pub diff_id: String,
    #[serde(flatten)]
    pub result: DiffResult,
}

/// Request/response facade over the parser, both comparers, and the cache.
///
/// Construct once at process start; frontends hand it raw map text and get
/// serializable results back.
#[derive(Debug)]
pub struct ComparisonService {
    parser: MapFileParser,
    config: AnalysisConfig,
    cache: Arc<ResultCache>,
}

impl Default for ComparisonService {
    fn default() -> Self {
        Self::new(AnalysisConfig::default())
    }
}

impl ComparisonService {
    pub fn new(config: AnalysisConfig) -> Self {
        let cache = Arc::new(ResultCache::new(config.cache.clone()));
        Self { parser: MapFileParser::new(), config, cache }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn cache(&self) -> &Arc<ResultCache> {
        &self.cache
    }

    /// Single-file analysis.
    pub fn parse(&self, text: &str) -> ParsedResult {
        self.parser.parse(text)
    }

    fn prepare(&self, text: &str, aggregate: bool) -> ParsedResult {
        let parsed = self.parser.parse(text);
        if aggregate {
            aggregate_parsed(&parsed)
        } else {
            parsed
        }
    }

    pub fn compare(&self, request: &CompareRequest<'_>) -> Result<CompareResponse, OptionsError> {
        let options = request.options.clone().unwrap_or_else(|| self.config.compare.clone());
        options.validate()?;

        let a = self.prepare(request.base, request.aggregate);
        let b = self.prepare(request.target, request.aggregate);
        let result = compare(&a, &b, &options);
        let compare_id = self.cache.put(CachedResult::Compare(result.clone()));
        info!(id = %compare_id, anomalies = result.anomalies.len(), "stored comparison");
        Ok(CompareResponse { compare_id, result })
    }

    pub fn diff(&self, request: &DiffRequest<'_>) -> Result<DiffResponse, OptionsError> {
        let options = request.options.clone().unwrap_or_else(|| self.config.diff.clone());
        options.validate()?;

        let v1 = self.prepare(request.v1, request.aggregate);
        let v2 = self.prepare(request.v2, request.aggregate);
        let result = diff_versions(&v1, &v2, &options);
        let diff_id = self.cache.put(CachedResult::Diff(result.clone()));
        info!(id = %diff_id, anomalies = result.anomalies.len(), "stored version diff");
        Ok(DiffResponse { diff_id, result })
    }

    /// Re-fetch a cached result; expired and unknown ids both yield `None`.
    pub fn fetch(&self, id: &str) -> Option<Arc<CachedResult>> {
        self.cache.get(id)
    }

    pub fn delete(&self, id: &str) -> bool {
        self.cache.delete(id)
    }

    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Start the hourly (per config) background sweep. Keep the handle alive.
    pub fn start_sweeper(&self) -> Result<SweepHandle, CacheError> {
        self.cache.start_sweeper()
    }
}
