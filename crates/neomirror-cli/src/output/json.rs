//! JSON views of the core reports.
//!
//! Field names are stable; scripts are expected to consume them.

use chrono::{DateTime, Utc};
use neomirror_core::discovery::DiscoveryStats;
use neomirror_core::mirror::ReconcileReport;
use neomirror_core::{
    Confidence, ContentClass, Discovery, MirrorReport, Origin, SizeEntry, SizeReport, UrlRecord,
};
use serde::Serialize;
use std::path::Path;

/// Output of `discover`.
#[derive(Debug, Serialize)]
pub struct DiscoverJson<'a> {
    origin: &'a Origin,
    confidence: Confidence,
    pages: usize,
    assets: usize,
    stats: &'a DiscoveryStats,
    urls: Vec<&'a UrlRecord>,
}

impl<'a> DiscoverJson<'a> {
    pub fn new(discovery: &'a Discovery) -> Self {
        let set = &discovery.set;
        Self {
            origin: set.origin(),
            confidence: discovery.confidence,
            pages: set.count(ContentClass::Page),
            assets: set.count(ContentClass::Asset),
            stats: &discovery.stats,
            urls: set.iter().collect(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ClassTotal {
    count: usize,
    bytes: u64,
}

/// Output of `size`.
#[derive(Debug, Serialize)]
pub struct SizeJson<'a> {
    origin: &'a Origin,
    confidence: Confidence,
    total_bytes: u64,
    url_count: usize,
    pages: ClassTotal,
    assets: ClassTotal,
    defaulted: usize,
    default_size_bytes: u64,
    top: Vec<&'a SizeEntry>,
    entries: Vec<&'a SizeEntry>,
}

impl<'a> SizeJson<'a> {
    pub fn new(
        discovery: &'a Discovery,
        report: &'a SizeReport,
        top: usize,
        default_size_bytes: u64,
    ) -> Self {
        let set = &discovery.set;
        Self {
            origin: set.origin(),
            confidence: discovery.confidence,
            total_bytes: report.total_bytes(),
            url_count: report.len(),
            pages: ClassTotal {
                count: set.count(ContentClass::Page),
                bytes: report.total_for(ContentClass::Page),
            },
            assets: ClassTotal {
                count: set.count(ContentClass::Asset),
                bytes: report.total_for(ContentClass::Asset),
            },
            defaulted: report.defaulted_count(),
            default_size_bytes,
            top: report.top(top),
            entries: report.entries().collect(),
        }
    }
}

#[derive(Debug, Serialize)]
struct FailureJson<'a> {
    url: &'a str,
    reason: &'a str,
}

/// Output of `mirror`.
#[derive(Debug, Serialize)]
pub struct MirrorJson<'a> {
    origin: &'a Origin,
    root: &'a Path,
    confidence: Confidence,
    discovered: usize,
    fetched: usize,
    failed: usize,
    fetched_bytes: u64,
    reconcile: &'a ReconcileReport,
    failures: Vec<FailureJson<'a>>,
    started_at: DateTime<Utc>,
    finished_at: DateTime<Utc>,
}

impl<'a> MirrorJson<'a> {
    pub fn new(discovery: &'a Discovery, report: &'a MirrorReport) -> Self {
        Self {
            origin: discovery.set.origin(),
            root: &report.root,
            confidence: discovery.confidence,
            discovered: discovery.set.len(),
            fetched: report.outcomes.fetched_count(),
            failed: report.outcomes.failed_count(),
            fetched_bytes: report.outcomes.fetched_bytes(),
            reconcile: &report.reconcile,
            failures: report
                .outcomes
                .failures()
                .map(|(url, reason)| FailureJson { url, reason })
                .collect(),
            started_at: report.started_at,
            finished_at: report.finished_at,
        }
    }
}
