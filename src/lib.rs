//! cvefold collects the pages published about CVEs by several
//! publishers, then folds them into one JSON record per CVE.
//!
//! The collection is resumable: a page already on disk is never fetched
//! again, and the first sign of a rate limit stops every worker so the next
//! run can pick up where this one stopped. The aggregation can be replayed
//! at will, each publisher only ever replaces its own part of a record.

pub mod aggregation;
pub mod application;
pub mod collection;
pub mod errors;
pub mod extractors;
pub mod feeds;
pub mod models;
pub mod readers;
pub mod storage;
pub mod writers;
