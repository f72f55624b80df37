//! Integration tests

mod completion_http;
mod decision_engine;
mod flag_ingest;
mod redaction_predicate;
mod selection;
mod test_utils;
