//! Names of the `gnmi_writer`-namespaced counters and histograms registered
//! through the `metrics` facade. Centralized here so call sites can't drift
//! from the names a dashboard expects.

pub const NOTIFICATIONS_CONSUMED_TOTAL: &str = "gnmi_writer_notifications_consumed_total";
pub const FETCH_ERRORS_TOTAL: &str = "gnmi_writer_fetch_errors_total";
pub const UNMARSHAL_ERRORS_TOTAL: &str = "gnmi_writer_unmarshal_errors_total";

pub const RECORDS_PROCESSED_TOTAL: &str = "gnmi_writer_records_processed_total";
pub const PROCESSING_ERRORS_TOTAL: &str = "gnmi_writer_processing_errors_total";
pub const PROCESSING_DURATION_SECONDS: &str = "gnmi_writer_processing_duration_seconds";
pub const WRITE_ERRORS_TOTAL: &str = "gnmi_writer_write_errors_total";
pub const COMMIT_ERRORS_TOTAL: &str = "gnmi_writer_commit_errors_total";

pub const CLICKHOUSE_INSERT_DURATION_SECONDS: &str = "gnmi_writer_clickhouse_insert_duration_seconds";
pub const CLICKHOUSE_INSERT_ERRORS_TOTAL: &str = "gnmi_writer_clickhouse_insert_errors_total";
pub const CLICKHOUSE_RECORDS_WRITTEN_TOTAL: &str = "gnmi_writer_clickhouse_records_written_total";
